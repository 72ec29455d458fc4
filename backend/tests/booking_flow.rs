//! End-to-end booking flow over the HTTP surface.
//!
//! A priest publishes a slot and a band, faithful register and book, and
//! the booking rules surface as HTTP errors with stable detail codes.

mod support;

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test;
use chrono::{DateTime, Duration, Utc};
use confesapp::domain::ports::PasswordHasher;
use confesapp::domain::scheduling::{BandStatus, SlotStatus};
use confesapp::domain::{Email, PersonName, User, UserDraft, UserId, UserRole};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use uuid::Uuid;

use support::{Harness, start_of_test};

const PRIEST_EMAIL: &str = "don.camillo@example.org";
const PRIEST_PASSWORD: &str = "brescello-1952";

#[fixture]
fn harness() -> Harness {
    let harness = Harness::new();
    let now = start_of_test();
    let priest = User::new(UserDraft {
        id: UserId::random(),
        email: Email::new(PRIEST_EMAIL).expect("valid email"),
        first_name: PersonName::new("Camillo", "firstName").expect("valid name"),
        last_name: PersonName::new("Tarocci", "lastName").expect("valid name"),
        phone: None,
        role: UserRole::Priest,
        diocese_id: Some(Uuid::new_v4()),
        parish_id: Some(Uuid::new_v4()),
        active: true,
        created_at: now,
        updated_at: now,
    })
    .expect("valid priest");
    let hash = harness.hasher.hash(PRIEST_PASSWORD).expect("hash");
    harness.store.seed_user(priest, hash);
    harness
}

fn at_hours(hours: i64) -> DateTime<Utc> {
    start_of_test() + Duration::hours(hours)
}

fn bearer(token: &str) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("Bearer {token}"))
}

fn uuid_field(body: &Value, field: &str) -> Uuid {
    body[field]
        .as_str()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_else(|| panic!("{field} should be a uuid in {body}"))
}

macro_rules! send {
    ($app:expr, $req:expr) => {{
        let res = test::call_service($app, $req.to_request()).await;
        let status = res.status();
        let bytes = test::read_body(res).await;
        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }};
}

macro_rules! register {
    ($app:expr, $email:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": $email,
                    "password": "kyrie-eleison",
                    "firstName": "Peppone",
                    "lastName": "Bottazzi"
                }))
        );
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["user"]["role"], "faithful");
        body["token"].as_str().expect("token").to_owned()
    }};
}

macro_rules! priest_login {
    ($app:expr) => {{
        let (status, body) = send!(
            $app,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({ "email": PRIEST_EMAIL, "password": PRIEST_PASSWORD }))
        );
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().expect("token").to_owned()
    }};
}

#[rstest]
#[actix_web::test]
async fn slot_booking_and_cancellation_round_trip(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let priest = priest_login!(&app);
    let faithful = register!(&app, "peppone@example.org");
    let latecomer = register!(&app, "smilzo@example.org");

    let (status, slot) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confession-slots")
            .insert_header(bearer(&priest))
            .set_json(json!({
                "startTime": at_hours(23),
                "endTime": at_hours(23) + Duration::minutes(30),
                "notes": "Side chapel"
            }))
    );
    assert_eq!(status, StatusCode::CREATED, "{slot}");
    let slot_id = uuid_field(&slot, "id");

    let (status, booked) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&faithful))
            .set_json(json!({ "slotId": slot_id }))
    );
    assert_eq!(status, StatusCode::CREATED, "{booked}");
    assert_eq!(booked["status"], "booked");
    assert_eq!(booked["slotId"], slot_id.to_string());
    assert!(booked["bandId"].is_null());
    let confession_id = uuid_field(&booked, "id");
    assert_eq!(
        harness.store.slot(slot_id).map(|slot| slot.status()),
        Some(SlotStatus::Booked)
    );

    let (status, refused) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&latecomer))
            .set_json(json!({ "slotId": slot_id }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(refused["details"]["code"], "target_unavailable");

    let (status, forbidden) = send!(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/confessions/{confession_id}/cancel"))
            .insert_header(bearer(&latecomer))
    );
    assert_eq!(status, StatusCode::FORBIDDEN, "{forbidden}");

    let (status, cancelled) = send!(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/confessions/{confession_id}/cancel"))
            .insert_header(bearer(&faithful))
    );
    assert_eq!(status, StatusCode::OK, "{cancelled}");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(
        harness.store.slot(slot_id).map(|slot| slot.status()),
        Some(SlotStatus::Available)
    );

    let (status, rebooked) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&latecomer))
            .set_json(json!({ "slotId": slot_id }))
    );
    assert_eq!(status, StatusCode::CREATED, "{rebooked}");

    let (status, mine) = send!(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/confessions/mine")
            .insert_header(bearer(&faithful))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
    assert_eq!(mine[0]["status"], "cancelled");
}

#[rstest]
#[actix_web::test]
async fn band_fills_up_and_completes_after_start(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let priest = priest_login!(&app);
    let first = register!(&app, "gina@example.org");
    let second = register!(&app, "mariolino@example.org");

    let (status, created) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confession-bands")
            .insert_header(bearer(&priest))
            .set_json(json!({
                "startTime": at_hours(2),
                "endTime": at_hours(4),
                "capacity": 1
            }))
    );
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created.as_array().map(Vec::len), Some(1));
    assert_eq!(created[0]["recurrence"], "none");
    let band_id = uuid_field(&created[0], "id");

    let (status, booked) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&first))
            .set_json(json!({ "bandId": band_id, "notes": "First time in years" }))
    );
    assert_eq!(status, StatusCode::CREATED, "{booked}");
    let confession_id = uuid_field(&booked, "id");

    let (status, band) = send!(
        &app,
        test::TestRequest::get()
            .uri(&format!("/api/v1/confession-bands/{band_id}"))
            .insert_header(bearer(&second))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(band["bookedCount"], 1);
    assert_eq!(band["remaining"], 0);
    assert_eq!(band["status"], "full");

    let (status, refused) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&second))
            .set_json(json!({ "bandId": band_id }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(refused["details"]["code"], "band_full");

    let (status, early) = send!(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/confessions/{confession_id}/complete"))
            .insert_header(bearer(&priest))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(early["details"]["code"], "not_started");

    harness.clock.advance(Duration::hours(3));

    let (status, completed) = send!(
        &app,
        test::TestRequest::post()
            .uri(&format!("/api/v1/confessions/{confession_id}/complete"))
            .insert_header(bearer(&priest))
    );
    assert_eq!(status, StatusCode::OK, "{completed}");
    assert_eq!(completed["status"], "completed");
    assert_eq!(
        harness.store.band(band_id).map(|band| band.status()),
        Some(BandStatus::Full)
    );

    let (status, listed) = send!(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/confessions/priest?status=completed")
            .insert_header(bearer(&priest))
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["id"], confession_id.to_string());
}

#[rstest]
#[actix_web::test]
async fn role_and_token_guards_hold(harness: Harness) {
    let app = test::init_service(harness.app()).await;
    let faithful = register!(&app, "brusco@example.org");

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .set_json(json!({ "slotId": Uuid::new_v4() }))
    );
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{body}");

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confession-slots")
            .insert_header(bearer(&faithful))
            .set_json(json!({
                "startTime": at_hours(5),
                "endTime": at_hours(6)
            }))
    );
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&faithful))
            .set_json(json!({ "slotId": Uuid::new_v4(), "bandId": Uuid::new_v4() }))
    );
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/confessions")
            .insert_header(bearer(&faithful))
            .set_json(json!({ "bandId": Uuid::new_v4() }))
    );
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");

    let (status, body) = send!(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": "BRUSCO@example.org",
                "password": "kyrie-eleison",
                "firstName": "Brusco",
                "lastName": "Bottazzi"
            }))
    );
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}
