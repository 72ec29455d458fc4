//! Bearer-token issuance and the authenticated-caller extractor.
//!
//! Tokens are HS256 JWTs carrying `sub` (user id), `role`, `iat` and `exp`.
//! Expiry is checked against the injected clock rather than the system clock
//! so tests can pin time.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use chrono::{DateTime, Duration, TimeZone, Utc};
use futures_util::future::{Ready, ready};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Actor, Error, User, UserId, UserRole};

use super::token_config::TokenKey;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    role: UserRole,
    iat: i64,
    exp: i64,
}

/// A signed token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies bearer tokens.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

fn invalid_token() -> Error {
    Error::unauthorized("invalid or expired token")
}

impl TokenCodec {
    /// Build a codec from the signing key. The key bytes are copied into the
    /// `jsonwebtoken` key types; the caller's [`TokenKey`] wipes itself on drop.
    pub fn new(key: &TokenKey, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(key.as_bytes()),
            decoding: DecodingKey::from_secret(key.as_bytes()),
            validation,
            ttl,
            clock,
        }
    }

    /// Issue a token for `user` valid for the configured TTL.
    pub fn issue(&self, user: &User) -> Result<IssuedToken, Error> {
        let now = self.clock.utc();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: user.id().to_string(),
            role: user.role(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| Error::internal(format!("failed to sign token: {err}")))?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verify a token and return the caller it names.
    pub fn verify(&self, token: &str) -> Result<Actor, Error> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|err| {
            debug!(error = %err, "rejected bearer token");
            invalid_token()
        })?;
        let claims = data.claims;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(invalid_token)?;
        if expires_at <= self.clock.utc() {
            return Err(invalid_token());
        }
        let user_id = UserId::new(&claims.sub).map_err(|_| invalid_token())?;
        Ok(Actor::new(user_id, claims.role))
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing bearer token"))?;
    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must use the Bearer scheme"))
}

fn authenticate(req: &HttpRequest) -> Result<Actor, Error> {
    let codec = req
        .app_data::<web::Data<TokenCodec>>()
        .ok_or_else(|| Error::internal("token codec is not configured"))?;
    codec.verify(bearer_token(req)?)
}

/// Extractor yielding the verified caller, or `401` when the bearer token is
/// missing or invalid.
///
/// # Examples
/// ```
/// use actix_web::{HttpResponse, get};
/// use confesapp::inbound::http::auth::Authenticated;
///
/// #[get("/whoami")]
/// async fn whoami(Authenticated(actor): Authenticated) -> HttpResponse {
///     HttpResponse::Ok().body(actor.user_id().to_string())
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Actor);

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(Self))
    }
}
