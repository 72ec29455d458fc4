//! Church hierarchy: dioceses and their parishes.

mod diocese;
mod parish;

pub use diocese::{Diocese, DioceseChanges, DioceseDraft};
pub use parish::{GeoPoint, Parish, ParishChanges, ParishDraft};

/// Maximum length of a diocese or parish name.
pub const NAME_MAX: usize = 200;
/// Maximum length of a parish address.
pub const ADDRESS_MAX: usize = 500;

/// Validation errors for directory entities.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectoryValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("address must be at most {max} characters")]
    AddressTooLong { max: usize },
    #[error("latitude must be between -90 and 90, got {value}")]
    LatitudeOutOfRange { value: f64 },
    #[error("longitude must be between -180 and 180, got {value}")]
    LongitudeOutOfRange { value: f64 },
    #[error("latitude and longitude must be supplied together")]
    PartialCoordinates,
}

pub(crate) fn validate_name(raw: &str) -> Result<String, DirectoryValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DirectoryValidationError::EmptyName);
    }
    if trimmed.chars().count() > NAME_MAX {
        return Err(DirectoryValidationError::NameTooLong { max: NAME_MAX });
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn validate_address(
    raw: Option<&str>,
) -> Result<Option<String>, DirectoryValidationError> {
    let Some(trimmed) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > ADDRESS_MAX {
        return Err(DirectoryValidationError::AddressTooLong { max: ADDRESS_MAX });
    }
    Ok(Some(trimmed.to_owned()))
}
