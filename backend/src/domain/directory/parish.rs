//! Parish entity and coordinates.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{DirectoryValidationError, validate_address, validate_name};

/// WGS84 coordinates of a parish church.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Validate a coordinate pair.
    ///
    /// # Examples
    /// ```
    /// use confesapp::domain::GeoPoint;
    ///
    /// assert!(GeoPoint::new(41.9022, 12.4539).is_ok());
    /// assert!(GeoPoint::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DirectoryValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DirectoryValidationError::LatitudeOutOfRange { value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DirectoryValidationError::LongitudeOutOfRange { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build an optional point from optional halves; both or neither.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, DirectoryValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(DirectoryValidationError::PartialCoordinates),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }
    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Input payload for [`Parish::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParishDraft {
    pub id: Uuid,
    pub diocese_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a parish. The diocese cannot be changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParishChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the address.
    pub address: Option<Option<String>>,
    pub location: Option<GeoPoint>,
}

/// A church location under a diocese.
#[derive(Debug, Clone, PartialEq)]
pub struct Parish {
    id: Uuid,
    diocese_id: Uuid,
    name: String,
    address: Option<String>,
    location: Option<GeoPoint>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Parish {
    /// Validate and construct a parish.
    pub fn new(draft: ParishDraft) -> Result<Self, DirectoryValidationError> {
        Self::try_from(draft)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn diocese_id(&self) -> Uuid {
        self.diocese_id
    }
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a partial update.
    pub fn apply(
        mut self,
        changes: ParishChanges,
        now: DateTime<Utc>,
    ) -> Result<Self, DirectoryValidationError> {
        if let Some(name) = changes.name {
            self.name = validate_name(&name)?;
        }
        if let Some(address) = changes.address {
            self.address = validate_address(address.as_deref())?;
        }
        if let Some(location) = changes.location {
            self.location = Some(location);
        }
        self.updated_at = now;
        Ok(self)
    }

    /// Soft-delete the parish.
    #[must_use]
    pub fn deactivated(mut self, now: DateTime<Utc>) -> Self {
        self.active = false;
        self.updated_at = now;
        self
    }
}

impl TryFrom<ParishDraft> for Parish {
    type Error = DirectoryValidationError;

    fn try_from(draft: ParishDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            id: draft.id,
            diocese_id: draft.diocese_id,
            name: validate_name(&draft.name)?,
            address: validate_address(draft.address.as_deref())?,
            location: draft.location,
            active: draft.active,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        })
    }
}
