use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "longitude")]
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, AppError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(AppError::BadRequest(format!("latitude out of range: {lat}")));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(AppError::BadRequest(format!("longitude out of range: {lng}")));
        }

        Ok(Self { lat, lng })
    }
}

/// A named place. The address is optional because the backend omits it for
/// rides created from raw coordinates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Place {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl Place {
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            coordinates: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Coordinates;

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(Coordinates::new(91.0, 0.0).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn accepts_long_form_field_names() {
        let c: Coordinates =
            serde_json::from_str(r#"{ "latitude": 52.52, "longitude": 13.405 }"#).unwrap();
        assert_eq!(c, Coordinates { lat: 52.52, lng: 13.405 });
    }
}
