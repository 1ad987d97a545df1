//! Request and response bodies exchanged with the backend API.

use serde::{Deserialize, Serialize};

use crate::models::driver::{DriverAvailability, DriverDocuments, Vehicle};
use crate::models::geo::{Coordinates, Place};
use crate::models::ride::RideStatus;
use crate::models::user::{Role, User};

/// Every backend response wraps its payload as `{ success, message, data }`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self, fallback: &str) -> String {
        self.message
            .or(self.error)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "accessToken")]
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfilePayload {
    pub license_number: String,
    pub vehicle: Vehicle,
    pub documents: DriverDocuments,
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverStatusPayload {
    pub status: DriverAvailability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationPayload {
    pub location: Coordinates,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStatsPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_earnings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rides: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RideRequestPayload {
    pub pickup: Place,
    pub destination: Place,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CancelPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatePayload {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusPayload {
    pub status: RideStatus,
}
