use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::geo::Place;
use crate::models::lenient::optional_amount;

/// Lifecycle stage of a ride as reported by the backend.
///
/// Values outside the known set decode as [`RideStatus::Unknown`] instead of
/// failing, so one odd record never hides a whole list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RideStatus {
    Requested,
    Accepted,
    PickedUp,
    InTransit,
    Completed,
    Cancelled,
    Unknown(String),
}

impl RideStatus {
    pub const KNOWN: [RideStatus; 6] = [
        RideStatus::Requested,
        RideStatus::Accepted,
        RideStatus::PickedUp,
        RideStatus::InTransit,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::PickedUp => "picked_up",
            RideStatus::InTransit => "in_transit",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
            RideStatus::Unknown(raw) => raw,
        }
    }

    /// Key used when grouping rides by status; every unknown value shares one
    /// bucket.
    pub fn bucket(&self) -> &str {
        match self {
            RideStatus::Unknown(_) => "unknown",
            known => known.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RideStatus::Unknown(_))
    }
}

impl From<String> for RideStatus {
    fn from(raw: String) -> Self {
        RideStatus::from(raw.as_str())
    }
}

impl From<&str> for RideStatus {
    fn from(raw: &str) -> Self {
        match raw {
            "requested" => RideStatus::Requested,
            "accepted" => RideStatus::Accepted,
            "picked_up" => RideStatus::PickedUp,
            "in_transit" => RideStatus::InTransit,
            "completed" => RideStatus::Completed,
            "cancelled" => RideStatus::Cancelled,
            other => RideStatus::Unknown(other.to_string()),
        }
    }
}

impl From<RideStatus> for String {
    fn from(status: RideStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rider or driver attached to a ride. The backend sends either a bare id or
/// a populated object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartyRefWire")]
pub struct PartyRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PartyRefWire {
    Id(String),
    Populated {
        #[serde(default, alias = "_id")]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        phone: Option<String>,
    },
}

impl From<PartyRefWire> for PartyRef {
    fn from(wire: PartyRefWire) -> Self {
        match wire {
            PartyRefWire::Id(id) => PartyRef {
                id: Some(id),
                ..PartyRef::default()
            },
            PartyRefWire::Populated { id, name, phone } => PartyRef { id, name, phone },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "pickupLocation")]
    pub pickup: Place,
    #[serde(default, alias = "dropoffLocation", alias = "dropoff")]
    pub destination: Place,
    pub status: RideStatus,
    #[serde(default, deserialize_with = "optional_amount")]
    pub fare: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub distance: Option<f64>,
    #[serde(default, deserialize_with = "optional_amount")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rider: Option<PartyRef>,
    #[serde(default)]
    pub driver: Option<PartyRef>,
    #[serde(default)]
    pub rating: Option<u8>,
}

impl Ride {
    pub fn is_rated(&self) -> bool {
        self.rating.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Ride, RideStatus};

    #[test]
    fn unknown_status_survives_decode() {
        let ride: Ride = serde_json::from_value(json!({
            "_id": "r1",
            "status": "pending"
        }))
        .unwrap();

        assert_eq!(ride.status, RideStatus::Unknown("pending".to_string()));
        assert_eq!(ride.status.bucket(), "unknown");
        assert_eq!(ride.pickup.address, None);
    }

    #[test]
    fn party_ref_accepts_id_or_object() {
        let ride: Ride = serde_json::from_value(json!({
            "id": "r2",
            "status": "accepted",
            "rider": "u-17",
            "driver": { "_id": "d-3", "name": "Dana", "phone": "555-0101" }
        }))
        .unwrap();

        assert_eq!(ride.rider.unwrap().id.as_deref(), Some("u-17"));
        let driver = ride.driver.unwrap();
        assert_eq!(driver.name.as_deref(), Some("Dana"));
        assert_eq!(driver.id.as_deref(), Some("d-3"));
    }

    #[test]
    fn known_statuses_keep_their_wire_names() {
        for status in RideStatus::KNOWN {
            assert!(status.is_known());
            assert_eq!(RideStatus::from(status.as_str()), status);
        }
    }

    #[test]
    fn status_serializes_as_wire_string() {
        let value = serde_json::to_value(RideStatus::InTransit).unwrap();
        assert_eq!(value, json!("in_transit"));
    }
}
