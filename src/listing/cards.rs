use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::lifecycle::{action_views, rider_can_cancel, rider_can_rate, ActionView, StatusColor};
use crate::listing::{or_unknown, NOT_RATED};
use crate::models::driver::{DriverAvailability, DriverProfile};
use crate::models::ride::{PartyRef, Ride, RideStatus};
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Serialize)]
pub struct PartyView {
    pub name: String,
    pub phone: String,
}

impl PartyView {
    fn from_ref(party: Option<&PartyRef>) -> Self {
        Self {
            name: or_unknown(party.and_then(|p| p.name.as_deref())).to_string(),
            phone: or_unknown(party.and_then(|p| p.phone.as_deref())).to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RideCard {
    pub id: String,
    pub pickup: String,
    pub destination: String,
    pub status: RideStatus,
    pub status_label: &'static str,
    pub status_color: StatusColor,
    pub fare: f64,
    pub distance: Option<f64>,
    pub rating: String,
    pub rider: PartyView,
    pub driver: PartyView,
    pub created_at: Option<DateTime<Utc>>,
    pub actions: Vec<ActionView>,
}

impl RideCard {
    pub fn from_ride(ride: &Ride) -> Self {
        Self {
            id: ride.id.clone(),
            pickup: or_unknown(ride.pickup.address.as_deref()).to_string(),
            destination: or_unknown(ride.destination.address.as_deref()).to_string(),
            status: ride.status.clone(),
            status_label: ride.status.label(),
            status_color: ride.status.color(),
            fare: ride.fare.unwrap_or(0.0),
            distance: ride.distance,
            rating: rating_display(ride.rating),
            rider: PartyView::from_ref(ride.rider.as_ref()),
            driver: PartyView::from_ref(ride.driver.as_ref()),
            created_at: ride.created_at,
            actions: Vec::new(),
        }
    }

    /// Card with the transitions a driver may trigger.
    pub fn for_driver(ride: &Ride) -> Self {
        Self {
            actions: action_views(&ride.status),
            ..Self::from_ride(ride)
        }
    }

    /// Card with the rider's cancel and rate buttons where they apply.
    pub fn for_rider(ride: &Ride) -> Self {
        let mut actions = Vec::new();
        if rider_can_cancel(&ride.status) {
            actions.push(ActionView {
                kind: "cancel",
                target: RideStatus::Cancelled,
                label: "Cancel Ride",
            });
        }
        if rider_can_rate(&ride.status, ride.is_rated()) {
            actions.push(ActionView {
                kind: "rate",
                target: RideStatus::Completed,
                label: "Rate Ride",
            });
        }

        Self {
            actions,
            ..Self::from_ride(ride)
        }
    }
}

pub fn rating_display(rating: Option<u8>) -> String {
    match rating {
        Some(stars) => format!("{stars}/5"),
        None => NOT_RATED.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: or_unknown(user.name.as_deref()).to_string(),
            email: user.email.clone(),
            phone: or_unknown(user.phone.as_deref()).to_string(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DriverRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub status: DriverAvailability,
    pub vehicle: String,
    pub missing_documents: Vec<&'static str>,
    pub total_earnings: f64,
    pub total_rides: u32,
}

impl From<&DriverProfile> for DriverRow {
    fn from(driver: &DriverProfile) -> Self {
        let vehicle = match &driver.vehicle {
            Some(v) => format!("{} {} {} ({})", v.year, v.make, v.model, v.plate),
            None => "No vehicle registered".to_string(),
        };

        Self {
            id: driver.id.clone(),
            name: or_unknown(driver.name.as_deref()).to_string(),
            email: or_unknown(driver.email.as_deref()).to_string(),
            phone: or_unknown(driver.phone.as_deref()).to_string(),
            status: driver.status,
            vehicle,
            missing_documents: driver.documents.missing(),
            total_earnings: driver.total_earnings,
            total_rides: driver.total_rides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RideCard;
    use crate::listing::fixtures::{ride, ride_between};

    #[test]
    fn bare_ride_renders_placeholders() {
        let card = RideCard::from_ride(&ride("r1", "completed"));
        assert_eq!(card.pickup, "Unknown");
        assert_eq!(card.rider.name, "Unknown");
        assert_eq!(card.rating, "Not rated");
        assert_eq!(card.fare, 0.0);
    }

    #[test]
    fn rated_ride_shows_stars() {
        let mut r = ride_between("r2", "completed", "A", "B", "Ann");
        r.rating = Some(4);
        let card = RideCard::for_rider(&r);
        assert_eq!(card.rating, "4/5");
        assert!(card.actions.is_empty());
    }

    #[test]
    fn rider_sees_rate_on_unrated_completed_ride() {
        let card = RideCard::for_rider(&ride("r3", "completed"));
        let kinds: Vec<_> = card.actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec!["rate"]);

        let card = RideCard::for_rider(&ride("r4", "requested"));
        let kinds: Vec<_> = card.actions.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec!["cancel"]);
    }

    #[test]
    fn driver_card_carries_transitions() {
        let card = RideCard::for_driver(&ride("r5", "accepted"));
        let labels: Vec<_> = card.actions.iter().map(|a| a.label).collect();
        assert_eq!(labels, vec!["Mark as Picked Up", "Cancel"]);
    }
}
