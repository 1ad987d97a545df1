//! In-memory filtering, aggregation and card building over lists that were
//! fetched in full from the backend. Everything here is recomputed from the
//! latest fetched list on every page render.

pub mod cards;
pub mod stats;

use std::cmp::Reverse;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::driver::DriverProfile;
use crate::models::ride::{Ride, RideStatus};
use crate::models::user::{Role, User};

pub const UNKNOWN: &str = "Unknown";
pub const NOT_RATED: &str = "Not rated";

pub fn or_unknown(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.trim().is_empty() => text,
        _ => UNKNOWN,
    }
}

fn normalized(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

fn any_contains<'a>(needle: &str, haystacks: impl IntoIterator<Item = &'a str>) -> bool {
    haystacks
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Case-insensitive substring match over addresses and the rider's and
/// driver's name and phone. Missing fields are searched as their placeholder.
pub fn ride_matches(ride: &Ride, query: &str) -> bool {
    let Some(needle) = normalized(query) else {
        return true;
    };

    let rider = ride.rider.as_ref();
    let driver = ride.driver.as_ref();
    any_contains(
        &needle,
        [
            or_unknown(ride.pickup.address.as_deref()),
            or_unknown(ride.destination.address.as_deref()),
            or_unknown(rider.and_then(|p| p.name.as_deref())),
            or_unknown(rider.and_then(|p| p.phone.as_deref())),
            or_unknown(driver.and_then(|p| p.name.as_deref())),
            or_unknown(driver.and_then(|p| p.phone.as_deref())),
        ],
    )
}

pub fn search_rides<'a>(rides: &'a [Ride], query: &str) -> Vec<&'a Ride> {
    rides.iter().filter(|ride| ride_matches(ride, query)).collect()
}

pub fn search_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let Some(needle) = normalized(query) else {
        return users.iter().collect();
    };

    users
        .iter()
        .filter(|user| {
            any_contains(
                &needle,
                [
                    or_unknown(user.name.as_deref()),
                    user.email.as_str(),
                    or_unknown(user.phone.as_deref()),
                ],
            )
        })
        .collect()
}

pub fn search_drivers<'a>(drivers: &'a [DriverProfile], query: &str) -> Vec<&'a DriverProfile> {
    let Some(needle) = normalized(query) else {
        return drivers.iter().collect();
    };

    drivers
        .iter()
        .filter(|driver| {
            any_contains(
                &needle,
                [
                    or_unknown(driver.name.as_deref()),
                    or_unknown(driver.email.as_deref()),
                    or_unknown(driver.phone.as_deref()),
                ],
            )
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(RideStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: &RideStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }

    pub fn apply<'a>(&self, rides: impl IntoIterator<Item = &'a Ride>) -> Vec<&'a Ride> {
        rides
            .into_iter()
            .filter(|ride| self.matches(&ride.status))
            .collect()
    }
}

impl FromStr for StatusFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "all" => Ok(StatusFilter::All),
            other => {
                let status = RideStatus::from(other);
                if !status.is_known() {
                    return Err(AppError::BadRequest(format!("unknown status filter: {other}")));
                }
                Ok(StatusFilter::Only(status))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    Only(Role),
}

impl FromStr for RoleFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "all" => Ok(RoleFilter::All),
            other => Role::parse(other)
                .map(RoleFilter::Only)
                .ok_or_else(|| AppError::BadRequest(format!("unknown role filter: {other}"))),
        }
    }
}

impl RoleFilter {
    pub fn matches(&self, role: Role) -> bool {
        match self {
            RoleFilter::All => true,
            RoleFilter::Only(wanted) => *wanted == role,
        }
    }
}

#[derive(Debug, Default)]
pub struct RolePartition<'a> {
    pub riders: Vec<&'a User>,
    pub drivers: Vec<&'a User>,
    pub admins: Vec<&'a User>,
}

pub fn partition_by_role(users: &[User]) -> RolePartition<'_> {
    let mut partition = RolePartition::default();

    for user in users {
        match user.role {
            Role::Rider => partition.riders.push(user),
            Role::Driver => partition.drivers.push(user),
            Role::Admin => partition.admins.push(user),
        }
    }

    partition
}

/// Rides waiting for any driver.
pub fn available(rides: &[Ride]) -> Vec<&Ride> {
    StatusFilter::Only(RideStatus::Requested).apply(rides)
}

/// Rides a driver is currently working.
pub fn active(rides: &[Ride]) -> Vec<&Ride> {
    rides.iter().filter(|ride| ride.status.is_active()).collect()
}

/// Newest first; rides without a creation time keep their relative order at
/// the end.
pub fn newest_first(rides: &[Ride]) -> Vec<&Ride> {
    let mut sorted: Vec<&Ride> = rides.iter().collect();
    sorted.sort_by_key(|ride| (ride.created_at.is_none(), Reverse(ride.created_at)));
    sorted
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::models::geo::Place;
    use crate::models::ride::{PartyRef, Ride, RideStatus};

    pub fn ride(id: &str, status: &str) -> Ride {
        Ride {
            id: id.to_string(),
            pickup: Place::default(),
            destination: Place::default(),
            status: RideStatus::from(status),
            fare: None,
            distance: None,
            duration: None,
            created_at: None,
            started_at: None,
            ended_at: None,
            rider: None,
            driver: None,
            rating: None,
        }
    }

    pub fn ride_between(id: &str, status: &str, from: &str, to: &str, rider: &str) -> Ride {
        Ride {
            pickup: Place::from_address(from),
            destination: Place::from_address(to),
            rider: Some(PartyRef {
                id: Some(format!("{id}-rider")),
                name: Some(rider.to_string()),
                phone: Some("555-0100".to_string()),
            }),
            ..ride(id, status)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::fixtures::{ride, ride_between};
    use super::*;

    fn user(id: &str, name: Option<&str>, email: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: name.map(str::to_string),
            email: email.to_string(),
            phone: None,
            role,
            created_at: None,
        }
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let rides = vec![
            ride_between("a", "requested", "Main St", "Airport", "Ann"),
            ride("b", "completed"),
            ride_between("c", "cancelled", "Dock", "Mall", "Cy"),
        ];

        let ids: Vec<_> = search_rides(&rides, "").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let ids: Vec<_> = search_rides(&rides, "   ").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn ride_search_is_case_insensitive_across_fields() {
        let rides = vec![
            ride_between("a", "requested", "Main St", "Airport", "Ann"),
            ride_between("b", "requested", "Dock", "Mall", "Bob"),
        ];

        let hits: Vec<_> = search_rides(&rides, "AIRport").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(hits, vec!["a"]);

        let hits: Vec<_> = search_rides(&rides, "bob").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(hits, vec!["b"]);
    }

    #[test]
    fn rides_missing_fields_are_kept_and_searched_as_placeholder() {
        let rides = vec![ride("bare", "requested")];
        assert_eq!(search_rides(&rides, "unknown").len(), 1);
        assert!(search_rides(&rides, "main").is_empty());
    }

    #[test]
    fn user_search_matches_email() {
        let users = vec![
            user("1", Some("Ann"), "ann@example.com", Role::Rider),
            user("2", None, "root@example.com", Role::Admin),
        ];
        let hits = search_users(&users, "ROOT@");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "2");
    }

    #[test]
    fn status_filter_parses_all_and_known_statuses() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "picked_up".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(RideStatus::PickedUp)
        );
        assert!("flying".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn status_filter_is_exact() {
        let rides = vec![ride("a", "accepted"), ride("b", "completed"), ride("c", "accepted")];
        let hits = StatusFilter::Only(RideStatus::Accepted).apply(&rides);
        assert_eq!(hits.len(), 2);
        assert_eq!(StatusFilter::All.apply(&rides).len(), 3);
    }

    #[test]
    fn partition_splits_by_role() {
        let users = vec![
            user("1", None, "a@x.io", Role::Rider),
            user("2", None, "b@x.io", Role::Driver),
            user("3", None, "c@x.io", Role::Rider),
            user("4", None, "d@x.io", Role::Admin),
        ];

        let partition = partition_by_role(&users);
        assert_eq!(partition.riders.len(), 2);
        assert_eq!(partition.drivers.len(), 1);
        assert_eq!(partition.admins.len(), 1);
    }

    #[test]
    fn available_and_active_views() {
        let rides = vec![
            ride("a", "requested"),
            ride("b", "accepted"),
            ride("c", "in_transit"),
            ride("d", "completed"),
        ];
        assert_eq!(available(&rides).len(), 1);
        let active_ids: Vec<_> = active(&rides).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(active_ids, vec!["b", "c"]);
    }

    #[test]
    fn history_sorts_newest_first_with_undated_last() {
        let mut old = ride("old", "completed");
        old.created_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap());
        let mut new = ride("new", "completed");
        new.created_at = Some(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        let undated = ride("undated", "cancelled");

        let rides = vec![undated, old, new];
        let ids: Vec<_> = newest_first(&rides).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "undated"]);
    }
}
