use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::driver::DriverProfile;
use crate::models::ride::{Ride, RideStatus};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RideStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Sum of fares over completed rides; a missing fare counts as zero.
    pub completed_fare_total: f64,
    pub rated_count: usize,
    /// Mean over rated rides only. `None` when nothing has been rated.
    pub average_rating: Option<f64>,
}

impl RideStats {
    pub fn from_rides<'a>(rides: impl IntoIterator<Item = &'a Ride>) -> Self {
        let mut stats = RideStats::default();
        let mut rating_sum = 0u32;

        for ride in rides {
            stats.total += 1;
            *stats
                .by_status
                .entry(ride.status.bucket().to_string())
                .or_insert(0) += 1;

            if ride.status == RideStatus::Completed {
                stats.completed_fare_total += ride.fare.unwrap_or(0.0);
            }

            if let Some(rating) = ride.rating {
                rating_sum += u32::from(rating);
                stats.rated_count += 1;
            }
        }

        if stats.rated_count > 0 {
            stats.average_rating = Some(f64::from(rating_sum) / stats.rated_count as f64);
        }

        stats
    }

    pub fn count(&self, status: &RideStatus) -> usize {
        self.by_status.get(status.bucket()).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DriverStats {
    pub total: usize,
    pub online: usize,
    pub total_earnings: f64,
    pub total_rides: u64,
    pub incomplete_documents: usize,
}

impl DriverStats {
    pub fn from_drivers<'a>(drivers: impl IntoIterator<Item = &'a DriverProfile>) -> Self {
        drivers
            .into_iter()
            .fold(DriverStats::default(), |mut stats, driver| {
                stats.total += 1;
                if driver.is_online() {
                    stats.online += 1;
                }
                stats.total_earnings += driver.total_earnings;
                stats.total_rides += u64::from(driver.total_rides);
                if !driver.documents.is_complete() {
                    stats.incomplete_documents += 1;
                }
                stats
            })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::RideStats;
    use crate::listing::fixtures::ride;
    use crate::models::ride::{Ride, RideStatus};

    #[test]
    fn only_completed_fares_are_summed() {
        let mut rides = vec![
            ride("a", "completed"),
            ride("b", "completed"),
            ride("c", "pending"),
            ride("d", "cancelled"),
        ];
        rides[0].fare = Some(10.0);
        rides[1].fare = Some(20.0);
        rides[3].fare = Some(30.0);

        let stats = RideStats::from_rides(&rides);
        assert_eq!(stats.completed_fare_total, 30.0);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.count(&RideStatus::Completed), 2);
        assert_eq!(stats.by_status.get("unknown"), Some(&1));
    }

    #[test]
    fn decoded_list_with_a_bad_fare_keeps_every_ride() {
        let rides: Vec<Ride> = serde_json::from_value(json!([
            { "_id": "a", "status": "completed", "fare": 10 },
            { "_id": "b", "status": "completed", "fare": "20" },
            { "_id": "c", "status": "pending", "fare": "missing" },
            { "_id": "d", "status": "cancelled", "fare": 30 }
        ]))
        .unwrap();

        assert_eq!(rides.len(), 4);
        assert_eq!(rides[2].fare, None);

        let stats = RideStats::from_rides(&rides);
        assert_eq!(stats.completed_fare_total, 30.0);
        assert_eq!(stats.total, 4);
    }

    #[test]
    fn unrated_rides_are_left_out_of_the_average() {
        let mut rides = vec![ride("a", "completed"), ride("b", "completed"), ride("c", "completed")];
        rides[0].rating = Some(5);
        rides[1].rating = Some(4);

        let stats = RideStats::from_rides(&rides);
        assert_eq!(stats.rated_count, 2);
        assert_eq!(stats.average_rating, Some(4.5));
    }

    #[test]
    fn no_ratings_means_no_average() {
        let rides = vec![ride("a", "completed")];
        let stats = RideStats::from_rides(&rides);
        assert_eq!(stats.average_rating, None);

        let empty = RideStats::from_rides(std::iter::empty());
        assert_eq!(empty.total, 0);
        assert_eq!(empty.completed_fare_total, 0.0);
    }
}
