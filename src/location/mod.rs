//! Where the driver's coordinates come from.

pub mod availability;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::models::geo::Coordinates;

/// Why no position could be obtained. The display text is what the driver
/// sees next to the disabled "Go Online" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("Location access denied by user")]
    PermissionDenied,
    #[error("Location information is unavailable")]
    PositionUnavailable,
    #[error("Location request timed out")]
    Timeout,
}

pub type Reading = Result<Coordinates, LocationError>;

#[async_trait]
pub trait LocationSource: Send + Sync {
    /// One-shot read.
    async fn current_position(&self) -> Reading;

    /// Readings produced after the call, until the source goes away.
    fn watch(&self) -> BoxStream<'static, Reading>;
}

/// How old a pushed reading may be and still count as the current position.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
struct Stamped {
    reading: Reading,
    at: Instant,
}

/// Readings pushed by the driver's device screen, which owns the actual
/// geolocation capability and forwards both fixes and capability errors.
pub struct DeviceLocation {
    tx: watch::Sender<Option<Stamped>>,
    fix_timeout: Duration,
    max_age: Duration,
}

impl DeviceLocation {
    pub fn new(fix_timeout: Duration) -> Self {
        let (tx, _unused_rx) = watch::channel(None);
        Self {
            tx,
            fix_timeout,
            max_age: DEFAULT_MAX_AGE,
        }
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn push(&self, reading: Reading) {
        self.tx.send_replace(Some(Stamped {
            reading,
            at: Instant::now(),
        }));
    }
}

#[async_trait]
impl LocationSource for DeviceLocation {
    /// Returns the latest reading if it is recent enough, otherwise waits for
    /// the device to push a new one.
    async fn current_position(&self) -> Reading {
        let mut rx = self.tx.subscribe();
        let max_age = self.max_age;

        let fresh =
            rx.wait_for(|latest| latest.is_some_and(|stamped| stamped.at.elapsed() <= max_age));
        match tokio::time::timeout(self.fix_timeout, fresh).await {
            Ok(Ok(latest)) => (*latest).map_or(Err(LocationError::PositionUnavailable), |stamped| {
                stamped.reading
            }),
            Ok(Err(_closed)) => Err(LocationError::PositionUnavailable),
            Err(_elapsed) => Err(LocationError::Timeout),
        }
    }

    fn watch(&self) -> BoxStream<'static, Reading> {
        WatchStream::from_changes(self.tx.subscribe())
            .filter_map(|latest| async move { latest.map(|stamped| stamped.reading) })
            .boxed()
    }
}

/// A console parked at a known spot.
pub struct FixedLocation {
    coordinates: Coordinates,
}

impl FixedLocation {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self) -> Reading {
        Ok(self.coordinates)
    }

    fn watch(&self) -> BoxStream<'static, Reading> {
        stream::once(futures::future::ready(Ok(self.coordinates)))
            .chain(stream::pending())
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::StreamExt;

    use super::{DeviceLocation, FixedLocation, LocationError, LocationSource};
    use crate::models::geo::Coordinates;

    fn berlin() -> Coordinates {
        Coordinates {
            lat: 52.52,
            lng: 13.405,
        }
    }

    #[tokio::test]
    async fn device_returns_latest_pushed_fix() {
        let device = DeviceLocation::new(Duration::from_millis(50));
        device.push(Ok(berlin()));
        assert_eq!(device.current_position().await, Ok(berlin()));
    }

    #[tokio::test]
    async fn device_reports_denied_permission() {
        let device = DeviceLocation::new(Duration::from_millis(50));
        device.push(Err(LocationError::PermissionDenied));

        let err = device.current_position().await.unwrap_err();
        assert_eq!(err.to_string(), "Location access denied by user");
    }

    #[tokio::test]
    async fn device_without_fix_times_out() {
        let device = DeviceLocation::new(Duration::from_millis(20));
        assert_eq!(device.current_position().await, Err(LocationError::Timeout));
    }

    #[tokio::test]
    async fn stale_fix_is_not_reused() {
        let device =
            DeviceLocation::new(Duration::from_millis(40)).with_max_age(Duration::from_millis(10));
        device.push(Ok(berlin()));
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(device.current_position().await, Err(LocationError::Timeout));
    }

    #[tokio::test]
    async fn stale_fix_waits_for_a_new_push() {
        let device = Arc::new(
            DeviceLocation::new(Duration::from_millis(500)).with_max_age(Duration::from_millis(10)),
        );
        device.push(Err(LocationError::PermissionDenied));
        tokio::time::sleep(Duration::from_millis(30)).await;

        let pusher = device.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            pusher.push(Ok(berlin()));
        });

        assert_eq!(device.current_position().await, Ok(berlin()));
    }

    #[tokio::test]
    async fn device_watch_yields_later_readings() {
        let device = DeviceLocation::new(Duration::from_millis(50));
        device.push(Ok(berlin()));

        let mut watch = device.watch();
        let next = Coordinates {
            lat: 48.85,
            lng: 2.35,
        };
        device.push(Ok(next));

        assert_eq!(watch.next().await, Some(Ok(next)));
    }

    #[tokio::test]
    async fn fixed_source_emits_its_point() {
        let fixed = FixedLocation::new(berlin());
        assert_eq!(fixed.current_position().await, Ok(berlin()));
        assert_eq!(fixed.watch().next().await, Some(Ok(berlin())));
    }
}
