use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::BackendClient;
use crate::error::{AppError, AppResult};
use crate::location::{LocationError, LocationSource};
use crate::models::driver::DriverAvailability;
use crate::models::geo::Coordinates;
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityView {
    pub online: bool,
    /// Whether the "Go Online" control is enabled.
    pub can_go_online: bool,
    pub blocked_reason: Option<String>,
    pub last_location: Option<Coordinates>,
}

#[derive(Default)]
struct Readings {
    last_location: Option<Coordinates>,
    blocked: Option<LocationError>,
}

/// Held while switching, so online and offline writes never interleave.
#[derive(Default)]
struct Toggle {
    watch: Option<JoinHandle<()>>,
}

/// The driver's online/offline switch and the location reporting tied to it.
///
/// Going online always needs a fresh position. Without one the switch stays
/// off and no status is sent to the backend.
pub struct AvailabilityController {
    source: Arc<dyn LocationSource>,
    backend: Arc<BackendClient>,
    notifier: Notifier,
    metrics: Metrics,
    readings: Arc<RwLock<Readings>>,
    online: AtomicBool,
    toggle: Mutex<Toggle>,
}

impl AvailabilityController {
    pub fn new(
        source: Arc<dyn LocationSource>,
        backend: Arc<BackendClient>,
        notifier: Notifier,
        metrics: Metrics,
    ) -> Self {
        Self {
            source,
            backend,
            notifier,
            metrics,
            readings: Arc::new(RwLock::new(Readings::default())),
            online: AtomicBool::new(false),
            toggle: Mutex::new(Toggle::default()),
        }
    }

    pub async fn view(&self) -> AvailabilityView {
        let online = self.online.load(Ordering::SeqCst);
        let readings = self.readings.read().await;

        AvailabilityView {
            online,
            can_go_online: !online && readings.blocked.is_none(),
            blocked_reason: readings.blocked.map(|reason| reason.to_string()),
            last_location: readings.last_location,
        }
    }

    /// One-shot read done when the driver screen opens.
    pub async fn probe(&self) -> AvailabilityView {
        let reading = self.source.current_position().await;
        self.record(reading).await;
        self.view().await
    }

    pub async fn go_online(&self) -> AppResult<AvailabilityView> {
        if self.online.load(Ordering::SeqCst) {
            return Ok(self.view().await);
        }

        // The fix wait can be long; nothing is locked while it runs.
        let reading = self.source.current_position().await;
        self.record(reading).await;
        let coordinates = reading.map_err(|reason| {
            warn!(%reason, "cannot go online without a location");
            AppError::Location(reason)
        })?;

        let mut toggle = self.toggle.lock().await;
        if self.online.load(Ordering::SeqCst) {
            drop(toggle);
            return Ok(self.view().await);
        }

        self.backend
            .set_driver_status(DriverAvailability::Online, Some(coordinates))
            .await?;

        toggle.watch = Some(self.spawn_reporter());
        self.online.store(true, Ordering::SeqCst);
        drop(toggle);

        info!(lat = coordinates.lat, lng = coordinates.lng, "driver online");
        Ok(self.view().await)
    }

    pub async fn go_offline(&self) -> AppResult<AvailabilityView> {
        let mut toggle = self.toggle.lock().await;
        if !self.online.load(Ordering::SeqCst) {
            drop(toggle);
            return Ok(self.view().await);
        }

        self.backend
            .set_driver_status(DriverAvailability::Offline, None)
            .await?;

        if let Some(watch) = toggle.watch.take() {
            watch.abort();
        }
        self.online.store(false, Ordering::SeqCst);
        drop(toggle);

        info!("driver offline");
        Ok(self.view().await)
    }

    /// Stops reporting without waiting on the backend, e.g. on sign-out.
    /// Offline is still sent once, best effort.
    pub async fn shutdown(&self) {
        let mut toggle = self.toggle.lock().await;
        if let Some(watch) = toggle.watch.take() {
            watch.abort();
        }

        if self.online.swap(false, Ordering::SeqCst) {
            if let Err(err) = self
                .backend
                .set_driver_status(DriverAvailability::Offline, None)
                .await
            {
                warn!(error = %err, "failed to report offline during shutdown");
            }
        }
    }

    async fn record(&self, reading: Result<Coordinates, LocationError>) {
        let mut readings = self.readings.write().await;
        match reading {
            Ok(coordinates) => {
                readings.last_location = Some(coordinates);
                readings.blocked = None;
            }
            Err(reason) => readings.blocked = Some(reason),
        }
    }

    fn spawn_reporter(&self) -> JoinHandle<()> {
        let mut stream = self.source.watch();
        let backend = self.backend.clone();
        let readings = self.readings.clone();
        let notifier = self.notifier.clone();
        let metrics = self.metrics.clone();

        tokio::spawn(async move {
            while let Some(reading) = stream.next().await {
                match reading {
                    Ok(coordinates) => {
                        {
                            let mut readings = readings.write().await;
                            readings.last_location = Some(coordinates);
                            readings.blocked = None;
                        }

                        let outcome = match backend.update_driver_location(coordinates).await {
                            Ok(()) => "ok",
                            Err(err) => {
                                warn!(error = %err, "location report dropped");
                                "error"
                            }
                        };
                        metrics
                            .location_reports_total
                            .with_label_values(&[outcome])
                            .inc();
                    }
                    Err(reason) => {
                        readings.write().await.blocked = Some(reason);
                        metrics
                            .location_reports_total
                            .with_label_values(&["unavailable"])
                            .inc();
                        warn!(%reason, "location lost while online");
                        notifier.error(reason.to_string());
                    }
                }
            }
        })
    }
}

impl Drop for AvailabilityController {
    fn drop(&mut self) {
        if let Some(watch) = self.toggle.get_mut().watch.take() {
            watch.abort();
        }
    }
}
