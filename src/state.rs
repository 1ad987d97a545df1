use std::sync::Arc;
use std::time::Duration;

use crate::backend::BackendClient;
use crate::config::{Config, LocationSourceKind};
use crate::error::{AppError, AppResult};
use crate::location::availability::AvailabilityController;
use crate::location::{DeviceLocation, FixedLocation, LocationSource};
use crate::models::user::{Role, User};
use crate::notify::Notifier;
use crate::observability::metrics::Metrics;
use crate::preferences::PreferenceStore;
use crate::session::ensure_role;

/// Everything a page handler needs, passed explicitly through the router.
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub availability: AvailabilityController,
    /// Present when readings come from the driver's device screen.
    pub device: Option<Arc<DeviceLocation>>,
    pub notifier: Notifier,
    pub preferences: PreferenceStore,
    pub metrics: Metrics,
}

impl AppState {
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let metrics = Metrics::new();
        let backend = Arc::new(BackendClient::new(&config.api_base_url, metrics.clone())?);

        let (source, device): (Arc<dyn LocationSource>, Option<Arc<DeviceLocation>>) =
            match &config.location_source {
                LocationSourceKind::Device => {
                    let device = Arc::new(
                        DeviceLocation::new(Duration::from_millis(config.location_fix_timeout_ms))
                            .with_max_age(Duration::from_millis(config.location_max_age_ms)),
                    );
                    (device.clone() as Arc<dyn LocationSource>, Some(device))
                }
                LocationSourceKind::Fixed(coordinates) => {
                    (
                        Arc::new(FixedLocation::new(*coordinates)) as Arc<dyn LocationSource>,
                        None,
                    )
                }
            };

        Ok(Self::new(
            backend,
            source,
            device,
            Notifier::new(config.event_buffer_size),
            PreferenceStore::new(config.preferences_path.clone()),
            metrics,
        ))
    }

    pub fn new(
        backend: Arc<BackendClient>,
        source: Arc<dyn LocationSource>,
        device: Option<Arc<DeviceLocation>>,
        notifier: Notifier,
        preferences: PreferenceStore,
        metrics: Metrics,
    ) -> Self {
        let availability =
            AvailabilityController::new(source, backend.clone(), notifier.clone(), metrics.clone());

        Self {
            backend,
            availability,
            device,
            notifier,
            preferences,
            metrics,
        }
    }

    /// The signed-in user, always as the backend last reported it.
    pub async fn current_user(&self) -> AppResult<User> {
        if !self.backend.has_token().await {
            return Err(AppError::Unauthorized);
        }
        self.backend.me().await
    }

    pub async fn require(&self, allowed: &[Role]) -> AppResult<User> {
        let user = self.current_user().await?;
        ensure_role(&user, allowed)?;
        Ok(user)
    }
}
