use std::env;
use std::path::PathBuf;

use crate::error::AppError;
use crate::models::geo::Coordinates;

#[derive(Debug, Clone, PartialEq)]
pub enum LocationSourceKind {
    /// Readings are pushed by the driver's device screen.
    Device,
    Fixed(Coordinates),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub api_base_url: String,
    pub event_buffer_size: usize,
    pub location_source: LocationSourceKind,
    pub location_fix_timeout_ms: u64,
    pub location_max_age_ms: u64,
    pub preferences_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000/api".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 256)?,
            location_source: location_source_from_env()?,
            location_fix_timeout_ms: parse_or_default("LOCATION_FIX_TIMEOUT_MS", 10_000)?,
            location_max_age_ms: parse_or_default("LOCATION_MAX_AGE_MS", 30_000)?,
            preferences_path: env::var("PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ride-console.prefs.json")),
        })
    }
}

fn location_source_from_env() -> Result<LocationSourceKind, AppError> {
    let kind = env::var("LOCATION_SOURCE").unwrap_or_else(|_| "device".to_string());

    match kind.as_str() {
        "device" => Ok(LocationSourceKind::Device),
        "fixed" => {
            let lat: f64 = parse_required("FIXED_LAT")?;
            let lng: f64 = parse_required("FIXED_LNG")?;
            Ok(LocationSourceKind::Fixed(Coordinates::new(lat, lng)?))
        }
        other => Err(AppError::Internal(format!(
            "invalid LOCATION_SOURCE: {other}, expected device/fixed"
        ))),
    }
}

fn parse_required<T>(key: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).map_err(|_| AppError::Internal(format!("{key} is required")))?;
    raw.parse::<T>()
        .map_err(|err| AppError::Internal(format!("invalid {key}: {err}")))
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
