use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::{surface, ListQuery, ListView};
use crate::backend::payloads::DriverProfilePayload;
use crate::error::{AppError, AppResult};
use crate::forms::DriverProfileForm;
use crate::listing::cards::{DriverRow, RideCard};
use crate::listing::{self, ride_matches, StatusFilter};
use crate::location::availability::AvailabilityView;
use crate::location::LocationError;
use crate::models::driver::{DriverDocuments, DriverProfile, Vehicle};
use crate::models::geo::Coordinates;
use crate::models::ride::{Ride, RideStatus};
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/driver/rides/available", get(available_rides))
        .route("/driver/rides/active", get(active_rides))
        .route("/driver/rides/history", get(ride_history))
        .route("/driver/rides/:id/accept", post(accept_ride))
        .route("/driver/rides/:id/status", post(update_ride_status))
        .route("/driver/availability", get(availability).post(set_availability))
        .route("/driver/availability/probe", post(probe_location))
        .route("/driver/profile", get(profile).post(create_profile))
        .route("/device/location", post(device_location))
}

async fn available_rides(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListView<RideCard>>, AppError> {
    state.require(&[Role::Driver]).await?;
    let rides = state.backend.available_rides().await?;

    let cards = listing::available(&rides)
        .into_iter()
        .filter(|ride| ride_matches(ride, &query.search))
        .map(RideCard::for_driver)
        .collect();

    Ok(Json(ListView::new(cards, "No ride requests right now")))
}

async fn active_rides(State(state): State<Arc<AppState>>) -> Result<Json<ListView<RideCard>>, AppError> {
    state.require(&[Role::Driver]).await?;
    let history = state.backend.ride_history().await?;

    let cards = listing::active(&history)
        .into_iter()
        .map(RideCard::for_driver)
        .collect();

    Ok(Json(ListView::new(cards, "No active rides")))
}

async fn ride_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListView<RideCard>>, AppError> {
    state.require(&[Role::Driver]).await?;
    let filter: StatusFilter = query.status.as_deref().unwrap_or("all").parse()?;
    let history = state.backend.ride_history().await?;

    let cards = listing::newest_first(&history)
        .into_iter()
        .filter(|ride| filter.matches(&ride.status))
        .filter(|ride| ride_matches(ride, &query.search))
        .map(RideCard::for_driver)
        .collect();

    Ok(Json(ListView::new(cards, "No rides yet")))
}

/// Accepting is only offered for rides this driver last saw as requested.
async fn accept_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RideCard>, AppError> {
    state.require(&[Role::Driver]).await?;
    let ride = surface(&state, "Accept ride", accept_last_seen(&state, &id).await)?;

    info!(ride_id = %ride.id, "ride accepted");
    state.notifier.success("Ride accepted");
    Ok(Json(RideCard::for_driver(&ride)))
}

async fn accept_last_seen(state: &AppState, id: &str) -> AppResult<Ride> {
    let available = state.backend.available_rides().await?;
    let last_seen = available
        .iter()
        .find(|ride| ride.id == id)
        .ok_or_else(|| AppError::Conflict(format!("ride {id} is no longer available")))?;
    if last_seen.status != RideStatus::Requested {
        return Err(AppError::Conflict(format!(
            "ride {id} is {} and cannot be accepted",
            last_seen.status
        )));
    }

    state.backend.accept_ride(id).await
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: RideStatus,
}

/// Forwards the requested status as is. The backend decides whether the move
/// is legal.
async fn update_ride_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<RideCard>, AppError> {
    state.require(&[Role::Driver]).await?;
    let ride = surface(
        &state,
        "Update ride",
        forward_status(&state, &id, payload.status).await,
    )?;

    info!(ride_id = %ride.id, status = %ride.status, "ride status updated");
    state
        .notifier
        .success(format!("Ride marked as {}", ride.status.label()));
    Ok(Json(RideCard::for_driver(&ride)))
}

async fn forward_status(state: &AppState, id: &str, status: RideStatus) -> AppResult<Ride> {
    match &status {
        RideStatus::Unknown(raw) => {
            return Err(AppError::BadRequest(format!("unknown ride status: {raw}")));
        }
        RideStatus::Accepted => {
            return Err(AppError::BadRequest(
                "rides are accepted through the accept action".to_string(),
            ));
        }
        _ => {}
    }

    state.backend.update_ride_status(id, status).await
}

async fn availability(State(state): State<Arc<AppState>>) -> Result<Json<AvailabilityView>, AppError> {
    state.require(&[Role::Driver]).await?;
    Ok(Json(state.availability.view().await))
}

async fn probe_location(State(state): State<Arc<AppState>>) -> Result<Json<AvailabilityView>, AppError> {
    state.require(&[Role::Driver]).await?;
    Ok(Json(state.availability.probe().await))
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub online: bool,
}

async fn set_availability(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<Json<AvailabilityView>, AppError> {
    state.require(&[Role::Driver]).await?;

    let view = if payload.online {
        surface(&state, "Go online", state.availability.go_online().await)?
    } else {
        surface(&state, "Go offline", state.availability.go_offline().await)?
    };

    Ok(Json(view))
}

#[derive(Deserialize)]
#[serde(untagged)]
pub enum DeviceReport {
    Fix(Coordinates),
    Failure { error: LocationError },
}

/// Receives a geolocation fix, or the reason there is none, from the
/// driver's device.
async fn device_location(
    State(state): State<Arc<AppState>>,
    Json(report): Json<DeviceReport>,
) -> Result<Json<AvailabilityView>, AppError> {
    state.require(&[Role::Driver]).await?;
    let device = state.device.as_ref().ok_or_else(|| {
        AppError::BadRequest("this console uses a fixed location".to_string())
    })?;

    let reading = match report {
        DeviceReport::Fix(c) => Ok(Coordinates::new(c.lat, c.lng)?),
        DeviceReport::Failure { error } => Err(error),
    };
    device.push(reading);

    Ok(Json(state.availability.probe().await))
}

#[derive(Serialize)]
pub struct DriverProfileView {
    #[serde(flatten)]
    pub row: DriverRow,
    pub license_number: Option<String>,
    pub vehicle_details: Option<Vehicle>,
    pub documents: DriverDocuments,
}

impl DriverProfileView {
    fn from_profile(profile: &DriverProfile) -> Self {
        Self {
            row: DriverRow::from(profile),
            license_number: profile.license_number.clone(),
            vehicle_details: profile.vehicle.clone(),
            documents: profile.documents.clone(),
        }
    }
}

async fn profile(State(state): State<Arc<AppState>>) -> Result<Json<DriverProfileView>, AppError> {
    state.require(&[Role::Driver]).await?;
    let profile = state.backend.driver_profile().await?;

    Ok(Json(DriverProfileView::from_profile(&profile)))
}

async fn create_profile(
    State(state): State<Arc<AppState>>,
    Json(form): Json<DriverProfileForm>,
) -> Result<Json<DriverProfileView>, AppError> {
    state.require(&[Role::Driver]).await?;
    let vehicle = form.validate()?;

    let payload = DriverProfilePayload {
        license_number: form.license_number.trim().to_string(),
        vehicle,
        documents: form.documents.clone(),
    };
    let profile = surface(
        &state,
        "Save profile",
        state.backend.create_driver_profile(&payload).await,
    )?;

    state.notifier.success("Driver profile saved");
    Ok(Json(DriverProfileView::from_profile(&profile)))
}
