use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::{surface, ListQuery, ListView};
use crate::backend::payloads::{CancelPayload, RatePayload, RideRequestPayload};
use crate::error::{AppError, AppResult};
use crate::forms::{RatingForm, RideRequestForm};
use crate::lifecycle::rider_can_cancel;
use crate::listing::cards::RideCard;
use crate::listing::stats::RideStats;
use crate::listing::{self, ride_matches, StatusFilter};
use crate::models::ride::Ride;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/rider/dashboard", get(dashboard))
        .route("/rider/rides", post(request_ride))
        .route("/rider/rides/:id/cancel", post(cancel_ride))
        .route("/rider/rides/:id/rate", post(rate_ride))
}

#[derive(Serialize)]
pub struct RiderDashboard {
    pub stats: RideStats,
    pub active_ride: Option<RideCard>,
    pub rides: ListView<RideCard>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<RiderDashboard>, AppError> {
    state.require(&[Role::Rider]).await?;
    let filter: StatusFilter = query.status.as_deref().unwrap_or("all").parse()?;
    let history = state.backend.ride_history().await?;

    let sorted = listing::newest_first(&history);
    let active_ride = sorted
        .iter()
        .find(|ride| rider_can_cancel(&ride.status) || ride.status.is_active())
        .map(|ride| RideCard::for_rider(ride));

    let cards = sorted
        .into_iter()
        .filter(|ride| filter.matches(&ride.status))
        .filter(|ride| ride_matches(ride, &query.search))
        .map(RideCard::for_rider)
        .collect();

    Ok(Json(RiderDashboard {
        stats: RideStats::from_rides(&history),
        active_ride,
        rides: ListView::new(cards, "No rides yet"),
    }))
}

async fn request_ride(
    State(state): State<Arc<AppState>>,
    Json(form): Json<RideRequestForm>,
) -> Result<Json<RideCard>, AppError> {
    state.require(&[Role::Rider]).await?;
    let ride = surface(&state, "Request ride", submit_request(&state, &form).await)?;

    info!(ride_id = %ride.id, "ride requested");
    state.notifier.success("Ride requested");
    Ok(Json(RideCard::for_rider(&ride)))
}

async fn submit_request(state: &AppState, form: &RideRequestForm) -> AppResult<Ride> {
    form.validate()?;

    let payload = RideRequestPayload {
        pickup: form.pickup.to_place(),
        destination: form.destination.to_place(),
    };
    state.backend.request_ride(&payload).await
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

async fn cancel_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<CancelRequest>>,
) -> Result<Json<RideCard>, AppError> {
    state.require(&[Role::Rider]).await?;
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let ride = surface(&state, "Cancel ride", cancel_if_allowed(&state, &id, request).await)?;

    info!(ride_id = %ride.id, "ride cancelled by rider");
    state.notifier.success("Ride cancelled");
    Ok(Json(RideCard::for_rider(&ride)))
}

/// Riders may only cancel before pickup. Rides missing from the last fetched
/// history are passed through for the backend to judge.
async fn cancel_if_allowed(state: &AppState, id: &str, request: CancelRequest) -> AppResult<Ride> {
    let history = state.backend.ride_history().await?;
    if let Some(known) = history.iter().find(|ride| ride.id == id) {
        if !rider_can_cancel(&known.status) {
            return Err(AppError::Conflict(format!(
                "ride {id} is {} and can no longer be cancelled",
                known.status
            )));
        }
    }

    let payload = CancelPayload {
        reason: request
            .reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty()),
    };
    state.backend.cancel_ride(id, &payload).await
}

async fn rate_ride(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(form): Json<RatingForm>,
) -> Result<Json<RideCard>, AppError> {
    state.require(&[Role::Rider]).await?;
    let ride = surface(&state, "Rate ride", submit_rating(&state, &id, &form).await)?;

    info!(ride_id = %ride.id, rating = form.rating, "ride rated");
    state.notifier.success("Thanks for rating your ride");
    Ok(Json(RideCard::for_rider(&ride)))
}

async fn submit_rating(state: &AppState, id: &str, form: &RatingForm) -> AppResult<Ride> {
    form.validate()?;

    let payload = RatePayload {
        rating: form.rating,
        comment: form
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .map(str::to_string),
    };
    state.backend.rate_ride(id, &payload).await
}
