use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;

use crate::error::AppError;
use crate::listing::cards::RideCard;
use crate::models::user::Role;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/rides/:id", get(ride_detail))
}

/// Ride detail for any signed-in role, with the actions that role may take.
async fn ride_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RideCard>, AppError> {
    let user = state.current_user().await?;
    let ride = state.backend.get_ride(&id).await?;

    let card = match user.role {
        Role::Driver => RideCard::for_driver(&ride),
        Role::Rider => RideCard::for_rider(&ride),
        Role::Admin => RideCard::from_ride(&ride),
    };
    Ok(Json(card))
}
