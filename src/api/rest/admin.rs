use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch};
use axum::Json;
use axum::Router;
use serde::Serialize;
use tracing::info;

use crate::api::rest::{surface, ListQuery, ListView};
use crate::backend::payloads::DriverStatsPayload;
use crate::error::AppError;
use crate::listing::cards::{DriverRow, RideCard, UserRow};
use crate::listing::stats::{DriverStats, RideStats};
use crate::listing::{
    self, partition_by_role, search_drivers, search_rides, search_users, RoleFilter, StatusFilter,
};
use crate::models::user::{Role, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", get(get_user))
        .route("/admin/drivers", get(list_drivers))
        .route("/admin/drivers/:id", delete(delete_driver))
        .route("/admin/drivers/:id/stats", patch(update_driver_stats))
        .route("/admin/rides", get(list_rides))
        .route("/admin/stats", get(stats))
}

#[derive(Debug, Default, Serialize)]
pub struct RoleCounts {
    pub riders: usize,
    pub drivers: usize,
    pub admins: usize,
}

impl RoleCounts {
    fn of(users: &[User]) -> Self {
        let partition = partition_by_role(users);
        Self {
            riders: partition.riders.len(),
            drivers: partition.drivers.len(),
            admins: partition.admins.len(),
        }
    }
}

#[derive(Serialize)]
pub struct UsersPage {
    pub counts: RoleCounts,
    #[serde(flatten)]
    pub list: ListView<UserRow>,
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<UsersPage>, AppError> {
    state.require(&[Role::Admin]).await?;
    let filter: RoleFilter = query.role.as_deref().unwrap_or("all").parse()?;
    let users = state.backend.list_users().await?;

    let counts = RoleCounts::of(&users);

    let rows = search_users(&users, &query.search)
        .into_iter()
        .filter(|user| filter.matches(user.role))
        .map(UserRow::from)
        .collect();

    Ok(Json(UsersPage {
        counts,
        list: ListView::new(rows, "No users found"),
    }))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserRow>, AppError> {
    state.require(&[Role::Admin]).await?;
    let user = state.backend.get_user(&id).await?;
    Ok(Json(UserRow::from(&user)))
}

#[derive(Serialize)]
pub struct DriversPage {
    pub stats: DriverStats,
    #[serde(flatten)]
    pub list: ListView<DriverRow>,
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<DriversPage>, AppError> {
    state.require(&[Role::Admin]).await?;
    let drivers = state.backend.list_drivers().await?;

    let rows = search_drivers(&drivers, &query.search)
        .into_iter()
        .map(DriverRow::from)
        .collect();

    Ok(Json(DriversPage {
        stats: DriverStats::from_drivers(&drivers),
        list: ListView::new(rows, "No drivers found"),
    }))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.require(&[Role::Admin]).await?;
    surface(&state, "Delete driver", state.backend.delete_driver(&id).await)?;

    info!(driver_id = %id, "driver deleted");
    state.notifier.success("Driver deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn update_driver_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<DriverStatsPayload>,
) -> Result<Json<DriverRow>, AppError> {
    state.require(&[Role::Admin]).await?;

    if payload.total_earnings.is_some_and(|earnings| !earnings.is_finite() || earnings < 0.0) {
        return Err(AppError::BadRequest(
            "total earnings must be a non-negative amount".to_string(),
        ));
    }

    let driver = surface(
        &state,
        "Update driver stats",
        state.backend.update_driver_stats(&id, &payload).await,
    )?;

    state.notifier.success("Driver stats updated");
    Ok(Json(DriverRow::from(&driver)))
}

async fn list_rides(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListView<RideCard>>, AppError> {
    state.require(&[Role::Admin]).await?;
    let filter: StatusFilter = query.status.as_deref().unwrap_or("all").parse()?;
    let rides = state.backend.all_rides().await?;

    let cards = filter
        .apply(search_rides(&rides, &query.search))
        .into_iter()
        .map(RideCard::from_ride)
        .collect();

    Ok(Json(ListView::new(cards, "No rides found")))
}

#[derive(Serialize)]
pub struct AdminStats {
    pub users: RoleCounts,
    pub total_users: usize,
    pub rides: RideStats,
    pub drivers: DriverStats,
    pub online_drivers: usize,
    pub active_rides: usize,
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<AdminStats>, AppError> {
    state.require(&[Role::Admin]).await?;

    let (users, rides, drivers, online) = tokio::try_join!(
        state.backend.list_users(),
        state.backend.all_rides(),
        state.backend.list_drivers(),
        state.backend.online_drivers(),
    )?;

    Ok(Json(AdminStats {
        users: RoleCounts::of(&users),
        total_users: users.len(),
        rides: RideStats::from_rides(&rides),
        drivers: DriverStats::from_drivers(&drivers),
        online_drivers: online.len(),
        active_rides: listing::active(&rides).len(),
    }))
}
