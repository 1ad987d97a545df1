//! Who is signed in, and what they get to see.

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::listing::cards::UserRow;
use crate::models::user::{Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> NavItem {
    NavItem { label, path }
}

pub fn navigation(role: Role) -> &'static [NavItem] {
    const RIDER: &[NavItem] = &[
        item("Dashboard", "/rider/dashboard"),
        item("Request Ride", "/rider/rides"),
        item("Ride History", "/rider/dashboard#history"),
    ];
    const DRIVER: &[NavItem] = &[
        item("Availability", "/driver/availability"),
        item("Available Rides", "/driver/rides/available"),
        item("Active Rides", "/driver/rides/active"),
        item("Ride History", "/driver/rides/history"),
        item("Profile", "/driver/profile"),
    ];
    const ADMIN: &[NavItem] = &[
        item("Overview", "/admin/stats"),
        item("Users", "/admin/users"),
        item("Drivers", "/admin/drivers"),
        item("Rides", "/admin/rides"),
    ];

    match role {
        Role::Rider => RIDER,
        Role::Driver => DRIVER,
        Role::Admin => ADMIN,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub user: UserRow,
    pub role: Role,
    pub navigation: &'static [NavItem],
}

impl SessionView {
    pub fn for_user(user: &User) -> Self {
        Self {
            user: UserRow::from(user),
            role: user.role,
            navigation: navigation(user.role),
        }
    }
}

/// Fails with `Forbidden` unless the user's role is one of `allowed`.
pub fn ensure_role(user: &User, allowed: &[Role]) -> AppResult<()> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "{} accounts cannot open this page",
            user.role
        )))
    }
}
