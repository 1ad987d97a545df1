//! Client-side form checks. A form with any field error never reaches the
//! backend.

mod rules;

use std::collections::BTreeMap;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::driver::{DriverDocuments, FuelType, Vehicle};
use crate::models::geo::{Coordinates, Place};
use crate::models::user::Role;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Records the first failing rule for `field`.
    fn check(&mut self, field: &'static str, result: Result<(), String>) {
        if let Err(message) = result {
            self.add(field, message);
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::default();
        errors.check("email", rules::email(&self.email));
        errors.check("password", rules::required("Password", &self.password));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
}

impl RegisterForm {
    /// Validates every field and returns the parsed role.
    pub fn validate(&self) -> Result<Role, AppError> {
        let mut errors = ValidationErrors::default();
        errors.check("name", rules::required("Name", &self.name));
        errors.check("email", rules::email(&self.email));
        errors.check("phone", rules::phone(&self.phone));
        errors.check("password", rules::password(&self.password));
        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        // Admin accounts are provisioned by the backend, not self-registered.
        let role = match Role::parse(&self.role) {
            Some(role @ (Role::Rider | Role::Driver)) => Some(role),
            Some(Role::Admin) | None => {
                errors.add("role", "Choose rider or driver");
                None
            }
        };

        errors.into_result()?;
        role.ok_or_else(|| AppError::Internal("role missing after validation".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceInput {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl PlaceInput {
    pub fn to_place(&self) -> Place {
        Place {
            address: Some(self.address.trim().to_string()),
            coordinates: self.coordinates,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RideRequestForm {
    pub pickup: PlaceInput,
    pub destination: PlaceInput,
}

impl RideRequestForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::default();
        errors.check("pickup", rules::required("Pickup location", &self.pickup.address));
        errors.check(
            "destination",
            rules::required("Destination", &self.destination.address),
        );
        if errors.is_empty()
            && self.pickup.address.trim().eq_ignore_ascii_case(self.destination.address.trim())
        {
            errors.add("destination", "Destination must differ from pickup location");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingForm {
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RatingForm {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = ValidationErrors::default();
        if !(1..=5).contains(&self.rating) {
            errors.add("rating", "Rating must be between 1 and 5");
        }
        if let Some(comment) = &self.comment {
            if comment.chars().count() > 500 {
                errors.add("comment", "Comment must be at most 500 characters");
            }
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleInput {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub color: String,
    pub plate: String,
    pub capacity: u8,
    pub fuel_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriverProfileForm {
    pub license_number: String,
    pub vehicle: VehicleInput,
    #[serde(default)]
    pub documents: DriverDocuments,
}

impl DriverProfileForm {
    /// Validates the form and builds the vehicle record sent to the backend.
    pub fn validate(&self) -> Result<Vehicle, AppError> {
        let mut errors = ValidationErrors::default();
        let v = &self.vehicle;

        errors.check(
            "license_number",
            rules::required("License number", &self.license_number),
        );
        errors.check("vehicle.make", rules::required("Make", &v.make));
        errors.check("vehicle.model", rules::required("Model", &v.model));
        errors.check("vehicle.color", rules::required("Color", &v.color));
        errors.check("vehicle.plate", rules::plate(&v.plate));

        let newest = Utc::now().year() + 1;
        if !(1990..=newest).contains(&i32::from(v.year)) {
            errors.add("vehicle.year", format!("Year must be between 1990 and {newest}"));
        }
        if !(1..=8).contains(&v.capacity) {
            errors.add("vehicle.capacity", "Capacity must be between 1 and 8");
        }
        let fuel_type = FuelType::parse(&v.fuel_type);
        if fuel_type.is_none() {
            errors.add("vehicle.fuel_type", "Choose petrol, diesel, electric, hybrid or cng");
        }

        errors.into_result()?;

        Ok(Vehicle {
            make: v.make.trim().to_string(),
            model: v.model.trim().to_string(),
            year: v.year,
            color: v.color.trim().to_string(),
            plate: v.plate.trim().to_uppercase(),
            capacity: v.capacity,
            fuel_type: fuel_type.unwrap_or(FuelType::Other),
        })
    }
}
