use serde::{Deserialize, Serialize};

use crate::models::geo::Coordinates;
use crate::models::lenient::amount_or_zero;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverAvailability {
    #[serde(alias = "ONLINE")]
    Online,
    #[default]
    #[serde(alias = "OFFLINE")]
    Offline,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
    Cng,
    #[serde(other)]
    Other,
}

impl FuelType {
    pub fn parse(raw: &str) -> Option<FuelType> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "petrol" | "gasoline" => Some(FuelType::Petrol),
            "diesel" => Some(FuelType::Diesel),
            "electric" => Some(FuelType::Electric),
            "hybrid" => Some(FuelType::Hybrid),
            "cng" => Some(FuelType::Cng),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub color: String,
    #[serde(alias = "licensePlate")]
    pub plate: String,
    pub capacity: u8,
    pub fuel_type: FuelType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DriverDocuments {
    #[serde(default)]
    pub registration: bool,
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub inspection: bool,
    #[serde(default)]
    pub license: bool,
}

impl DriverDocuments {
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("registration", self.registration),
            ("insurance", self.insurance),
            ("inspection", self.inspection),
            ("license", self.license),
        ]
        .into_iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.registration && self.insurance && self.inspection && self.license
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: DriverAvailability,
    #[serde(default)]
    pub license_number: Option<String>,
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
    #[serde(default)]
    pub documents: DriverDocuments,
    #[serde(default, deserialize_with = "amount_or_zero")]
    pub total_earnings: f64,
    #[serde(default)]
    pub total_rides: u32,
    #[serde(default)]
    pub current_location: Option<Coordinates>,
}

impl DriverProfile {
    pub fn is_online(&self) -> bool {
        self.status == DriverAvailability::Online
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DriverAvailability, DriverDocuments, DriverProfile, FuelType};

    #[test]
    fn sparse_profile_decodes_with_defaults() {
        let profile: DriverProfile = serde_json::from_value(json!({
            "_id": "d1",
            "name": "Dana",
            "totalEarnings": "120.50"
        }))
        .unwrap();

        assert_eq!(profile.status, DriverAvailability::Offline);
        assert_eq!(profile.total_earnings, 120.5);
        assert_eq!(profile.total_rides, 0);
        assert!(!profile.documents.is_complete());
    }

    #[test]
    fn missing_documents_are_listed_in_order() {
        let docs = DriverDocuments {
            registration: true,
            insurance: false,
            inspection: true,
            license: false,
        };
        assert_eq!(docs.missing(), vec!["insurance", "license"]);
    }

    #[test]
    fn unrecognised_fuel_type_decodes_as_other() {
        let fuel: FuelType = serde_json::from_str("\"hydrogen\"").unwrap();
        assert_eq!(fuel, FuelType::Other);
        assert_eq!(FuelType::parse("Gasoline"), Some(FuelType::Petrol));
    }
}
