use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The three kinds of account. Navigation and page access are decided by
/// matching on this, never by comparing role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Rider => "rider",
            Role::Driver => "driver",
            Role::Admin => "admin",
        }
    }

    /// Parses a role string, ignoring case. The backend sends both `"RIDER"`
    /// and `"rider"`; anything but lowercase is logged.
    pub fn parse(raw: &str) -> Option<Role> {
        let role = match raw.to_ascii_lowercase().as_str() {
            "rider" => Role::Rider,
            "driver" => Role::Driver,
            "admin" => Role::Admin,
            _ => return None,
        };

        if raw != role.as_str() {
            warn!(received = raw, canonical = role.as_str(), "non-canonical role casing");
        }

        Some(role)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Role::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown role: {raw}, expected rider/driver/admin"
            ))
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::{Role, User};

    #[test]
    fn role_parse_ignores_case() {
        assert_eq!(Role::parse("RIDER"), Some(Role::Rider));
        assert_eq!(Role::parse("driver"), Some(Role::Driver));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("dispatcher"), None);
    }

    #[test]
    fn user_with_unknown_role_fails_decode() {
        let result = serde_json::from_str::<User>(
            r#"{ "_id": "u1", "email": "a@b.co", "role": "superuser" }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Driver).unwrap(), "\"driver\"");
    }
}
