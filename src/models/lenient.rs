//! Decoders for fields the backend does not send consistently.

use serde::{Deserialize, Deserializer};
use tracing::warn;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accepts `12.5`, `"12.50"` or `null`. A string that is not a number reads
/// as absent so one bad record never fails a whole list.
pub fn optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match Option::<NumberOrString>::deserialize(deserializer)? {
        None => None,
        Some(NumberOrString::Number(value)) => Some(value),
        Some(NumberOrString::Text(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                match trimmed.parse::<f64>() {
                    Ok(value) if value.is_finite() => Some(value),
                    _ => {
                        warn!(raw = %raw, "non-numeric amount treated as missing");
                        None
                    }
                }
            }
        }
    };

    Ok(amount)
}

pub fn amount_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    optional_amount(deserializer).map(|value| value.unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(default, deserialize_with = "super::optional_amount")]
        fare: Option<f64>,
    }

    fn fare(json: &str) -> Option<f64> {
        serde_json::from_str::<Wrapper>(json).unwrap().fare
    }

    #[test]
    fn number_string_and_missing_fares() {
        assert_eq!(fare(r#"{ "fare": 12.5 }"#), Some(12.5));
        assert_eq!(fare(r#"{ "fare": "7.25" }"#), Some(7.25));
        assert_eq!(fare(r#"{ "fare": null }"#), None);
        assert_eq!(fare(r#"{}"#), None);
    }

    #[test]
    fn non_numeric_fare_reads_as_missing() {
        assert_eq!(fare(r#"{ "fare": "missing" }"#), None);
        assert_eq!(fare(r#"{ "fare": "NaN" }"#), None);
    }
}
