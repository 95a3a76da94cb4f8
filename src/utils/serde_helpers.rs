use serde::{ Deserialize, Deserializer, Serializer };
use serde::de::Error;
use tracing::Level;

/// Serialize `tracing::Level` as its lowercase name
pub fn serialize_level<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer
{
    serializer.serialize_str(&level.as_str().to_ascii_lowercase())
}

/// Deserialize `tracing::Level` from a case-insensitive name or a 1..=5 verbosity number
pub fn deserialize_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where D: Deserializer<'de>
{
    let raw = String::deserialize(deserializer)?;
    raw.parse::<Level>().map_err(|_| D::Error::custom(format!("unknown log level: {}", raw)))
}
