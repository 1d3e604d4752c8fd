//! Lenient id decoding for records written by the web client, where user ids
//! are whatever the backend handed out: integers or strings.

use serde::{de::Error as _, Deserialize, Deserializer};
use serde_json::Value;

/// Required id: a JSON string or number, numbers rendered in decimal.
pub(crate) fn id_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(de)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected a string or number id, got {other}"))),
    }
}

/// Optional id that drops falsy values (`0`, `""`, `null`, `false`), so a
/// zero id falls through to the next candidate the same way the web client's
/// `id || username` does.
pub(crate) fn truthy_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) if n.as_f64().is_some_and(|f| f != 0.0) => Some(n.to_string()),
        _ => None,
    })
}
