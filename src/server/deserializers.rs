use serde::{Deserialize, Deserializer};

// query parameters that are not integers are treated as absent, so the
// caller falls back to its default instead of rejecting the request
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.trim().parse::<i64>().ok()))
}
