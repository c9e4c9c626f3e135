//! Record identifiers arrive as strings from most deployments, but some
//! stores hand out integers. Both are normalized to `String`.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    };
    if id.is_empty() {
        return Err(serde::de::Error::custom(crate::ProtoError::EmptyId));
    }
    Ok(id)
}
