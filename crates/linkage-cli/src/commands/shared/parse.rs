use anyhow::Context;
use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Split a `type:id` entity reference. The type is left unchecked so the
/// linking flow reports unknown types itself.
pub fn parse_entity_ref(raw: &str) -> anyhow::Result<(String, String)> {
    let (entity_type, entity_id) = raw
        .split_once(':')
        .with_context(|| format!("invalid entity '{raw}': expected type:id"))?;
    let entity_type = entity_type.trim();
    let entity_id = entity_id.trim();
    if entity_type.is_empty() || entity_id.is_empty() {
        anyhow::bail!("invalid entity '{raw}': expected type:id");
    }
    Ok((entity_type.replace('-', "_"), entity_id.to_string()))
}
