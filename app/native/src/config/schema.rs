//! JSON Schema for the configuration file.

use super::PlashConfig;

/// Schema `$id`, so editors can associate it with the config file.
const SCHEMA_ID: &str = "https://plash.app/config.schema.json";

/// Generates a JSON Schema for the Plash configuration.
#[must_use]
pub fn generate_schema() -> schemars::Schema {
    let mut schema = schemars::schema_for!(PlashConfig);

    if let Some(obj) = schema.as_object_mut() {
        obj.insert("$id".to_string(), serde_json::json!(SCHEMA_ID));
    }

    schema
}

/// Generates a pretty-printed JSON Schema string.
#[must_use]
pub fn generate_schema_json() -> String {
    let schema = generate_schema();
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
