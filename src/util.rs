/// Quote a version token the same way it is stored in `latest.json`.
#[must_use]
pub fn quote_version(version: &str) -> String {
    serde_json::Value::String(version.to_owned()).to_string()
}
