// Version information for the palsy detection service

/// Semantic version number, from Cargo.toml
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Service name shown in API responses and logs
pub const SERVICE_NAME: &str = "Facial Palsy Detection API";

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} v{}", SERVICE_NAME, VERSION_NUMBER)
}
