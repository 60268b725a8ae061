//! Application configuration, loaded from the environment: `.env` via
//! `dotenv`, then plain `std::env::var` reads with defaults. No heavier
//! configuration crate is pulled in — the router only needs a handful of
//! environment variables.

#[derive(Debug, Clone)]
pub struct Settings {
    /// Telemetry sink location. Defaults to a local SQLite file.
    pub db_url: String,
    /// Log verbosity passed to `tracing_subscriber::EnvFilter`.
    pub log_level: String,
    /// Host:port the HTTP facade binds to.
    pub bind_addr: String,
}

impl Settings {
    /// Loads `.env` if present (missing file is not an error, only a
    /// warning) and reads settings from the environment.
    pub fn load() -> Self {
        if let Err(err) = dotenv::dotenv() {
            eprintln!("Warning: could not load .env file: {err}");
        }

        Self {
            db_url: std::env::var("DB_URL").unwrap_or_else(|_| "sqlite://telemetry.db".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        std::env::remove_var("DB_URL");
        std::env::remove_var("LOG_LEVEL");
        std::env::remove_var("BIND_ADDR");
        let settings = Settings::load();
        assert_eq!(settings.db_url, "sqlite://telemetry.db");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
    }
}
