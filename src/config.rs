//! Process configuration, read once from the environment at startup.

use std::env;
use std::path::PathBuf;

const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/evoting";
const DEFAULT_DATABASE: &str = "evoting";
/// One year.
const MAX_JWT_EXPIRY_HOURS: i64 = 24 * 365;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    /// Whether `MONGODB_URI` was given rather than defaulted
    pub mongodb_uri_set: bool,
    pub mongodb_database: String,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Empty means any origin is accepted
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    /// Test configuration. Uses the minimum bcrypt cost.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            mongodb_uri: DEFAULT_MONGODB_URI.to_string(),
            mongodb_uri_set: false,
            mongodb_database: DEFAULT_DATABASE.to_string(),
            jwt_secret: "test-secret-for-unit-tests".to_string(),
            jwt_expiry_hours: 24,
            bcrypt_cost: 4,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let given_uri = lookup("MONGODB_URI")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let mongodb_uri_set = given_uri.is_some();
        let mongodb_uri = given_uri.unwrap_or_else(|| DEFAULT_MONGODB_URI.to_string());
        let mongodb_database = lookup("MONGODB_DATABASE")
            .unwrap_or_else(|| database_name_from_uri(&mongodb_uri).to_string());

        let jwt_secret = lookup("JWT_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let jwt_expiry_hours: i64 = parse_or(&lookup, "JWT_EXPIRY_HOURS", 24)?;
        if !(1..=MAX_JWT_EXPIRY_HOURS).contains(&jwt_expiry_hours) {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRY_HOURS",
                value: jwt_expiry_hours.to_string(),
            });
        }

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 5000)?,
            mongodb_uri,
            mongodb_uri_set,
            mongodb_database,
            jwt_secret,
            jwt_expiry_hours,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            cors_origins,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

/// `mongodb+srv://u:p@host/evoting?retryWrites=true` -> `evoting`
fn database_name_from_uri(uri: &str) -> &str {
    let without_scheme = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    without_scheme
        .split_once('/')
        .map(|(_, path)| path.split('?').next().unwrap_or(""))
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_DATABASE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.mongodb_database, "evoting");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert!(config.cors_origins.is_empty());
        assert!(!config.mongodb_uri_set);
        assert_eq!(config.mongodb_uri, DEFAULT_MONGODB_URI);
    }

    #[test]
    fn given_mongodb_uri_is_marked_as_set() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("MONGODB_URI", "mongodb://db:27017/ukm"),
        ]))
        .unwrap();
        assert!(config.mongodb_uri_set);
        assert_eq!(config.mongodb_database, "ukm");

        let config =
            Config::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("MONGODB_URI", " ")])).unwrap();
        assert!(!config.mongodb_uri_set);
    }

    #[test]
    fn token_lifetime_must_be_positive_and_bounded() {
        for value in ["0", "-2", "9223372036854775807", "8761"] {
            let err = Config::from_lookup(lookup_from(&[
                ("JWT_SECRET", "x"),
                ("JWT_EXPIRY_HOURS", value),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: "JWT_EXPIRY_HOURS", .. }),
                "accepted {}",
                value
            );
        }

        let config =
            Config::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("JWT_EXPIRY_HOURS", "8760")]))
                .unwrap();
        assert_eq!(config.jwt_expiry_hours, 8760);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("JWT_SECRET", "x"), ("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn database_name_comes_from_uri_path() {
        assert_eq!(
            database_name_from_uri(
                "mongodb+srv://u:p@cluster.mongodb.net/ukm_votes?retryWrites=true"
            ),
            "ukm_votes"
        );
        assert_eq!(database_name_from_uri("mongodb://localhost:27017"), "evoting");
        assert_eq!(database_name_from_uri("mongodb://localhost:27017/?w=majority"), "evoting");
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "x"),
            ("CORS_ORIGINS", "http://localhost:3000, https://evoting.example ,"),
        ]))
        .unwrap();
        assert_eq!(
            config.cors_origins,
            vec!["http://localhost:3000", "https://evoting.example"]
        );
    }
}
