use std::{env, path::PathBuf, time::Duration};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,
    pub admin_dir: PathBuf,
    pub upload_dir: PathBuf,
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let public_dir = path_var("APP_PUBLIC_DIR", "public");
        let upload_dir = env::var("APP_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| public_dir.join("uploads"));

        Self {
            port: parsed_var("PORT", 8080),
            data_dir: path_var("APP_DATA_DIR", "data"),
            admin_dir: path_var("APP_ADMIN_DIR", "admin"),
            upload_dir,
            public_dir,
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string()),
            session_ttl: Duration::from_secs(parsed_var("SESSION_TTL_SECS", 12 * 60 * 60)),
        }
    }

    /// Everything rooted under one directory; used by tests.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let public_dir = root.join("public");
        Self {
            port: 0,
            data_dir: root.join("data"),
            admin_dir: root.join("admin"),
            upload_dir: public_dir.join("uploads"),
            public_dir,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            session_ttl: Duration::from_secs(60),
        }
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parsed_var<T: std::str::FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!("ignoring invalid {name}={raw:?}, using {default}");
                default
            }
        },
        Err(_) => default,
    }
}
