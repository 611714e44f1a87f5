use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WATER_GOAL_ML: u32 = 2500;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub data_path: PathBuf,
    pub settings_path: PathBuf,
    pub water_goal_ml: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parse_var("PORT").unwrap_or(DEFAULT_PORT),
            data_path: path_var("APP_DATA_PATH", "data/state.json"),
            settings_path: path_var("APP_SETTINGS_PATH", "data/settings.json"),
            water_goal_ml: parse_var("WATER_GOAL_ML")
                .filter(|goal| *goal > 0)
                .unwrap_or(DEFAULT_WATER_GOAL_ML),
        }
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let value = env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("ignoring invalid {name}={value:?}");
            None
        }
    }
}
