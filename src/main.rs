use habit_tracker::{router, settings::SettingsStore, AppConfig, AppState, JsonStore};
use std::{net::SocketAddr, path::Path, sync::Arc};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = AppConfig::from_env();
    ensure_parent(&config.data_path).await?;
    ensure_parent(&config.settings_path).await?;

    let store = JsonStore::open(config.data_path.clone()).await;
    let settings = SettingsStore::load(config.settings_path.clone()).await;
    let state = AppState::new(Arc::new(store), settings, config.water_goal_ml);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr} (water goal {} ml)", config.water_goal_ml);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent).await,
        _ => Ok(()),
    }
}
