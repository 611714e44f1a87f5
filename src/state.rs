use crate::settings::SettingsStore;
use crate::store::DocumentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub settings: Arc<SettingsStore>,
    pub water_goal_ml: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SettingsStore, water_goal_ml: u32) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
            water_goal_ml,
        }
    }
}
