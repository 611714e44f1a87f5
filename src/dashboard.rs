use crate::errors::StoreError;
use crate::models::{
    DAILY_LOGS, DailyLog, DailyLogResponse, DashboardResponse, InventoryView, ItemView, ROUTINES,
    RoutineBoard, RoutineGroup, SUPPLEMENTS, SupplementBoard, TimeOfDay, TrackableItem, WaterView,
};
use crate::store::{CollectionSubscription, Document, DocumentStore};
use crate::tracker;
use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use tracing::warn;

/// Full decoded contents of the tracked collections.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub supplements: Vec<TrackableItem>,
    pub routines: Vec<TrackableItem>,
    pub daily_logs: BTreeMap<NaiveDate, DailyLog>,
}

pub async fn load_snapshot(store: &dyn DocumentStore) -> Result<Snapshot, StoreError> {
    Ok(Snapshot {
        supplements: decode_items(&store.list(SUPPLEMENTS).await?),
        routines: decode_items(&store.list(ROUTINES).await?),
        daily_logs: decode_logs(&store.list(DAILY_LOGS).await?),
    })
}

/// Documents that fail to decode are skipped with a warning.
pub fn decode_items(docs: &[Document]) -> Vec<TrackableItem> {
    let mut items: Vec<TrackableItem> = docs
        .iter()
        .filter_map(|doc| match TrackableItem::from_fields(&doc.id, &doc.fields) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("skipping malformed item {}: {err}", doc.id);
                None
            }
        })
        .collect();
    items.sort_by_cached_key(|item| (item.name.to_lowercase(), item.id.clone()));
    items
}

pub fn decode_logs(docs: &[Document]) -> BTreeMap<NaiveDate, DailyLog> {
    docs.iter()
        .filter_map(|doc| match DailyLog::from_fields(&doc.id, &doc.fields) {
            Ok(log) => Some((log.date, log)),
            Err(err) => {
                warn!("skipping malformed daily log {}: {err}", doc.id);
                None
            }
        })
        .collect()
}

/// Keeps a [`Snapshot`] in step with the store by subscribing to each tracked
/// collection. Every change yields the whole snapshot again.
pub struct LiveSnapshot {
    supplements: CollectionSubscription,
    routines: CollectionSubscription,
    daily_logs: CollectionSubscription,
    snapshot: Snapshot,
    primed: bool,
}

impl LiveSnapshot {
    pub fn open(store: &dyn DocumentStore) -> Self {
        let mut supplements = store.subscribe_collection(SUPPLEMENTS);
        let mut routines = store.subscribe_collection(ROUTINES);
        let mut daily_logs = store.subscribe_collection(DAILY_LOGS);
        let snapshot = Snapshot {
            supplements: decode_items(&supplements.current()),
            routines: decode_items(&routines.current()),
            daily_logs: decode_logs(&daily_logs.current()),
        };
        Self {
            supplements,
            routines,
            daily_logs,
            snapshot,
            primed: false,
        }
    }

    /// The first call returns the snapshot taken at open; later calls wait
    /// for any tracked collection to change. `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Snapshot> {
        if !self.primed {
            self.primed = true;
            return Some(self.snapshot.clone());
        }
        tokio::select! {
            Some(docs) = self.supplements.next() => self.snapshot.supplements = decode_items(&docs),
            Some(docs) = self.routines.next() => self.snapshot.routines = decode_items(&docs),
            Some(docs) = self.daily_logs.next() => self.snapshot.daily_logs = decode_logs(&docs),
            else => return None,
        }
        Some(self.snapshot.clone())
    }
}

pub fn build_dashboard(snapshot: &Snapshot, goal_ml: u32) -> DashboardResponse {
    build_dashboard_at(Local::now().date_naive(), snapshot, goal_ml)
}

pub fn build_dashboard_at(today: NaiveDate, snapshot: &Snapshot, goal_ml: u32) -> DashboardResponse {
    let supplements: Vec<ItemView> = snapshot
        .supplements
        .iter()
        .map(|item| item_view(item, today))
        .collect();

    let mut groups: Vec<RoutineGroup> = TimeOfDay::ALL
        .iter()
        .map(|time_of_day| RoutineGroup {
            time_of_day: *time_of_day,
            items: Vec::new(),
        })
        .collect();
    for routine in &snapshot.routines {
        let slot = TimeOfDay::from_category(routine.category.as_deref());
        if let Some(group) = groups.iter_mut().find(|group| group.time_of_day == slot) {
            group.items.push(item_view(routine, today));
        }
    }
    groups.retain(|group| !group.items.is_empty());

    let today_log = snapshot
        .daily_logs
        .get(&today)
        .cloned()
        .unwrap_or_else(|| DailyLog::empty(today));

    DashboardResponse {
        date: today.to_string(),
        supplements: SupplementBoard {
            done: supplements.iter().filter(|item| item.done_today).count(),
            total: supplements.len(),
            collective_streak: tracker::collective_streak(&snapshot.supplements, today),
            items: supplements,
        },
        routines: RoutineBoard {
            done: snapshot
                .routines
                .iter()
                .filter(|item| tracker::is_done(item, today))
                .count(),
            total: snapshot.routines.len(),
            collective_streak: tracker::collective_streak(&snapshot.routines, today),
            groups,
        },
        water: WaterView {
            liquid_volume_ml: today_log.liquid_volume_ml,
            goal_ml,
            progress_percent: tracker::progress_percent(today_log.liquid_volume_ml, goal_ml),
            streak: tracker::liquid_streak(&snapshot.daily_logs, goal_ml, today),
        },
        mood_level: today_log.mood_level,
    }
}

pub fn item_view(item: &TrackableItem, today: NaiveDate) -> ItemView {
    ItemView {
        id: item.id.clone(),
        name: item.name.clone(),
        category: item.category.clone(),
        dosage: item.dosage.clone(),
        done_today: tracker::is_done(item, today),
        streak: tracker::streak(&item.history, today),
        inventory: item.consumption.map(|consumption| InventoryView {
            stock_remaining: consumption.stock_remaining,
            units_per_day: consumption.units_per_day,
            days_remaining: tracker::days_remaining(
                consumption.stock_remaining,
                consumption.units_per_day,
            ),
            status: tracker::stock_status(consumption.stock_remaining, consumption.units_per_day),
        }),
    }
}

pub fn log_response(log: &DailyLog, goal_ml: u32) -> DailyLogResponse {
    DailyLogResponse {
        date: log.date.to_string(),
        liquid_volume_ml: log.liquid_volume_ml,
        goal_ml,
        progress_percent: tracker::progress_percent(log.liquid_volume_ml, goal_ml),
        mood_level: log.mood_level,
    }
}
