use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::tracker::{LiquidStreak, StockStatus};

pub const SUPPLEMENTS: &str = "supplements";
pub const ROUTINES: &str = "routines";
pub const DAILY_LOGS: &str = "dailyLogs";

/// Collections holding trackable items, as they appear in API paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Supplements,
    Routines,
}

impl ItemKind {
    pub fn collection(self) -> &'static str {
        match self {
            ItemKind::Supplements => SUPPLEMENTS,
            ItemKind::Routines => ROUTINES,
        }
    }

    pub fn is_consumable(self) -> bool {
        matches!(self, ItemKind::Supplements)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consumption {
    #[serde(default)]
    pub stock_remaining: i64,
    #[serde(default = "default_units_per_day")]
    pub units_per_day: u32,
}

impl Default for Consumption {
    fn default() -> Self {
        Self {
            stock_remaining: 0,
            units_per_day: default_units_per_day(),
        }
    }
}

fn default_units_per_day() -> u32 {
    1
}

/// A supplement or routine that is marked complete at most once per day.
///
/// The document id is not part of the stored fields; it is filled in from the
/// document key when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrackableItem {
    #[serde(default, skip_serializing)]
    pub id: String,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default, alias = "timeOfDay", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default)]
    pub history: BTreeSet<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption: Option<Consumption>,
}

impl TrackableItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn from_fields(id: &str, fields: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut item: TrackableItem = serde_json::from_value(Value::Object(fields.clone()))?;
        item.id = id.to_string();
        Ok(item)
    }

    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Ok(Map::new()),
        }
    }

    /// Stored fields minus the completion history, for edits.
    pub fn descriptive_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        let mut fields = self.to_fields()?;
        fields.remove("history");
        for key in ["category", "dosage", "consumption"] {
            fields.entry(key).or_insert(Value::Null);
        }
        Ok(fields)
    }

    pub fn apply_edit(&mut self, edit: &EditItemRequest) {
        if let Some(name) = &edit.name {
            self.name = name.trim().to_string();
        }
        if let Some(category) = &edit.category {
            self.category = non_empty(category);
        }
        if let Some(dosage) = &edit.dosage {
            self.dosage = non_empty(dosage);
        }
        if edit.stock_remaining.is_some() || edit.units_per_day.is_some() {
            let consumption = self.consumption.get_or_insert_with(Consumption::default);
            if let Some(stock) = edit.stock_remaining {
                consumption.stock_remaining = stock;
            }
            if let Some(per_day) = edit.units_per_day {
                consumption.units_per_day = per_day;
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Per-date record of water intake and mood, keyed by the ISO date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub date: NaiveDate,
    #[serde(default)]
    pub liquid_volume_ml: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_level: Option<u8>,
}

impl DailyLog {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            liquid_volume_ml: 0,
            mood_level: None,
        }
    }

    pub fn from_fields(id: &str, fields: &Map<String, Value>) -> Result<Self, serde_json::Error> {
        let mut fields = fields.clone();
        fields
            .entry("date")
            .or_insert_with(|| Value::String(id.to_string()));
        serde_json::from_value(Value::Object(fields))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Noon,
    Evening,
    Flexible,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::Morning,
        TimeOfDay::Noon,
        TimeOfDay::Evening,
        TimeOfDay::Flexible,
    ];

    /// Accepts the English slot names and the German ones older routine
    /// documents carry. Unknown or missing categories are grouped as flexible.
    pub fn from_category(category: Option<&str>) -> Self {
        match category.map(|value| value.trim().to_lowercase()).as_deref() {
            Some("morning" | "morgens") => TimeOfDay::Morning,
            Some("noon" | "mittags") => TimeOfDay::Noon,
            Some("evening" | "abends") => TimeOfDay::Evening,
            _ => TimeOfDay::Flexible,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewItemRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub stock_remaining: Option<i64>,
    #[serde(default)]
    pub units_per_day: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub stock_remaining: Option<i64>,
    #[serde(default)]
    pub units_per_day: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct WaterRequest {
    pub delta_ml: i64,
}

#[derive(Debug, Deserialize)]
pub struct MoodRequest {
    pub level: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryView {
    pub stock_remaining: i64,
    pub units_per_day: u32,
    pub days_remaining: i64,
    pub status: StockStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub dosage: Option<String>,
    pub done_today: bool,
    pub streak: u32,
    pub inventory: Option<InventoryView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SupplementBoard {
    pub items: Vec<ItemView>,
    pub done: usize,
    pub total: usize,
    pub collective_streak: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoutineGroup {
    pub time_of_day: TimeOfDay,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoutineBoard {
    pub groups: Vec<RoutineGroup>,
    pub done: usize,
    pub total: usize,
    pub collective_streak: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DailyLogResponse {
    pub date: String,
    pub liquid_volume_ml: u32,
    pub goal_ml: u32,
    pub progress_percent: u8,
    pub mood_level: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WaterView {
    pub liquid_volume_ml: u32,
    pub goal_ml: u32,
    pub progress_percent: u8,
    pub streak: LiquidStreak,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub date: String,
    pub supplements: SupplementBoard,
    pub routines: RoutineBoard,
    pub water: WaterView,
    pub mood_level: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_decodes_with_defaults() {
        let fields = json!({ "title": "Bett machen" });
        let item = TrackableItem::from_fields("r1", fields.as_object().unwrap()).unwrap();
        assert_eq!(item.id, "r1");
        assert_eq!(item.name, "Bett machen");
        assert!(item.history.is_empty());
        assert!(item.consumption.is_none());
    }

    #[test]
    fn consumption_defaults_units_per_day_to_one() {
        let fields = json!({ "name": "Omega 3", "consumption": {} });
        let item = TrackableItem::from_fields("s1", fields.as_object().unwrap()).unwrap();
        let consumption = item.consumption.unwrap();
        assert_eq!(consumption.stock_remaining, 0);
        assert_eq!(consumption.units_per_day, 1);
    }

    #[test]
    fn item_fields_leave_out_id() {
        let mut item = TrackableItem::new("Vitamin D3");
        item.id = "abc".into();
        item.history
            .insert(NaiveDate::from_ymd_opt(2025, 12, 23).unwrap());
        let fields = item.to_fields().unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields["history"], json!(["2025-12-23"]));
    }

    #[test]
    fn descriptive_fields_never_carry_history() {
        let mut item = TrackableItem::new("Magnesium");
        item.history
            .insert(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        let fields = item.descriptive_fields().unwrap();
        assert!(!fields.contains_key("history"));
        assert_eq!(fields["consumption"], Value::Null);
    }

    #[test]
    fn edit_keeps_history_and_sets_stock() {
        let mut item = TrackableItem::new("Zink");
        let day = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        item.history.insert(day);
        item.apply_edit(&EditItemRequest {
            name: Some("  Zinc ".into()),
            stock_remaining: Some(60),
            ..EditItemRequest::default()
        });
        assert_eq!(item.name, "Zinc");
        assert!(item.history.contains(&day));
        assert_eq!(
            item.consumption,
            Some(Consumption {
                stock_remaining: 60,
                units_per_day: 1
            })
        );
    }

    #[test]
    fn daily_log_takes_date_from_key() {
        let fields = json!({ "liquidVolumeMl": 750 });
        let log = DailyLog::from_fields("2025-06-01", fields.as_object().unwrap()).unwrap();
        assert_eq!(log.date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(log.liquid_volume_ml, 750);
        assert_eq!(log.mood_level, None);
    }

    #[test]
    fn time_of_day_falls_back_to_flexible() {
        assert_eq!(TimeOfDay::from_category(Some("Morning")), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_category(Some("whenever")), TimeOfDay::Flexible);
        assert_eq!(TimeOfDay::from_category(None), TimeOfDay::Flexible);
    }

    #[test]
    fn time_of_day_reads_german_slot_names() {
        assert_eq!(TimeOfDay::from_category(Some("morgens")), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_category(Some("Mittags")), TimeOfDay::Noon);
        assert_eq!(TimeOfDay::from_category(Some("abends")), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_category(Some("flexibel")), TimeOfDay::Flexible);
    }

    #[test]
    fn routine_time_of_day_field_decodes_as_category() {
        let fields = json!({ "title": "Lesen", "timeOfDay": "abends", "history": [] });
        let item = TrackableItem::from_fields("r7", fields.as_object().unwrap()).unwrap();
        assert_eq!(item.name, "Lesen");
        assert_eq!(item.category.as_deref(), Some("abends"));
        assert!(!item.to_fields().unwrap().contains_key("timeOfDay"));
    }
}
