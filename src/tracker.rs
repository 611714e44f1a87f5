//! Pure adherence calculations: completion toggles, streaks and stock
//! projections. Everything here is recomputed from a snapshot and never
//! touches the store.

use crate::models::{DailyLog, TrackableItem};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on how far back a streak walk looks.
pub const STREAK_LOOKBACK_DAYS: u32 = 365;
pub const LOW_STOCK_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockStatus {
    Empty,
    Low,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidStreak {
    /// Consecutive fully elapsed days (ending yesterday) that met the goal.
    pub completed_days: u32,
    pub today_met: bool,
    pub displayed: u32,
}

pub fn is_done(item: &TrackableItem, today: NaiveDate) -> bool {
    item.history.contains(&today)
}

/// Flips today's completion. Consumable items are debited on completion and
/// credited back on undo, so applying this twice restores the item exactly.
pub fn toggle(item: &TrackableItem, today: NaiveDate) -> TrackableItem {
    let mut next = item.clone();
    if next.history.remove(&today) {
        if let Some(consumption) = next.consumption.as_mut() {
            consumption.stock_remaining += i64::from(consumption.units_per_day);
        }
    } else {
        next.history.insert(today);
        if let Some(consumption) = next.consumption.as_mut() {
            consumption.stock_remaining -= i64::from(consumption.units_per_day);
        }
    }

    next
}

pub fn streak(history: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    anchored_walk(today, |day| history.contains(&day))
}

/// Days on which every item was completed. An empty collection has no streak.
pub fn collective_streak(items: &[TrackableItem], today: NaiveDate) -> u32 {
    if items.is_empty() {
        return 0;
    }
    anchored_walk(today, |day| items.iter().all(|item| item.history.contains(&day)))
}

pub fn liquid_streak(
    logs: &BTreeMap<NaiveDate, DailyLog>,
    goal_ml: u32,
    today: NaiveDate,
) -> LiquidStreak {
    let met = |day: NaiveDate| {
        logs.get(&day)
            .is_some_and(|log| log.liquid_volume_ml >= goal_ml)
    };

    let completed_days = today.pred_opt().map_or(0, |yesterday| walk_back(yesterday, &met));
    let today_met = met(today);

    LiquidStreak {
        completed_days,
        today_met,
        displayed: completed_days + u32::from(today_met),
    }
}

pub fn days_remaining(stock_remaining: i64, units_per_day: u32) -> i64 {
    let per_day = i64::from(units_per_day.max(1));
    stock_remaining.div_euclid(per_day)
}

pub fn stock_status(stock_remaining: i64, units_per_day: u32) -> StockStatus {
    if stock_remaining <= 0 {
        return StockStatus::Empty;
    }
    if days_remaining(stock_remaining, units_per_day) < LOW_STOCK_DAYS {
        StockStatus::Low
    } else {
        StockStatus::Normal
    }
}

pub fn update_volume(current_ml: u32, delta_ml: i64) -> u32 {
    let next = i64::from(current_ml).saturating_add(delta_ml);
    next.clamp(0, i64::from(u32::MAX)) as u32
}

/// Mood levels run from 1 to 5.
pub fn mood_level(raw: i64) -> Option<u8> {
    u8::try_from(raw).ok().filter(|level| (1..=5).contains(level))
}

pub fn progress_percent(volume_ml: u32, goal_ml: u32) -> u8 {
    if goal_ml == 0 {
        return 100;
    }
    let percent = u64::from(volume_ml) * 100 / u64::from(goal_ml);
    percent.min(100) as u8
}

// Starts today when today already qualifies, otherwise yesterday, so an
// unfinished day does not zero the streak.
fn anchored_walk(today: NaiveDate, qualifies: impl Fn(NaiveDate) -> bool) -> u32 {
    if qualifies(today) {
        return walk_back(today, qualifies);
    }
    today.pred_opt().map_or(0, |yesterday| walk_back(yesterday, qualifies))
}

fn walk_back(start: NaiveDate, qualifies: impl Fn(NaiveDate) -> bool) -> u32 {
    let mut count = 0;
    let mut cursor = start;
    while count < STREAK_LOOKBACK_DAYS && qualifies(cursor) {
        count += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    count
}
