use crate::dashboard::{LiveSnapshot, build_dashboard, item_view, load_snapshot, log_response};
use crate::errors::AppError;
use crate::models::{
    Consumption, CreatedResponse, DAILY_LOGS, DailyLog, DailyLogResponse, DashboardResponse,
    EditItemRequest, ItemKind, ItemView, MoodRequest, NewItemRequest, TrackableItem, WaterRequest,
};
use crate::settings::Preferences;
use crate::state::AppState;
use crate::store::{DocPath, DocumentStore, Fields};
use crate::tracker;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        Html,
        sse::{Event, KeepAlive, Sse},
    },
    Json,
};
use chrono::{Local, NaiveDate};
use futures::stream::{self, Stream};
use serde_json::Value;
use tracing::info;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let preferences = state.settings.get().await;
    Html(render_index(&today_string(), &preferences))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let snapshot = load_snapshot(state.store.as_ref()).await?;
    Ok(Json(build_dashboard(&snapshot, state.water_goal_ml)))
}

/// Pushes a fresh dashboard whenever a tracked collection changes. The
/// subscriptions are dropped with the stream when the client disconnects.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let live = LiveSnapshot::open(state.store.as_ref());
    let goal_ml = state.water_goal_ml;

    let updates = stream::unfold(live, move |mut live| async move {
        let snapshot = live.next().await?;
        let event = Event::default()
            .event("dashboard")
            .json_data(build_dashboard(&snapshot, goal_ml));
        Some((event, live))
    });

    Sse::new(updates).keep_alive(KeepAlive::default())
}

pub async fn create_item(
    State(state): State<AppState>,
    Path(kind): Path<ItemKind>,
    Json(payload): Json<NewItemRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    let wants_stock = payload.stock_remaining.is_some() || payload.units_per_day.is_some();
    if wants_stock && !kind.is_consumable() {
        return Err(AppError::bad_request("routines do not track stock"));
    }

    let item = TrackableItem {
        category: payload.category.filter(|value| !value.trim().is_empty()),
        dosage: payload.dosage.filter(|value| !value.trim().is_empty()),
        consumption: wants_stock.then(|| Consumption {
            stock_remaining: payload.stock_remaining.unwrap_or(0),
            units_per_day: payload.units_per_day.unwrap_or(1),
        }),
        ..TrackableItem::new(name)
    };

    let id = state.store.create(kind.collection(), item.to_fields()?).await?;
    info!("created {}/{id} ({name})", kind.collection());
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub async fn edit_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ItemKind, String)>,
    Json(payload): Json<EditItemRequest>,
) -> Result<Json<ItemView>, AppError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
    }
    let touches_stock = payload.stock_remaining.is_some() || payload.units_per_day.is_some();
    if touches_stock && !kind.is_consumable() {
        return Err(AppError::bad_request("routines do not track stock"));
    }

    let path = DocPath::new(kind.collection(), id);
    let mut item = fetch_item(state.store.as_ref(), &path).await?;
    item.apply_edit(&payload);
    state
        .store
        .update(&path, item.descriptive_fields()?)
        .await?;

    info!("edited {path}");
    Ok(Json(item_view(&item, today())))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ItemKind, String)>,
) -> Result<StatusCode, AppError> {
    let path = DocPath::new(kind.collection(), id);
    state.store.delete(&path).await?;
    info!("deleted {path}");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_item(
    State(state): State<AppState>,
    Path((kind, id)): Path<(ItemKind, String)>,
) -> Result<Json<ItemView>, AppError> {
    let today = today();
    let path = DocPath::new(kind.collection(), id);
    let item = fetch_item(state.store.as_ref(), &path).await?;
    let toggled = tracker::toggle(&item, today);

    let mut fields = Fields::new();
    fields.insert("history".into(), serde_json::to_value(&toggled.history)?);
    if let Some(consumption) = &toggled.consumption {
        fields.insert("consumption".into(), serde_json::to_value(consumption)?);
    }
    state.store.update(&path, fields).await?;

    info!(
        "toggled {path}: done_today={}",
        tracker::is_done(&toggled, today)
    );
    Ok(Json(item_view(&toggled, today)))
}

pub async fn adjust_water(
    State(state): State<AppState>,
    Json(payload): Json<WaterRequest>,
) -> Result<Json<DailyLogResponse>, AppError> {
    let today = today();
    let path = daily_log_path(today);
    let mut log = fetch_log(state.store.as_ref(), &path, today).await?;
    log.liquid_volume_ml = tracker::update_volume(log.liquid_volume_ml, payload.delta_ml);

    let mut fields = Fields::new();
    fields.insert("date".into(), Value::String(today.to_string()));
    fields.insert("liquidVolumeMl".into(), Value::from(log.liquid_volume_ml));
    state.store.upsert(&path, fields, true).await?;

    info!("water for {today}: {} ml", log.liquid_volume_ml);
    Ok(Json(log_response(&log, state.water_goal_ml)))
}

pub async fn set_mood(
    State(state): State<AppState>,
    Json(payload): Json<MoodRequest>,
) -> Result<Json<DailyLogResponse>, AppError> {
    let level = payload
        .level
        .map(|raw| {
            tracker::mood_level(raw)
                .ok_or_else(|| AppError::bad_request("mood level must be between 1 and 5"))
        })
        .transpose()?;

    let today = today();
    let path = daily_log_path(today);
    let mut log = fetch_log(state.store.as_ref(), &path, today).await?;
    log.mood_level = level;

    let mut fields = Fields::new();
    fields.insert("date".into(), Value::String(today.to_string()));
    fields.insert(
        "moodLevel".into(),
        level.map(Value::from).unwrap_or(Value::Null),
    );
    state.store.upsert(&path, fields, true).await?;

    info!("mood for {today}: {:?}", log.mood_level);
    Ok(Json(log_response(&log, state.water_goal_ml)))
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Preferences> {
    Json(state.settings.get().await)
}

pub async fn put_settings(
    State(state): State<AppState>,
    Json(payload): Json<Preferences>,
) -> Result<Json<Preferences>, AppError> {
    Ok(Json(state.settings.save(payload).await?))
}

async fn fetch_item(store: &dyn DocumentStore, path: &DocPath) -> Result<TrackableItem, AppError> {
    let doc = store
        .get(path)
        .await?
        .ok_or_else(|| AppError::not_found(format!("document not found: {path}")))?;
    Ok(TrackableItem::from_fields(&doc.id, &doc.fields)?)
}

async fn fetch_log(
    store: &dyn DocumentStore,
    path: &DocPath,
    date: NaiveDate,
) -> Result<DailyLog, AppError> {
    match store.get(path).await? {
        Some(doc) => Ok(DailyLog::from_fields(&doc.id, &doc.fields)?),
        None => Ok(DailyLog::empty(date)),
    }
}

fn daily_log_path(date: NaiveDate) -> DocPath {
    DocPath::new(DAILY_LOGS, date.to_string())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn today_string() -> String {
    today().to_string()
}
