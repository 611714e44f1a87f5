//! Document store abstraction and its JSON-file implementation.
//!
//! Every committed write publishes a new immutable [`Database`] snapshot on a
//! watch channel. Subscriptions compare the part they care about against what
//! they last delivered, so a collection subscriber only wakes up when its own
//! collection was written.

use crate::errors::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{
    fs,
    sync::{watch, Mutex},
};
use tracing::{debug, error, info};

pub type Fields = Map<String, Value>;
pub type Collection = BTreeMap<String, Fields>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub collections: BTreeMap<String, Arc<Collection>>,
}

impl Database {
    fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .get(collection)
            .map(|docs| to_documents(docs))
            .unwrap_or_default()
    }

    fn fields(&self, path: &DocPath) -> Option<Fields> {
        self.collections
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .cloned()
    }

    fn collection_mut(&mut self, collection: &str) -> &mut Collection {
        Arc::make_mut(self.collections.entry(collection.to_string()).or_default())
    }
}

fn to_documents(docs: &Collection) -> Vec<Document> {
    docs.iter()
        .map(|(id, fields)| Document {
            id: id.clone(),
            fields: fields.clone(),
        })
        .collect()
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn subscribe_collection(&self, collection: &str) -> CollectionSubscription;

    fn subscribe_document(&self, path: &DocPath) -> DocumentSubscription;

    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Writes `fields` at `path`, creating the document if needed. With
    /// `merge` the fields are laid over the existing ones, otherwise the
    /// document is replaced.
    async fn upsert(&self, path: &DocPath, fields: Fields, merge: bool) -> Result<(), StoreError>;

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Merges `fields` into an existing document.
    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError>;

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError>;
}

/// Live view of one collection. The first [`next`](Self::next) yields the
/// current contents; later calls wait for the collection to change. Dropping
/// the subscription ends it.
pub struct CollectionSubscription {
    collection: String,
    rx: watch::Receiver<Arc<Database>>,
    last: Option<Arc<Collection>>,
    primed: bool,
}

impl CollectionSubscription {
    fn new(collection: &str, rx: watch::Receiver<Arc<Database>>) -> Self {
        Self {
            collection: collection.to_string(),
            rx,
            last: None,
            primed: false,
        }
    }

    pub fn current(&mut self) -> Vec<Document> {
        self.last = self
            .rx
            .borrow_and_update()
            .collections
            .get(&self.collection)
            .cloned();
        self.primed = true;
        self.delivered()
    }

    /// Returns `None` once the store is gone.
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        if !self.primed {
            return Some(self.current());
        }
        loop {
            self.rx.changed().await.ok()?;
            let latest = self
                .rx
                .borrow_and_update()
                .collections
                .get(&self.collection)
                .cloned();
            let unchanged = match (&latest, &self.last) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if !unchanged {
                self.last = latest;
                return Some(self.delivered());
            }
        }
    }

    fn delivered(&self) -> Vec<Document> {
        self.last
            .as_deref()
            .map(to_documents)
            .unwrap_or_default()
    }
}

/// Live view of one document; yields `None` inside the option while the
/// document does not exist.
pub struct DocumentSubscription {
    path: DocPath,
    rx: watch::Receiver<Arc<Database>>,
    last: Option<Fields>,
    primed: bool,
}

impl DocumentSubscription {
    fn new(path: &DocPath, rx: watch::Receiver<Arc<Database>>) -> Self {
        Self {
            path: path.clone(),
            rx,
            last: None,
            primed: false,
        }
    }

    pub fn current(&mut self) -> Option<Document> {
        self.last = self.rx.borrow_and_update().fields(&self.path);
        self.primed = true;
        self.delivered()
    }

    pub async fn next(&mut self) -> Option<Option<Document>> {
        if !self.primed {
            return Some(self.current());
        }
        loop {
            self.rx.changed().await.ok()?;
            let latest = self.rx.borrow_and_update().fields(&self.path);
            if latest != self.last {
                self.last = latest;
                return Some(self.delivered());
            }
        }
    }

    fn delivered(&self) -> Option<Document> {
        self.last.as_ref().map(|fields| Document {
            id: self.path.id.clone(),
            fields: fields.clone(),
        })
    }
}

/// Document store persisted as a single pretty-printed JSON file.
pub struct JsonStore {
    path: Option<PathBuf>,
    write_lock: Mutex<()>,
    tx: watch::Sender<Arc<Database>>,
}

impl JsonStore {
    /// Loads the database from `path`. A missing file starts empty; an
    /// unreadable or corrupt one is logged and also starts empty.
    pub async fn open(path: PathBuf) -> Self {
        let data = load_database(&path).await;
        info!(
            "opened store at {} ({} collections)",
            path.display(),
            data.collections.len()
        );
        Self::with_data(Some(path), data)
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::with_data(None, Database::default())
    }

    fn with_data(path: Option<PathBuf>, data: Database) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(data));
        Self {
            path,
            write_lock: Mutex::new(()),
            tx,
        }
    }

    pub fn snapshot(&self) -> Arc<Database> {
        Arc::clone(&*self.tx.borrow())
    }

    // Applies `mutate` to a copy of the current database, persists it and only
    // then publishes it. A failed persist leaves the published state as it was.
    async fn commit<T: Send>(
        &self,
        mutate: impl FnOnce(&mut Database) -> Result<T, StoreError> + Send,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut next = Database::clone(&self.snapshot());
        let output = mutate(&mut next)?;
        if let Some(path) = &self.path {
            persist_database(path, &next).await?;
        }
        self.tx.send_replace(Arc::new(next));
        Ok(output)
    }
}

#[async_trait]
impl DocumentStore for JsonStore {
    fn subscribe_collection(&self, collection: &str) -> CollectionSubscription {
        CollectionSubscription::new(collection, self.tx.subscribe())
    }

    fn subscribe_document(&self, path: &DocPath) -> DocumentSubscription {
        DocumentSubscription::new(path, self.tx.subscribe())
    }

    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        Ok(self.snapshot().fields(path).map(|fields| Document {
            id: path.id.clone(),
            fields,
        }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.snapshot().documents(collection))
    }

    async fn upsert(&self, path: &DocPath, fields: Fields, merge: bool) -> Result<(), StoreError> {
        debug!("upsert {path} (merge: {merge})");
        self.commit(|db| {
            let docs = db.collection_mut(&path.collection);
            if merge {
                if let Some(existing) = docs.get_mut(&path.id) {
                    existing.extend(fields);
                    return Ok(());
                }
            }
            docs.insert(path.id.clone(), fields);
            Ok(())
        })
        .await
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        debug!("create {collection}/{id}");
        self.commit(|db| {
            db.collection_mut(collection).insert(id.clone(), fields);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        debug!("update {path}");
        self.commit(|db| {
            let existing = db
                .collections
                .get_mut(&path.collection)
                .map(Arc::make_mut)
                .and_then(|docs| docs.get_mut(&path.id))
                .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            existing.extend(fields);
            Ok(())
        })
        .await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        debug!("delete {path}");
        self.commit(|db| {
            let removed = db
                .collections
                .get_mut(&path.collection)
                .map(Arc::make_mut)
                .and_then(|docs| docs.remove(&path.id));
            match removed {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound(path.to_string())),
            }
        })
        .await
    }
}

async fn load_database(path: &Path) -> Database {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                Database::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Database::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            Database::default()
        }
    }
}

// The data file is only ever replaced by rename from a sibling temp file.
async fn persist_database(path: &Path, data: &Database) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(data)?;
    let tmp = temp_path(path);
    fs::write(&tmp, payload).await?;
    if let Err(err) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::timeout;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn doc_path_displays_collection_and_id() {
        let path = DocPath::new("dailyLogs", "2025-01-01");
        assert_eq!(path.to_string(), "dailyLogs/2025-01-01");
    }

    #[tokio::test]
    async fn create_update_delete() {
        let store = JsonStore::in_memory();
        let id = store
            .create("routines", fields(json!({ "name": "Stretch" })))
            .await
            .unwrap();
        let path = DocPath::new("routines", &id);

        store
            .update(&path, fields(json!({ "category": "morning" })))
            .await
            .unwrap();
        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["name"], json!("Stretch"));
        assert_eq!(doc.fields["category"], json!("morning"));

        store.delete(&path).await.unwrap();
        assert!(store.get(&path).await.unwrap().is_none());
        assert!(store.list("routines").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_missing_documents_fail() {
        let store = JsonStore::in_memory();
        let path = DocPath::new("routines", "missing");
        assert!(matches!(
            store.update(&path, Fields::new()).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete(&path).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn upsert_merges_or_replaces() {
        let store = JsonStore::in_memory();
        let path = DocPath::new("dailyLogs", "2025-01-01");

        store
            .upsert(&path, fields(json!({ "liquidVolumeMl": 500 })), true)
            .await
            .unwrap();
        store
            .upsert(&path, fields(json!({ "moodLevel": 4 })), true)
            .await
            .unwrap();
        let doc = store.get(&path).await.unwrap().unwrap();
        assert_eq!(doc.fields["liquidVolumeMl"], json!(500));
        assert_eq!(doc.fields["moodLevel"], json!(4));

        store
            .upsert(&path, fields(json!({ "moodLevel": 2 })), false)
            .await
            .unwrap();
        let doc = store.get(&path).await.unwrap().unwrap();
        assert!(!doc.fields.contains_key("liquidVolumeMl"));
        assert_eq!(doc.fields["moodLevel"], json!(2));
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonStore::open(path.clone()).await;
        let id = store
            .create("supplements", fields(json!({ "name": "Omega 3" })))
            .await
            .unwrap();
        drop(store);

        let reopened = JsonStore::open(path).await;
        let docs = reopened.list("supplements").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].fields["name"], json!("Omega 3"));
    }

    #[tokio::test]
    async fn persist_replaces_file_without_leaving_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ \"collections\": {} }").unwrap();

        let store = JsonStore::open(path.clone()).await;
        store
            .create("routines", fields(json!({ "name": "Walk" })))
            .await
            .unwrap();

        let on_disk: Database = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.collections["routines"].len(), 1);
        assert!(!temp_path(&path).exists());
        assert_eq!(temp_path(&path), dir.path().join("state.json.tmp"));
    }

    #[tokio::test]
    async fn stale_temp_file_does_not_affect_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonStore::open(path.clone()).await;
        store
            .create("routines", fields(json!({ "name": "Walk" })))
            .await
            .unwrap();
        drop(store);

        // Leftover of an interrupted write.
        std::fs::write(temp_path(&path), b"{ \"collec").unwrap();

        let reopened = JsonStore::open(path).await;
        assert_eq!(reopened.list("routines").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = JsonStore::open(path).await;
        assert!(store.snapshot().collections.is_empty());
    }

    #[tokio::test]
    async fn failed_persist_keeps_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be written as a file.
        let store = JsonStore::open(dir.path().to_path_buf()).await;
        let result = store
            .create("routines", fields(json!({ "name": "Read" })))
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert!(store.list("routines").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn collection_subscription_yields_initial_then_changes() {
        let store = JsonStore::in_memory();
        store
            .create("routines", fields(json!({ "name": "Walk" })))
            .await
            .unwrap();

        let mut sub = store.subscribe_collection("routines");
        let initial = sub.next().await.unwrap();
        assert_eq!(initial.len(), 1);

        // Writes to other collections do not wake this subscription.
        store
            .create("supplements", fields(json!({ "name": "Zinc" })))
            .await
            .unwrap();
        assert!(timeout(Duration::from_millis(50), sub.next()).await.is_err());

        store
            .create("routines", fields(json!({ "name": "Journal" })))
            .await
            .unwrap();
        let changed = timeout(Duration::from_secs(1), sub.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(changed.len(), 2);
    }

    #[tokio::test]
    async fn document_subscription_tracks_creation_and_deletion() {
        let store = JsonStore::in_memory();
        let path = DocPath::new("dailyLogs", "2025-03-03");
        let mut sub = store.subscribe_document(&path);
        assert_eq!(sub.next().await, Some(None));

        store
            .upsert(&path, fields(json!({ "liquidVolumeMl": 250 })), true)
            .await
            .unwrap();
        let doc = sub.next().await.unwrap().unwrap();
        assert_eq!(doc.fields["liquidVolumeMl"], json!(250));

        store.delete(&path).await.unwrap();
        assert_eq!(sub.next().await, Some(None));
    }

    #[tokio::test]
    async fn subscription_ends_when_store_is_dropped() {
        let store = JsonStore::in_memory();
        let mut sub = store.subscribe_collection("routines");
        assert!(sub.next().await.is_some());
        drop(store);
        assert!(sub.next().await.is_none());
    }
}
