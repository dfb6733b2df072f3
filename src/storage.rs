use crate::errors::AppError;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::{fs, sync::Mutex};
use tracing::{debug, error, info, warn};

/// One JSON file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Appointments,
    Contacts,
    Customers,
    Services,
    Products,
    Settings,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Appointments,
        Collection::Contacts,
        Collection::Customers,
        Collection::Services,
        Collection::Products,
        Collection::Settings,
        Collection::Users,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Appointments => "appointments",
            Collection::Contacts => "contacts",
            Collection::Customers => "customers",
            Collection::Services => "services",
            Collection::Products => "products",
            Collection::Settings => "settings",
            Collection::Users => "users",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

/// Hands out ids that never go backwards, even after the highest record is deleted.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicU64,
}

impl IdSequence {
    fn starting_at(next: u64) -> Self {
        Self {
            next: AtomicU64::new(next.max(1)),
        }
    }

    /// Makes sure the next id is above `id`; covers files edited behind our back.
    pub fn observe(&self, id: u64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

struct Table {
    lock: Mutex<()>,
    ids: IdSequence,
}

/// High-water marks of the id sequences, so ids stay unique across restarts.
const SEQUENCES_FILE: &str = "sequences.json";

pub struct Store {
    data_dir: PathBuf,
    tables: HashMap<Collection, Table>,
    sequences: Mutex<()>,
}

impl Store {
    /// Creates the data directory, writes default content for any missing
    /// collection file and seeds the id sequences from the stored high-water
    /// marks and what is on disk.
    pub async fn open(data_dir: impl Into<PathBuf>, defaults: &HashMap<Collection, Value>) -> Result<Self, std::io::Error> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;

        for (collection, value) in defaults {
            let path = data_dir.join(collection.file_name());
            if fs::try_exists(&path).await? {
                continue;
            }
            let payload = serde_json::to_vec_pretty(value).map_err(std::io::Error::other)?;
            fs::write(&path, payload).await?;
            info!("initialized {}", path.display());
        }

        let persisted: HashMap<String, u64> = read_json(&data_dir.join(SEQUENCES_FILE)).await.unwrap_or_default();

        let mut tables = HashMap::new();
        for collection in Collection::ALL {
            let max_id = match read_json::<Value>(&data_dir.join(collection.file_name())).await {
                Some(Value::Array(records)) => records
                    .iter()
                    .filter_map(|record| record.get("id").and_then(Value::as_u64))
                    .max()
                    .unwrap_or(0),
                _ => 0,
            };
            let next = persisted
                .get(collection.name())
                .copied()
                .unwrap_or(0)
                .max(max_id + 1);
            tables.insert(
                collection,
                Table {
                    lock: Mutex::new(()),
                    ids: IdSequence::starting_at(next),
                },
            );
        }

        Ok(Self {
            data_dir,
            tables,
            sequences: Mutex::new(()),
        })
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }

    fn table(&self, collection: Collection) -> &Table {
        // Every variant is inserted in `open`.
        &self.tables[&collection]
    }

    pub fn ids(&self, collection: Collection) -> &IdSequence {
        &self.table(collection).ids
    }

    /// Whole collection, or empty when the file is missing or unreadable.
    pub async fn read<R: DeserializeOwned>(&self, collection: Collection) -> Vec<R> {
        read_json(&self.path(collection)).await.unwrap_or_default()
    }

    /// Singleton documents such as settings; default when unreadable.
    pub async fn read_document<D: DeserializeOwned + Default>(&self, collection: Collection) -> D {
        read_json(&self.path(collection)).await.unwrap_or_default()
    }

    pub async fn write<T: Serialize + ?Sized>(&self, collection: Collection, data: &T) -> Result<(), AppError> {
        persist_data(&self.path(collection), data)
            .await
            .map_err(|err| AppError::persistence(collection.name(), err))
    }

    /// Read-modify-write under the collection lock. Nothing is written when
    /// `apply` fails. A file that does not parse is moved aside to
    /// `<name>.json.corrupt` before it is replaced.
    pub async fn mutate<R, T, F>(&self, collection: Collection, apply: F) -> Result<T, AppError>
    where
        R: Serialize + DeserializeOwned,
        F: FnOnce(&mut Vec<R>, &IdSequence) -> Result<T, AppError>,
    {
        let table = self.table(collection);
        let _guard = table.lock.lock().await;

        let path = self.path(collection);
        let (mut records, corrupt) = load_for_write::<Vec<R>>(&path).await?;
        let issued_before = table.ids.peek();
        let outcome = apply(&mut records, &table.ids)?;

        if table.ids.peek() != issued_before {
            self.persist_sequences().await?;
        }
        if corrupt {
            quarantine(&path).await?;
        }
        self.write(collection, &records).await?;
        debug!(collection = collection.name(), len = records.len(), "collection written");
        Ok(outcome)
    }

    /// Same as `mutate` for singleton documents.
    pub async fn mutate_document<D, T, F>(&self, collection: Collection, apply: F) -> Result<T, AppError>
    where
        D: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut D) -> Result<T, AppError>,
    {
        let table = self.table(collection);
        let _guard = table.lock.lock().await;

        let path = self.path(collection);
        let (mut document, corrupt) = load_for_write::<D>(&path).await?;
        let outcome = apply(&mut document)?;
        if corrupt {
            quarantine(&path).await?;
        }
        self.write(collection, &document).await?;
        Ok(outcome)
    }

    async fn persist_sequences(&self) -> Result<(), AppError> {
        let _guard = self.sequences.lock().await;
        let marks: BTreeMap<&str, u64> = Collection::ALL
            .into_iter()
            .map(|collection| (collection.name(), self.ids(collection).peek()))
            .collect();
        persist_data(&self.data_dir.join(SEQUENCES_FILE), &marks)
            .await
            .map_err(|err| AppError::persistence("id sequences", err))
    }
}

enum Loaded<T> {
    Data(T),
    Missing,
    Corrupt,
    Unreadable(std::io::Error),
}

async fn load_json<T: DeserializeOwned>(path: &Path) -> Loaded<T> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => Loaded::Data(data),
            Err(err) => {
                error!("failed to parse {}: {err}", path.display());
                Loaded::Corrupt
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Loaded::Missing,
        Err(err) => {
            error!("failed to read {}: {err}", path.display());
            Loaded::Unreadable(err)
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match load_json(path).await {
        Loaded::Data(data) => Some(data),
        Loaded::Missing | Loaded::Corrupt | Loaded::Unreadable(_) => None,
    }
}

/// Current content for a read-modify-write, and whether the file was corrupt.
/// An I/O failure aborts the write instead of clobbering a file we could not read.
async fn load_for_write<T: DeserializeOwned + Default>(path: &Path) -> Result<(T, bool), AppError> {
    match load_json(path).await {
        Loaded::Data(data) => Ok((data, false)),
        Loaded::Missing => Ok((T::default(), false)),
        Loaded::Corrupt => Ok((T::default(), true)),
        Loaded::Unreadable(err) => Err(AppError::internal(err)),
    }
}

async fn quarantine(path: &Path) -> Result<(), AppError> {
    let target = path.with_extension("json.corrupt");
    fs::rename(path, &target).await.map_err(AppError::internal)?;
    warn!("moved unparseable {} to {}", path.display(), target.display());
    Ok(())
}

/// Pretty-printed, written to a sibling temp file and renamed into place.
async fn persist_data<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), std::io::Error> {
    let payload = serde_json::to_vec_pretty(data).map_err(std::io::Error::other)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    pub fn unique_dir(label: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("storefront_{label}_{}_{}", std::process::id(), nanos));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::unique_dir;
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn open_seeds_missing_files_only() {
        let dir = unique_dir("seed");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("services.json"), b"[{\"id\": 7}]").await.unwrap();

        let mut defaults = HashMap::new();
        defaults.insert(Collection::Services, json!([{ "id": 1 }]));
        defaults.insert(Collection::Contacts, json!([]));
        let store = Store::open(&dir, &defaults).await.unwrap();

        let services: Vec<Value> = store.read(Collection::Services).await;
        assert_eq!(services, vec![json!({ "id": 7 })]);
        assert!(dir.join("contacts.json").exists());
        assert_eq!(store.ids(Collection::Services).peek(), 8);
        assert_eq!(store.ids(Collection::Contacts).peek(), 1);
    }

    #[tokio::test]
    async fn unreadable_collection_reads_as_empty() {
        let dir = unique_dir("corrupt");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("contacts.json"), b"{not json").await.unwrap();

        let store = Store::open(&dir, &HashMap::new()).await.unwrap();
        let contacts: Vec<Value> = store.read(Collection::Contacts).await;
        assert!(contacts.is_empty());
    }

    #[tokio::test]
    async fn failed_mutation_leaves_file_untouched() {
        let dir = unique_dir("untouched");
        let mut defaults = HashMap::new();
        defaults.insert(Collection::Products, json!([{ "id": 1 }]));
        let store = Store::open(&dir, &defaults).await.unwrap();
        let before = fs::read(dir.join("products.json")).await.unwrap();

        let result: Result<(), AppError> = store
            .mutate::<Value, _, _>(Collection::Products, |records, _| {
                records.clear();
                Err(AppError::not_found("Product not found"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(fs::read(dir.join("products.json")).await.unwrap(), before);
    }

    #[tokio::test]
    async fn high_water_mark_survives_restart() {
        let dir = unique_dir("restart");
        let mut defaults = HashMap::new();
        defaults.insert(Collection::Appointments, json!([]));

        let store = Store::open(&dir, &defaults).await.unwrap();
        for _ in 0..2 {
            store
                .mutate::<Value, _, _>(Collection::Appointments, |records, ids| {
                    records.push(json!({ "id": ids.next_id() }));
                    Ok(())
                })
                .await
                .unwrap();
        }
        store
            .mutate::<Value, _, _>(Collection::Appointments, |records, _| {
                records.retain(|record| record["id"] != json!(2));
                Ok(())
            })
            .await
            .unwrap();
        drop(store);

        let reopened = Store::open(&dir, &defaults).await.unwrap();
        assert_eq!(reopened.ids(Collection::Appointments).peek(), 3);
    }

    #[tokio::test]
    async fn corrupt_file_is_moved_aside_before_overwrite() {
        let dir = unique_dir("quarantine");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join("contacts.json"), b"[{\"id\": 1,").await.unwrap();
        let store = Store::open(&dir, &HashMap::new()).await.unwrap();

        store
            .mutate::<Value, _, _>(Collection::Contacts, |records, ids| {
                records.push(json!({ "id": ids.next_id() }));
                Ok(())
            })
            .await
            .unwrap();

        let saved = fs::read(dir.join("contacts.json.corrupt")).await.unwrap();
        assert_eq!(saved, b"[{\"id\": 1,");
        let contacts: Vec<Value> = store.read(Collection::Contacts).await;
        assert_eq!(contacts, vec![json!({ "id": 1 })]);
    }

    #[test]
    fn id_sequence_observes_larger_ids() {
        let ids = IdSequence::starting_at(3);
        ids.observe(10);
        assert_eq!(ids.next_id(), 11);
        ids.observe(2);
        assert_eq!(ids.next_id(), 12);
    }
}
