use crate::domain::{ContainerQuery, StoreError, StoreResult};
use crate::ports::{ContainerStore, RouteStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::{Container, LoadingRoute};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A keyed record set persisted as one JSON array.
///
/// Every mutation rewrites the whole snapshot through a sibling temp file,
/// fsyncs it and renames it over the original, so a crash leaves either the
/// old or the new snapshot on disk.
struct JsonSnapshot<T> {
    records: RwLock<BTreeMap<String, T>>,
    path: PathBuf,
}

impl<T> JsonSnapshot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    fn open(path: &Path, key_of: impl Fn(&T) -> String) -> StoreResult<Self> {
        let path = path.to_path_buf();
        let records = match std::fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => {
                let list: Vec<T> =
                    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                info!(
                    "[bt-01] 💾 Loaded {} records from {}",
                    list.len(),
                    path.display()
                );
                list.into_iter().map(|r| (key_of(&r), r)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[bt-01] 📁 No existing store file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            records: RwLock::new(records),
            path,
        })
    }

    fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, T>) -> R) -> R {
        f(&self.records.read())
    }

    /// Apply a mutation and persist it. On write failure the in-memory map
    /// is rolled back so memory never runs ahead of disk.
    fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<String, T>) -> R) -> StoreResult<R> {
        let mut records = self.records.write();
        let before = records.clone();
        let result = f(&mut records);
        if let Err(e) = self.save(&records) {
            *records = before;
            return Err(e);
        }
        Ok(result)
    }

    fn save(&self, records: &BTreeMap<String, T>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let list: Vec<&T> = records.values().collect();
        let bytes = serde_json::to_vec(&list)?;

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!(
            "[bt-01] wrote {} records ({} bytes) to {}",
            records.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Container store persisted to a JSON snapshot file.
pub struct FileBackedContainerStore {
    snapshot: JsonSnapshot<Container>,
}

impl FileBackedContainerStore {
    /// Open (or create on first write) the store at `path`.
    ///
    /// A missing or empty file yields an empty store; a file that does not
    /// parse is reported as `StoreError::Corrupt` rather than silently reset.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self {
            snapshot: JsonSnapshot::open(path.as_ref(), |c: &Container| c.uid.clone())?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.snapshot.path
    }
}

impl ContainerStore for FileBackedContainerStore {
    fn get(&self, uid: &str) -> StoreResult<Option<Container>> {
        Ok(self.snapshot.read(|r| r.get(uid).cloned()))
    }

    fn upsert(&self, container: Container) -> StoreResult<()> {
        self.snapshot.write(|r| {
            r.insert(container.uid.clone(), container);
        })
    }

    fn upsert_many(&self, containers: Vec<Container>) -> StoreResult<()> {
        self.snapshot.write(|r| {
            for container in containers {
                r.insert(container.uid.clone(), container);
            }
        })
    }

    fn delete(&self, uid: &str) -> StoreResult<bool> {
        if self.snapshot.read(|r| !r.contains_key(uid)) {
            return Ok(false);
        }
        self.snapshot.write(|r| r.remove(uid).is_some())
    }

    fn query(&self, query: &ContainerQuery) -> StoreResult<Vec<Container>> {
        Ok(self.snapshot.read(|r| query.apply(r.values())))
    }

    fn all(&self) -> StoreResult<Vec<Container>> {
        Ok(self.snapshot.read(|r| r.values().cloned().collect()))
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.snapshot.read(BTreeMap::len))
    }
}

/// Route mirror persisted to a JSON snapshot file.
pub struct FileBackedRouteStore {
    snapshot: JsonSnapshot<LoadingRoute>,
}

impl FileBackedRouteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self {
            snapshot: JsonSnapshot::open(path.as_ref(), |r: &LoadingRoute| r.id.clone())?,
        })
    }
}

impl RouteStore for FileBackedRouteStore {
    fn get_route(&self, route_id: &str) -> StoreResult<Option<LoadingRoute>> {
        Ok(self.snapshot.read(|r| r.get(route_id).cloned()))
    }

    fn put_route(&self, route: LoadingRoute) -> StoreResult<()> {
        self.snapshot.write(|r| {
            r.insert(route.id.clone(), route);
        })
    }

    fn delete_route(&self, route_id: &str) -> StoreResult<bool> {
        if self.snapshot.read(|r| !r.contains_key(route_id)) {
            return Ok(false);
        }
        self.snapshot.write(|r| r.remove(route_id).is_some())
    }

    fn list_routes(&self) -> StoreResult<Vec<LoadingRoute>> {
        Ok(self.snapshot.read(|r| r.values().cloned().collect()))
    }
}
