use bytes::Bytes;
use error_stack::{Report, ResultExt};
use object_store::{path::Path, ObjectStore as _};
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to build client")]
    BuildingClient,
    #[error("Failed to get {0}")]
    Get(Path),
    #[error("Failed to put {0}")]
    Put(Path),
    #[error("Failed to delete {0}")]
    Delete(Path),
}

/// Storage for uploaded image files
pub struct Storage {
    /// A description of where the files live, for logging
    pub bucket: String,
    store: ObjectStore,
}

impl Storage {
    /// Create a new Storage for a local filesystem
    pub fn new_local(base_path: String) -> Result<Self, Report<StorageError>> {
        std::fs::create_dir_all(&base_path).change_context(StorageError::BuildingClient)?;
        let store = object_store::local::LocalFileSystem::new_with_prefix(&base_path)
            .change_context(StorageError::BuildingClient)?;
        Ok(Self {
            bucket: base_path,
            store: ObjectStore::Local(store),
        })
    }

    /// Create a Storage that keeps files in memory
    pub fn new_in_memory() -> Self {
        Self {
            bucket: "memory".to_string(),
            store: ObjectStore::Memory(object_store::memory::InMemory::new()),
        }
    }

    #[instrument(skip(self), fields(bucket=%self.bucket))]
    pub async fn get(&self, location: &str) -> Result<Bytes, Report<StorageError>> {
        let location = Path::from(location);
        let result = self
            .store
            .get(&location)
            .await
            .change_context_lazy(|| StorageError::Get(location.clone()))?;
        result
            .bytes()
            .await
            .change_context(StorageError::Get(location))
    }

    #[instrument(skip(self, bytes), fields(bucket=%self.bucket, size=bytes.len()))]
    pub async fn put(&self, location: &str, bytes: Bytes) -> Result<(), Report<StorageError>> {
        let location = Path::from(location);
        self.store
            .put(&location, bytes)
            .await
            .change_context(StorageError::Put(location))?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket=%self.bucket))]
    pub async fn delete(&self, location: &str) -> Result<(), Report<StorageError>> {
        let location = Path::from(location);
        self.store
            .delete(&location)
            .await
            .change_context(StorageError::Delete(location))
    }
}

/// Dispatch to different stores.
enum ObjectStore {
    Local(object_store::local::LocalFileSystem),
    Memory(object_store::memory::InMemory),
}

impl ObjectStore {
    async fn get(&self, location: &Path) -> object_store::Result<object_store::GetResult> {
        match self {
            ObjectStore::Local(local) => local.get(location).await,
            ObjectStore::Memory(memory) => memory.get(location).await,
        }
    }

    async fn put(&self, location: &Path, data: Bytes) -> object_store::Result<()> {
        match self {
            ObjectStore::Local(local) => local.put(location, data).await?,
            ObjectStore::Memory(memory) => memory.put(location, data).await?,
        };
        Ok(())
    }

    async fn delete(&self, location: &Path) -> object_store::Result<()> {
        match self {
            ObjectStore::Local(local) => local.delete(location).await,
            ObjectStore::Memory(memory) => memory.delete(location).await,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn in_memory_put_get_delete() {
        let storage = Storage::new_in_memory();
        storage
            .put("photos/a/cat.jpg", Bytes::from_static(b"meow"))
            .await
            .unwrap();

        let data = storage.get("photos/a/cat.jpg").await.unwrap();
        assert_eq!(data.as_ref(), b"meow");

        storage.delete("photos/a/cat.jpg").await.unwrap();
        let err = storage.get("photos/a/cat.jpg").await.unwrap_err();
        assert!(matches!(err.current_context(), StorageError::Get(_)));
    }
}
