use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use error_stack::Report;
use tracing::instrument;

use super::{Photo, PhotoId};
use crate::Error;

/// Persistence for photo records.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn get(&self, id: PhotoId) -> Result<Option<Photo>, Report<Error>>;

    /// All photos, newest first
    async fn list(&self) -> Result<Vec<Photo>, Report<Error>>;

    /// Insert or update the photo, returning the stored record.
    async fn save(&self, photo: Photo) -> Result<Photo, Report<Error>>;

    /// Remove the photo. Returns false if it did not exist.
    async fn delete(&self, id: PhotoId) -> Result<bool, Report<Error>>;
}

/// A [PhotoStore] that keeps photos in memory.
#[derive(Default)]
pub struct InMemoryPhotoStore {
    photos: Mutex<BTreeMap<PhotoId, Photo>>,
}

impl InMemoryPhotoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<PhotoId, Photo>>, Report<Error>> {
        self.photos
            .lock()
            .map_err(|_| Report::new(Error::Db).attach_printable("photo store lock poisoned"))
    }
}

#[async_trait]
impl PhotoStore for InMemoryPhotoStore {
    #[instrument(skip(self))]
    async fn get(&self, id: PhotoId) -> Result<Option<Photo>, Report<Error>> {
        Ok(self.lock()?.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Photo>, Report<Error>> {
        let mut photos = self.lock()?.values().cloned().collect::<Vec<_>>();
        photos.sort_by(|a, b| b.create_dt.cmp(&a.create_dt).then(b.id.cmp(&a.id)));
        Ok(photos)
    }

    #[instrument(skip(self, photo), fields(id = %photo.id))]
    async fn save(&self, photo: Photo) -> Result<Photo, Report<Error>> {
        self.lock()?.insert(photo.id, photo.clone());
        Ok(photo)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: PhotoId) -> Result<bool, Report<Error>> {
        Ok(self.lock()?.remove(&id).is_some())
    }
}
