use crate::domain::model::{Listing, ListingChanges, ListingMutation, MutationFailure};
use crate::domain::ports::{ListingStore, Storage};
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use tokio::sync::Mutex;

fn insert_unique(listings: &mut Vec<Listing>, listing: Listing) -> Result<()> {
    if listings.iter().any(|l| l.id == listing.id) {
        return Err(CatalogError::StoreError {
            message: format!("duplicate key: listing {} already exists", listing.id),
        });
    }
    listings.push(listing);
    Ok(())
}

fn update_existing(listings: &mut [Listing], id: &str, changes: ListingChanges) -> Result<()> {
    let listing = listings
        .iter_mut()
        .find(|l| l.id == id)
        .ok_or_else(|| CatalogError::StoreError {
            message: format!("listing {} not found", id),
        })?;
    changes.apply_to(listing);
    Ok(())
}

/// Listing store kept in memory. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryListingStore {
    listings: Mutex<Vec<Listing>>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: Mutex::new(listings),
        }
    }

    pub async fn snapshot(&self) -> Vec<Listing> {
        self.listings.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Listing> {
        self.listings.lock().await.iter().find(|l| l.id == id).cloned()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn read_all_listings(&self) -> Result<Vec<Listing>> {
        Ok(self.snapshot().await)
    }

    async fn insert_listing(&self, listing: Listing) -> Result<()> {
        insert_unique(&mut *self.listings.lock().await, listing)
    }

    async fn update_listing(&self, id: &str, changes: ListingChanges) -> Result<()> {
        update_existing(&mut self.listings.lock().await, id, changes)
    }
}

/// Listing table persisted as one JSON array through a `Storage` backend.
pub struct JsonListingStore<S: Storage> {
    storage: S,
    file_name: String,
    // 序列化讀取-修改-寫入
    lock: Mutex<()>,
}

impl<S: Storage> JsonListingStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Listing>> {
        match self.storage.read_file(&self.file_name).await {
            Ok(data) if data.is_empty() => Ok(Vec::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(CatalogError::IoError(e)) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Listing file {} not found, starting empty", self.file_name);
                Ok(Vec::new())
            }
            Err(e) => Err(CatalogError::StoreError {
                message: format!("failed to read {}: {}", self.file_name, e),
            }),
        }
    }

    async fn save(&self, listings: &[Listing]) -> Result<()> {
        let json = serde_json::to_vec_pretty(listings)?;
        self.storage.write_file(&self.file_name, &json).await
    }
}

#[async_trait]
impl<S: Storage> ListingStore for JsonListingStore<S> {
    async fn read_all_listings(&self) -> Result<Vec<Listing>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn insert_listing(&self, listing: Listing) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut listings = self.load().await?;
        insert_unique(&mut listings, listing)?;
        self.save(&listings).await
    }

    async fn update_listing(&self, id: &str, changes: ListingChanges) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut listings = self.load().await?;
        update_existing(&mut listings, id, changes)?;
        self.save(&listings).await
    }

    /// 整批只讀一次、寫一次
    async fn apply_mutations(&self, mutations: Vec<ListingMutation>) -> Result<Vec<MutationFailure>> {
        let _guard = self.lock.lock().await;
        let mut listings = self.load().await?;
        let total = mutations.len();
        let mut failures = Vec::new();

        for mutation in mutations {
            let id = mutation.id().to_string();
            let result = match mutation {
                ListingMutation::Insert(listing) => insert_unique(&mut listings, listing),
                ListingMutation::Update { id, changes } => {
                    update_existing(&mut listings, &id, changes)
                }
            };
            if let Err(e) = result {
                failures.push(MutationFailure {
                    id,
                    message: e.to_string(),
                });
            }
        }

        if failures.len() < total {
            self.save(&listings).await?;
            tracing::debug!(
                "📂 Saved {} listings to {} ({} rejected)",
                listings.len(),
                self.file_name,
                failures.len()
            );
        }
        Ok(failures)
    }
}
