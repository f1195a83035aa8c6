use crate::domain::model::{
    Listing, ListingChanges, ListingMutation, MutationFailure, RawListing, TermCode,
};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Source of per-term registrar snapshots.
#[async_trait]
pub trait RegistrarFeed: Send + Sync {
    async fn fetch_term(&self, term: TermCode) -> Result<Vec<RawListing>>;
}

/// Persisted listings. Implementations never delete rows.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn read_all_listings(&self) -> Result<Vec<Listing>>;
    async fn insert_listing(&self, listing: Listing) -> Result<()>;
    async fn update_listing(&self, id: &str, changes: ListingChanges) -> Result<()>;

    /// Applies a term's writes. Rejected rows come back as failures; `Err` means
    /// nothing from the batch was persisted. Stores that can persist once per
    /// batch should override this.
    async fn apply_mutations(&self, mutations: Vec<ListingMutation>) -> Result<Vec<MutationFailure>> {
        let mut failures = Vec::new();
        for mutation in mutations {
            let id = mutation.id().to_string();
            let result = match mutation {
                ListingMutation::Insert(listing) => self.insert_listing(listing).await,
                ListingMutation::Update { id, changes } => self.update_listing(&id, changes).await,
            };
            if let Err(e) = result {
                failures.push(MutationFailure {
                    id,
                    message: e.to_string(),
                });
            }
        }
        Ok(failures)
    }
}
