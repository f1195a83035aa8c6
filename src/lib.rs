pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{HttpRegistrarFeed, JsonListingStore, MemoryListingStore};
pub use config::{cli::LocalStorage, toml_config::CatalogConfig};
pub use crate::core::{
    crosslist::CrosslistNormalizer, engine::CatalogEngine, reconcile::PrecedenceReconciler,
    term_order::TermOrder,
};
pub use domain::model::{Listing, ListingOp, RawListing, ReconcileSummary, TermCode};
pub use utils::error::{CatalogError, Result};
