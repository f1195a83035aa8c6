pub mod crosslist;
pub mod engine;
pub mod reconcile;
pub mod term_order;

pub use crate::domain::model::{Listing, ListingOp, RawListing, ReconcileSummary, TermCode};
pub use crate::domain::ports::{ListingStore, RegistrarFeed, Storage};
pub use crate::utils::error::Result;
