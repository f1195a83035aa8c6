use crate::adapters::corpus;
use crate::core::crosslist::CrosslistNormalizer;
use crate::core::reconcile::{apply_plan, dedup_by_id, PrecedenceReconciler, ReconcilePlan};
use crate::core::term_order::TermOrder;
use crate::domain::model::{NormalizationReport, ReconcileSummary, TermCode};
use crate::domain::ports::{ListingStore, RegistrarFeed, Storage};
use crate::utils::error::{CatalogError, Result};
use std::path::Path;

pub const FULL_CROSS_FILE: &str = "full_cross.json";
pub const LINKING_TABLE_FILE: &str = "linking_table.json";

/// Drives fetch → dedup → plan → apply for registrar terms.
///
/// Runs one term at a time. Callers must not run two passes against the same
/// store concurrently: there is no locking across terms for a listing id.
pub struct CatalogEngine<F: RegistrarFeed, S: ListingStore> {
    feed: F,
    store: S,
    order: TermOrder,
}

impl<F: RegistrarFeed, S: ListingStore> CatalogEngine<F, S> {
    pub fn new(feed: F, store: S, order: TermOrder) -> Self {
        Self { feed, store, order }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches and diffs a term without touching the store.
    pub async fn plan_term(&self, term: TermCode) -> Result<ReconcilePlan> {
        self.order.require_rank(term)?;

        let fetched = self.feed.fetch_term(term).await?;
        let incoming = dedup_by_id(fetched);
        tracing::info!("🔄 Reconciling {} listings for term {}", incoming.len(), term);

        // 讀取失敗時在任何寫入前中止
        let persisted = self.store.read_all_listings().await.map_err(|e| {
            CatalogError::FetchFailure {
                term,
                message: format!("listing store read failed: {}", e),
            }
        })?;
        tracing::debug!("Loaded {} persisted listings", persisted.len());

        PrecedenceReconciler::new(&self.order).plan(&incoming, term, &persisted)
    }

    pub async fn reconcile_term(&self, term: TermCode) -> Result<ReconcileSummary> {
        let plan = self.plan_term(term).await?;
        let summary = apply_plan(&self.store, plan).await;

        tracing::info!(
            "✅ Term {}: {} inserted, {} updated, {} unchanged, {} failed",
            term,
            summary.inserts,
            summary.updates,
            summary.unchanged,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// Every configured term, most recent first. Stops at the first fetch failure.
    pub async fn reconcile_all_terms(&self) -> Result<Vec<ReconcileSummary>> {
        let mut summaries = Vec::with_capacity(self.order.len());
        for term in self.order.terms().to_vec() {
            summaries.push(self.reconcile_term(term).await?);
        }
        tracing::info!("✅ Reconciled all {} terms", summaries.len());
        Ok(summaries)
    }
}

/// Normalizes a corpus dump directory and writes `full_cross.json` and
/// `linking_table.json` through `output`.
pub async fn normalize_corpus<S: ListingStore, O: Storage>(
    corpus_dir: impl AsRef<Path>,
    normalizer: &CrosslistNormalizer,
    store: &S,
    output: &O,
) -> Result<NormalizationReport> {
    let corpus = corpus::read_corpus_dir(corpus_dir)?;
    let persisted = store.read_all_listings().await?;

    let report = normalizer.normalize(&corpus, &persisted);

    output
        .write_file(FULL_CROSS_FILE, &serde_json::to_vec_pretty(&report.groups)?)
        .await?;
    output
        .write_file(LINKING_TABLE_FILE, &serde_json::to_vec_pretty(&report.duplicates)?)
        .await?;

    tracing::info!(
        "✅ Wrote {} canonical groups and {} duplicate codes ({} integrity faults, {} warnings)",
        report.groups.len(),
        report.duplicates.len(),
        report.integrity_faults,
        report.warnings.len()
    );
    Ok(report)
}
