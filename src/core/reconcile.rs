use crate::core::term_order::TermOrder;
use crate::domain::model::{
    DataQualityWarning, Listing, ListingMutation, ListingOp, MutationFailure, RawListing,
    ReconcileSummary, TermCode,
};
use crate::domain::ports::ListingStore;
use crate::utils::error::Result;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Planned operations for one term, in incoming order.
#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub term: Option<TermCode>,
    pub ops: Vec<(String, ListingOp)>,
    pub warnings: Vec<DataQualityWarning>,
}

impl ReconcilePlan {
    pub fn op_for(&self, id: &str) -> Option<&ListingOp> {
        self.ops.iter().find(|(op_id, _)| op_id == id).map(|(_, op)| op)
    }

    /// Counts the plan as if every mutation succeeded.
    pub fn preview(&self) -> ReconcileSummary {
        let mut summary = ReconcileSummary {
            term: self.term,
            warnings: self.warnings.clone(),
            ..Default::default()
        };
        for (_, op) in &self.ops {
            match op {
                ListingOp::Insert(_) => summary.inserts += 1,
                ListingOp::Update(_) => summary.updates += 1,
                ListingOp::NoOp => summary.unchanged += 1,
            }
        }
        summary
    }
}

/// Drops repeated ids from one term's snapshot. The first record for an id wins.
pub fn dedup_by_id(records: Vec<RawListing>) -> Vec<RawListing> {
    let mut seen = HashSet::with_capacity(records.len());
    let before = records.len();
    let deduped: Vec<RawListing> = records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect();

    if deduped.len() < before {
        tracing::debug!("Removed {} duplicate records by id", before - deduped.len());
    }
    deduped
}

/// Adds `displaced` to the alias set and keeps `displayed` out of it.
fn absorb_alias(aka: &Option<Vec<String>>, displaced: &str, displayed: &str) -> Option<Vec<String>> {
    let mut set: BTreeSet<String> = aka.iter().flatten().cloned().collect();
    set.insert(displaced.to_string());
    set.remove(displayed);

    if set.is_empty() {
        None
    } else {
        Some(set.into_iter().collect())
    }
}

/// Decides how a term's snapshot moves each listing's ultimate/penultimate window.
pub struct PrecedenceReconciler<'a> {
    order: &'a TermOrder,
}

impl<'a> PrecedenceReconciler<'a> {
    pub fn new(order: &'a TermOrder) -> Self {
        Self { order }
    }

    /// Pure diff of `incoming` against `persisted`. `incoming` must already be unique by id.
    pub fn plan(
        &self,
        incoming: &[RawListing],
        term: TermCode,
        persisted: &[Listing],
    ) -> Result<ReconcilePlan> {
        let new_rank = self.order.require_rank(term)?;
        let mut plan = ReconcilePlan {
            term: Some(term),
            ops: Vec::with_capacity(incoming.len()),
            warnings: Vec::new(),
        };

        // 資料庫為空時直接全部新增
        if persisted.is_empty() {
            tracing::info!("📥 No persisted listings, inserting {} records for term {}", incoming.len(), term);
            for raw in incoming {
                plan.ops
                    .push((raw.id.clone(), ListingOp::Insert(Listing::first_seen(raw, term))));
            }
            return Ok(plan);
        }

        let by_id: HashMap<&str, &Listing> =
            persisted.iter().map(|listing| (listing.id.as_str(), listing)).collect();

        for raw in incoming {
            let op = match by_id.get(raw.id.as_str()) {
                None => ListingOp::Insert(Listing::first_seen(raw, term)),
                Some(existing) => self.plan_existing(raw, term, new_rank, existing, &mut plan.warnings),
            };
            plan.ops.push((raw.id.clone(), op));
        }

        Ok(plan)
    }

    fn rank_or_oldest(
        &self,
        id: &str,
        term: TermCode,
        warnings: &mut Vec<DataQualityWarning>,
    ) -> usize {
        match self.order.rank(term) {
            Some(rank) => rank,
            None => {
                tracing::warn!("⚠️ Listing {} references unranked term {}", id, term);
                warnings.push(DataQualityWarning::UnrankedTerm {
                    id: id.to_string(),
                    term,
                });
                usize::MAX
            }
        }
    }

    fn plan_existing(
        &self,
        raw: &RawListing,
        term: TermCode,
        new_rank: usize,
        existing: &Listing,
        warnings: &mut Vec<DataQualityWarning>,
    ) -> ListingOp {
        let ult_rank = self.rank_or_oldest(&existing.id, existing.ult_term, warnings);
        let title_changed = existing.title != raw.title;

        match new_rank.cmp(&ult_rank) {
            Ordering::Equal => {
                if title_changed {
                    tracing::debug!(
                        "Listing {} title changed within term {} ('{}' -> '{}'), not applied",
                        existing.id,
                        term,
                        existing.title,
                        raw.title
                    );
                }
                ListingOp::NoOp
            }
            // 新學期成為最新：舊標題移入 aka
            Ordering::Less => {
                let aka = if title_changed {
                    absorb_alias(&existing.aka, &existing.title, &raw.title)
                } else {
                    existing.aka.clone()
                };
                ListingOp::Update(Listing {
                    id: existing.id.clone(),
                    code: raw.crosslist_code.clone(),
                    title: raw.title.clone(),
                    aka,
                    ult_term: term,
                    pen_term: Some(existing.ult_term),
                })
            }
            Ordering::Greater => {
                let aka = if title_changed {
                    absorb_alias(&existing.aka, &raw.title, &existing.title)
                } else {
                    existing.aka.clone()
                };
                let updated = Listing {
                    aka,
                    ..existing.clone()
                };

                let Some(pen_term) = existing.pen_term else {
                    return ListingOp::Update(Listing {
                        pen_term: Some(term),
                        ..updated
                    });
                };

                let pen_rank = self.rank_or_oldest(&existing.id, pen_term, warnings);
                if new_rank == pen_rank {
                    return ListingOp::NoOp;
                }

                // 介於兩者之間或更舊：指標不動，只在 aka 有變時更新
                if updated.aka != existing.aka {
                    ListingOp::Update(updated)
                } else {
                    ListingOp::NoOp
                }
            }
        }
    }
}

/// Writes a plan through the store as one batch. Individual failures are
/// collected, never fatal; a batch-level error marks every write as failed.
pub async fn apply_plan<S: ListingStore>(store: &S, plan: ReconcilePlan) -> ReconcileSummary {
    let mut summary = ReconcileSummary {
        term: plan.term,
        warnings: plan.warnings,
        ..Default::default()
    };

    let mut mutations = Vec::with_capacity(plan.ops.len());
    for (id, op) in plan.ops {
        match op {
            ListingOp::NoOp => summary.unchanged += 1,
            ListingOp::Insert(listing) => mutations.push(ListingMutation::Insert(listing)),
            ListingOp::Update(listing) => mutations.push(ListingMutation::Update {
                changes: listing.changes(),
                id,
            }),
        }
    }
    if mutations.is_empty() {
        return summary;
    }

    let planned: Vec<(String, bool)> = mutations
        .iter()
        .map(|m| (m.id().to_string(), matches!(m, ListingMutation::Insert(_))))
        .collect();

    summary.failures = match store.apply_mutations(mutations).await {
        Ok(failures) => failures,
        Err(e) => {
            tracing::error!("❌ Listing store rejected the whole batch: {}", e);
            let message = e.to_string();
            planned
                .iter()
                .map(|(id, _)| MutationFailure {
                    id: id.clone(),
                    message: message.clone(),
                })
                .collect()
        }
    };

    let failed: HashSet<&str> = summary.failures.iter().map(|f| f.id.as_str()).collect();
    for failure in &summary.failures {
        tracing::error!("❌ Write failed for listing {}: {}", failure.id, failure.message);
    }
    for (id, is_insert) in &planned {
        if failed.contains(id.as_str()) {
            continue;
        }
        if *is_insert {
            summary.inserts += 1;
        } else {
            summary.updates += 1;
        }
    }

    summary
}
