use crate::domain::model::TermCode;
use crate::utils::error::{CatalogError, Result};
use std::collections::HashMap;

/// Total recency order over terms. Rank 0 is the most recent term.
#[derive(Debug, Clone, Default)]
pub struct TermOrder {
    terms: Vec<TermCode>,
    ranks: HashMap<TermCode, usize>,
}

impl TermOrder {
    /// 由新到舊排列的學期清單建立排序
    pub fn from_most_recent(terms: impl IntoIterator<Item = TermCode>) -> Result<Self> {
        let terms: Vec<TermCode> = terms.into_iter().collect();
        let mut ranks = HashMap::with_capacity(terms.len());

        for (rank, term) in terms.iter().enumerate() {
            if ranks.insert(*term, rank).is_some() {
                return Err(CatalogError::InvalidConfigValueError {
                    field: "terms.order".to_string(),
                    value: term.to_string(),
                    reason: "Term appears more than once".to_string(),
                });
            }
        }

        Ok(Self { terms, ranks })
    }

    pub fn rank(&self, term: TermCode) -> Option<usize> {
        self.ranks.get(&term).copied()
    }

    pub fn require_rank(&self, term: TermCode) -> Result<usize> {
        self.rank(term).ok_or(CatalogError::UnknownTerm { term })
    }

    /// Terms from most recent to oldest.
    pub fn terms(&self) -> &[TermCode] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
