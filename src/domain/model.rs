use serde::{Deserialize, Serialize};
use std::fmt;

/// Registrar term code (e.g. `1244`). Recency comes from `TermOrder`, never from the number itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermCode(pub u32);

impl fmt::Display for TermCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One registrar record for one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListing {
    #[serde(alias = "course_id")]
    pub id: String,
    #[serde(alias = "crosslistings", default)]
    pub crosslist_code: String,
    #[serde(default)]
    pub title: String,
}

impl RawListing {
    pub fn new(id: impl Into<String>, crosslist_code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            crosslist_code: crosslist_code.into(),
            title: title.into(),
        }
    }
}

/// Persisted listing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub aka: Option<Vec<String>>,
    pub ult_term: TermCode,
    #[serde(default)]
    pub pen_term: Option<TermCode>,
}

impl Listing {
    /// First observation of a listing.
    pub fn first_seen(raw: &RawListing, term: TermCode) -> Self {
        Self {
            id: raw.id.clone(),
            code: raw.crosslist_code.clone(),
            title: raw.title.clone(),
            aka: None,
            ult_term: term,
            pen_term: None,
        }
    }

    pub fn changes(&self) -> ListingChanges {
        ListingChanges {
            code: self.code.clone(),
            title: self.title.clone(),
            aka: self.aka.clone(),
            ult_term: self.ult_term,
            pen_term: self.pen_term,
        }
    }
}

/// Mutable columns written by `ListingStore::update_listing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingChanges {
    pub code: String,
    pub title: String,
    pub aka: Option<Vec<String>>,
    pub ult_term: TermCode,
    pub pen_term: Option<TermCode>,
}

impl ListingChanges {
    pub fn apply_to(self, listing: &mut Listing) {
        listing.code = self.code;
        listing.title = self.title;
        listing.aka = self.aka;
        listing.ult_term = self.ult_term;
        listing.pen_term = self.pen_term;
    }
}

/// Merged crosslisting: a primary code and every other code it is known by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCrosslistGroup {
    pub primary_code: String,
    pub linked_codes: Vec<String>,
}

impl fmt::Display for CanonicalCrosslistGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary_code)?;
        for code in &self.linked_codes {
            write!(f, " / {}", code)?;
        }
        Ok(())
    }
}

/// Persisted listings sharing the same `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateCode {
    pub code: String,
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataQualityWarning {
    MissingCrosslisting { id: String },
    DuplicateCanonicalGroup { primary_code: String },
    DuplicatePersistedCode { code: String },
    UnrankedTerm { id: String, term: TermCode },
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataQualityWarning::MissingCrosslisting { id } => {
                write!(f, "No crosslisting found for {}", id)
            }
            DataQualityWarning::DuplicateCanonicalGroup { primary_code } => {
                write!(f, "Duplicate canonical group for primary code {}", primary_code)
            }
            DataQualityWarning::DuplicatePersistedCode { code } => {
                write!(f, "Multiple persisted listings share code {}", code)
            }
            DataQualityWarning::UnrankedTerm { id, term } => {
                write!(f, "Listing {} references term {} outside the term order", id, term)
            }
        }
    }
}

/// Output of the crosslisting normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    pub groups: Vec<String>,
    pub duplicates: Vec<DuplicateCode>,
    pub integrity_faults: usize,
    pub warnings: Vec<DataQualityWarning>,
}

/// Reconciliation decision for a single incoming record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOp {
    Insert(Listing),
    Update(Listing),
    NoOp,
}

/// Store write produced by applying a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingMutation {
    Insert(Listing),
    Update { id: String, changes: ListingChanges },
}

impl ListingMutation {
    pub fn id(&self) -> &str {
        match self {
            ListingMutation::Insert(listing) => &listing.id,
            ListingMutation::Update { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationFailure {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    pub term: Option<TermCode>,
    pub inserts: usize,
    pub updates: usize,
    pub unchanged: usize,
    pub failures: Vec<MutationFailure>,
    pub warnings: Vec<DataQualityWarning>,
}

impl ReconcileSummary {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
