use crate::domain::model::{
    CanonicalCrosslistGroup, DataQualityWarning, DuplicateCode, Listing, NormalizationReport,
    RawListing,
};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

/// Administrative marker for records that are not real courses.
pub const DEFAULT_SENTINEL: &str = "NFO";

// 科目代碼與課號黏在一起，例如 MAT1010、CS101
static GLUED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Z]{2,5})(\d)").expect("valid glued-code regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// A crosslisting descriptor after formatting normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Descriptor {
    text: String,
    codes: Vec<String>,
}

impl Descriptor {
    fn parse(raw: &str) -> Option<Self> {
        let text = normalize_descriptor(raw);
        let codes: Vec<String> = text
            .split(['/', ','])
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect();

        if codes.is_empty() {
            return None;
        }
        Some(Self { text, codes })
    }

    fn primary(&self) -> &str {
        &self.codes[0]
    }
}

/// Collapses whitespace and separates subject letters from a glued catalog number.
pub fn normalize_descriptor(raw: &str) -> String {
    let collapsed = WHITESPACE.replace_all(raw.trim(), " ");
    GLUED_CODE.replace_all(&collapsed, "$1 $2").into_owned()
}

/// Locale-style ordering: alphanumerics compared case-insensitively first,
/// punctuation and spacing only break ties.
pub fn collate(a: &str, b: &str) -> Ordering {
    fn primary_weight(s: &str) -> impl Iterator<Item = char> + '_ {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
    }

    primary_weight(a)
        .cmp(primary_weight(b))
        .then_with(|| a.cmp(b))
}

fn is_sentinel(raw: &str, sentinels: &[String]) -> bool {
    raw.split(|c: char| !c.is_alphanumeric())
        .any(|token| sentinels.iter().any(|s| s == token))
}

/// Groups crosslisting descriptors under their primary code.
#[derive(Debug, Clone)]
pub struct CrosslistNormalizer {
    sentinels: Vec<String>,
}

impl Default for CrosslistNormalizer {
    fn default() -> Self {
        Self::new(vec![DEFAULT_SENTINEL.to_string()])
    }
}

impl CrosslistNormalizer {
    pub fn new(sentinels: Vec<String>) -> Self {
        Self { sentinels }
    }

    /// Builds the canonical group table from the corpus and the linking table
    /// from the persisted listings. Faults are reported, never corrected.
    pub fn normalize(&self, corpus: &[RawListing], persisted: &[Listing]) -> NormalizationReport {
        let mut warnings = Vec::new();
        let groups = self.reduce(corpus, &mut warnings);
        let integrity_faults = count_duplicate_groups(&groups, &mut warnings);
        let duplicates = build_linking_table(persisted);

        for duplicate in &duplicates {
            tracing::warn!("⚠️ Duplicate listing code {} shared by {:?}", duplicate.code, duplicate.ids);
            warnings.push(DataQualityWarning::DuplicatePersistedCode {
                code: duplicate.code.clone(),
            });
        }

        // 合併後 linked codes 重新排序，渲染字串需再排序一次
        let mut rendered: Vec<String> = groups.iter().map(ToString::to_string).collect();
        rendered.sort_by(|a, b| collate(a, b));

        NormalizationReport {
            groups: rendered,
            duplicates,
            integrity_faults,
            warnings,
        }
    }

    /// Extract, normalize, sort and merge adjacent descriptors sharing a primary code.
    pub fn reduce(
        &self,
        corpus: &[RawListing],
        warnings: &mut Vec<DataQualityWarning>,
    ) -> Vec<CanonicalCrosslistGroup> {
        let mut descriptors = Vec::with_capacity(corpus.len());

        for record in corpus {
            if is_sentinel(&record.crosslist_code, &self.sentinels) {
                continue;
            }
            match Descriptor::parse(&record.crosslist_code) {
                Some(descriptor) => descriptors.push(descriptor),
                None => {
                    tracing::warn!("⚠️ No crosslisting found for {}", record.id);
                    warnings.push(DataQualityWarning::MissingCrosslisting {
                        id: record.id.clone(),
                    });
                }
            }
        }

        descriptors.sort_by(|a, b| collate(&a.text, &b.text));

        let mut groups = Vec::new();
        let mut iter = descriptors.into_iter().peekable();

        while let Some(first) = iter.next() {
            let primary = first.primary().to_string();
            let mut linked: BTreeSet<String> = first.codes.into_iter().skip(1).collect();

            while let Some(next) = iter.next_if(|d| d.primary() == primary) {
                linked.extend(next.codes.into_iter().skip(1));
            }
            linked.remove(&primary);

            groups.push(CanonicalCrosslistGroup {
                primary_code: primary,
                linked_codes: linked.into_iter().collect(),
            });
        }

        tracing::debug!("Reduced corpus into {} canonical groups", groups.len());
        groups
    }
}

fn count_duplicate_groups(
    groups: &[CanonicalCrosslistGroup],
    warnings: &mut Vec<DataQualityWarning>,
) -> usize {
    let mut seen = HashSet::with_capacity(groups.len());
    let mut faults = 0;

    for group in groups {
        if !seen.insert(group.primary_code.as_str()) {
            faults += 1;
            tracing::warn!("⚠️ Duplicate canonical group for {}", group.primary_code);
            warnings.push(DataQualityWarning::DuplicateCanonicalGroup {
                primary_code: group.primary_code.clone(),
            });
        }
    }

    if faults > 0 {
        tracing::error!("❌ Found {} duplicate canonical groups", faults);
    }
    faults
}

/// Every persisted code carried by more than one listing, with the ids sharing it.
pub fn build_linking_table(listings: &[Listing]) -> Vec<DuplicateCode> {
    let mut sorted: Vec<&Listing> = listings.iter().collect();
    sorted.sort_by(|a, b| collate(&a.code, &b.code).then_with(|| a.id.cmp(&b.id)));

    let mut duplicates = Vec::new();
    for run in sorted.chunk_by(|a, b| a.code == b.code) {
        if run.len() > 1 {
            duplicates.push(DuplicateCode {
                code: run[0].code.clone(),
                ids: run.iter().map(|l| l.id.clone()).collect(),
            });
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TermCode;

    fn raw(id: &str, code: &str) -> RawListing {
        RawListing::new(id, code, format!("Title {}", id))
    }

    fn listing(id: &str, code: &str) -> Listing {
        Listing::first_seen(&raw(id, code), TermCode(1244))
    }

    #[test]
    fn test_normalize_inserts_space_after_subject() {
        assert_eq!(normalize_descriptor("MAT1010"), "MAT 1010");
        assert_eq!(normalize_descriptor("CS101 / MATH201"), "CS 101 / MATH 201");
        assert_eq!(normalize_descriptor("  COS  126 "), "COS 126");
        assert_eq!(normalize_descriptor("COS 126"), "COS 126");
    }

    #[test]
    fn test_slash_and_comma_descriptors_merge() {
        let corpus = vec![raw("1", "CS101 / MATH201"), raw("2", "CS 101, PHIL 201")];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert_eq!(report.groups, vec!["CS 101 / MATH 201 / PHIL 201"]);
        assert_eq!(report.integrity_faults, 0);
    }

    #[test]
    fn test_linked_codes_deduplicated_and_sorted() {
        let corpus = vec![
            raw("1", "ECO 300 / POL 300 / HIS 300"),
            raw("2", "ECO 300 / HIS 300"),
            raw("3", "ECO 300"),
        ];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert_eq!(report.groups, vec!["ECO 300 / HIS 300 / POL 300"]);
    }

    #[test]
    fn test_primary_without_links_is_bare() {
        let corpus = vec![raw("1", "COS 126"), raw("2", "COS 126")];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert_eq!(report.groups, vec!["COS 126"]);
    }

    #[test]
    fn test_prefix_sharing_codes_stay_separate() {
        let corpus = vec![raw("1", "CS 101 / MATH 201"), raw("2", "CS 1010")];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert_eq!(report.groups, vec!["CS 1010", "CS 101 / MATH 201"]);
        assert_eq!(report.integrity_faults, 0);
    }

    #[test]
    fn test_non_adjacent_primary_reported_as_fault() {
        let corpus = vec![
            raw("1", "CS 101 / MATH 201"),
            raw("2", "CS 101N"),
            raw("3", "CS 101, PHIL 201"),
        ];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert!(report.integrity_faults >= 1);
        assert_eq!(report.groups.len(), 3);
        assert!(report.warnings.contains(&DataQualityWarning::DuplicateCanonicalGroup {
            primary_code: "CS 101".to_string()
        }));
    }

    #[test]
    fn test_empty_descriptor_warns_and_sentinel_is_silent() {
        let corpus = vec![raw("1", ""), raw("2", "NFO 999"), raw("3", "ART 100")];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert_eq!(report.groups, vec!["ART 100"]);
        assert_eq!(
            report.warnings,
            vec![DataQualityWarning::MissingCrosslisting { id: "1".to_string() }]
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let corpus = vec![
            raw("1", "PHI201 / CLA 201"),
            raw("2", "MAE 206"),
            raw("3", "PHI 201, REL 201"),
            raw("4", "AAS 230 / ENG 230"),
        ];
        let normalizer = CrosslistNormalizer::default();

        let first = normalizer.normalize(&corpus, &[]);
        let second = normalizer.normalize(&corpus, &[]);
        assert_eq!(first.groups, second.groups);
    }

    #[test]
    fn test_groups_sorted_after_linked_codes_reordered() {
        let corpus = vec![raw("1", "AB 1 / ZZ 9 / CC 2"), raw("2", "AB 1D")];
        let report = CrosslistNormalizer::default().normalize(&corpus, &[]);

        assert_eq!(report.groups, vec!["AB 1 / CC 2 / ZZ 9", "AB 1D"]);

        let mut sorted = report.groups.clone();
        sorted.sort_by(|a, b| collate(a, b));
        assert_eq!(report.groups, sorted);
    }

    #[test]
    fn test_linking_table_reports_shared_codes() {
        let listings = vec![
            listing("003", "COS 126"),
            listing("001", "ART 100"),
            listing("002", "COS 126"),
            listing("004", "COS 126"),
        ];

        let duplicates = build_linking_table(&listings);
        assert_eq!(
            duplicates,
            vec![DuplicateCode {
                code: "COS 126".to_string(),
                ids: vec!["002".to_string(), "003".to_string(), "004".to_string()],
            }]
        );
    }
}
