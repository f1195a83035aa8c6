use crate::domain::model::RawListing;
use crate::utils::error::{CatalogError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn field_str(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Parses one term dump: a JSON array of course objects.
pub fn parse_term_dump(data: &[u8]) -> Result<Vec<RawListing>> {
    let json: Value = serde_json::from_slice(data)?;
    let Value::Array(items) = json else {
        return Err(CatalogError::ValidationError {
            message: "corpus dump must be a JSON array".to_string(),
        });
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        if let Value::Object(obj) = item {
            records.push(RawListing {
                id: field_str(&obj, &["id", "course_id", "course"]).unwrap_or_default(),
                crosslist_code: field_str(&obj, &["crosslistCode", "crosslistings"])
                    .unwrap_or_default(),
                title: field_str(&obj, &["title", "long_title"]).unwrap_or_default(),
            });
        }
    }
    Ok(records)
}

/// Reads every `*.json` term dump in `dir`, in file-name order.
pub fn read_corpus_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<RawListing>> {
    let mut files: Vec<_> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();
    files.sort();

    let mut corpus = Vec::new();
    for path in &files {
        let data = fs::read(path)?;
        let records = parse_term_dump(&data)?;
        tracing::debug!("Loaded {} records from {}", records.len(), path.display());
        corpus.extend(records);
    }

    tracing::info!("📂 Loaded {} corpus records from {} term files", corpus.len(), files.len());
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_registrar_style_fields() {
        let data = br#"[
            {"course": "COS 126", "crosslistings": "COS 126 / EGR 126", "long_title": "Computer Science"},
            {"course_id": 2051, "crosslistings": ""},
            "not an object"
        ]"#;
        let records = parse_term_dump(data).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "COS 126");
        assert_eq!(records[0].crosslist_code, "COS 126 / EGR 126");
        assert_eq!(records[1].id, "2051");
        assert!(records[1].crosslist_code.is_empty());
    }

    #[test]
    fn test_non_array_dump_rejected() {
        assert!(parse_term_dump(br#"{"classes": []}"#).is_err());
    }

    #[test]
    fn test_read_corpus_dir_skips_other_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("1244.json"),
            r#"[{"id": "1", "crosslistings": "ART 100"}]"#,
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("1252.json"),
            r#"[{"id": "2", "crosslistings": "COS 126"}]"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let corpus = read_corpus_dir(temp_dir.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus[0].id, "1");
    }
}
