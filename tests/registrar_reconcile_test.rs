use anyhow::Result;
use catalog_etl::{
    CatalogEngine, CatalogError, HttpRegistrarFeed, JsonListingStore, LocalStorage, TermCode,
    TermOrder,
};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn registrar_body(classes: serde_json::Value) -> serde_json::Value {
    serde_json::json!({ "classes": { "class": classes } })
}

fn order() -> TermOrder {
    TermOrder::from_most_recent([TermCode(1252), TermCode(1244), TermCode(1242)]).unwrap()
}

/// 兩個學期依序匯入，後抓到較舊學期時補上 pen_term
#[tokio::test]
async fn test_two_terms_through_http_and_json_store() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let newest = server.mock(|when, then| {
        when.method(GET)
            .path("/courses")
            .query_param("term", "1252")
            .header("Authorization", "Bearer test-token");
        then.status(200).json_body(registrar_body(serde_json::json!([
            {"course_id": "001", "crosslistings": "COS 126 / EGR 126", "long_title": "Computer Science", "topic_title": null},
            {"course_id": "002", "crosslistings": "HUM 216", "long_title": "Special Topics", "topic_title": "Epic Poetry"},
            {"course_id": "002", "crosslistings": "HUM 216", "long_title": "Special Topics", "topic_title": "Epic Poetry"}
        ])));
    });
    let older = server.mock(|when, then| {
        when.method(GET)
            .path("/courses")
            .query_param("term", "1242")
            .header("Authorization", "Bearer test-token");
        then.status(200).json_body(registrar_body(serde_json::json!([
            {"course_id": "001", "crosslistings": "COS 126", "long_title": "Intro to Programming", "topic_title": null},
            {"course_id": "003", "crosslistings": "ART 100", "long_title": "Drawing", "topic_title": null}
        ])));
    });

    let feed = HttpRegistrarFeed::new(server.url("/courses?term="), Some("Bearer test-token".to_string()))
        .with_timeout(Duration::from_secs(5));
    let store = JsonListingStore::new(LocalStorage::new(temp_dir.path()), "listings.json");
    let engine = CatalogEngine::new(feed, store, order());

    let first = engine.reconcile_term(TermCode(1252)).await?;
    assert_eq!(first.inserts, 2);
    assert!(first.is_clean());

    let second = engine.reconcile_term(TermCode(1242)).await?;
    assert_eq!(second.inserts, 1);
    assert_eq!(second.updates, 1);
    assert_eq!(second.unchanged, 0);

    newest.assert();
    older.assert();

    let raw = std::fs::read(temp_dir.path().join("listings.json"))?;
    let listings: Vec<catalog_etl::Listing> = serde_json::from_slice(&raw)?;
    assert_eq!(listings.len(), 3);

    let cos = listings.iter().find(|l| l.id == "001").unwrap();
    assert_eq!(cos.title, "Computer Science");
    assert_eq!(cos.code, "COS 126 / EGR 126");
    assert_eq!(cos.ult_term, TermCode(1252));
    assert_eq!(cos.pen_term, Some(TermCode(1242)));
    assert_eq!(cos.aka, Some(vec!["Intro to Programming".to_string()]));

    let hum = listings.iter().find(|l| l.id == "002").unwrap();
    assert_eq!(hum.title, "Special Topics: Epic Poetry");

    Ok(())
}

#[tokio::test]
async fn test_reconciling_same_term_twice_is_unchanged() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/courses").query_param("term", "1244");
        then.status(200).json_body(registrar_body(serde_json::json!([
            {"course_id": "001", "crosslistings": "COS 126", "long_title": "Computer Science", "topic_title": null}
        ])));
    });

    let feed = HttpRegistrarFeed::new(server.url("/courses?term="), None);
    let store = JsonListingStore::new(LocalStorage::new(temp_dir.path()), "listings.json");
    let engine = CatalogEngine::new(feed, store, order());

    engine.reconcile_term(TermCode(1244)).await?;
    let again = engine.reconcile_term(TermCode(1244)).await?;

    assert_eq!(again.inserts, 0);
    assert_eq!(again.updates, 0);
    assert_eq!(again.unchanged, 1);
    Ok(())
}

#[tokio::test]
async fn test_registrar_error_is_fetch_failure_and_writes_nothing() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    let unauthorized = server.mock(|when, then| {
        when.method(GET).path("/courses");
        then.status(401).body("unauthorized");
    });

    let feed = HttpRegistrarFeed::new(server.url("/courses?term="), Some("Bearer stale".to_string()));
    let store = JsonListingStore::new(LocalStorage::new(temp_dir.path()), "listings.json");
    let engine = CatalogEngine::new(feed, store, order());

    let result = engine.reconcile_term(TermCode(1244)).await;

    unauthorized.assert();
    match result {
        Err(CatalogError::FetchFailure { term, message }) => {
            assert_eq!(term, TermCode(1244));
            assert!(message.contains("401"));
        }
        other => panic!("expected fetch failure, got {:?}", other),
    }
    assert!(!temp_dir.path().join("listings.json").exists());
    Ok(())
}

#[tokio::test]
async fn test_reconcile_all_stops_at_first_fetch_failure() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/courses").query_param("term", "1252");
        then.status(200).json_body(registrar_body(serde_json::json!([
            {"course_id": "001", "crosslistings": "COS 126", "long_title": "Computer Science", "topic_title": null}
        ])));
    });
    server.mock(|when, then| {
        when.method(GET).path("/courses").query_param("term", "1244");
        then.status(500);
    });
    let never_called = server.mock(|when, then| {
        when.method(GET).path("/courses").query_param("term", "1242");
        then.status(200).json_body(registrar_body(serde_json::json!([])));
    });

    let feed = HttpRegistrarFeed::new(server.url("/courses?term="), None);
    let store = JsonListingStore::new(LocalStorage::new(temp_dir.path()), "listings.json");
    let engine = CatalogEngine::new(feed, store, order());

    let result = engine.reconcile_all_terms().await;
    assert!(matches!(result, Err(CatalogError::FetchFailure { .. })));
    never_called.assert_hits(0);

    // 第一個學期已寫入
    let raw = std::fs::read(temp_dir.path().join("listings.json"))?;
    let listings: Vec<catalog_etl::Listing> = serde_json::from_slice(&raw)?;
    assert_eq!(listings.len(), 1);
    Ok(())
}
