use crate::domain::model::{RawListing, TermCode};
use crate::domain::ports::RegistrarFeed;
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RegistrarResponse {
    classes: RegistrarClasses,
}

#[derive(Debug, Deserialize)]
struct RegistrarClasses {
    #[serde(default)]
    class: Vec<RegistrarClass>,
}

/// 課號可能是字串或數字
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CourseId {
    Text(String),
    Number(serde_json::Number),
}

impl CourseId {
    fn into_string(self) -> String {
        match self {
            CourseId::Text(s) => s,
            CourseId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistrarClass {
    #[serde(default)]
    course_id: Option<CourseId>,
    #[serde(default)]
    crosslistings: Option<String>,
    #[serde(default)]
    long_title: Option<String>,
    #[serde(default)]
    topic_title: Option<String>,
}

impl RegistrarClass {
    /// Rows without a course id are dropped.
    fn into_raw(self) -> Option<RawListing> {
        let id = self.course_id.map(CourseId::into_string).filter(|id| !id.is_empty())?;
        let long_title = self.long_title.unwrap_or_default();
        // 有主題標題時附加在長標題之後
        let title = match self.topic_title {
            Some(topic) if !topic.is_empty() => format!("{}: {}", long_title, topic),
            _ => long_title,
        };
        Some(RawListing {
            id,
            crosslist_code: self.crosslistings.unwrap_or_default(),
            title,
        })
    }
}

fn into_raw_listings(classes: Vec<RegistrarClass>, term: TermCode) -> Vec<RawListing> {
    let total = classes.len();
    let records: Vec<RawListing> = classes.into_iter().filter_map(RegistrarClass::into_raw).collect();
    if records.len() < total {
        tracing::warn!(
            "⚠️ Skipped {} registrar rows without course_id for term {}",
            total - records.len(),
            term
        );
    }
    records
}

/// Registrar course feed over HTTP, one GET per term.
pub struct HttpRegistrarFeed {
    client: Client,
    term_url: String,
    auth_bearer: Option<String>,
    timeout: Option<Duration>,
}

impl HttpRegistrarFeed {
    pub fn new(term_url: impl Into<String>, auth_bearer: Option<String>) -> Self {
        Self {
            client: Client::new(),
            term_url: term_url.into(),
            auth_bearer,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn term_endpoint(&self, term: TermCode) -> String {
        format!("{}{}", self.term_url, term)
    }

    async fn fetch_raw(&self, term: TermCode) -> Result<Vec<RawListing>> {
        let endpoint = self.term_endpoint(term);
        let mut request = self.client.get(&endpoint);

        if let Some(bearer) = &self.auth_bearer {
            request = request.header("Authorization", bearer);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        tracing::debug!("Making registrar request to: {}", endpoint);
        let response = request.send().await?;
        tracing::debug!("Registrar response status: {}", response.status());

        if !response.status().is_success() {
            return Err(CatalogError::FetchFailure {
                term,
                message: format!("registrar returned {}", response.status()),
            });
        }

        let body: RegistrarResponse = response.json().await?;
        Ok(into_raw_listings(body.classes.class, term))
    }
}

#[async_trait]
impl RegistrarFeed for HttpRegistrarFeed {
    async fn fetch_term(&self, term: TermCode) -> Result<Vec<RawListing>> {
        match self.fetch_raw(term).await {
            Ok(records) => {
                tracing::info!("📡 Fetched {} registrar records for term {}", records.len(), term);
                Ok(records)
            }
            Err(CatalogError::ApiError(e)) => Err(CatalogError::FetchFailure {
                term,
                message: e.to_string(),
            }),
            Err(e) => Err(e),
        }
    }
}
