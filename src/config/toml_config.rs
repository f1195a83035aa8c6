use crate::core::crosslist::DEFAULT_SENTINEL;
use crate::core::term_order::TermOrder;
use crate::domain::model::TermCode;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var regex"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub registrar: RegistrarConfig,
    pub terms: TermsConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    pub term_url: String,
    pub auth_bearer: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermsConfig {
    /// Most recent first.
    pub order: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    #[serde(default = "default_listings_file")]
    pub listings_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: String,
    #[serde(default = "default_resolve_dir")]
    pub output_path: String,
    #[serde(default = "default_sentinels")]
    pub sentinels: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            output_path: default_resolve_dir(),
            sentinels: default_sentinels(),
        }
    }
}

fn default_listings_file() -> String {
    "listings.json".to_string()
}

fn default_corpus_dir() -> String {
    "./coursedata".to_string()
}

fn default_resolve_dir() -> String {
    "./resolve".to_string()
}

fn default_sentinels() -> Vec<String> {
    vec![DEFAULT_SENTINEL.to_string()]
}

impl CatalogConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| CatalogError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${REGISTRAR_AUTH_BEARER})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn term_order(&self) -> Result<TermOrder> {
        TermOrder::from_most_recent(self.terms.order.iter().copied().map(TermCode))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.registrar.timeout_seconds.unwrap_or(30))
    }

    pub fn auth_bearer(&self) -> Option<String> {
        self.registrar
            .auth_bearer
            .clone()
            .filter(|bearer| !bearer.trim().is_empty() && !bearer.starts_with("${"))
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("registrar.term_url", &self.registrar.term_url)?;
        validation::validate_path("store.path", &self.store.path)?;
        validation::validate_non_empty_string("store.listings_file", &self.store.listings_file)?;
        validation::validate_path("normalize.corpus_dir", &self.normalize.corpus_dir)?;
        validation::validate_path("normalize.output_path", &self.normalize.output_path)?;

        if let Some(timeout) = self.registrar.timeout_seconds {
            validation::validate_range("registrar.timeout_seconds", timeout, 1, 600)?;
        }

        if self.terms.order.is_empty() {
            return Err(CatalogError::MissingConfigError {
                field: "terms.order".to_string(),
            });
        }
        self.term_order()?;

        Ok(())
    }
}

impl Validate for CatalogConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
