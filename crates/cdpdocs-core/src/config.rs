//! Configuration loader and typed settings.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_SEARCH__TOP_K=5`).
//! Paths accept `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::error::{Error, Result};
use crate::types::canonical_platform;

/// Tantivy refuses writer arenas smaller than this.
pub const MIN_WRITER_MEMORY_BYTES: usize = 15_000_000;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same layering as [`Config::load`], reading the TOML files from `base`.
    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        Ok(Self { figment })
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index: IndexSettings,
    pub search: SearchSettings,
    pub embedder: EmbedderSettings,
    pub text: TextSettings,
    pub cache: CacheSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.index.vector_dimension == 0 {
            return Err(Error::InvalidConfig("index.vector_dimension must be > 0".into()));
        }
        check_weight("search.semantic_weight", self.search.semantic_weight)?;
        if self.search.top_k == 0 {
            return Err(Error::InvalidConfig("search.top_k must be > 0".into()));
        }
        for (platform, o) in &self.search.platforms {
            if let Some(w) = o.semantic_weight {
                check_weight(&format!("search.platforms.{platform}.semantic_weight"), w)?;
            }
            if o.top_k == Some(0) {
                return Err(Error::InvalidConfig(format!("search.platforms.{platform}.top_k must be > 0")));
            }
        }
        let b = &self.search.boosts;
        for (name, v) in [("title", b.title), ("section", b.section), ("content", b.content)] {
            if !(v.is_finite() && v > 0.0) {
                return Err(Error::InvalidConfig(format!("search.boosts.{name} must be a positive number")));
            }
        }
        if self.cache.capacity == 0 {
            return Err(Error::InvalidConfig("cache.capacity must be > 0".into()));
        }
        if self.text.writer_memory_bytes < MIN_WRITER_MEMORY_BYTES {
            return Err(Error::InvalidConfig(format!(
                "text.writer_memory_bytes must be at least {MIN_WRITER_MEMORY_BYTES}"
            )));
        }
        Ok(())
    }
}

fn check_weight(key: &str, w: f32) -> Result<()> {
    if (0.0..=1.0).contains(&w) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{key} must be within [0, 1], got {w}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub vector_dimension: usize,
    /// Absent means everything lives in memory for the life of the process.
    pub data_dir: Option<String>,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { vector_dimension: 768, data_dir: None }
    }
}

impl IndexSettings {
    pub fn data_path(&self) -> Option<PathBuf> {
        self.data_dir.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub semantic_weight: f32,
    pub top_k: usize,
    pub boosts: Boosts,
    pub platforms: BTreeMap<String, PlatformOverrides>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { semantic_weight: 0.5, top_k: 3, boosts: Boosts::default(), platforms: BTreeMap::new() }
    }
}

impl SearchSettings {
    fn overrides(&self, platform: &str) -> Option<&PlatformOverrides> {
        let platform = canonical_platform(platform);
        self.platforms.iter().find(|(k, _)| canonical_platform(k) == platform).map(|(_, v)| v)
    }

    pub fn semantic_weight_for(&self, platform: &str) -> f32 {
        self.overrides(platform).and_then(|o| o.semantic_weight).unwrap_or(self.semantic_weight)
    }

    pub fn top_k_for(&self, platform: &str) -> usize {
        self.overrides(platform).and_then(|o| o.top_k).unwrap_or(self.top_k)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformOverrides {
    pub semantic_weight: Option<f32>,
    pub top_k: Option<usize>,
}

/// Multipliers applied to keyword matches per field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Boosts {
    pub title: f32,
    pub section: f32,
    pub content: f32,
}

impl Default for Boosts {
    fn default() -> Self {
        Self { title: 2.0, section: 1.5, content: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    #[default]
    Hash,
    Model,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderSettings {
    pub kind: EmbedderKind,
    pub model_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    pub writer_memory_bytes: usize,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self { writer_memory_bytes: 20_000_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    /// Maximum number of cached answers.
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl_secs: 3600, capacity: DEFAULT_CACHE_CAPACITY }
    }
}

/// `~` and `$VAR` / `${VAR}` expanded. If a variable is unset only the tilde
/// is expanded and the rest is kept as written. Never canonicalizes.
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let raw = input.as_ref();
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
    }
}
