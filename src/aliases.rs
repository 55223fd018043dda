//! Localized-name to species-slug map.
//!
//! A small map ships with the binary; a full one can be generated from the
//! species list with [`AliasBuilder`] and passed back in with `--aliases`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use futures_util::{StreamExt, TryStreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{SpeciesSource, localized_name};
use crate::config::Config;
use crate::error::Result;

const BUILTIN: &str = include_str!("../data/aliases.json");

/// Species list size requested when building a map
pub const DEFAULT_INDEX_LIMIT: u32 = 1100;

/// Concurrent species fetches while building a map
const FETCH_CONCURRENCY: usize = 16;

/// Lowercased localized name -> species slug
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameAliases {
    entries: BTreeMap<String, String>,
}

impl NameAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map bundled with the crate
    pub fn builtin() -> Result<Self> {
        let aliases: Self = serde_json::from_str(BUILTIN)?;
        Ok(aliases.normalized())
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let aliases: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), entries = aliases.len(), "loaded alias map");
        Ok(aliases.normalized())
    }

    /// The file named by `config.aliases`, or the bundled map
    pub fn load(config: &Config) -> Result<Self> {
        match &config.aliases {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    /// Slug for `input`; unknown names pass through trimmed and lowercased
    pub fn resolve(&self, input: &str) -> String {
        let key = input.trim().to_lowercase();
        match self.entries.get(&key) {
            Some(slug) => slug.clone(),
            None => key,
        }
    }

    pub fn insert(&mut self, name: &str, slug: &str) {
        self.entries.insert(name.to_lowercase(), slug.to_lowercase());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")?;
        Ok(())
    }

    fn normalized(self) -> Self {
        let mut out = Self::new();
        for (name, slug) in &self.entries {
            out.insert(name, slug);
        }
        out
    }
}

/// Rebuilds a [`NameAliases`] map from the species list
pub struct AliasBuilder<'a, S: SpeciesSource + ?Sized> {
    source: &'a S,
    lang: &'a str,
    limit: u32,
}

impl<'a, S: SpeciesSource + ?Sized> AliasBuilder<'a, S> {
    pub fn new(source: &'a S, lang: &'a str) -> Self {
        Self {
            source,
            lang,
            limit: DEFAULT_INDEX_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Fetch every listed species and map its name in `lang` to its slug.
    /// Species without a name in that language are skipped.
    pub async fn build(&self) -> Result<NameAliases> {
        let index = self.source.species_index(self.limit).await?;
        info!(species = index.results.len(), lang = self.lang, "building alias map");

        let species: Vec<_> = stream::iter(&index.results)
            .map(|entry| self.source.species(&entry.name))
            .buffer_unordered(FETCH_CONCURRENCY)
            .try_collect()
            .await?;

        let mut aliases = NameAliases::new();
        for record in &species {
            if let Some(name) = localized_name(&record.names, self.lang) {
                aliases.insert(name, &record.name);
            }
        }
        info!(entries = aliases.len(), "built alias map");
        Ok(aliases)
    }
}
