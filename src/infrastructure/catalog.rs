//! File-backed monster catalog loader

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::application::ports::outbound::CatalogPort;
use crate::domain::entities::{MonsterCatalog, MonsterMetadata};

/// Loads the catalog from a JSON document on disk.
///
/// The document is the output of the stat-block extraction pipeline: a list
/// of per-monster metadata records, optionally accompanied by the keyword
/// taxonomy. When the taxonomy is absent it is derived as the union of the
/// monsters' own keywords.
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    /// Full document with an explicit taxonomy
    WithTaxonomy {
        monsters: Vec<MonsterMetadata>,
        #[serde(default)]
        theme_keywords: Vec<String>,
    },
    /// Bare list of monster records
    List(Vec<MonsterMetadata>),
}

impl CatalogDocument {
    fn into_catalog(self) -> MonsterCatalog {
        let (monsters, mut theme_keywords) = match self {
            Self::WithTaxonomy {
                monsters,
                theme_keywords,
            } => (monsters, theme_keywords),
            Self::List(monsters) => (monsters, Vec::new()),
        };

        if theme_keywords.is_empty() {
            theme_keywords = monsters
                .iter()
                .flat_map(|m| m.theme_keywords.iter().cloned())
                .collect();
            theme_keywords.sort();
            theme_keywords.dedup();
        }

        MonsterCatalog {
            monsters,
            theme_keywords,
        }
    }
}

#[async_trait]
impl CatalogPort for FileCatalog {
    async fn load(&self) -> Result<MonsterCatalog> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read catalog file {}", self.path.display()))?;
        let document: CatalogDocument = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse catalog file {}", self.path.display()))?;
        Ok(document.into_catalog())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_list_derives_taxonomy() {
        let raw = r#"[
            {"file": "ghoul.html", "name": "Ghoul", "cr": "1",
             "creature_type": "Undead", "combat_role": "striker",
             "theme_keywords": ["undead", "graveyard"], "summary": ""},
            {"file": "zombie.html", "name": "Zombie", "cr": "1/4",
             "creature_type": "Undead", "combat_role": "tank",
             "theme_keywords": ["undead"], "summary": ""}
        ]"#;
        let document: CatalogDocument = serde_json::from_str(raw).unwrap();
        let catalog = document.into_catalog();

        assert_eq!(catalog.monsters.len(), 2);
        assert_eq!(catalog.theme_keywords, vec!["graveyard", "undead"]);
    }

    #[test]
    fn test_explicit_taxonomy_preserved() {
        let raw = r#"{
            "monsters": [],
            "theme_keywords": ["undead", "urban", "wilderness"]
        }"#;
        let document: CatalogDocument = serde_json::from_str(raw).unwrap();
        let catalog = document.into_catalog();
        assert_eq!(catalog.theme_keywords.len(), 3);
    }
}
