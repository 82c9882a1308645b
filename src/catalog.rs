//! Dilemma catalog: typed, validated, read-only after load.
//!
//! The built-in dataset ships as `data/dilemmas.json` and is compiled into the
//! binary. A replacement catalog can be loaded from a JSON file with the same
//! shape. Either way the records are checked once at load time:
//! - dilemma ids are unique and non-empty
//! - every dilemma has at least one choice
//! - choice keys are a single letter and unique within their dilemma
//! - scores sit on the fixed 0..=3 scale

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, TrainerError};

/// Highest score a single choice can carry.
pub const MAX_CHOICE_SCORE: u8 = 3;

const BUILTIN_CATALOG: &str = include_str!("../data/dilemmas.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub key: String,
    pub label: String,
    pub score: u8,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dilemma {
    pub id: String,
    pub title: String,
    pub context: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Dilemma {
    pub fn choice(&self, key: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.key == key)
    }

    /// Labels in the "A. Refuse, document..." form a picker would show.
    pub fn choice_labels(&self) -> Vec<String> {
        self.choices
            .iter()
            .map(|c| format!("{}. {}", c.key, c.label))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TrainerError::InvalidCatalog("dilemma with empty id".to_string()));
        }
        if self.choices.is_empty() {
            return Err(TrainerError::InvalidCatalog(format!(
                "dilemma {} has no choices",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for choice in &self.choices {
            let mut chars = choice.key.chars();
            let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
            if !single_letter {
                return Err(TrainerError::InvalidCatalog(format!(
                    "dilemma {}: choice key {:?} is not a single letter",
                    self.id, choice.key
                )));
            }
            if !seen.insert(choice.key.as_str()) {
                return Err(TrainerError::InvalidCatalog(format!(
                    "dilemma {}: duplicate choice key {}",
                    self.id, choice.key
                )));
            }
            if choice.score > MAX_CHOICE_SCORE {
                return Err(TrainerError::InvalidCatalog(format!(
                    "dilemma {}: choice {} score {} outside 0..={}",
                    self.id, choice.key, choice.score, MAX_CHOICE_SCORE
                )));
            }
        }
        Ok(())
    }
}

/// Ordered, immutable collection of dilemmas. Share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Catalog {
    dilemmas: Vec<Dilemma>,
    fingerprint: String,
}

impl Catalog {
    /// Validate and wrap an ordered list of dilemmas.
    pub fn new(dilemmas: Vec<Dilemma>) -> Result<Self> {
        let encoded = serde_json::to_vec(&dilemmas)
            .map_err(|e| TrainerError::InvalidCatalog(e.to_string()))?;
        Self::with_fingerprint(dilemmas, sha256_hex(&encoded))
    }

    fn with_fingerprint(dilemmas: Vec<Dilemma>, fingerprint: String) -> Result<Self> {
        if dilemmas.is_empty() {
            return Err(TrainerError::InvalidCatalog("catalog is empty".to_string()));
        }
        let mut ids = HashSet::new();
        for d in &dilemmas {
            d.validate()?;
            if !ids.insert(d.id.as_str()) {
                return Err(TrainerError::InvalidCatalog(format!(
                    "duplicate dilemma id {}",
                    d.id
                )));
            }
        }
        Ok(Self { dilemmas, fingerprint })
    }

    /// The eight scenarios bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let dilemmas: Vec<Dilemma> = serde_json::from_str(raw)
            .map_err(|e| TrainerError::InvalidCatalog(e.to_string()))?;
        Self::with_fingerprint(dilemmas, sha256_hex(raw.as_bytes()))
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog {}", path.display()))?;
        let catalog = Self::from_json_str(&raw)
            .with_context(|| format!("loading catalog {}", path.display()))?;
        Ok(catalog)
    }

    pub fn get_all(&self) -> &[Dilemma] {
        &self.dilemmas
    }

    pub fn get_by_id(&self, id: &str) -> Result<&Dilemma> {
        self.dilemmas
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| TrainerError::NotFound { id: id.to_string() })
    }

    pub fn get_by_title(&self, title: &str) -> Option<&Dilemma> {
        self.dilemmas.iter().find(|d| d.title == title)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.dilemmas.iter().position(|d| d.id == id)
    }

    pub fn titles(&self) -> Vec<&str> {
        self.dilemmas.iter().map(|d| d.title.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.dilemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dilemmas.is_empty()
    }

    /// SHA-256 of the source the catalog was loaded from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(key: &str, score: u8) -> Choice {
        Choice {
            key: key.to_string(),
            label: format!("label {}", key),
            score,
            feedback: format!("feedback {}", key),
        }
    }

    fn dilemma(id: &str, choices: Vec<Choice>) -> Dilemma {
        Dilemma {
            id: id.to_string(),
            title: format!("title {}", id),
            context: "context".to_string(),
            choices,
            resources: vec![],
        }
    }

    #[test]
    fn builtin_catalog_loads_in_order() {
        let cat = Catalog::builtin().unwrap();
        assert_eq!(cat.len(), 8);
        assert_eq!(cat.get_all()[0].id, "bribe_supervisor_email");
        assert_eq!(cat.get_all()[7].id, "nepotism_hidden_subcontractor");
        assert_eq!(cat.fingerprint().len(), 64);
    }

    #[test]
    fn builtin_choices_are_unique_and_in_range() {
        let cat = Catalog::builtin().unwrap();
        for d in cat.get_all() {
            let keys: HashSet<_> = d.choices.iter().map(|c| c.key.as_str()).collect();
            assert_eq!(keys.len(), d.choices.len(), "duplicate key in {}", d.id);
            assert!(d.choices.iter().all(|c| c.score <= MAX_CHOICE_SCORE));
            assert!(!d.resources.is_empty());
        }
    }

    #[test]
    fn get_by_id_reports_not_found() {
        let cat = Catalog::builtin().unwrap();
        assert!(cat.get_by_id("gift_vendor_conference").is_ok());
        assert_eq!(
            cat.get_by_id("nope").unwrap_err(),
            TrainerError::NotFound { id: "nope".to_string() }
        );
    }

    #[test]
    fn rejects_duplicate_choice_keys() {
        let err = Catalog::new(vec![dilemma("x", vec![choice("A", 1), choice("A", 2)])]).unwrap_err();
        assert!(matches!(err, TrainerError::InvalidCatalog(_)));
    }

    #[test]
    fn rejects_out_of_range_score() {
        let err = Catalog::new(vec![dilemma("x", vec![choice("A", 4)])]).unwrap_err();
        assert!(matches!(err, TrainerError::InvalidCatalog(_)));
    }

    #[test]
    fn rejects_empty_choices_and_empty_catalog() {
        assert!(Catalog::new(vec![dilemma("x", vec![])]).is_err());
        assert!(Catalog::new(vec![]).is_err());
    }

    #[test]
    fn rejects_duplicate_ids_and_multi_letter_keys() {
        let dup = vec![dilemma("x", vec![choice("A", 1)]), dilemma("x", vec![choice("A", 1)])];
        assert!(Catalog::new(dup).is_err());
        assert!(Catalog::new(vec![dilemma("x", vec![choice("AB", 1)])]).is_err());
    }

    #[test]
    fn choice_labels_carry_key_prefix() {
        let d = dilemma("x", vec![choice("A", 3), choice("B", 0)]);
        assert_eq!(d.choice_labels(), vec!["A. label A", "B. label B"]);
        assert_eq!(d.choice("B").unwrap().score, 0);
        assert!(d.choice("Z").is_none());
    }
}
