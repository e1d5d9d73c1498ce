use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Cell of the soft-totals table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoftCode {
    #[serde(rename = "H")]
    Hit,
    #[serde(rename = "S")]
    Stand,
    /// Double, hit when doubling is not possible
    #[serde(rename = "D")]
    Double,
    /// Double, stand when doubling is not possible
    #[serde(rename = "Ds")]
    DoubleOrStand,
}

/// Cell of the hard-totals table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardCode {
    #[serde(rename = "H")]
    Hit,
    #[serde(rename = "S")]
    Stand,
    #[serde(rename = "D")]
    Double,
}

/// `player -> dealer -> value`, as stored on disk
type Section<V> = HashMap<String, HashMap<String, V>>;

/// Raw strategy file format
#[derive(Debug, Deserialize)]
struct StrategyFile {
    split: Section<bool>,
    surrender: Section<bool>,
    soft: Section<SoftCode>,
    hard: Section<HardCode>,
}

/// Immutable decision tables keyed by `(player, dealer)` token text
#[derive(Debug, Clone, Default)]
pub struct StrategyTable {
    split: HashMap<(String, String), bool>,
    surrender: HashMap<(String, String), bool>,
    soft: HashMap<(String, String), SoftCode>,
    hard: HashMap<(String, String), HardCode>,
}

impl StrategyTable {
    /// Load the strategy tables from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read strategy table {}", path.display()))?;
        let table = Self::from_json(&content)
            .with_context(|| format!("Failed to parse strategy table {}", path.display()))?;

        tracing::info!(
            "Loaded strategy tables: {} split, {} surrender, {} soft, {} hard",
            table.split.len(),
            table.surrender.len(),
            table.soft.len(),
            table.hard.len()
        );
        Ok(table)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let file: StrategyFile = serde_json::from_str(content)?;
        Ok(Self {
            split: flatten(file.split),
            surrender: flatten(file.surrender),
            soft: flatten(file.soft),
            hard: flatten(file.hard),
        })
    }

    pub fn split(&self, player: &str, dealer: &str) -> Option<bool> {
        lookup(&self.split, player, dealer)
    }

    pub fn surrender(&self, player: &str, dealer: &str) -> Option<bool> {
        lookup(&self.surrender, player, dealer)
    }

    pub fn soft(&self, player: &str, dealer: &str) -> Option<SoftCode> {
        lookup(&self.soft, player, dealer)
    }

    pub fn hard(&self, player: &str, dealer: &str) -> Option<HardCode> {
        lookup(&self.hard, player, dealer)
    }

    pub fn is_empty(&self) -> bool {
        self.split.is_empty()
            && self.surrender.is_empty()
            && self.soft.is_empty()
            && self.hard.is_empty()
    }
}

fn flatten<V>(section: Section<V>) -> HashMap<(String, String), V> {
    section
        .into_iter()
        .flat_map(|(player, row)| {
            let player = player.trim().to_string();
            row.into_iter()
                .map(move |(dealer, value)| ((player.clone(), dealer.trim().to_string()), value))
        })
        .collect()
}

fn lookup<V: Copy>(map: &HashMap<(String, String), V>, player: &str, dealer: &str) -> Option<V> {
    map.get(&(player.to_string(), dealer.to_string())).copied()
}
