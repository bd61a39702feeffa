//! Evaluation datasets.
//!
//! Each item pairs a query with its gold reference spans and the passages a
//! system retrieved (or generated) for it. Two JSON layouts are accepted:
//!
//! - listed: `{"name": ..., "items": [{"id": ..., "query": ..., ...}]}`
//! - keyed: `{"Q1": {"query": ..., "ground_truth": [...], "retrieved": [...]}}`
//!
//! Keyed items are ordered by natural id order (`Q2` before `Q10`).

use crate::error::{Result, SpanEvalError};
use crate::text::join_passages;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A single evaluation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetItem {
    /// Unique identifier for this item.
    pub id: String,
    /// The query the passages answer.
    #[serde(default)]
    pub query: String,
    /// Gold reference spans; may be empty.
    #[serde(default)]
    pub ground_truth: Vec<String>,
    /// Retrieved or generated passages, in rank order.
    #[serde(default)]
    pub retrieved: Vec<String>,
}

impl DatasetItem {
    /// Create an item from its parts.
    pub fn new(
        id: impl Into<String>,
        query: impl Into<String>,
        ground_truth: Vec<String>,
        retrieved: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            ground_truth,
            retrieved,
        }
    }

    /// The candidate text: trimmed, non-blank passages joined by single spaces.
    pub fn candidate_text(&self) -> String {
        join_passages(&self.retrieved)
    }

    /// The gold spans joined by single spaces, as one reference text.
    pub fn gold_text(&self) -> String {
        self.ground_truth.join(" ")
    }
}

/// A collection of evaluation items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name.
    pub name: String,
    /// Dataset items, in evaluation order.
    pub items: Vec<DatasetItem>,
}

/// Item body in the keyed layout (the id is the map key).
#[derive(Debug, Deserialize)]
struct KeyedItem {
    #[serde(default)]
    query: String,
    #[serde(default)]
    ground_truth: Vec<String>,
    #[serde(default)]
    retrieved: Vec<String>,
}

/// Keyed layout: item id to item body.
type KeyedItems = BTreeMap<String, KeyedItem>;

/// True when `value` is the listed layout (an `items` array at the top level).
fn is_listed_layout(value: &serde_json::Value) -> bool {
    value.get("items").is_some_and(serde_json::Value::is_array)
}

impl Dataset {
    /// Create a new empty dataset.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            items: Vec::new(),
        }
    }

    /// Add an item to the dataset.
    pub fn add_item(&mut self, item: DatasetItem) {
        self.items.push(item);
    }

    /// Number of items in the dataset.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get a subset of items (for quick testing).
    pub fn take(&self, n: usize) -> Self {
        Self {
            name: self.name.clone(),
            items: self.items.iter().take(n).cloned().collect(),
        }
    }

    /// Parse a dataset from JSON text in either supported layout.
    ///
    /// `fallback_name` names keyed datasets, which carry no name of their own.
    pub fn from_json_str(content: &str, fallback_name: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(content)
            .map_err(|e| SpanEvalError::InvalidDataset(format!("malformed JSON: {}", e)))?;

        // Parse the detected layout from the text again so errors carry positions.
        let dataset = if is_listed_layout(&value) {
            serde_json::from_str::<Dataset>(content).map_err(|e| {
                SpanEvalError::InvalidDataset(format!("invalid listed dataset: {}", e))
            })?
        } else {
            let map: KeyedItems = serde_json::from_str(content).map_err(|e| {
                SpanEvalError::InvalidDataset(format!("invalid keyed dataset: {}", e))
            })?;
            let mut items: Vec<DatasetItem> = map
                .into_iter()
                .map(|(id, item)| DatasetItem {
                    id,
                    query: item.query,
                    ground_truth: item.ground_truth,
                    retrieved: item.retrieved,
                })
                .collect();
            items.sort_by(|a, b| natural_cmp(&a.id, &b.id));
            Self {
                name: fallback_name.to_string(),
                items,
            }
        };

        dataset.check_unique_ids()?;
        Ok(dataset)
    }

    /// Load from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SpanEvalError::DatasetNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| SpanEvalError::io(path, e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset");

        Self::from_json_str(&content, name)
    }

    /// Serialize to pretty JSON in the listed layout.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                return Err(SpanEvalError::InvalidDataset(format!(
                    "duplicate item id '{}'",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

/// Compare ids by alphabetic prefix, then by trailing number.
///
/// `Q2` sorts before `Q10`; ids without a numeric suffix compare as text.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (a_prefix, a_num) = split_numeric_suffix(a);
    let (b_prefix, b_num) = split_numeric_suffix(b);
    a_prefix
        .cmp(b_prefix)
        .then_with(|| match (a_num, b_num) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.cmp(b))
}

fn split_numeric_suffix(id: &str) -> (&str, Option<u64>) {
    let digits_start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);

    match digits_start {
        Some(i) => (&id[..i], id[i..].parse().ok()),
        None => (id, None),
    }
}

/// Load a dataset from a JSON file (either layout).
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    Dataset::load_json(path)
}

/// Create a small sample dataset for quick runs.
pub fn create_sample_dataset() -> Dataset {
    let mut dataset = Dataset::new("sample");

    dataset.add_item(DatasetItem::new(
        "S1",
        "Why do hydrangea flowers change color, and how can I control the shade?",
        vec![
            "Hydrangea color shifts occur because pigments react to soil acidity. Acidic soils produce blue blooms, while alkaline soils yield pink shades.".to_string(),
        ],
        vec![
            "Hydrangeas change colors due to the acidity or alkalinity of the soil.".to_string(),
            " To control the shade, you can add aluminum sulfate to the soil. ".to_string(),
        ],
    ));

    dataset.add_item(DatasetItem::new(
        "S2",
        "Can a plant survive in complete darkness?",
        vec![
            "Plants cannot grow indefinitely in total darkness because photosynthesis ceases without light.".to_string(),
        ],
        vec![
            "No, plants cannot survive or grow in complete darkness, as they require sunlight for photosynthesis.".to_string(),
        ],
    ));

    dataset.add_item(DatasetItem::new(
        "S3",
        "What shows that an indoor plant is thriving?",
        vec![
            "Healthy indoor plants show firm leaves, vivid coloration, and steady new leaf formation.".to_string(),
            "Brown tips or stunted growth suggest imbalance.".to_string(),
        ],
        vec!["New growth, dark green color, and healthy leaves.".to_string(), "   ".to_string()],
    ));

    dataset
}
