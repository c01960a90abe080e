//! Typed sign labels and the class-index → label table.

use crate::defaults;
use crate::error::{Result, SignStreamError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Outcome label of one classified frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignLabel {
    /// A sign from the label table.
    Sign(Arc<str>),
    /// The model picked a class index the label table has no entry for.
    Unknown,
    /// No usable hand landmarks in the frame. Never enters a sentence.
    NoHandDetected,
}

impl SignLabel {
    pub fn sign(name: &str) -> Self {
        SignLabel::Sign(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        match self {
            SignLabel::Sign(name) => name,
            SignLabel::Unknown => defaults::UNKNOWN_LABEL,
            SignLabel::NoHandDetected => defaults::NO_HAND_LABEL,
        }
    }

    /// Whether this label marks a frame without signal.
    pub fn is_sentinel(&self) -> bool {
        matches!(self, SignLabel::NoHandDetected)
    }
}

impl fmt::Display for SignLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label file as written by the dataset preparation step (`{"0": "hello"}`)
/// or as a plain array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelFile {
    Indexed(BTreeMap<String, String>),
    List(Vec<String>),
}

/// Maps class indices of the sequence model to sign labels.
///
/// Indices without an entry decode to [`SignLabel::Unknown`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    labels: Vec<Option<Arc<str>>>,
}

impl LabelTable {
    /// Builds a dense table from labels in class-index order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| Some(Arc::from(l.as_ref())))
                .collect(),
        }
    }

    /// Parses a label table from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LabelFile = serde_json::from_str(json).map_err(|e| {
            SignStreamError::LabelTable {
                message: format!("invalid label JSON: {e}"),
            }
        })?;

        match file {
            LabelFile::List(labels) => Ok(Self::from_labels(labels)),
            LabelFile::Indexed(entries) => {
                let mut labels: Vec<Option<Arc<str>>> = Vec::new();
                for (key, label) in entries {
                    let idx: usize = key.trim().parse().map_err(|_| SignStreamError::LabelTable {
                        message: format!("label key {key:?} is not a class index"),
                    })?;
                    if idx > defaults::MAX_CLASS_INDEX {
                        return Err(SignStreamError::LabelTable {
                            message: format!(
                                "class index {idx} exceeds the maximum of {}",
                                defaults::MAX_CLASS_INDEX
                            ),
                        });
                    }
                    if idx >= labels.len() {
                        labels.resize(idx + 1, None);
                    }
                    labels[idx] = Some(Arc::from(label.as_str()));
                }
                Ok(Self { labels })
            }
        }
    }

    /// Loads a label table from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SignStreamError::LabelTable {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_json(&contents)
    }

    /// Decodes a class index into its label.
    pub fn decode(&self, index: usize) -> SignLabel {
        match self.labels.get(index) {
            Some(Some(name)) => SignLabel::Sign(Arc::clone(name)),
            _ => SignLabel::Unknown,
        }
    }

    /// Number of class slots (including gaps).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates over `(index, label)` pairs with an entry.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(idx, l)| l.as_deref().map(|name| (idx, name)))
    }
}
