use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Id shown for matches the index returned without one.
pub const UNKNOWN_ID: &str = "Unknown ID";

/// Nearest-neighbor request, serialized in the Pinecone data-plane shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub vector: Vec<f32>,
    pub top_k: usize,
    pub include_values: bool,
    pub include_metadata: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl QueryRequest {
    /// Metadata on, values off: what a display-only search needs.
    pub fn new(vector: Vec<f32>, top_k: usize) -> Self {
        Self {
            vector,
            top_k,
            include_values: false,
            include_metadata: true,
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Raw query response as received on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    #[serde(default)]
    pub matches: Option<Vec<RawMatch>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl QueryResponse {
    pub fn with_matches(matches: Vec<RawMatch>) -> Self {
        Self {
            matches: Some(matches),
            ..Self::default()
        }
    }

    /// Validate the loosely typed matches into a [`ResultSet`].
    ///
    /// Returns `None` when the field is missing or the list is empty.
    pub fn into_result_set(self) -> Option<ResultSet> {
        let matches = self.matches.filter(|m| !m.is_empty())?;
        Some(matches.into_iter().map(Match::from).collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Usage {
    #[serde(rename = "readUnits", default)]
    pub read_units: Option<u64>,
}

/// One match before validation; every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawMatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f32>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

/// Typed display metadata of a catalog item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MatchMetadata {
    /// Present only when the index returned a non-empty string.
    pub image_url: Option<String>,
    /// Present only when the index returned a string.
    pub product_url: Option<String>,
    /// Any other metadata keys, untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl MatchMetadata {
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let image_url = match map.remove("image_url") {
            Some(Value::String(url)) if !url.trim().is_empty() => Some(url),
            _ => None,
        };
        let product_url = match map.remove("product_url") {
            Some(Value::String(url)) => Some(url),
            _ => None,
        };
        Self {
            image_url,
            product_url,
            extra: map.into_iter().collect(),
        }
    }
}

/// A validated match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub id: String,
    /// Relevance as reported by the index; carried but never displayed.
    pub score: Option<f32>,
    pub metadata: MatchMetadata,
}

impl From<RawMatch> for Match {
    fn from(raw: RawMatch) -> Self {
        Self {
            id: raw.id.unwrap_or_else(|| UNKNOWN_ID.to_string()),
            score: raw.score,
            metadata: raw.metadata.map(MatchMetadata::from_map).unwrap_or_default(),
        }
    }
}

/// Matches in the order the index returned them, best first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ResultSet {
    matches: Vec<Match>,
}

impl ResultSet {
    pub fn new(matches: Vec<Match>) -> Self {
        Self { matches }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Match> {
        self.matches.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Match> {
        self.matches.iter()
    }

    pub fn as_slice(&self) -> &[Match] {
        &self.matches
    }

    pub fn into_vec(self) -> Vec<Match> {
        self.matches
    }
}

impl FromIterator<Match> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Match>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Match;
    type IntoIter = std::slice::Iter<'a, Match>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}
