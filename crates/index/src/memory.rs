use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{IndexError, QueryRequest, QueryResponse, RawMatch, VectorIndex};

/// One catalog entry: an embedded product image and its display metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogRecord {
    pub id: String,
    pub values: Vec<f32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Brute-force cosine index over a catalog held in memory.
///
/// Read-only after construction. Intended for offline demos and tests; there
/// is no ANN structure and no score cutoff.
#[derive(Debug, Clone)]
pub struct MemoryIndex {
    name: String,
    records: Vec<CatalogRecord>,
    dimension: Option<usize>,
}

impl MemoryIndex {
    pub fn new(name: impl Into<String>, records: Vec<CatalogRecord>) -> Result<Self, IndexError> {
        let dimension = records.first().map(|r| r.values.len());
        if let Some(dim) = dimension {
            if dim == 0 {
                return Err(IndexError::Catalog("catalog vectors must not be empty".into()));
            }
            if let Some(bad) = records.iter().find(|r| r.values.len() != dim) {
                return Err(IndexError::Catalog(format!(
                    "record `{}` has {} values, expected {dim}",
                    bad.id,
                    bad.values.len()
                )));
            }
        }
        Ok(Self {
            name: name.into(),
            records,
            dimension,
        })
    }

    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self, IndexError> {
        let records: Vec<CatalogRecord> =
            serde_json::from_str(json).map_err(|e| IndexError::Catalog(e.to_string()))?;
        Self::new(name, records)
    }

    pub fn from_json_file<P: AsRef<Path>>(
        name: impl Into<String>,
        path: P,
    ) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| IndexError::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_json_str(name, &json)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, IndexError> {
        if let Some(expected) = self.dimension {
            if expected != request.vector.len() {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: request.vector.len(),
                });
            }
        }

        let mut scored: Vec<(f32, &CatalogRecord)> = self
            .records
            .iter()
            .map(|record| (cosine_similarity(&request.vector, &record.values), record))
            .collect();
        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(request.top_k);

        let matches = scored
            .into_iter()
            .map(|(score, record)| RawMatch {
                id: Some(record.id.clone()),
                score: Some(score),
                values: request.include_values.then(|| record.values.clone()),
                metadata: request.include_metadata.then(|| record.metadata.clone()),
            })
            .collect();

        Ok(QueryResponse {
            matches: Some(matches),
            namespace: request.namespace.clone(),
            usage: None,
        })
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str, values: Vec<f32>) -> CatalogRecord {
        CatalogRecord {
            id: id.into(),
            values,
            metadata: json!({ "image_url": format!("https://cdn.example/{id}.jpg") })
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn catalog() -> MemoryIndex {
        MemoryIndex::new(
            "test",
            vec![
                record("x", vec![1.0, 0.0]),
                record("y", vec![0.0, 1.0]),
                record("xy", vec![1.0, 1.0]),
                record("neg", vec![-1.0, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn rejects_ragged_catalog() {
        let err = MemoryIndex::new(
            "bad",
            vec![record("a", vec![1.0, 2.0]), record("b", vec![1.0])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("record `b`"));
    }

    #[tokio::test]
    async fn ranks_by_descending_similarity() {
        let index = catalog();
        let resp = index
            .query(&QueryRequest::new(vec![1.0, 0.1], 3))
            .await
            .unwrap();
        let ids: Vec<String> = resp
            .matches
            .unwrap()
            .into_iter()
            .map(|m| m.id.unwrap())
            .collect();
        assert_eq!(ids, vec!["x", "xy", "y"]);
    }

    #[tokio::test]
    async fn honors_include_flags() {
        let index = catalog();
        let resp = index
            .query(&QueryRequest::new(vec![0.0, 1.0], 1))
            .await
            .unwrap();
        let m = &resp.matches.unwrap()[0];
        assert!(m.values.is_none());
        assert!(m.metadata.is_some());

        let mut req = QueryRequest::new(vec![0.0, 1.0], 1);
        req.include_values = true;
        req.include_metadata = false;
        let resp = index.query(&req).await.unwrap();
        let m = &resp.matches.unwrap()[0];
        assert_eq!(m.values.as_deref(), Some(&[0.0, 1.0][..]));
        assert!(m.metadata.is_none());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_an_error() {
        let err = catalog()
            .query(&QueryRequest::new(vec![1.0, 0.0, 0.0], 8))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn empty_catalog_returns_empty_matches() {
        let index = MemoryIndex::new("empty", Vec::new()).unwrap();
        assert!(index.is_empty());
        let resp = index
            .query(&QueryRequest::new(vec![1.0], 8))
            .await
            .unwrap();
        assert!(resp.into_result_set().is_none());
    }

    #[test]
    fn parses_json_catalog() {
        let index = MemoryIndex::from_json_str(
            "json",
            r#"[{"id": "a", "values": [0.1, 0.2]}, {"id": "b", "values": [0.3, 0.4], "metadata": {"product_url": "https://shop.example/b"}}]"#,
        )
        .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.dimension(), Some(2));
        assert!(MemoryIndex::from_json_str("bad", "{").is_err());
    }
}
