
use tracing::debug;

use crate::{RagError, Result};

/// In-memory exact nearest-neighbor index over dense vectors.
///
/// Append-only: vectors keep the position at which they were inserted, and
/// that position is the join key callers use to correlate results with their
/// own records. Search is a brute-force scan, which is plenty for the
/// session-sized knowledge bases this crate targets.
#[derive(Debug, Default)]
pub struct FlatIndex {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of vectors in order.
    ///
    /// The first insertion fixes the index dimension for its lifetime. A
    /// batch containing any vector of a different length fails with
    /// [`RagError::DimensionMismatch`] and inserts nothing.
    #[inline]
    pub fn insert(&mut self, vectors: Vec<Vec<f32>>) -> Result<()> {
        if vectors.is_empty() {
            return Ok(());
        }

        let expected = self.dimension.unwrap_or(vectors[0].len());
        if expected == 0 {
            return Err(RagError::Embedding(
                "embedder produced zero-dimension vectors".to_string(),
            ));
        }
        for vector in &vectors {
            if vector.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        if self.dimension.is_none() {
            debug!("Index dimension fixed at {}", expected);
            self.dimension = Some(expected);
        }
        self.vectors.extend(vectors);

        Ok(())
    }

    /// Return up to `k` stored positions ordered by ascending squared
    /// Euclidean distance from `query`.
    ///
    /// Distances are squared L2, not true L2; ranking is identical and this
    /// matches what the original flat index reported. Ties are broken by
    /// lower insertion position. Searching an empty index returns an empty
    /// result.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        if query.len() != dimension {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| (position, squared_l2(query, vector)))
            .collect();

        // Position tiebreak keeps results deterministic for equal distances
        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored)
    }

    /// Number of stored vectors
    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension fixed by the first insertion, if any
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Discard all vectors and unset the dimension
    #[inline]
    pub fn clear(&mut self) {
        self.vectors.clear();
        self.dimension = None;
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
