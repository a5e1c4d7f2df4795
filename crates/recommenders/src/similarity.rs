//! Cosine similarity between unit-length TF-IDF vectors.
//!
//! Batch mode builds the full item x item matrix; only the upper triangle
//! (diagonal included) is stored, and `get`/`row` answer for both triangles.
//! Query mode scores one vector against the whole catalog.

use crate::tfidf::SparseVector;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, instrument};

/// Cosine similarity of two unit vectors (their dot product)
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    a.dot(b)
}

/// Similarity of `query` to every vector, in input order
pub fn query_scores(query: &SparseVector, vectors: &[SparseVector]) -> Vec<f64> {
    vectors.par_iter().map(|vector| query.dot(vector)).collect()
}

/// Rows computed per parallel batch while building the matrix
const ROW_BLOCK: usize = 256;

/// Columns `i..n` of row `i`, accumulated from the postings of its terms
fn upper_row(vectors: &[SparseVector], postings: &[Vec<(usize, f64)>], i: usize) -> Vec<f64> {
    let mut acc = vec![0.0; vectors.len() - i];
    for (column, weight) in vectors[i].iter() {
        let list = &postings[column as usize];
        let first = list.partition_point(|&(row, _)| row < i);
        for &(j, other) in &list[first..] {
            acc[j - i] += weight * other;
        }
    }
    acc
}

/// Symmetric N x N matrix of pairwise cosine similarities
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    /// Row-major upper triangle: row `i` holds columns `i..n`
    upper: Vec<f64>,
}

impl SimilarityMatrix {
    /// Compute every pair sharing at least one term.
    ///
    /// ## Algorithm
    /// 1. Build an inverted index: column -> (row, weight), rows ascending
    /// 2. For each row `i` in parallel, walk the postings of its terms and
    ///    accumulate products for rows `j >= i`
    /// 3. Append the row slices, block by block, to the packed triangle
    ///
    /// Each row is summed in a fixed order, so the result does not depend on
    /// thread scheduling.
    #[instrument(skip(vectors), fields(n = vectors.len()))]
    pub fn from_vectors(vectors: &[SparseVector]) -> Self {
        let start = Instant::now();
        let n = vectors.len();

        let mut postings: Vec<Vec<(usize, f64)>> = Vec::new();
        for (row, vector) in vectors.iter().enumerate() {
            for (column, weight) in vector.iter() {
                let column = column as usize;
                if postings.len() <= column {
                    postings.resize_with(column + 1, Vec::new);
                }
                postings[column].push((row, weight));
            }
        }

        // One block of rows in flight at a time, appended in row order
        let mut upper: Vec<f64> = Vec::with_capacity(n * (n + 1) / 2);
        let mut block_start = 0;
        while block_start < n {
            let block_end = (block_start + ROW_BLOCK).min(n);
            let block: Vec<Vec<f64>> = (block_start..block_end)
                .into_par_iter()
                .map(|i| upper_row(vectors, &postings, i))
                .collect();
            for row in block {
                upper.extend(row);
            }
            block_start = block_end;
        }

        debug!("Built {}x{} similarity matrix in {:?}", n, n, start.elapsed());
        Self { n, upper }
    }

    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        // Rows before `i` hold n, n - 1, ..., n - i + 1 entries
        i * self.n - i * i.saturating_sub(1) / 2 + (j - i)
    }

    /// Similarity between rows `i` and `j`; `None` when out of range
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.n || j >= self.n {
            return None;
        }
        self.upper.get(self.offset(i, j)).copied()
    }

    /// Full row `i`, as if both triangles were stored
    pub fn row(&self, i: usize) -> Option<Vec<f64>> {
        if i >= self.n {
            return None;
        }
        Some((0..self.n).map(|j| self.upper[self.offset(i, j)]).collect())
    }

    /// Element-wise mean of the given rows; `None` when `rows` is empty or
    /// any row is out of range
    pub fn mean_of_rows(&self, rows: &[usize]) -> Option<Vec<f64>> {
        if rows.is_empty() || rows.iter().any(|&row| row >= self.n) {
            return None;
        }
        let mut sum = vec![0.0; self.n];
        for &row in rows {
            for (j, slot) in sum.iter_mut().enumerate() {
                *slot += self.upper[self.offset(row, j)];
            }
        }
        let count = rows.len() as f64;
        Some(sum.into_iter().map(|total| total / count).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfidf::TfidfVectorizer;

    fn unit(entries: &[(u32, f64)]) -> SparseVector {
        let mut vector = SparseVector::from_entries(entries.iter().copied());
        vector.normalize();
        vector
    }

    fn create_test_vectors() -> Vec<SparseVector> {
        vec![
            unit(&[(0, 1.0), (1, 1.0)]),
            unit(&[(1, 1.0), (2, 1.0)]),
            unit(&[(3, 2.0)]),
            SparseVector::default(),
        ]
    }

    #[test]
    fn test_self_similarity_is_one() {
        let vectors = create_test_vectors();
        for vector in &vectors[..3] {
            assert!((cosine_similarity(vector, vector) - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let vectors = create_test_vectors();
        let matrix = SimilarityMatrix::from_vectors(&vectors);

        assert_eq!(matrix.len(), 4);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                let expected = vectors[i].dot(&vectors[j]);
                assert!((matrix.get(i, j).unwrap() - expected).abs() < 1e-12);
            }
        }
        assert!((matrix.get(0, 1).unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(matrix.get(0, 2), Some(0.0));
        // A document with no retained terms is similar to nothing, itself included
        assert_eq!(matrix.get(3, 3), Some(0.0));
        assert!(matrix.get(4, 0).is_none());
    }

    #[test]
    fn test_row_and_mean() {
        let matrix = SimilarityMatrix::from_vectors(&create_test_vectors());

        let row = matrix.row(1).unwrap();
        assert_eq!(row.len(), 4);
        assert!((row[0] - 0.5).abs() < 1e-9);
        assert!((row[1] - 1.0).abs() < 1e-9);

        let mean = matrix.mean_of_rows(&[0, 1]).unwrap();
        assert!((mean[0] - 0.75).abs() < 1e-9);
        assert!((mean[2] - 0.0).abs() < 1e-9);
        assert!(matrix.mean_of_rows(&[]).is_none());
        assert!(matrix.mean_of_rows(&[9]).is_none());
    }

    #[test]
    fn test_query_mode_matches_matrix_mean() {
        let docs = [
            "pixar toy cowboy friendship",
            "space horror alien crew",
            "pixar balloon house adventure",
            "space crew adventure",
        ];
        let fitted = TfidfVectorizer::new().fit(&docs).unwrap();
        let matrix = SimilarityMatrix::from_vectors(fitted.vectors());

        // Mean of unit vectors, dotted with each item, equals the mean row
        let chosen = [0usize, 2];
        let dim = fitted.dimension();
        let mut mean = vec![0.0; dim];
        for &row in &chosen {
            for (column, value) in fitted.vectors()[row].to_dense(dim).into_iter().enumerate() {
                mean[column] += value / chosen.len() as f64;
            }
        }
        let query = SparseVector::from_entries(
            mean.into_iter()
                .enumerate()
                .filter(|&(_, value)| value != 0.0)
                .map(|(column, value)| (column as u32, value)),
        );

        let by_query = query_scores(&query, fitted.vectors());
        let by_matrix = matrix.mean_of_rows(&chosen).unwrap();
        for (a, b) in by_query.iter().zip(&by_matrix) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matrix_spanning_several_blocks() {
        let n = ROW_BLOCK * 2 + 7;
        let vectors: Vec<SparseVector> = (0..n as u32)
            .map(|i| unit(&[(i % 5, 1.0), (5 + i % 3, 0.5)]))
            .collect();
        let matrix = SimilarityMatrix::from_vectors(&vectors);

        assert_eq!(matrix.len(), n);
        assert_eq!(matrix.upper.len(), n * (n + 1) / 2);
        for (i, j) in [(0, n - 1), (ROW_BLOCK - 1, ROW_BLOCK), (ROW_BLOCK + 3, 2 * ROW_BLOCK + 1), (n - 1, n - 1)] {
            let expected = vectors[i].dot(&vectors[j]);
            assert!((matrix.get(i, j).unwrap() - expected).abs() < 1e-12);
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
        }
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = SimilarityMatrix::from_vectors(&[]);
        assert!(matrix.is_empty());
        assert!(matrix.row(0).is_none());
    }
}
