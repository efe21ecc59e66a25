//! TF-IDF vector space model
//!
//! Weighting follows the common scikit-learn defaults so scores line up with
//! earlier experiments:
//! - tokens are runs of two or more word characters, lowercased
//! - `tf` is the raw term count
//! - `idf = ln((1 + n) / (1 + df)) + 1` (smoothed)
//! - each document vector is L2-normalised
//!
//! Vocabulary and idf weights are local to the corpus they were fitted on.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::corpus::Corpus;
use crate::core::matrix::PairwiseMatrix;

use super::Metric;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"\b\w\w+\b").unwrap();
}

/// Lowercased tokens of `text`, in order of appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sparse vector with entries sorted by term index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    /// Build from `(index, weight)` pairs; zero weights are dropped.
    pub fn from_pairs(mut entries: Vec<(usize, f64)>) -> Self {
        entries.retain(|&(_, w)| w != 0.0);
        entries.sort_by_key(|&(i, _)| i);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn norm(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut dot = 0.0;
        self.for_each_pair(other, |a, b| dot += a * b);
        dot
    }

    /// Cosine similarity, 0 when either vector is all zeros.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        let (norm_a, norm_b) = (self.norm(), other.norm());
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        (self.dot(other) / (norm_a * norm_b)).clamp(0.0, 1.0)
    }

    pub fn euclidean(&self, other: &SparseVector) -> f64 {
        let mut sum = 0.0;
        self.for_each_pair(other, |a, b| sum += (a - b) * (a - b));
        sum.sqrt()
    }

    pub fn manhattan(&self, other: &SparseVector) -> f64 {
        let mut sum = 0.0;
        self.for_each_pair(other, |a, b| sum += (a - b).abs());
        sum
    }

    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for &(i, w) in &self.entries {
            if i < dim {
                dense[i] = w;
            }
        }
        dense
    }

    /// Visit `(self[k], other[k])` for every index present in either vector.
    fn for_each_pair(&self, other: &SparseVector, mut visit: impl FnMut(f64, f64)) {
        let (a, b) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        while i < a.len() || j < b.len() {
            match (a.get(i), b.get(j)) {
                (Some(&(ia, wa)), Some(&(ib, wb))) if ia == ib => {
                    visit(wa, wb);
                    i += 1;
                    j += 1;
                }
                (Some(&(ia, wa)), Some(&(ib, _))) if ia < ib => {
                    visit(wa, 0.0);
                    i += 1;
                }
                (Some(_), Some(&(_, wb))) => {
                    visit(0.0, wb);
                    j += 1;
                }
                (Some(&(_, wa)), None) => {
                    visit(wa, 0.0);
                    i += 1;
                }
                (None, Some(&(_, wb))) => {
                    visit(0.0, wb);
                    j += 1;
                }
                (None, None) => break,
            }
        }
    }
}

/// A TF-IDF model fitted on one corpus, with one vector per entry.
#[derive(Debug, Clone)]
pub struct TfIdfModel {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
}

impl TfIdfModel {
    /// Fit vocabulary and idf on `corpus` and transform every entry.
    pub fn fit(corpus: &Corpus) -> Self {
        let documents: Vec<Vec<String>> = corpus.iter().map(tokenize).collect();

        // Alphabetical term order gives stable indices
        let mut vocabulary: BTreeMap<String, usize> = BTreeMap::new();
        for token in documents.iter().flatten() {
            vocabulary.entry(token.clone()).or_insert(0);
        }
        for (index, slot) in vocabulary.values_mut().enumerate() {
            *slot = index;
        }

        let mut document_frequency = vec![0usize; vocabulary.len()];
        let mut counts: Vec<BTreeMap<usize, usize>> = Vec::with_capacity(documents.len());
        for tokens in &documents {
            let mut tf: BTreeMap<usize, usize> = BTreeMap::new();
            for token in tokens {
                if let Some(&index) = vocabulary.get(token) {
                    *tf.entry(index).or_insert(0) += 1;
                }
            }
            for &index in tf.keys() {
                document_frequency[index] += 1;
            }
            counts.push(tf);
        }

        let n = documents.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let vectors = counts
            .into_iter()
            .map(|tf| {
                let weighted = SparseVector::from_pairs(
                    tf.into_iter()
                        .map(|(index, count)| (index, count as f64 * idf[index]))
                        .collect(),
                );
                let norm = weighted.norm();
                if norm == 0.0 {
                    weighted
                } else {
                    SparseVector::from_pairs(
                        weighted.entries.iter().map(|&(i, w)| (i, w / norm)).collect(),
                    )
                }
            })
            .collect();

        Self {
            vocabulary,
            idf,
            vectors,
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|i| self.idf[i])
    }

    pub fn vectors(&self) -> &[SparseVector] {
        &self.vectors
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

pub fn cosine_matrix(model: &TfIdfModel) -> PairwiseMatrix {
    let v = model.vectors();
    PairwiseMatrix::build(Metric::Cosine, v.len(), |i, j| Ok(v[i].cosine(&v[j])))
}

pub fn euclidean_matrix(model: &TfIdfModel) -> PairwiseMatrix {
    let v = model.vectors();
    PairwiseMatrix::build(Metric::Euclidean, v.len(), |i, j| Ok(v[i].euclidean(&v[j])))
}

pub fn manhattan_matrix(model: &TfIdfModel) -> PairwiseMatrix {
    let v = model.vectors();
    PairwiseMatrix::build(Metric::Manhattan, v.len(), |i, j| Ok(v[i].manhattan(&v[j])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StepAttribute;

    fn corpus(entries: &[&str]) -> Corpus {
        Corpus::from_entries(
            StepAttribute::StepName,
            entries.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_tokenize_skips_single_characters() {
        assert_eq!(
            tokenize("1: I run Jekyll build\n2: a b cd"),
            vec!["run", "jekyll", "build", "cd"]
        );
    }

    #[test]
    fn test_idf_smoothing() {
        let model = TfIdfModel::fit(&corpus(&["alpha beta", "alpha gamma"]));
        assert_eq!(model.vocabulary_size(), 3);
        // alpha in both documents: ln(3/3) + 1
        assert!((model.idf("alpha").unwrap() - 1.0).abs() < 1e-12);
        // beta in one: ln(3/2) + 1
        assert!((model.idf("beta").unwrap() - (1.5f64.ln() + 1.0)).abs() < 1e-12);
        assert_eq!(model.term_index("alpha"), Some(0));
        assert_eq!(model.term_index("gamma"), Some(2));
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let model = TfIdfModel::fit(&corpus(&["alpha beta beta", "gamma", ""]));
        assert!((model.vectors()[0].norm() - 1.0).abs() < 1e-12);
        assert!((model.vectors()[1].norm() - 1.0).abs() < 1e-12);
        assert_eq!(model.vectors()[2].nnz(), 0);
    }

    #[test]
    fn test_identical_entries() {
        let model = TfIdfModel::fit(&corpus(&[
            "1: I have a site\n2: I build it",
            "1: totally different words",
            "1: I have a site\n2: I build it",
        ]));

        let cosine = cosine_matrix(&model);
        assert!((cosine.get(0, 2) - 1.0).abs() < 1e-9);
        assert!(cosine.get(0, 1) < 1.0);

        assert_eq!(euclidean_matrix(&model).get(0, 2), 0.0);
        assert_eq!(manhattan_matrix(&model).get(0, 2), 0.0);
    }

    #[test]
    fn test_disjoint_vocabularies() {
        let model = TfIdfModel::fit(&corpus(&["alpha", "beta"]));
        assert_eq!(cosine_matrix(&model).get(0, 1), 0.0);
        assert!((euclidean_matrix(&model).get(0, 1) - 2f64.sqrt()).abs() < 1e-12);
        assert!((manhattan_matrix(&model).get(0, 1) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sparse_matches_dense() {
        let a = SparseVector::from_pairs(vec![(3, 1.0), (0, 2.0)]);
        let b = SparseVector::from_pairs(vec![(1, 4.0), (3, 3.0)]);
        assert_eq!(a.to_dense(4), vec![2.0, 0.0, 0.0, 1.0]);
        assert_eq!(a.dot(&b), 3.0);
        assert_eq!(a.manhattan(&b), 2.0 + 4.0 + 2.0);
        assert!((a.euclidean(&b) - (4.0f64 + 16.0 + 4.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_vector_cosine() {
        let zero = SparseVector::default();
        let a = SparseVector::from_pairs(vec![(0, 1.0)]);
        assert_eq!(zero.cosine(&a), 0.0);
    }
}
