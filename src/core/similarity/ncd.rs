//! Normalized Compression Distance
//!
//! `ncd(a, b) = (C(a ++ b) - min(C(a), C(b))) / (|a| + |b|)` where `C` is the
//! compressed size and `|x|` the raw byte length. Content-agnostic: no
//! tokenisation, so it also works on glue code.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use rayon::prelude::*;

use crate::core::corpus::Corpus;
use crate::core::error::{AnalysisError, Result};
use crate::core::matrix::PairwiseMatrix;

use super::Metric;

/// Description-length proxy for NCD.
#[cfg_attr(test, mockall::automock)]
pub trait Compressor: Send + Sync {
    /// Size in bytes of `data` once compressed.
    fn compressed_len(&self, data: &[u8]) -> std::io::Result<usize>;
}

/// zlib stream compressor (same framing as Python's `zlib.compress`).
#[derive(Debug, Clone, Copy)]
pub struct ZlibCompressor {
    level: u32,
}

impl Default for ZlibCompressor {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl ZlibCompressor {
    /// Compression level 0..=9; values above 9 are clamped.
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Compressor for ZlibCompressor {
    fn compressed_len(&self, data: &[u8]) -> std::io::Result<usize> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(self.level));
        encoder.write_all(data)?;
        Ok(encoder.finish()?.len())
    }
}

/// Compression distance between two non-empty strings.
///
/// Fails with [`AnalysisError::InvalidInput`] when either side is empty.
pub fn ncd<C: Compressor + ?Sized>(compressor: &C, a: &str, b: &str) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(AnalysisError::invalid_input(
            "compression distance needs two non-empty strings",
        ));
    }
    let size_a = compressor.compressed_len(a.as_bytes())?;
    let size_b = compressor.compressed_len(b.as_bytes())?;
    ncd_with_sizes(compressor, a, b, size_a, size_b)
}

/// Same as [`ncd`] with `C(a)` and `C(b)` already known.
fn ncd_with_sizes<C: Compressor + ?Sized>(
    compressor: &C,
    a: &str,
    b: &str,
    size_a: usize,
    size_b: usize,
) -> Result<f64> {
    let mut joined = Vec::with_capacity(a.len() + b.len());
    joined.extend_from_slice(a.as_bytes());
    joined.extend_from_slice(b.as_bytes());
    let size_ab = compressor.compressed_len(&joined)?;

    let numerator = size_ab as f64 - size_a.min(size_b) as f64;
    Ok((numerator / (a.len() + b.len()) as f64).max(0.0))
}

/// NCD matrix over a corpus. Pairs with an empty entry hold `+inf`.
pub fn ncd_matrix<C: Compressor + ?Sized>(corpus: &Corpus, compressor: &C) -> PairwiseMatrix {
    // C(x) per entry, computed once; None for empty or failed entries
    let sizes: Vec<Option<usize>> = corpus
        .entries()
        .par_iter()
        .map(|entry| {
            if entry.is_empty() {
                None
            } else {
                compressor.compressed_len(entry.as_bytes()).ok()
            }
        })
        .collect();

    PairwiseMatrix::build(Metric::Ncd, corpus.len(), |i, j| match (sizes[i], sizes[j]) {
        (Some(size_a), Some(size_b)) => {
            ncd_with_sizes(compressor, &corpus[i], &corpus[j], size_a, size_b)
        }
        _ => ncd(compressor, &corpus[i], &corpus[j]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::StepAttribute;

    const UNRELATED_A: &str = "Given I have a configuration file with permalink pretty\n\
        When I run jekyll build with the drafts flag enabled\n\
        Then the _site directory should exist and contain index.html";
    const UNRELATED_B: &str = "Server listens on port 4000 and reloads assets via websocket; \
        the watcher debounces filesystem events, coalesces renames, and \
        emits a JSON payload per batch";

    #[test]
    fn test_ncd_formula_with_mock_compressor() {
        let mut mock = MockCompressor::new();
        mock.expect_compressed_len().returning(|data| {
            Ok(match data.len() {
                4 => 10,  // "abcd"
                6 => 12,  // "efghij"
                10 => 15, // joined
                n => n,
            })
        });

        let d = ncd(&mock, "abcd", "efghij").unwrap();
        // (15 - min(10, 12)) / (4 + 6)
        assert!((d - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ncd_rejects_empty_inputs() {
        let zlib = ZlibCompressor::default();
        assert!(ncd(&zlib, "", "abc").unwrap_err().is_invalid_input());
        assert!(ncd(&zlib, "abc", "").unwrap_err().is_invalid_input());
        assert!(ncd(&zlib, "", "").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_self_repetition_closer_than_unrelated() {
        let zlib = ZlibCompressor::default();
        let repeated = format!("{UNRELATED_A}{UNRELATED_A}");
        let near = ncd(&zlib, UNRELATED_A, &repeated).unwrap();
        let far = ncd(&zlib, UNRELATED_A, UNRELATED_B).unwrap();
        assert!(near < far, "near={near} far={far}");
        assert!(near >= 0.0);
    }

    #[test]
    fn test_ncd_symmetric_numerator_terms() {
        let zlib = ZlibCompressor::default();
        let d = ncd(&zlib, UNRELATED_A, UNRELATED_B).unwrap();
        assert!(d.is_finite());
        assert!(d > 0.0);
    }

    #[test]
    fn test_matrix_records_infinity_for_empty_entry() {
        let corpus = Corpus::from_entries(
            StepAttribute::ScenarioTitle,
            vec![
                UNRELATED_A.to_string(),
                String::new(),
                UNRELATED_B.to_string(),
            ],
        );
        let matrix = ncd_matrix(&corpus, &ZlibCompressor::default());

        assert_eq!(matrix.size(), 3);
        assert!(matrix.get(0, 1).is_infinite());
        assert!(matrix.get(1, 2).is_infinite());
        assert!(matrix.get(0, 2).is_finite());
        assert_eq!(matrix.get(1, 1), 0.0);
        assert_eq!(matrix.undefined_pairs().len(), 2);
        assert!(matrix.is_symmetric(0.0));
    }

    #[test]
    fn test_zlib_level_clamped() {
        assert_eq!(ZlibCompressor::new(42).level(), 9);
        assert_eq!(ZlibCompressor::default().level(), 6);
    }
}
