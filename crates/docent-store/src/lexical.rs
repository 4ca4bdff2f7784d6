//! BM25 scoring for the in-memory backend.

use std::collections::{HashMap, HashSet};

const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Lowercased alphanumeric runs.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Corpus statistics for one text field.
#[derive(Debug, Default)]
pub(crate) struct FieldStats {
    doc_count: usize,
    avg_len: f32,
    doc_freq: HashMap<String, usize>,
}

impl FieldStats {
    #[expect(clippy::cast_precision_loss)]
    pub(crate) fn collect<'a>(texts: impl Iterator<Item = &'a str>) -> Self {
        let mut stats = Self::default();
        let mut total_len = 0usize;
        for text in texts {
            let tokens = tokenize(text);
            total_len += tokens.len();
            stats.doc_count += 1;
            let unique: HashSet<String> = tokens.into_iter().collect();
            for term in unique {
                *stats.doc_freq.entry(term).or_insert(0) += 1;
            }
        }
        if stats.doc_count > 0 {
            stats.avg_len = total_len as f32 / stats.doc_count as f32;
        }
        stats
    }

    #[expect(clippy::cast_precision_loss)]
    fn idf(&self, term: &str) -> f32 {
        let n = self.doc_count as f32;
        let df = self.doc_freq.get(term).copied().unwrap_or(0) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }
}

/// BM25 score of `text` for `query_terms`; zero when no term occurs.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn bm25(query_terms: &[String], text: &str, stats: &FieldStats) -> f32 {
    let tokens = tokenize(text);
    if tokens.is_empty() || stats.avg_len == 0.0 {
        return 0.0;
    }
    let len = tokens.len() as f32;
    let norm = K1 * (1.0 - B + B * len / stats.avg_len);

    query_terms
        .iter()
        .map(|term| {
            let tf = tokens.iter().filter(|t| *t == term).count() as f32;
            if tf == 0.0 {
                return 0.0;
            }
            stats.idf(term) * tf * (K1 + 1.0) / (tf + norm)
        })
        .sum()
}
