//! BM25 lexical ranking, used when the embedding model is unavailable

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

const K1: f64 = 1.5;
const B: f64 = 0.75;

static TOKENIZE_RE: OnceLock<Regex> = OnceLock::new();

pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let re = TOKENIZE_RE.get_or_init(|| Regex::new(r"[\p{L}][\p{L}\p{N}_]{2,}").unwrap());
    re.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Bm25 {
    avg_doc_len: f64,
    doc_lens: Vec<usize>,
    term_freqs: Vec<HashMap<String, usize>>,
    idf: HashMap<String, f64>,
}

impl Bm25 {
    pub fn index<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut bm25 = Self::default();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0;

        for text in texts {
            let tokens = tokenize(text);
            total_len += tokens.len();
            bm25.doc_lens.push(tokens.len());

            let mut tf: HashMap<String, usize> = HashMap::new();
            for token in &tokens {
                *tf.entry(token.clone()).or_insert(0) += 1;
            }
            for term in tokens.iter().collect::<HashSet<_>>() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            bm25.term_freqs.push(tf);
        }

        let n = bm25.doc_lens.len();
        if n == 0 {
            return bm25;
        }
        bm25.avg_doc_len = (total_len as f64 / n as f64).max(1.0);

        for (term, df) in doc_freq {
            let idf = ((n as f64 - df as f64 + 0.5) / (df as f64 + 0.5) + 1.0).ln();
            bm25.idf.insert(term, idf);
        }
        bm25
    }

    /// `(doc index, score)` for the best `k` documents with a positive score
    pub fn search(&self, query: &str, k: usize) -> Vec<(usize, f64)> {
        let query_tokens = tokenize(query);
        let mut scores: Vec<(usize, f64)> = (0..self.doc_lens.len())
            .map(|idx| (idx, self.score(idx, &query_tokens)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scores.truncate(k);
        scores
    }

    fn score(&self, idx: usize, query_tokens: &[String]) -> f64 {
        let doc_len = self.doc_lens[idx] as f64;
        let tfs = &self.term_freqs[idx];
        let norm = K1 * (1.0 - B + B * doc_len / self.avg_doc_len);

        query_tokens
            .iter()
            .filter_map(|term| {
                let tf = *tfs.get(term)? as f64;
                let idf = self.idf.get(term)?;
                Some(idf * tf * (K1 + 1.0) / (tf + norm))
            })
            .sum()
    }
}
