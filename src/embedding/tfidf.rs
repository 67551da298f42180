//! Character n-gram TF-IDF
//!
//! Word-bounded character n-grams (`char_wb`): each whitespace-separated
//! word is padded with one space on each side and cut into n-grams of every
//! length in the configured range. A word shorter than `n` contributes
//! itself once and stops the larger sizes. IDF is smoothed,
//! `ln((1 + N) / (1 + df)) + 1`, and every row is L2-normalized.
//!
//! Used for query seeding when no query vector is available, and as an
//! alternative similarity source when building graphs.

use std::collections::HashMap;

/// Sparse row: (feature index, value) sorted by feature index
pub type SparseRow = Vec<(usize, f64)>;

/// Fits a vocabulary over a corpus and produces L2-normalized TF-IDF rows
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    min_n: usize,
    max_n: usize,
    max_df: f64,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self {
            min_n: 2,
            max_n: 4,
            max_df: 1.0,
        }
    }
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ngram_range(mut self, min_n: usize, max_n: usize) -> Self {
        self.min_n = min_n.max(1);
        self.max_n = max_n.max(self.min_n);
        self
    }

    /// Ignore terms appearing in more than this fraction of documents
    pub fn with_max_df(mut self, max_df: f64) -> Self {
        self.max_df = max_df;
        self
    }

    /// Fit on `docs` and return one normalized row per document.
    ///
    /// Never fails: an empty vocabulary (blank corpus, or every term pruned
    /// by `max_df`) yields all-zero rows.
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> TfidfMatrix {
        let n_docs = docs.len();
        let counts: Vec<HashMap<String, usize>> = docs
            .iter()
            .map(|d| {
                let mut c = HashMap::new();
                for gram in char_wb_ngrams(d.as_ref(), self.min_n, self.max_n) {
                    *c.entry(gram).or_insert(0) += 1;
                }
                c
            })
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for term in doc.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.max_df * n_docs as f64;
        let mut vocab: Vec<&str> = df
            .iter()
            .filter(|(_, d)| **d as f64 <= max_doc_count)
            .map(|(t, _)| *t)
            .collect();
        vocab.sort_unstable();
        let feature: HashMap<&str, usize> = vocab.iter().enumerate().map(|(i, t)| (*t, i)).collect();
        let idf: Vec<f64> = vocab
            .iter()
            .map(|t| ((1.0 + n_docs as f64) / (1.0 + df[t] as f64)).ln() + 1.0)
            .collect();

        let rows = counts
            .iter()
            .map(|doc| {
                let mut row: SparseRow = doc
                    .iter()
                    .filter_map(|(t, &c)| feature.get(t.as_str()).map(|&f| (f, c as f64 * idf[f])))
                    .collect();
                row.sort_unstable_by_key(|(f, _)| *f);
                let norm = row.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, v) in row.iter_mut() {
                        *v /= norm;
                    }
                }
                row
            })
            .collect();

        TfidfMatrix {
            rows,
            vocabulary_len: vocab.len(),
        }
    }
}

/// Output of `TfidfVectorizer::fit_transform`
#[derive(Debug, Clone, Default)]
pub struct TfidfMatrix {
    rows: Vec<SparseRow>,
    vocabulary_len: usize,
}

impl TfidfMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary_len
    }

    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        self.rows.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Cosine similarity of rows `i` and `j` (rows are unit length or zero)
    pub fn cosine(&self, i: usize, j: usize) -> f64 {
        sparse_dot(self.row(i), self.row(j))
    }
}

fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Similarity of `query` against each document, fitting on query + documents.
pub fn query_similarities<S: AsRef<str>>(query: &str, docs: &[S]) -> Vec<f64> {
    let mut corpus: Vec<&str> = Vec::with_capacity(docs.len() + 1);
    corpus.push(query);
    corpus.extend(docs.iter().map(AsRef::as_ref));
    let matrix = TfidfVectorizer::new().fit_transform(&corpus);
    (1..matrix.len()).map(|j| matrix.cosine(0, j)).collect()
}

/// Word-bounded character n-grams of the lowercased text
pub fn char_wb_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut grams = Vec::new();
    for word in lower.split_whitespace() {
        let mut w: Vec<char> = Vec::with_capacity(word.len() + 2);
        w.push(' ');
        w.extend(word.chars());
        w.push(' ');
        let w_len = w.len();

        for n in min_n..=max_n {
            let mut offset = 0;
            grams.push(w[offset..(offset + n).min(w_len)].iter().collect());
            while offset + n < w_len {
                offset += 1;
                grams.push(w[offset..offset + n].iter().collect());
            }
            if offset == 0 {
                break;
            }
        }
    }
    grams
}
