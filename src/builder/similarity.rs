//! Dense pairwise similarity

use crate::embedding::norm_or_one;
use crate::embedding::tfidf::TfidfVectorizer;

/// Dense symmetric similarity matrix, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Build from rows of a dense matrix. Rows shorter than `n` are zero-filled.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let n = rows.len();
        let mut m = Self::zeros(n);
        for (i, row) in rows.into_iter().enumerate() {
            for (j, v) in row.into_iter().take(n).enumerate() {
                m.data[i * n + j] = v;
            }
        }
        m
    }

    /// Cosine similarity between L2-normalized embedding rows.
    pub fn from_embeddings(embeddings: &[Vec<f32>]) -> Self {
        let normed: Vec<Vec<f64>> = embeddings
            .iter()
            .map(|v| {
                let norm = norm_or_one(v);
                v.iter().map(|x| *x as f64 / norm).collect()
            })
            .collect();

        let n = normed.len();
        let mut m = Self::zeros(n);
        for i in 0..n {
            for j in i..n {
                let dot: f64 = if normed[i].len() == normed[j].len() {
                    normed[i].iter().zip(&normed[j]).map(|(a, b)| a * b).sum()
                } else {
                    0.0
                };
                m.data[i * n + j] = dot;
                m.data[j * n + i] = dot;
            }
        }
        m
    }

    /// TF-IDF cosine over node texts.
    ///
    /// A blank corpus, or one whose vocabulary is pruned away entirely by
    /// `max_df`, gives the zero matrix.
    pub fn from_texts<S: AsRef<str>>(texts: &[S], max_df: f64) -> Self {
        let n = texts.len();
        if texts.iter().all(|t| t.as_ref().trim().is_empty()) {
            return Self::zeros(n);
        }
        let tfidf = TfidfVectorizer::new().with_max_df(max_df).fit_transform(texts);
        if tfidf.vocabulary_len() == 0 {
            return Self::zeros(n);
        }
        let mut m = Self::zeros(n);
        for i in 0..n {
            for j in i..n {
                let s = tfidf.cosine(i, j);
                m.data[i * n + j] = s;
                m.data[j * n + i] = s;
            }
        }
        m
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}
