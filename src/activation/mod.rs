//! Spreading activation retrieval
//!
//! A query picks seed nodes (keywords, a query embedding, or TF-IDF when no
//! embedding is available), spreads their activation through one or more
//! graph views, and fuses the per-view results.

pub mod fusion;
mod seed;
mod spread;
mod types;

pub use fusion::{FusionConfig, FusionError, FusionKind, FusionStrategy, IntersectionBoost, Union, Weighted};
pub use seed::{embedding_seeds, keyword_seeds, tfidf_seeds, SeedSource};
pub use spread::SpreadingActivation;
pub use types::{format_for_prompt, ActivatedNode, ActivationMap};
