//! Combining activation maps from several views

use super::types::ActivationMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    #[error("unknown fusion strategy: {0} (expected union, intersection_boost, weighted or mean)")]
    Unknown(String),
}

/// Merges a semantic-view map with a local-view map.
///
/// Implementations return a map normalized to max 1, unless every merged
/// score is 0.
pub trait FusionStrategy: Send + Sync {
    fn fuse(&self, semantic: &ActivationMap, local: &ActivationMap) -> ActivationMap;

    fn name(&self) -> &'static str;
}

/// Apply `f` to every id present in either map.
fn combine<F>(semantic: &ActivationMap, local: &ActivationMap, f: F) -> ActivationMap
where
    F: Fn(f64, f64) -> f64,
{
    let ids: BTreeSet<_> = semantic.iter().chain(local.iter()).map(|(id, _)| id.clone()).collect();
    ids.into_iter()
        .map(|id| {
            let score = f(semantic.get(&id), local.get(&id));
            (id, score)
        })
        .collect::<ActivationMap>()
        .normalized()
}

/// Elementwise sum
#[derive(Debug, Clone, Copy, Default)]
pub struct Union;

impl FusionStrategy for Union {
    fn fuse(&self, semantic: &ActivationMap, local: &ActivationMap) -> ActivationMap {
        combine(semantic, local, |a, b| a + b)
    }

    fn name(&self) -> &'static str {
        "union"
    }
}

/// Sum, multiplied by `boost` for nodes active in both maps
#[derive(Debug, Clone, Copy)]
pub struct IntersectionBoost {
    pub boost: f64,
}

impl Default for IntersectionBoost {
    fn default() -> Self {
        Self { boost: 2.0 }
    }
}

impl FusionStrategy for IntersectionBoost {
    fn fuse(&self, semantic: &ActivationMap, local: &ActivationMap) -> ActivationMap {
        combine(semantic, local, |a, b| {
            let sum = a + b;
            if a > 0.0 && b > 0.0 {
                sum * self.boost
            } else {
                sum
            }
        })
    }

    fn name(&self) -> &'static str {
        "intersection_boost"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Weighted {
    pub semantic: f64,
    pub local: f64,
}

impl Default for Weighted {
    fn default() -> Self {
        Self {
            semantic: 0.6,
            local: 0.4,
        }
    }
}

impl FusionStrategy for Weighted {
    fn fuse(&self, semantic: &ActivationMap, local: &ActivationMap) -> ActivationMap {
        combine(semantic, local, |a, b| self.semantic * a + self.local * b)
    }

    fn name(&self) -> &'static str {
        "weighted"
    }
}

/// Sum of all maps divided by the number of maps. Not renormalized.
pub fn mean_merge(maps: &[ActivationMap]) -> ActivationMap {
    if maps.is_empty() {
        return ActivationMap::new();
    }
    let mut merged = ActivationMap::new();
    for map in maps {
        for (id, score) in map.iter() {
            merged.add(id, score);
        }
    }
    let n = maps.len() as f64;
    merged.iter().map(|(id, s)| (id.clone(), s / n)).collect()
}

/// Strategy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionKind {
    Union,
    #[default]
    IntersectionBoost,
    Weighted,
    Mean,
}

impl FusionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionKind::Union => "union",
            FusionKind::IntersectionBoost => "intersection_boost",
            FusionKind::Weighted => "weighted",
            FusionKind::Mean => "mean",
        }
    }
}

impl fmt::Display for FusionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FusionKind {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "union" => Ok(FusionKind::Union),
            "intersection_boost" => Ok(FusionKind::IntersectionBoost),
            "weighted" => Ok(FusionKind::Weighted),
            "mean" => Ok(FusionKind::Mean),
            _ => Err(FusionError::Unknown(s.to_string())),
        }
    }
}

/// Fusion settings as they appear in the `activation` config section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    #[serde(rename = "fusion")]
    pub kind: FusionKind,
    pub semantic_weight: f64,
    pub local_weight: f64,
    pub boost: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            kind: FusionKind::default(),
            semantic_weight: 0.6,
            local_weight: 0.4,
            boost: 2.0,
        }
    }
}

impl FusionConfig {
    pub fn with_kind(mut self, kind: FusionKind) -> Self {
        self.kind = kind;
        self
    }

    /// The two-map strategy for this config. `Mean` has none.
    pub fn strategy(&self) -> Option<Box<dyn FusionStrategy>> {
        match self.kind {
            FusionKind::Union => Some(Box::new(Union)),
            FusionKind::IntersectionBoost => Some(Box::new(IntersectionBoost { boost: self.boost })),
            FusionKind::Weighted => Some(Box::new(Weighted {
                semantic: self.semantic_weight,
                local: self.local_weight,
            })),
            FusionKind::Mean => None,
        }
    }

    /// Merge per-view maps in view order.
    ///
    /// One map is returned as is. Two-map strategies are folded left to
    /// right; `Mean` averages all maps at once.
    pub fn fuse_all(&self, mut maps: Vec<ActivationMap>) -> ActivationMap {
        if maps.len() <= 1 {
            return maps.pop().unwrap_or_default();
        }
        match self.strategy() {
            None => mean_merge(&maps),
            Some(strategy) => {
                let mut rest = maps.into_iter();
                let first = rest.next().unwrap_or_default();
                rest.fold(first, |acc, next| strategy.fuse(&acc, &next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn map(entries: &[(&str, f64)]) -> ActivationMap {
        entries.iter().map(|(id, s)| (NodeId::from(*id), *s)).collect()
    }

    fn score(m: &ActivationMap, id: &str) -> f64 {
        m.get(&NodeId::from(id))
    }

    #[test]
    fn union_with_empty_is_normalized_input() {
        let a = map(&[("a", 0.5), ("b", 0.25)]);
        assert_eq!(Union.fuse(&a, &ActivationMap::new()), a.clone().normalized());
    }

    #[test]
    fn weighted_with_itself_is_normalized_input() {
        let a = map(&[("a", 0.5), ("b", 0.2)]);
        let fused = Weighted::default().fuse(&a, &a);
        let expected = a.normalized();
        for (id, s) in expected.iter() {
            assert!((fused.get(id) - s).abs() < 1e-12);
        }
        assert_eq!(fused.len(), expected.len());
    }

    #[test]
    fn intersection_boost_favours_shared_nodes() {
        let semantic = map(&[("shared", 0.5), ("only_sem", 1.0)]);
        let local = map(&[("shared", 0.5), ("only_local", 0.9)]);
        let fused = IntersectionBoost::default().fuse(&semantic, &local);

        // shared = (0.5 + 0.5) * 2 = 2.0 is the max
        assert_eq!(score(&fused, "shared"), 1.0);
        assert!((score(&fused, "only_sem") - 0.5).abs() < 1e-12);
        assert!((score(&fused, "only_local") - 0.45).abs() < 1e-12);
    }

    #[test]
    fn all_zero_merge_is_not_normalized() {
        let zero = map(&[("a", 0.0)]);
        let fused = Union.fuse(&zero, &zero);
        assert_eq!(score(&fused, "a"), 0.0);
    }

    #[test]
    fn mean_divides_by_view_count() {
        let maps = vec![map(&[("a", 1.0)]), map(&[("a", 0.5), ("b", 1.0)])];
        let merged = mean_merge(&maps);
        assert_eq!(score(&merged, "a"), 0.75);
        assert_eq!(score(&merged, "b"), 0.5);
    }

    #[test]
    fn parse_selectors() {
        assert_eq!("union".parse::<FusionKind>(), Ok(FusionKind::Union));
        assert_eq!("intersection-boost".parse::<FusionKind>(), Ok(FusionKind::IntersectionBoost));
        assert_eq!("MEAN".parse::<FusionKind>(), Ok(FusionKind::Mean));
        assert!(matches!("max".parse::<FusionKind>(), Err(FusionError::Unknown(_))));
    }

    #[test]
    fn fuse_all_single_view_is_passthrough() {
        let a = map(&[("a", 0.4)]);
        let out = FusionConfig::default().fuse_all(vec![a.clone()]);
        assert_eq!(out, a);
        assert!(FusionConfig::default().fuse_all(Vec::new()).is_empty());
    }

    #[test]
    fn fuse_all_folds_three_views() {
        let maps = vec![map(&[("a", 1.0)]), map(&[("b", 1.0)]), map(&[("c", 1.0)])];
        let out = FusionConfig::default().with_kind(FusionKind::Union).fuse_all(maps);
        // (a + b) normalized → a = b = 1; + c → a = b = c = 1
        assert_eq!(score(&out, "a"), 1.0);
        assert_eq!(score(&out, "b"), 1.0);
        assert_eq!(score(&out, "c"), 1.0);
    }

    #[test]
    fn fuse_all_mean_uses_every_view() {
        let maps = vec![map(&[("a", 1.0)]), map(&[("a", 1.0)]), map(&[("b", 1.0)])];
        let out = FusionConfig::default().with_kind(FusionKind::Mean).fuse_all(maps);
        assert!((score(&out, "a") - 2.0 / 3.0).abs() < 1e-12);
        assert!((score(&out, "b") - 1.0 / 3.0).abs() < 1e-12);
    }
}
