//! Combination space sizing and collision diagnostics

use crate::catalog::model::{CollectionConfig, TraitCategory};
use crate::io::configuration::MIN_SUSPECT_SKEW;
use std::cmp::Ordering;
use std::fmt;

/// Number of distinct combinations the collection can actually produce
///
/// Product of each category's reachable options (positive-weight layers plus
/// the absent slot when its weight is positive). Saturates at `u64::MAX`.
pub fn combination_space(config: &CollectionConfig) -> u64 {
    config
        .categories
        .iter()
        .map(TraitCategory::reachable_options)
        .fold(1u64, u64::saturating_mul)
}

/// Category whose weighting concentrates draws on few outcomes
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionSuspect {
    /// Category name
    pub category: String,
    /// Most likely outcome
    pub dominant_option: String,
    /// Probability of the most likely outcome
    pub dominant_share: f64,
    /// Inverse Simpson index of the outcome distribution
    pub effective_options: f64,
    /// Outcomes with positive weight
    pub reachable_options: u64,
}

impl CollisionSuspect {
    /// How many times smaller the weighted choice is than a uniform one
    pub fn skew(&self) -> f64 {
        if self.effective_options <= 0.0 {
            return 0.0;
        }
        self.reachable_options as f64 / self.effective_options
    }
}

impl fmt::Display for CollisionSuspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} at {:.0}%, ~{:.1} of {} options effective)",
            self.category,
            self.dominant_option,
            self.dominant_share * 100.0,
            self.effective_options,
            self.reachable_options
        )
    }
}

/// Describe one category's outcome distribution
pub fn diagnose_category(category: &TraitCategory) -> Option<CollisionSuspect> {
    let options = category.weighted_options();
    let total: u64 = options.iter().map(|(_, weight)| u64::from(*weight)).sum();
    if total == 0 {
        return None;
    }

    let total_f64 = total as f64;
    let concentration: f64 = options
        .iter()
        .map(|(_, weight)| {
            let share = f64::from(*weight) / total_f64;
            share * share
        })
        .sum();

    let (dominant, dominant_weight) = options.iter().max_by_key(|(_, weight)| *weight)?;
    let dominant_option = category.label(*dominant)?.to_string();

    Some(CollisionSuspect {
        category: category.name.clone(),
        dominant_option,
        dominant_share: f64::from(*dominant_weight) / total_f64,
        effective_options: 1.0 / concentration,
        reachable_options: category.reachable_options(),
    })
}

/// Categories most likely to cause repeated combinations, worst first
///
/// Ranks by skew (reachable options over effective options), then by fewest
/// effective options. Evenly weighted categories are left out.
pub fn collision_suspects(config: &CollectionConfig, limit: usize) -> Vec<CollisionSuspect> {
    let mut suspects: Vec<CollisionSuspect> = config
        .categories
        .iter()
        .filter_map(diagnose_category)
        .filter(|suspect| suspect.skew() > MIN_SUSPECT_SKEW)
        .collect();

    suspects.sort_by(|a, b| {
        b.skew()
            .partial_cmp(&a.skew())
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                a.effective_options
                    .partial_cmp(&b.effective_options)
                    .unwrap_or(Ordering::Equal)
            })
    });
    suspects.truncate(limit);
    suspects
}
