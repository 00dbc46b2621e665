//! Trait combinations and the editions they form

use crate::catalog::model::{CollectionConfig, Layer, TraitCategory};
use crate::io::configuration::ABSENT_MARKER;
use crate::io::error::{Result, invalid_parameter};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Outcome of one category within a combination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Selection {
    /// Layer at this index within the category
    Chosen(usize),
    /// Optional category contributes nothing
    Absent,
}

/// One outcome per category, in category position order
///
/// Equality and hashing cover every category, which makes a combination its
/// own uniqueness key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination {
    selections: Vec<Selection>,
}

impl Combination {
    /// Create a combination from per-position selections
    pub const fn new(selections: Vec<Selection>) -> Self {
        Self { selections }
    }

    /// Selections in category position order
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Number of categories covered
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Whether the combination covers no categories
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Build a combination from explicit per-category choices
    ///
    /// Optional categories left unmentioned resolve to [`Selection::Absent`].
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if a choice names an unknown
    /// category or layer, a category is chosen twice, a required category is
    /// left out, or a required category is chosen as absent
    pub fn from_choices(config: &CollectionConfig, choices: &[Choice]) -> Result<Self> {
        let mut seen = HashSet::new();
        for choice in choices {
            if config.category(&choice.category).is_none() {
                return Err(invalid_parameter(
                    "choice",
                    &choice,
                    &"no such category in the collection",
                ));
            }
            if !seen.insert(choice.category.as_str()) {
                return Err(invalid_parameter(
                    "choice",
                    &choice,
                    &"category chosen more than once",
                ));
            }
        }

        let mut selections = Vec::with_capacity(config.categories.len());
        for category in &config.categories {
            let choice = choices.iter().find(|c| c.category == category.name);
            let selection = match choice.map(|c| c.layer.as_deref()) {
                Some(Some(layer_name)) => {
                    let index = category.find_layer(layer_name).ok_or_else(|| {
                        invalid_parameter(
                            "choice",
                            &format!("{}={layer_name}", category.name),
                            &"no such layer in the category",
                        )
                    })?;
                    Selection::Chosen(index)
                }
                Some(None) | None if category.optional => Selection::Absent,
                Some(None) => {
                    return Err(invalid_parameter(
                        "choice",
                        &format!("{}={ABSENT_MARKER}", category.name),
                        &"category is not optional",
                    ));
                }
                None => {
                    return Err(invalid_parameter(
                        "choice",
                        &category.name,
                        &"required category has no choice",
                    ));
                }
            };
            selections.push(selection);
        }

        Ok(Self::new(selections))
    }

    /// Pair each category with its chosen layer, `None` where absent
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error if the combination does not cover
    /// the collection's categories or points at a missing layer
    pub fn resolve<'a>(
        &self,
        config: &'a CollectionConfig,
    ) -> Result<Vec<(&'a TraitCategory, Option<&'a Layer>)>> {
        if self.selections.len() != config.categories.len() {
            return Err(invalid_parameter(
                "combination",
                &self,
                &format!("expected {} categories", config.categories.len()),
            ));
        }

        config
            .categories
            .iter()
            .zip(&self.selections)
            .map(|(category, selection)| match *selection {
                Selection::Chosen(index) => category
                    .layers
                    .get(index)
                    .map(|layer| (category, Some(layer)))
                    .ok_or_else(|| {
                        invalid_parameter(
                            "combination",
                            &self,
                            &format!("category '{}' has no layer {index}", category.name),
                        )
                    }),
                Selection::Absent if category.optional => Ok((category, None)),
                Selection::Absent => Err(invalid_parameter(
                    "combination",
                    &self,
                    &format!("category '{}' is not optional", category.name),
                )),
            })
            .collect()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .selections
            .iter()
            .map(|selection| match selection {
                Selection::Chosen(index) => index.to_string(),
                Selection::Absent => "-".to_string(),
            })
            .collect();
        write!(f, "[{}]", parts.join(","))
    }
}

/// Explicit `category=layer` choice used for previews
///
/// A layer of `none` selects the absent outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Category name
    pub category: String,
    /// Layer display name, `None` for absent
    pub layer: Option<String>,
}

impl Choice {
    /// Choose a layer by name
    pub fn layer(category: impl Into<String>, layer: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            layer: Some(layer.into()),
        }
    }

    /// Choose the absent outcome
    pub fn absent(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            layer: None,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}",
            self.category,
            self.layer.as_deref().unwrap_or(ABSENT_MARKER)
        )
    }
}

impl FromStr for Choice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (category, layer) = s
            .split_once('=')
            .ok_or_else(|| format!("expected CATEGORY=LAYER, got '{s}'"))?;
        let (category, layer) = (category.trim(), layer.trim());
        if category.is_empty() || layer.is_empty() {
            return Err(format!("expected CATEGORY=LAYER, got '{s}'"));
        }
        if layer.eq_ignore_ascii_case(ABSENT_MARKER) {
            Ok(Self::absent(category))
        } else {
            Ok(Self::layer(category, layer))
        }
    }
}

/// Counters describing how an edition was generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Candidates accepted into the edition
    pub accepted: usize,
    /// Candidates discarded as duplicates
    pub rejected: u64,
    /// Longest run of consecutive duplicates
    pub max_consecutive_rejections: u64,
}

/// Ordered set of pairwise distinct combinations
#[derive(Debug, Clone, Default)]
pub struct Edition {
    combinations: Vec<Combination>,
    stats: GenerationStats,
}

impl Edition {
    /// Wrap combinations already known to be distinct
    pub const fn new(combinations: Vec<Combination>, stats: GenerationStats) -> Self {
        Self {
            combinations,
            stats,
        }
    }

    /// Combinations in sequence order
    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    /// Iterate combinations in sequence order
    pub fn iter(&self) -> std::slice::Iter<'_, Combination> {
        self.combinations.iter()
    }

    /// Number of combinations
    pub fn len(&self) -> usize {
        self.combinations.len()
    }

    /// Whether the edition is empty
    pub fn is_empty(&self) -> bool {
        self.combinations.is_empty()
    }

    /// Generation counters
    pub const fn stats(&self) -> GenerationStats {
        self.stats
    }
}

impl<'a> IntoIterator for &'a Edition {
    type Item = &'a Combination;
    type IntoIter = std::slice::Iter<'a, Combination>;

    fn into_iter(self) -> Self::IntoIter {
        self.combinations.iter()
    }
}
