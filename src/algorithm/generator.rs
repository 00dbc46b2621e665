use crate::algorithm::cancel::CancellationToken;
use crate::algorithm::combination::{Combination, Edition, GenerationStats, Selection};
use crate::catalog::model::CollectionConfig;
use crate::io::configuration::{DEFAULT_RETRY_FACTOR, DEFAULT_RETRY_FLOOR, MAX_REPORTED_SUSPECTS};
use crate::io::error::{EngineError, Result, Stage};
use crate::math::sampler::WeightedSampler;
use crate::math::space::{collision_suspects, combination_space};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::collections::HashSet;
use tracing::{debug, info};

/// Random source for a run: seeded for reproducibility, fresh entropy otherwise
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

/// Bound on consecutive duplicate candidates before generation gives up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Rejections allowed per draw expected to find a new combination
    pub retry_factor: u64,
    /// Minimum rejections allowed regardless of edition progress
    pub retry_floor: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_factor: DEFAULT_RETRY_FACTOR,
            retry_floor: DEFAULT_RETRY_FLOOR,
        }
    }
}

impl RetryPolicy {
    /// Consecutive rejections tolerated once `accepted` of `space` combinations are taken
    ///
    /// Under uniform weights a new combination takes `space / (space - accepted)`
    /// draws on average, so the allowance grows as the edition fills.
    pub fn ceiling(&self, space: u64, accepted: usize) -> u64 {
        let unclaimed = space.saturating_sub(u64::try_from(accepted).unwrap_or(u64::MAX));
        if unclaimed == 0 {
            return self.retry_floor;
        }
        space
            .div_ceil(unclaimed)
            .saturating_mul(self.retry_factor)
            .max(self.retry_floor)
    }
}

/// Steps of the retry-until-unique loop
#[derive(Debug)]
enum GenerationState {
    /// Draw a fresh candidate
    Sampling,
    /// Look the candidate up in the accepted set
    Checking(Combination),
    /// Candidate is new and joins the edition
    Accepted(Combination),
    /// Candidate duplicates an accepted combination
    Rejected,
    /// Too many consecutive rejections
    ExhaustedRetries,
}

/// Draws trait combinations and fills editions of unique combinations
///
/// Holds one sampler per category, in category position order. The random
/// source is passed into every call so independent runs never share state.
pub struct CombinationGenerator<'a> {
    config: &'a CollectionConfig,
    samplers: Vec<WeightedSampler<Selection>>,
    space: u64,
    policy: RetryPolicy,
}

impl<'a> CombinationGenerator<'a> {
    /// Build samplers for every category of the collection
    ///
    /// # Errors
    ///
    /// Returns a sampler error naming the first category that has no
    /// outcomes or whose weights are all zero
    pub fn new(config: &'a CollectionConfig, policy: RetryPolicy) -> Result<Self> {
        let samplers = config
            .categories
            .iter()
            .map(|category| {
                WeightedSampler::new(category.weighted_options()).map_err(|e| {
                    EngineError::Sampler {
                        category: category.name.clone(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            samplers,
            space: combination_space(config),
            policy,
        })
    }

    /// Number of distinct combinations that can be drawn
    pub const fn combination_space(&self) -> u64 {
        self.space
    }

    /// Collection the generator draws from
    pub const fn config(&self) -> &'a CollectionConfig {
        self.config
    }

    /// Draw one combination, sampling every category once in position order
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Combination {
        let mut selections = Vec::with_capacity(self.samplers.len());
        for sampler in &self.samplers {
            selections.push(*sampler.pick(rng));
        }
        Combination::new(selections)
    }

    /// Fill an edition of `count` pairwise distinct combinations
    ///
    /// # Errors
    ///
    /// See [`Self::generate_with`]
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<Edition> {
        self.generate_with(count, rng, cancel, |_| {})
    }

    /// Fill an edition, reporting the accepted count after every acceptance
    ///
    /// The space check happens before the random source is touched.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `count` exceeds the combination space
    /// - Consecutive duplicates exceed the retry ceiling
    /// - The cancellation token fires before the edition is full
    #[tracing::instrument(skip(self, rng, cancel, on_accept))]
    pub fn generate_with<R, F>(
        &self,
        count: usize,
        rng: &mut R,
        cancel: &CancellationToken,
        mut on_accept: F,
    ) -> Result<Edition>
    where
        R: Rng + ?Sized,
        F: FnMut(usize),
    {
        if u64::try_from(count).unwrap_or(u64::MAX) > self.space {
            return Err(EngineError::InsufficientSpace {
                requested: count,
                available: self.space,
            });
        }

        let mut seen: HashSet<Combination> = HashSet::with_capacity(count);
        let mut accepted: Vec<Combination> = Vec::with_capacity(count);
        let mut stats = GenerationStats::default();
        let mut consecutive_rejections = 0u64;
        let mut state = GenerationState::Sampling;

        while accepted.len() < count {
            state = match state {
                GenerationState::Sampling => {
                    if cancel.is_cancelled() {
                        return Err(EngineError::Cancelled {
                            stage: Stage::Generation,
                        });
                    }
                    GenerationState::Checking(self.draw(rng))
                }
                GenerationState::Checking(candidate) => {
                    if seen.contains(&candidate) {
                        GenerationState::Rejected
                    } else {
                        GenerationState::Accepted(candidate)
                    }
                }
                GenerationState::Accepted(candidate) => {
                    seen.insert(candidate.clone());
                    accepted.push(candidate);
                    consecutive_rejections = 0;
                    stats.accepted += 1;
                    on_accept(accepted.len());
                    GenerationState::Sampling
                }
                GenerationState::Rejected => {
                    consecutive_rejections += 1;
                    stats.rejected += 1;
                    stats.max_consecutive_rejections =
                        stats.max_consecutive_rejections.max(consecutive_rejections);
                    if consecutive_rejections > self.policy.ceiling(self.space, accepted.len()) {
                        GenerationState::ExhaustedRetries
                    } else {
                        GenerationState::Sampling
                    }
                }
                GenerationState::ExhaustedRetries => {
                    let suspects = collision_suspects(self.config, MAX_REPORTED_SUSPECTS);
                    debug!(?suspects, "retry ceiling exceeded");
                    return Err(EngineError::GenerationTimeout {
                        accepted: accepted.len(),
                        requested: count,
                        rejections: consecutive_rejections,
                        suspects,
                    });
                }
            };
        }

        info!(
            accepted = stats.accepted,
            rejected = stats.rejected,
            space = self.space,
            "edition generated"
        );
        Ok(Edition::new(accepted, stats))
    }
}
