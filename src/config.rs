// Engine and generator configuration

use std::time::Duration;

use crate::types::{AriaError, AriaResult, Category};

/// Strength below which a pair leaves the `short` tier upward
pub const SHORT_MAX: f64 = 0.30;
/// Strength at which a pair enters the `long` tier
pub const MEDIUM_MAX: f64 = 0.80;
/// Strength below which a decaying pair is retired
pub const DECAY_MIN: f64 = 0.01;
/// Base strength added per reinforcement, before the category modifier
pub const REINFORCEMENT_BASE: f64 = 0.02;
/// Strength ceiling
pub const STRENGTH_MAX: f64 = 1.0;
/// Positions considered adjacent on each side of an occurrence
pub const ADJACENCY_WINDOW: usize = 2;
/// Minimum winning score for a category to be assigned
pub const CATEGORY_FLOOR: f64 = 0.15;
/// Occurrences required before a token can be classified
pub const MIN_OCCURRENCES_FOR_CATEGORY: u64 = 2;
/// Consecutive wins a non-current candidate needs to commit
pub const INERTIA_THRESHOLD: u8 = 3;
/// Most recent position samples considered per token
pub const POSITION_HISTORY: usize = 100;

/// Tuning for the ingestion pipeline
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempts for counter and global-stats increments
    pub retry_attempts: u32,
    /// TTL of the in-core global-stats cache
    pub global_cache_ttl: Duration,
    pub aging_enabled: bool,
    /// Idle time after which a token's scores are nudged down
    pub aging_idle: Duration,
    /// Minimum gap between aging sweeps
    pub aging_min_interval: Duration,
    /// Tokens touched per sweep
    pub aging_sweep_limit: usize,
    pub aging_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            global_cache_ttl: Duration::from_secs(5),
            aging_enabled: true,
            aging_idle: Duration::from_secs(24 * 60 * 60),
            aging_min_interval: Duration::from_secs(60 * 60),
            aging_sweep_limit: 256,
            aging_factor: 0.99,
        }
    }
}

impl EngineConfig {
    pub fn with_aging(mut self, enabled: bool) -> Self {
        self.aging_enabled = enabled;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> AriaResult<Self> {
        if attempts == 0 {
            return Err(AriaError::Invalid(
                "retry_attempts must be greater than 0".into(),
            ));
        }
        self.retry_attempts = attempts;
        Ok(self)
    }

    pub fn with_global_cache_ttl(mut self, ttl: Duration) -> Self {
        self.global_cache_ttl = ttl;
        self
    }
}

/// Tuning for the response generator
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub max_words: usize,
    pub min_words: usize,
    /// Edges below this strength are invisible to the walk
    pub strength_threshold: f64,
    /// Upper bound of the multiplicative noise applied to edge weights
    pub randomness: f64,
    pub max_length_chars: usize,
    /// Keywords consulted when collecting walk pairs
    pub keyword_limit: usize,
    /// Keywords seeding emergent-chain discovery
    pub chain_keyword_limit: usize,
    pub chain_max_len: usize,
    /// Outgoing edges followed per node during chain discovery
    pub chain_fanout: usize,
    /// Globally strongest pairs mixed into the walk graph
    pub top_pair_pool: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_words: 12,
            min_words: 3,
            strength_threshold: 0.01,
            randomness: 0.25,
            max_length_chars: 150,
            keyword_limit: 10,
            chain_keyword_limit: 5,
            chain_max_len: 5,
            chain_fanout: 5,
            top_pair_pool: 100,
        }
    }
}

impl GeneratorConfig {
    pub fn with_max_words(mut self, max_words: usize) -> AriaResult<Self> {
        if max_words == 0 {
            return Err(AriaError::Invalid("max_words must be greater than 0".into()));
        }
        if max_words < self.min_words {
            return Err(AriaError::Invalid(
                "max_words must not be less than min_words".into(),
            ));
        }
        self.max_words = max_words;
        Ok(self)
    }

    pub fn with_min_words(mut self, min_words: usize) -> AriaResult<Self> {
        if min_words == 0 || min_words > self.max_words {
            return Err(AriaError::Invalid(
                "min_words must be in 1..=max_words".into(),
            ));
        }
        self.min_words = min_words;
        Ok(self)
    }

    pub fn with_randomness(mut self, randomness: f64) -> AriaResult<Self> {
        if !(0.0..=1.0).contains(&randomness) {
            return Err(AriaError::Invalid(
                "randomness must be between 0.0 and 1.0".into(),
            ));
        }
        self.randomness = randomness;
        Ok(self)
    }

    pub fn with_max_length_chars(mut self, max_length_chars: usize) -> Self {
        self.max_length_chars = max_length_chars;
        self
    }

    /// Weight of a category when choosing the walk's starting node
    pub fn start_weight(&self, category: Category) -> f64 {
        match category {
            Category::Stable => 1.5,
            Category::Transition => 1.0,
            Category::Modifier => 0.7,
            Category::Structural => 0.3,
            Category::Unclassified => 0.5,
        }
    }

    /// Neighbor categories the walk favors when leaving `category`
    pub fn favored_transitions(&self, category: Category) -> &'static [Category] {
        match category {
            Category::Stable => &[
                Category::Modifier,
                Category::Transition,
                Category::Structural,
            ],
            Category::Modifier => &[Category::Stable, Category::Structural],
            Category::Transition => &[
                Category::Stable,
                Category::Modifier,
                Category::Structural,
            ],
            Category::Structural => &[
                Category::Stable,
                Category::Modifier,
                Category::Transition,
            ],
            Category::Unclassified => &[
                Category::Stable,
                Category::Transition,
                Category::Modifier,
                Category::Structural,
                Category::Unclassified,
            ],
        }
    }
}
