// Core types and errors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::config;

/// The result type used throughout the engine
pub type AriaResult<T> = Result<T, AriaError>;

#[derive(Debug, Error, Clone)]
pub enum AriaError {
    #[error("storage backend error: {message}")]
    Backend {
        message: String,
        location: Option<String>,
        source: Option<Arc<dyn std::error::Error + Send + Sync>>,
    },

    #[error("pair insert conflict: {pattern_key}")]
    Conflict { pattern_key: String },

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl AriaError {
    /// Backend error with optional source chain and call location
    pub fn backend<T: Into<String>>(
        message: T,
        source: Option<impl std::error::Error + Send + Sync + 'static>,
        location: Option<&str>,
    ) -> Self {
        let error = Self::Backend {
            message: message.into(),
            location: location.map(String::from),
            source: source.map(|e| Arc::new(e) as Arc<dyn std::error::Error + Send + Sync>),
        };

        if let Some(loc) = error.location() {
            log::error!("{} at {}", error, loc);
        } else {
            log::error!("{}", error);
        }

        error
    }

    pub fn simple_backend<T: Into<String>>(message: T) -> Self {
        Self::backend(message, None::<std::io::Error>, None)
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Backend { location, .. } => location.as_deref(),
            _ => None,
        }
    }

    pub fn source_error(&self) -> Option<&(dyn std::error::Error + Send + Sync)> {
        match self {
            Self::Backend { source, .. } => source.as_ref().map(|s| s.as_ref()),
            _ => None,
        }
    }

    /// True for transient storage failures worth retrying
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Create a backend error that captures the call site
#[macro_export]
macro_rules! backend_error {
    ($message:expr) => {
        $crate::AriaError::backend(
            $message,
            None::<std::io::Error>,
            Some(concat!(file!(), ":", line!())),
        )
    };
    ($message:expr, $source:expr) => {
        $crate::AriaError::backend($message, Some($source), Some(concat!(file!(), ":", line!())))
    };
}

/// Behavioral category of a token, derived from its four scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Stable,
    Transition,
    Modifier,
    Structural,
    #[default]
    Unclassified,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stable => "stable",
            Category::Transition => "transition",
            Category::Modifier => "modifier",
            Category::Structural => "structural",
            Category::Unclassified => "unclassified",
        }
    }

    /// Reinforcement modifier contributed by a pair endpoint of this category
    pub fn promotion_weight(&self) -> f64 {
        match self {
            Category::Stable => 1.5,
            Category::Structural => 0.6,
            Category::Transition => 1.0,
            Category::Modifier => 1.0,
            Category::Unclassified => 0.8,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strength tier of a pair; determines its decay cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Short,
    Medium,
    Long,
    Decay,
}

impl Tier {
    /// Tier a live pair belongs in at the given strength
    pub fn from_strength(strength: f64) -> Tier {
        if strength >= config::MEDIUM_MAX {
            Tier::Long
        } else if strength >= config::SHORT_MAX {
            Tier::Medium
        } else {
            Tier::Short
        }
    }

    /// Messages between decay events. The decay tier is never scheduled.
    pub fn interval(&self) -> u64 {
        match self {
            Tier::Short => 50,
            Tier::Medium => 200,
            Tier::Long => 1000,
            Tier::Decay => 0,
        }
    }

    /// Fraction of strength lost per decay event
    pub fn rate(&self) -> f64 {
        match self {
            Tier::Short => 0.15,
            Tier::Medium => 0.05,
            Tier::Long => 0.01,
            Tier::Decay => 0.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Short => "short",
            Tier::Medium => "medium",
            Tier::Long => "long",
            Tier::Decay => "decay",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-token behavioral record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStat {
    pub token: String,
    pub total_occurrences: u64,
    pub context_count: u64,
    pub unique_adjacency_count: u64,
    pub positional_variance: f64,
    pub bridge_count: u64,
    pub temporal_adj_count: u64,
    pub adjacent_to_stable: u64,
    pub contrast_pair_count: u64,
    pub standalone_count: u64,
    pub stability: f64,
    pub transition: f64,
    pub dependency: f64,
    pub structural: f64,
    pub category: Category,
    pub pending_category: Option<Category>,
    pub pending_count: u8,
    pub last_message_index: u64,
    /// Unix seconds of the last scorer write; drives the aging sweep
    pub last_updated_at: u64,
}

impl TokenStat {
    /// Zeroed record for a token seen for the first time
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            total_occurrences: 0,
            context_count: 0,
            unique_adjacency_count: 0,
            positional_variance: 0.0,
            bridge_count: 0,
            temporal_adj_count: 0,
            adjacent_to_stable: 0,
            contrast_pair_count: 0,
            standalone_count: 0,
            stability: 0.0,
            transition: 0.0,
            dependency: 0.0,
            structural: 0.0,
            category: Category::Unclassified,
            pending_category: None,
            pending_count: 0,
            last_message_index: 0,
            last_updated_at: 0,
        }
    }
}

/// A reinforced two-token co-occurrence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pair {
    pub token_a: String,
    pub token_b: String,
    pub frequency: u64,
    pub strength: f64,
    pub category_pattern: String,
    pub reinforcement_count: u64,
    pub decay_count: u64,
    pub tier: Tier,
    pub decay_at_message: u64,
    pub last_seen_message_index: u64,
}

impl Pair {
    /// Canonical key: sorted endpoints joined by an underscore
    pub fn key_for(a: &str, b: &str) -> String {
        if a <= b {
            format!("{}_{}", a, b)
        } else {
            format!("{}_{}", b, a)
        }
    }

    pub fn pattern_key(&self) -> String {
        Self::key_for(&self.token_a, &self.token_b)
    }

    /// Fresh short-tier pair at base strength, endpoints sorted
    pub fn new(a: &str, b: &str, message_index: u64, category_pattern: String) -> Self {
        let (token_a, token_b) = if a <= b { (a, b) } else { (b, a) };
        Self {
            token_a: token_a.to_string(),
            token_b: token_b.to_string(),
            frequency: 1,
            strength: config::REINFORCEMENT_BASE,
            category_pattern,
            reinforcement_count: 1,
            decay_count: 0,
            tier: Tier::Short,
            decay_at_message: message_index + Tier::Short.interval(),
            last_seen_message_index: message_index,
        }
    }

    /// The endpoint opposite `token`, if `token` is one of the two
    pub fn other_endpoint(&self, token: &str) -> Option<&str> {
        if self.token_a == token {
            Some(&self.token_b)
        } else if self.token_b == token {
            Some(&self.token_a)
        } else {
            None
        }
    }
}

/// Outcome of a conditional pair insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    /// A live pair already owns the key; the caller reinforces instead
    Conflict,
}

/// The singleton normalization record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalStats {
    pub total_contexts_seen: u64,
    pub total_adj_windows: u64,
    pub max_positional_variance: f64,
    pub total_tokens_seen: u64,
}

impl Default for GlobalStats {
    fn default() -> Self {
        Self {
            total_contexts_seen: 1,
            total_adj_windows: 1,
            max_positional_variance: 1.0,
            total_tokens_seen: 1,
        }
    }
}

/// Per-message increment applied to the global record in one write
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalDelta {
    pub contexts: u64,
    pub adj_windows: u64,
    pub tokens: u64,
}

/// Structured outcome of one ingestion tick
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProcessReport {
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_processed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorized: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_pairs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reinforced: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decayed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ProcessReport {
    /// Report for a message rejected before the counter advanced
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            processed: false,
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// Pair counts per tier
#[derive(Debug, Clone, Copy, Serialize, Default)]
pub struct TierCounts {
    pub short: u64,
    pub medium: u64,
    pub long: u64,
    pub decay: u64,
}

impl TierCounts {
    pub fn total(&self) -> u64 {
        self.short + self.medium + self.long + self.decay
    }

    pub fn live(&self) -> u64 {
        self.short + self.medium + self.long
    }
}

/// Snapshot of what the engine currently remembers
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub total_tokens: u64,
    pub total_pairs: u64,
    pub tiers: TierCounts,
    pub current_message_index: u64,
    pub global: GlobalStats,
}

/// A walk-derived token sequence; never persisted
#[derive(Debug, Clone, Serialize)]
pub struct EmergentChain {
    pub words: Vec<String>,
    pub weight: f64,
}
