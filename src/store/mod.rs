//! The storage seam the engine runs against.
//!
//! Everything the pipeline and generator know about persistence goes through
//! [`Store`]. Implementations must provide linearizable single-row reads and
//! atomic compare-and-update on primary keys; beyond that, interleaving of
//! concurrent ticks is unconstrained and lost updates on pair counters are
//! tolerated (the next tick re-reinforces).

mod memory;

pub use memory::MemoryStore;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::types::{
    AriaResult, Category, GlobalDelta, GlobalStats, InsertOutcome, Pair, TierCounts, TokenStat,
    Tier,
};

/// Abstract table store with compare-and-update semantics.
///
/// All operations fail with [`AriaError::Backend`](crate::AriaError::Backend)
/// on I/O errors; `NotFound` conditions are expressed as `Ok(None)` or empty
/// collections and are always recoverable.
#[async_trait]
pub trait Store: Send + Sync {
    /// Atomically advance the message counter and return the new value
    async fn next_message_index(&self) -> AriaResult<u64>;

    /// Read the counter without advancing it
    async fn current_message_index(&self) -> AriaResult<u64>;

    async fn get_token_stat(&self, token: &str) -> AriaResult<Option<TokenStat>>;

    /// Idempotent on the primary key `token`
    async fn upsert_token_stat(&self, stat: &TokenStat) -> AriaResult<()>;

    async fn append_token_position(
        &self,
        token: &str,
        position: u32,
        message_index: u64,
    ) -> AriaResult<()>;

    /// Most recent positions of `token`, newest last, at most `limit`
    async fn recent_positions(&self, token: &str, limit: usize) -> AriaResult<Vec<u32>>;

    /// Current categories for every requested token in one round-trip.
    /// Unknown tokens map to [`Category::Unclassified`].
    async fn get_many_categories(
        &self,
        tokens: &[String],
    ) -> AriaResult<HashMap<String, Category>>;

    async fn get_global_stats(&self) -> AriaResult<GlobalStats>;

    /// Apply `delta` and, when given, raise the variance high-water mark,
    /// in a single atomic write
    async fn update_global_stats(
        &self,
        delta: GlobalDelta,
        new_max_variance: Option<f64>,
    ) -> AriaResult<()>;

    async fn get_pair(&self, pattern_key: &str) -> AriaResult<Option<Pair>>;

    /// Insert a fresh pair. A live pair under the same key wins
    /// ([`InsertOutcome::Conflict`]); a retired `decay`-tier row is
    /// overwritten and the insert reports `Created`.
    async fn insert_pair(&self, pair: &Pair) -> AriaResult<InsertOutcome>;

    /// Write back a full pair row under its pattern key
    async fn update_pair(&self, pair: &Pair) -> AriaResult<()>;

    /// Live (non-decay) pairs containing `token`, strongest first
    async fn search_pairs_by_word(&self, token: &str) -> AriaResult<Vec<Pair>>;

    /// Strongest pairs overall. `tier: None` means all live tiers;
    /// retired rows only surface through an explicit `Some(Tier::Decay)`.
    async fn top_pairs(&self, limit: usize, tier: Option<Tier>) -> AriaResult<Vec<Pair>>;

    /// Live pairs whose `decay_at_message` has arrived
    async fn pairs_due_for_decay(&self, message_index: u64) -> AriaResult<Vec<Pair>>;

    async fn move_pair_tier(&self, pattern_key: &str, new_tier: Tier) -> AriaResult<()>;

    async fn token_count(&self) -> AriaResult<u64>;

    async fn pair_tier_counts(&self) -> AriaResult<TierCounts>;

    async fn tokens_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>>;

    /// Tokens whose last scorer write is at least `idle_secs` before
    /// `now_unix`, for the aging sweep
    async fn idle_token_stats(
        &self,
        idle_secs: u64,
        now_unix: u64,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>>;
}
