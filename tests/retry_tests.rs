// Backend-failure behavior: retries, propagation, generator fallback

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use aria_rs::types::{GlobalDelta, GlobalStats, InsertOutcome, TierCounts};
use aria_rs::{
    Aria, AriaError, AriaResult, Category, GenerateOptions, MemoryStore, Pair, Store, Tier,
    TokenStat,
};
use async_trait::async_trait;

/// Delegates to a real MemoryStore but fails the first
/// `counter_failures` calls to `next_message_index`.
struct FlakyStore {
    inner: MemoryStore,
    counter_failures: AtomicU32,
}

impl FlakyStore {
    fn new(counter_failures: u32) -> Self {
        Self {
            inner: MemoryStore::new(),
            counter_failures: AtomicU32::new(counter_failures),
        }
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn next_message_index(&self) -> AriaResult<u64> {
        let remaining = self.counter_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.counter_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(AriaError::simple_backend("injected counter failure"));
        }
        self.inner.next_message_index().await
    }

    async fn current_message_index(&self) -> AriaResult<u64> {
        self.inner.current_message_index().await
    }

    async fn get_token_stat(&self, token: &str) -> AriaResult<Option<TokenStat>> {
        self.inner.get_token_stat(token).await
    }

    async fn upsert_token_stat(&self, stat: &TokenStat) -> AriaResult<()> {
        self.inner.upsert_token_stat(stat).await
    }

    async fn append_token_position(
        &self,
        token: &str,
        position: u32,
        message_index: u64,
    ) -> AriaResult<()> {
        self.inner.append_token_position(token, position, message_index).await
    }

    async fn recent_positions(&self, token: &str, limit: usize) -> AriaResult<Vec<u32>> {
        self.inner.recent_positions(token, limit).await
    }

    async fn get_many_categories(
        &self,
        tokens: &[String],
    ) -> AriaResult<HashMap<String, Category>> {
        self.inner.get_many_categories(tokens).await
    }

    async fn get_global_stats(&self) -> AriaResult<GlobalStats> {
        self.inner.get_global_stats().await
    }

    async fn update_global_stats(
        &self,
        delta: GlobalDelta,
        new_max_variance: Option<f64>,
    ) -> AriaResult<()> {
        self.inner.update_global_stats(delta, new_max_variance).await
    }

    async fn get_pair(&self, pattern_key: &str) -> AriaResult<Option<Pair>> {
        self.inner.get_pair(pattern_key).await
    }

    async fn insert_pair(&self, pair: &Pair) -> AriaResult<InsertOutcome> {
        self.inner.insert_pair(pair).await
    }

    async fn update_pair(&self, pair: &Pair) -> AriaResult<()> {
        self.inner.update_pair(pair).await
    }

    async fn search_pairs_by_word(&self, token: &str) -> AriaResult<Vec<Pair>> {
        self.inner.search_pairs_by_word(token).await
    }

    async fn top_pairs(&self, limit: usize, tier: Option<Tier>) -> AriaResult<Vec<Pair>> {
        self.inner.top_pairs(limit, tier).await
    }

    async fn pairs_due_for_decay(&self, message_index: u64) -> AriaResult<Vec<Pair>> {
        self.inner.pairs_due_for_decay(message_index).await
    }

    async fn move_pair_tier(&self, pattern_key: &str, new_tier: Tier) -> AriaResult<()> {
        self.inner.move_pair_tier(pattern_key, new_tier).await
    }

    async fn token_count(&self) -> AriaResult<u64> {
        self.inner.token_count().await
    }

    async fn pair_tier_counts(&self) -> AriaResult<TierCounts> {
        self.inner.pair_tier_counts().await
    }

    async fn tokens_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        self.inner.tokens_by_category(category, limit).await
    }

    async fn idle_token_stats(
        &self,
        idle_secs: u64,
        now_unix: u64,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        self.inner.idle_token_stats(idle_secs, now_unix, limit).await
    }
}

#[tokio::test]
async fn transient_counter_failures_are_retried_away() {
    let aria = Aria::new(Arc::new(FlakyStore::new(2)));

    let report = aria
        .process_message("resilient little engine", "m1", "tester")
        .await
        .expect("two failures fit inside three attempts");
    assert!(report.processed);
    assert_eq!(report.message_index, Some(1));
}

#[tokio::test]
async fn persistent_counter_failures_surface_as_backend_errors() {
    let aria = Aria::new(Arc::new(FlakyStore::new(3)));

    let err = aria
        .process_message("doomed message", "m1", "tester")
        .await
        .expect_err("three failures exhaust the retry budget");
    assert!(err.is_backend(), "unexpected error: {}", err);
}

/// A store that fails every read; the generator must still answer.
struct BrokenStore;

#[async_trait]
impl Store for BrokenStore {
    async fn next_message_index(&self) -> AriaResult<u64> {
        Err(AriaError::simple_backend("down"))
    }

    async fn current_message_index(&self) -> AriaResult<u64> {
        Err(AriaError::simple_backend("down"))
    }

    async fn get_token_stat(&self, _token: &str) -> AriaResult<Option<TokenStat>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn upsert_token_stat(&self, _stat: &TokenStat) -> AriaResult<()> {
        Err(AriaError::simple_backend("down"))
    }

    async fn append_token_position(
        &self,
        _token: &str,
        _position: u32,
        _message_index: u64,
    ) -> AriaResult<()> {
        Err(AriaError::simple_backend("down"))
    }

    async fn recent_positions(&self, _token: &str, _limit: usize) -> AriaResult<Vec<u32>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn get_many_categories(
        &self,
        _tokens: &[String],
    ) -> AriaResult<HashMap<String, Category>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn get_global_stats(&self) -> AriaResult<GlobalStats> {
        Err(AriaError::simple_backend("down"))
    }

    async fn update_global_stats(
        &self,
        _delta: GlobalDelta,
        _new_max_variance: Option<f64>,
    ) -> AriaResult<()> {
        Err(AriaError::simple_backend("down"))
    }

    async fn get_pair(&self, _pattern_key: &str) -> AriaResult<Option<Pair>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn insert_pair(&self, _pair: &Pair) -> AriaResult<InsertOutcome> {
        Err(AriaError::simple_backend("down"))
    }

    async fn update_pair(&self, _pair: &Pair) -> AriaResult<()> {
        Err(AriaError::simple_backend("down"))
    }

    async fn search_pairs_by_word(&self, _token: &str) -> AriaResult<Vec<Pair>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn top_pairs(&self, _limit: usize, _tier: Option<Tier>) -> AriaResult<Vec<Pair>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn pairs_due_for_decay(&self, _message_index: u64) -> AriaResult<Vec<Pair>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn move_pair_tier(&self, _pattern_key: &str, _new_tier: Tier) -> AriaResult<()> {
        Err(AriaError::simple_backend("down"))
    }

    async fn token_count(&self) -> AriaResult<u64> {
        Err(AriaError::simple_backend("down"))
    }

    async fn pair_tier_counts(&self) -> AriaResult<TierCounts> {
        Err(AriaError::simple_backend("down"))
    }

    async fn tokens_by_category(
        &self,
        _category: Category,
        _limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        Err(AriaError::simple_backend("down"))
    }

    async fn idle_token_stats(
        &self,
        _idle_secs: u64,
        _now_unix: u64,
        _limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        Err(AriaError::simple_backend("down"))
    }
}

#[tokio::test]
async fn the_generator_never_surfaces_backend_errors() {
    let aria = Aria::new(Arc::new(BrokenStore));
    let response = aria.generate_response("anything", GenerateOptions::default()).await;
    assert_eq!(response, "...");
}
