// Core engine implementation

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::{EngineConfig, GeneratorConfig};
use crate::generator::Generator;
use crate::pipeline::{self, Tick};
use crate::store::Store;
use crate::types::{
    AriaResult, Category, EmergentChain, GlobalStats, MemoryStats, Pair, ProcessReport, TokenStat,
    Tier,
};
use crate::utils::tokenizer::tokenize;
use crate::utils::{now_unix, with_retries, StringValidator};

/// Options for a single generation request
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub max_length: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { max_length: 150 }
    }
}

/// In-core cache of the global normalization record.
///
/// Reads within the TTL are served from memory; any global write must
/// invalidate so the same tick observes its own update.
pub(crate) struct GlobalCache {
    ttl: Duration,
    retry_attempts: u32,
    cached: Mutex<Option<(GlobalStats, Instant)>>,
}

impl GlobalCache {
    fn new(ttl: Duration, retry_attempts: u32) -> Self {
        Self {
            ttl,
            retry_attempts,
            cached: Mutex::new(None),
        }
    }

    pub(crate) fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    pub(crate) async fn get(&self, store: &dyn Store) -> AriaResult<GlobalStats> {
        if let Ok(guard) = self.cached.lock() {
            if let Some((stats, at)) = guard.as_ref() {
                if at.elapsed() < self.ttl {
                    return Ok(stats.clone());
                }
            }
        }

        let fresh = store.get_global_stats().await?;
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some((fresh.clone(), Instant::now()));
        }
        Ok(fresh)
    }

    pub(crate) fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
    }
}

/// The ARIA learning engine.
///
/// Owns no data: every entity lives in the [`Store`], which the engine
/// holds behind an `Arc` so concurrent ticks for distinct users may run
/// in parallel.
pub struct Aria {
    store: Arc<dyn Store>,
    config: EngineConfig,
    generator_config: GeneratorConfig,
    global_cache: GlobalCache,
    last_aging: Mutex<Option<Instant>>,
}

impl Aria {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_configs(store, EngineConfig::default(), GeneratorConfig::default())
    }

    pub fn with_configs(
        store: Arc<dyn Store>,
        config: EngineConfig,
        generator_config: GeneratorConfig,
    ) -> Self {
        let global_cache = GlobalCache::new(config.global_cache_ttl, config.retry_attempts);
        Self {
            store,
            config,
            generator_config,
            global_cache,
            last_aging: Mutex::new(None),
        }
    }

    /// Replace the pipeline configuration
    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.global_cache = GlobalCache::new(config.global_cache_ttl, config.retry_attempts);
        self.config = config;
        self
    }

    /// Replace the generator configuration
    pub fn with_generator_config(mut self, config: GeneratorConfig) -> Self {
        self.generator_config = config;
        self
    }

    pub fn store(&self) -> Arc<dyn Store> {
        self.store.clone()
    }

    /// Ingest one message as a full tick: counter advance, statistics
    /// accumulation, scoring, pair reinforcement, decay.
    ///
    /// Only `Backend` errors propagate. Empty text or a missing user
    /// produce a `processed: false` report without advancing the counter;
    /// text that normalizes to nothing reports `processed: true` with
    /// reason `"no tokens"`.
    pub async fn process_message(
        &self,
        text: &str,
        message_id: &str,
        user_id: &str,
    ) -> AriaResult<ProcessReport> {
        if user_id.trim().is_empty() {
            log::debug!("rejecting message {}: missing user", message_id);
            return Ok(ProcessReport::skipped("missing user"));
        }
        if text.trim().is_empty() {
            log::debug!("rejecting message {}: empty message", message_id);
            return Ok(ProcessReport::skipped("empty message"));
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(ProcessReport {
                processed: true,
                reason: Some("no tokens".into()),
                ..ProcessReport::default()
            });
        }

        let store = self.store.as_ref();
        let message_index =
            with_retries(self.config.retry_attempts, || store.next_message_index()).await?;
        log::debug!(
            "message {} from {} processing as tick {}",
            message_id,
            user_id,
            message_index
        );

        let mut tick = Tick::new(message_index, tokens);
        pipeline::stats::accumulate(store, &self.global_cache, &mut tick).await?;
        pipeline::scorer::score(store, &self.global_cache, &mut tick, now_unix()).await?;
        pipeline::pairs::reinforce(store, &mut tick).await?;
        pipeline::decay::run(store, &mut tick).await?;

        self.maybe_age_tokens().await;

        Ok(tick.into_report())
    }

    /// Generate a short response by walking the pair/category graph.
    ///
    /// Infallible: empty memory, empty output and backend failures all
    /// collapse to `"..."`.
    pub async fn generate_response(&self, text: &str, options: GenerateOptions) -> String {
        let max_length = options
            .max_length
            .min(self.generator_config.max_length_chars);
        Generator::new(self.store.as_ref(), &self.generator_config)
            .respond(text, max_length)
            .await
    }

    /// Rate-limited aging sweep; failures are logged, never surfaced
    async fn maybe_age_tokens(&self) {
        if !self.config.aging_enabled {
            return;
        }
        {
            let mut guard = match self.last_aging.lock() {
                Ok(guard) => guard,
                Err(_) => return,
            };
            if let Some(last) = *guard {
                if last.elapsed() < self.config.aging_min_interval {
                    return;
                }
            }
            *guard = Some(Instant::now());
        }

        match pipeline::decay::age_idle_tokens(self.store.as_ref(), &self.config, now_unix()).await
        {
            Ok(touched) if touched > 0 => log::debug!("aged {} idle tokens", touched),
            Ok(_) => {}
            Err(err) => log::warn!("aging sweep failed: {}", err),
        }
    }

    // --- informational queries ---

    pub async fn memory_stats(&self) -> AriaResult<MemoryStats> {
        let store = self.store.as_ref();
        let tiers = store.pair_tier_counts().await?;
        Ok(MemoryStats {
            total_tokens: store.token_count().await?,
            total_pairs: tiers.total(),
            tiers,
            current_message_index: store.current_message_index().await?,
            global: self.global_cache.get(store).await?,
        })
    }

    /// Live pairs containing `word`, strongest first
    pub async fn search_by_word(&self, word: &str) -> AriaResult<Vec<Pair>> {
        let word = StringValidator::not_blank(word, "word")?;
        let normalized = tokenize(&word)
            .into_iter()
            .next()
            .ok_or_else(|| crate::AriaError::Invalid("word does not tokenize".into()))?;
        self.store.search_pairs_by_word(&normalized).await
    }

    pub async fn get_token_stats(&self, token: &str) -> AriaResult<Option<TokenStat>> {
        self.store.get_token_stat(&token.to_lowercase()).await
    }

    pub async fn get_tokens_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        self.store.tokens_by_category(category, limit).await
    }

    pub async fn get_top_pairs(&self, limit: usize, tier: Option<Tier>) -> AriaResult<Vec<Pair>> {
        self.store.top_pairs(limit, tier).await
    }

    /// Walk-derived chains reachable from `word`; never persisted
    pub async fn get_emergent_chains(
        &self,
        word: &str,
        max_len: usize,
    ) -> AriaResult<Vec<EmergentChain>> {
        let word = StringValidator::not_blank(word, "word")?;
        let normalized = tokenize(&word)
            .into_iter()
            .next()
            .ok_or_else(|| crate::AriaError::Invalid("word does not tokenize".into()))?;
        Generator::new(self.store.as_ref(), &self.generator_config)
            .discover_chains(&normalized, max_len)
            .await
    }

    // --- legacy cluster surface, kept as a view over pair queries ---

    #[deprecated(since = "0.1.0", note = "clusters are folded into pairs; use search_by_word()")]
    pub async fn search_clusters(&self, word: &str) -> AriaResult<Vec<Pair>> {
        self.search_by_word(word).await
    }

    #[deprecated(since = "0.1.0", note = "clusters are folded into pairs; use get_top_pairs()")]
    pub async fn top_clusters(&self, limit: usize) -> AriaResult<Vec<Pair>> {
        self.get_top_pairs(limit, None).await
    }
}
