// In-memory reference Store

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::backend_error;
use crate::config::POSITION_HISTORY;
use crate::store::Store;
use crate::types::{
    AriaResult, Category, GlobalDelta, GlobalStats, InsertOutcome, Pair, TierCounts, TokenStat,
    Tier,
};

/// Process-local [`Store`] on concurrent maps.
///
/// The reference backend for tests and single-process deployments. Row
/// operations are linearizable through the shard locks of [`DashMap`];
/// the counter is a fetch-add; the global record sits behind a mutex so
/// delta and high-water mark land in one write.
pub struct MemoryStore {
    counter: AtomicU64,
    tokens: DashMap<String, TokenStat>,
    positions: DashMap<String, VecDeque<(u32, u64)>>,
    pairs: DashMap<String, Pair>,
    global: Mutex<GlobalStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            tokens: DashMap::new(),
            positions: DashMap::new(),
            pairs: DashMap::new(),
            global: Mutex::new(GlobalStats::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn by_strength_desc(a: &Pair, b: &Pair) -> Ordering {
    b.strength
        .partial_cmp(&a.strength)
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl Store for MemoryStore {
    async fn next_message_index(&self) -> AriaResult<u64> {
        Ok(self.counter.fetch_add(1, AtomicOrdering::SeqCst) + 1)
    }

    async fn current_message_index(&self) -> AriaResult<u64> {
        Ok(self.counter.load(AtomicOrdering::SeqCst))
    }

    async fn get_token_stat(&self, token: &str) -> AriaResult<Option<TokenStat>> {
        Ok(self.tokens.get(token).map(|entry| entry.value().clone()))
    }

    async fn upsert_token_stat(&self, stat: &TokenStat) -> AriaResult<()> {
        self.tokens.insert(stat.token.clone(), stat.clone());
        Ok(())
    }

    async fn append_token_position(
        &self,
        token: &str,
        position: u32,
        message_index: u64,
    ) -> AriaResult<()> {
        let mut history = self.positions.entry(token.to_string()).or_default();
        history.push_back((position, message_index));
        // eager form of the read-time pruning policy
        while history.len() > POSITION_HISTORY {
            history.pop_front();
        }
        Ok(())
    }

    async fn recent_positions(&self, token: &str, limit: usize) -> AriaResult<Vec<u32>> {
        let history = match self.positions.get(token) {
            Some(history) => history,
            None => return Ok(Vec::new()),
        };
        let skip = history.len().saturating_sub(limit);
        Ok(history.iter().skip(skip).map(|(pos, _)| *pos).collect())
    }

    async fn get_many_categories(
        &self,
        tokens: &[String],
    ) -> AriaResult<HashMap<String, Category>> {
        let mut categories = HashMap::with_capacity(tokens.len());
        for token in tokens {
            let category = self
                .tokens
                .get(token)
                .map(|entry| entry.category)
                .unwrap_or_default();
            categories.insert(token.clone(), category);
        }
        Ok(categories)
    }

    async fn get_global_stats(&self) -> AriaResult<GlobalStats> {
        let global = self
            .global
            .lock()
            .map_err(|_| backend_error!("global stats lock poisoned"))?;
        Ok(global.clone())
    }

    async fn update_global_stats(
        &self,
        delta: GlobalDelta,
        new_max_variance: Option<f64>,
    ) -> AriaResult<()> {
        let mut global = self
            .global
            .lock()
            .map_err(|_| backend_error!("global stats lock poisoned"))?;
        global.total_contexts_seen += delta.contexts;
        global.total_adj_windows += delta.adj_windows;
        global.total_tokens_seen += delta.tokens;
        if let Some(max_variance) = new_max_variance {
            if max_variance > global.max_positional_variance {
                global.max_positional_variance = max_variance;
            }
        }
        Ok(())
    }

    async fn get_pair(&self, pattern_key: &str) -> AriaResult<Option<Pair>> {
        Ok(self.pairs.get(pattern_key).map(|entry| entry.value().clone()))
    }

    async fn insert_pair(&self, pair: &Pair) -> AriaResult<InsertOutcome> {
        match self.pairs.entry(pair.pattern_key()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().tier == Tier::Decay {
                    // delete-then-insert under the same key
                    occupied.insert(pair.clone());
                    Ok(InsertOutcome::Created)
                } else {
                    Ok(InsertOutcome::Conflict)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(pair.clone());
                Ok(InsertOutcome::Created)
            }
        }
    }

    async fn update_pair(&self, pair: &Pair) -> AriaResult<()> {
        self.pairs.insert(pair.pattern_key(), pair.clone());
        Ok(())
    }

    async fn search_pairs_by_word(&self, token: &str) -> AriaResult<Vec<Pair>> {
        let mut matches: Vec<Pair> = self
            .pairs
            .iter()
            .filter(|entry| {
                entry.tier != Tier::Decay
                    && (entry.token_a == token || entry.token_b == token)
            })
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(by_strength_desc);
        Ok(matches)
    }

    async fn top_pairs(&self, limit: usize, tier: Option<Tier>) -> AriaResult<Vec<Pair>> {
        let mut matches: Vec<Pair> = self
            .pairs
            .iter()
            .filter(|entry| match tier {
                Some(wanted) => entry.tier == wanted,
                None => entry.tier != Tier::Decay,
            })
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(by_strength_desc);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn pairs_due_for_decay(&self, message_index: u64) -> AriaResult<Vec<Pair>> {
        Ok(self
            .pairs
            .iter()
            .filter(|entry| entry.tier != Tier::Decay && entry.decay_at_message <= message_index)
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn move_pair_tier(&self, pattern_key: &str, new_tier: Tier) -> AriaResult<()> {
        match self.pairs.get_mut(pattern_key) {
            Some(mut entry) => {
                entry.tier = new_tier;
                Ok(())
            }
            None => Err(crate::AriaError::NotFound(format!(
                "pair {}",
                pattern_key
            ))),
        }
    }

    async fn token_count(&self) -> AriaResult<u64> {
        Ok(self.tokens.len() as u64)
    }

    async fn pair_tier_counts(&self) -> AriaResult<TierCounts> {
        let mut counts = TierCounts::default();
        for entry in self.pairs.iter() {
            match entry.tier {
                Tier::Short => counts.short += 1,
                Tier::Medium => counts.medium += 1,
                Tier::Long => counts.long += 1,
                Tier::Decay => counts.decay += 1,
            }
        }
        Ok(counts)
    }

    async fn tokens_by_category(
        &self,
        category: Category,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        let mut matches: Vec<TokenStat> = self
            .tokens
            .iter()
            .filter(|entry| entry.category == category)
            .map(|entry| entry.value().clone())
            .collect();
        matches.sort_by(|a, b| b.total_occurrences.cmp(&a.total_occurrences));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn idle_token_stats(
        &self,
        idle_secs: u64,
        now_unix: u64,
        limit: usize,
    ) -> AriaResult<Vec<TokenStat>> {
        let cutoff = now_unix.saturating_sub(idle_secs);
        let mut matches: Vec<TokenStat> = self
            .tokens
            .iter()
            .filter(|entry| entry.last_updated_at <= cutoff)
            .map(|entry| entry.value().clone())
            .collect();
        matches.truncate(limit);
        Ok(matches)
    }
}
