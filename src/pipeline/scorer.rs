// Category scorer and the inertia protocol

use crate::config::{
    CATEGORY_FLOOR, INERTIA_THRESHOLD, MIN_OCCURRENCES_FOR_CATEGORY, POSITION_HISTORY,
};
use crate::engine::GlobalCache;
use crate::pipeline::Tick;
use crate::store::Store;
use crate::types::{AriaResult, Category, GlobalDelta, GlobalStats, TokenStat};
use crate::utils::with_retries;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Sample variance over integer positions: mean(x²) − mean(x)²
pub(crate) fn positional_variance(positions: &[u32]) -> f64 {
    if positions.is_empty() {
        return 0.0;
    }
    let n = positions.len() as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for &p in positions {
        let x = p as f64;
        sum += x;
        sum_sq += x * x;
    }
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Derive the four behavioral scores of `stat` against the global record
fn apply_scores(stat: &mut TokenStat, global: &GlobalStats) {
    let g_ctx = global.total_contexts_seen.max(1) as f64;
    let g_adj = global.total_adj_windows.max(1) as f64;
    let g_var = global.max_positional_variance.max(1.0);
    let occurrences = stat.total_occurrences.max(1) as f64;
    let variance = stat.positional_variance;

    stat.stability = clamp01(
        stat.context_count as f64 / g_ctx + stat.unique_adjacency_count as f64 / g_adj
            - variance / g_var,
    );
    stat.transition = clamp01(
        stat.bridge_count as f64 / occurrences
            + stat.temporal_adj_count as f64 / occurrences
            + variance / g_var,
    );
    stat.dependency = clamp01(
        stat.adjacent_to_stable as f64 / occurrences
            + stat.contrast_pair_count as f64 / occurrences
            - stat.standalone_count as f64 / occurrences,
    );
    stat.structural = clamp01(
        stat.total_occurrences as f64 / g_ctx + stat.temporal_adj_count as f64 / occurrences
            - stat.unique_adjacency_count as f64 / g_adj
            - stat.standalone_count as f64 / occurrences
            - variance / g_var,
    );
}

/// The category the scores argue for this tick.
///
/// Ties resolve by priority: stable > transition > modifier > structural
/// (modifier is named from the dependency score).
fn candidate_category(stat: &TokenStat) -> Category {
    if stat.total_occurrences < MIN_OCCURRENCES_FOR_CATEGORY {
        return Category::Unclassified;
    }
    let ranked = [
        (Category::Stable, stat.stability),
        (Category::Transition, stat.transition),
        (Category::Modifier, stat.dependency),
        (Category::Structural, stat.structural),
    ];
    let mut best = ranked[0];
    for entry in &ranked[1..] {
        if entry.1 > best.1 {
            best = *entry;
        }
    }
    if best.1 <= CATEGORY_FLOOR {
        Category::Unclassified
    } else {
        best.0
    }
}

/// A change commits only after the same non-current candidate wins three
/// consecutive ticks.
fn apply_inertia(stat: &mut TokenStat, candidate: Category) {
    if candidate == stat.category {
        stat.pending_category = None;
        stat.pending_count = 0;
    } else if Some(candidate) == stat.pending_category {
        stat.pending_count += 1;
        if stat.pending_count >= INERTIA_THRESHOLD {
            stat.category = candidate;
            stat.pending_category = None;
            stat.pending_count = 0;
        }
    } else {
        stat.pending_category = Some(candidate);
        stat.pending_count = 1;
    }
}

/// Refresh variances, re-derive scores and run inertia for every token in
/// the tick, writing each stat back once.
pub(crate) async fn score(
    store: &dyn Store,
    cache: &GlobalCache,
    tick: &mut Tick,
    now_unix: u64,
) -> AriaResult<()> {
    // Pass A: variance refresh and the high-water mark, written before any
    // score reads it
    let tokens: Vec<String> = tick.stats.keys().cloned().collect();
    let mut batch_max = 0.0f64;
    for token in &tokens {
        let positions = store.recent_positions(token, POSITION_HISTORY).await?;
        let variance = positional_variance(&positions);
        if let Some(stat) = tick.stats.get_mut(token) {
            stat.positional_variance = variance;
        }
        batch_max = batch_max.max(variance);
    }

    let current = cache.get(store).await?;
    if batch_max > current.max_positional_variance {
        with_retries(cache.retry_attempts(), || {
            store.update_global_stats(GlobalDelta::default(), Some(batch_max))
        })
        .await?;
        cache.invalidate();
    }

    // Pass B: scores, candidate, inertia
    let global = cache.get(store).await?;
    let mut categorized = 0;
    for token in &tokens {
        let stat = match tick.stats.get_mut(token) {
            Some(stat) => stat,
            None => continue,
        };
        apply_scores(stat, &global);
        let candidate = candidate_category(stat);
        apply_inertia(stat, candidate);
        stat.last_updated_at = now_unix;
        if stat.category != Category::Unclassified {
            categorized += 1;
        }
        store.upsert_token_stat(stat).await?;
    }
    tick.categorized = categorized;

    log::debug!(
        "scored {} tokens at tick {} ({} categorized)",
        tokens.len(),
        tick.message_index,
        categorized
    );
    Ok(())
}
