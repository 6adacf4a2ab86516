// Token statistics accumulator

use std::collections::{HashMap, HashSet};

use crate::config::ADJACENCY_WINDOW;
use crate::engine::GlobalCache;
use crate::pipeline::Tick;
use crate::store::Store;
use crate::types::{AriaResult, Category, GlobalDelta, TokenStat};
use crate::utils::tokenizer::{has_contrast_partner_in, is_temporal_marker};
use crate::utils::with_retries;

/// What one message contributes to a single token
#[derive(Default)]
struct Scratch {
    occurrences: u64,
    bridges: u64,
    adjacency: HashSet<String>,
    saw_temporal: bool,
    saw_stable: bool,
}

/// Update per-token counters, position history and the global record for
/// the message held by `tick`.
pub(crate) async fn accumulate(
    store: &dyn Store,
    cache: &GlobalCache,
    tick: &mut Tick,
) -> AriaResult<()> {
    let n = tick.tokens.len();
    let token_set: HashSet<&str> = tick.tokens.iter().map(String::as_str).collect();

    for token in &token_set {
        let stat = store
            .get_token_stat(token)
            .await?
            .unwrap_or_else(|| TokenStat::new(*token));
        tick.stats.insert((*token).to_string(), stat);
    }

    // Snapshot used for every adjacent-to-stable signal in this message
    let stable_set: HashSet<String> = tick
        .stats
        .values()
        .filter(|stat| stat.category == Category::Stable)
        .map(|stat| stat.token.clone())
        .collect();

    let mut scratch: HashMap<String, Scratch> = HashMap::with_capacity(token_set.len());

    for i in 0..n {
        let token = tick.tokens[i].clone();
        store
            .append_token_position(&token, i as u32, tick.message_index)
            .await?;

        let entry = scratch.entry(token).or_default();
        entry.occurrences += 1;

        let lo = i.saturating_sub(ADJACENCY_WINDOW);
        let hi = (i + ADJACENCY_WINDOW).min(n.saturating_sub(1));
        for j in lo..=hi {
            if j == i {
                continue;
            }
            let neighbor = &tick.tokens[j];
            entry.adjacency.insert(neighbor.clone());
            if is_temporal_marker(neighbor) {
                entry.saw_temporal = true;
            }
            if stable_set.contains(neighbor) {
                entry.saw_stable = true;
            }
        }

        if i > 0
            && i < n - 1
            && stable_set.contains(&tick.tokens[i - 1])
            && stable_set.contains(&tick.tokens[i + 1])
        {
            entry.bridges += 1;
        }
    }

    for (token, contribution) in scratch {
        let stat = match tick.stats.get_mut(&token) {
            Some(stat) => stat,
            None => continue,
        };

        stat.total_occurrences += contribution.occurrences;
        stat.bridge_count += contribution.bridges;

        // at most one increment per (token, message); the loaded snapshot
        // still holds the previous tick's index
        if stat.last_message_index != tick.message_index {
            stat.context_count += 1;
        }
        if contribution.saw_temporal {
            stat.temporal_adj_count += 1;
        }
        if contribution.saw_stable {
            stat.adjacent_to_stable += 1;
        }
        if has_contrast_partner_in(&token, &token_set) {
            stat.contrast_pair_count += 1;
        }
        if tick.standalone {
            stat.standalone_count += 1;
        }

        stat.unique_adjacency_count = stat
            .unique_adjacency_count
            .max(contribution.adjacency.len() as u64);
        stat.last_message_index = tick.message_index;
    }

    let delta = GlobalDelta {
        contexts: 1,
        adj_windows: n.saturating_sub(1) as u64,
        tokens: n as u64,
    };
    with_retries(cache.retry_attempts(), || {
        store.update_global_stats(delta, None)
    })
    .await?;
    cache.invalidate();

    Ok(())
}
