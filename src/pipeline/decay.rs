// Decay engine and the idle-token aging sweep

use crate::config::{DECAY_MIN, EngineConfig};
use crate::pipeline::Tick;
use crate::store::Store;
use crate::types::{AriaResult, Tier};

/// Decay every pair whose `decay_at_message` has arrived.
///
/// Pairs reinforced earlier in this tick always carry a future
/// `decay_at_message`, so they are never double-processed here.
pub(crate) async fn run(store: &dyn Store, tick: &mut Tick) -> AriaResult<()> {
    let due = store.pairs_due_for_decay(tick.message_index).await?;
    if due.is_empty() {
        return Ok(());
    }

    for mut pair in due {
        let new_strength = pair.strength * (1.0 - pair.tier.rate());
        pair.decay_count += 1;

        if new_strength < DECAY_MIN {
            pair.strength = new_strength.max(0.0);
            let key = pair.pattern_key();
            store.update_pair(&pair).await?;
            store.move_pair_tier(&key, Tier::Decay).await?;
            tick.removed += 1;
        } else {
            pair.strength = new_strength;
            let new_tier = Tier::from_strength(new_strength);
            pair.tier = new_tier;
            pair.decay_at_message = tick.message_index + new_tier.interval();
            store.update_pair(&pair).await?;
            tick.decayed += 1;
        }
    }

    log::debug!(
        "tick {}: {} pairs decayed, {} retired",
        tick.message_index,
        tick.decayed,
        tick.removed
    );
    Ok(())
}

/// Nudge the scores of long-idle tokens down without re-deriving their
/// categories. Returns how many tokens were touched.
pub(crate) async fn age_idle_tokens(
    store: &dyn Store,
    config: &EngineConfig,
    now_unix: u64,
) -> AriaResult<usize> {
    let idle = store
        .idle_token_stats(
            config.aging_idle.as_secs(),
            now_unix,
            config.aging_sweep_limit,
        )
        .await?;

    let mut touched = 0;
    for mut stat in idle {
        stat.stability *= config.aging_factor;
        stat.transition *= config.aging_factor;
        stat.dependency *= config.aging_factor;
        stat.structural *= config.aging_factor;
        stat.last_updated_at = now_unix;
        store.upsert_token_stat(&stat).await?;
        touched += 1;
    }
    Ok(touched)
}
