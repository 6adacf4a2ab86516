// Pair engine: creation, reinforcement, tier promotion

use std::collections::HashMap;

use crate::config::{REINFORCEMENT_BASE, STRENGTH_MAX};
use crate::pipeline::Tick;
use crate::store::Store;
use crate::types::{AriaResult, Category, InsertOutcome, Pair, Tier};

/// Reinforcement modifier for a pair whose endpoints currently hold the
/// given categories. A fully-unclassified pair reinforces at the base
/// modifier; the unclassified discount only applies next to a classified
/// partner.
fn reinforcement_modifier(cat_a: Category, cat_b: Category) -> f64 {
    if cat_a == Category::Unclassified && cat_b == Category::Unclassified {
        return 1.0;
    }
    cat_a.promotion_weight().max(cat_b.promotion_weight())
}

fn pattern_of(cat_a: Category, cat_b: Category) -> String {
    format!("{}->{}", cat_a.as_str(), cat_b.as_str())
}

/// Categories of a pair's endpoints in canonical (sorted) order
fn endpoint_categories(
    a: &str,
    b: &str,
    categories: &HashMap<String, Category>,
) -> (Category, Category) {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    (
        categories.get(first).copied().unwrap_or_default(),
        categories.get(second).copied().unwrap_or_default(),
    )
}

fn reinforce_pair(pair: &mut Pair, cat_a: Category, cat_b: Category, message_index: u64) -> bool {
    let entry_tier = pair.tier;

    // a pending decay event is applied before the reinforcement lands
    if pair.decay_at_message <= message_index {
        pair.strength *= 1.0 - pair.tier.rate();
        pair.decay_count += 1;
    }

    let add = REINFORCEMENT_BASE * reinforcement_modifier(cat_a, cat_b);
    pair.strength = (pair.strength + add).min(STRENGTH_MAX);

    let new_tier = Tier::from_strength(pair.strength);
    pair.tier = new_tier;
    pair.category_pattern = pattern_of(cat_a, cat_b);
    pair.frequency += 1;
    pair.reinforcement_count += 1;
    pair.decay_at_message = message_index + new_tier.interval();
    pair.last_seen_message_index = message_index;

    new_tier != entry_tier
}

/// Create or reinforce every adjacent pair of the tick's token sequence.
///
/// Endpoint categories are re-read from storage in one batched call; the
/// pair's stored `category_pattern` is never trusted.
pub(crate) async fn reinforce(store: &dyn Store, tick: &mut Tick) -> AriaResult<()> {
    let n = tick.tokens.len();
    if n < 2 {
        return Ok(());
    }

    let mut adjacencies: Vec<(String, String)> = Vec::with_capacity(n - 1);
    for i in 0..n - 1 {
        let a = &tick.tokens[i];
        let b = &tick.tokens[i + 1];
        if a != b {
            adjacencies.push((a.clone(), b.clone()));
        }
    }
    if adjacencies.is_empty() {
        return Ok(());
    }

    let mut distinct: Vec<String> = adjacencies
        .iter()
        .flat_map(|(a, b)| [a.clone(), b.clone()])
        .collect();
    distinct.sort();
    distinct.dedup();
    let categories = store.get_many_categories(&distinct).await?;

    for (a, b) in adjacencies {
        let key = Pair::key_for(&a, &b);
        let (cat_a, cat_b) = endpoint_categories(&a, &b, &categories);

        match store.get_pair(&key).await? {
            Some(pair) if pair.tier == Tier::Decay => {
                // a retired pair re-enters as a fresh short-tier record
                let fresh = Pair::new(&a, &b, tick.message_index, pattern_of(cat_a, cat_b));
                store.insert_pair(&fresh).await?;
                tick.new_pairs += 1;
            }
            Some(mut pair) => {
                if reinforce_pair(&mut pair, cat_a, cat_b, tick.message_index) {
                    tick.promoted += 1;
                }
                store.update_pair(&pair).await?;
                tick.reinforced += 1;
            }
            None => {
                let fresh = Pair::new(&a, &b, tick.message_index, pattern_of(cat_a, cat_b));
                match store.insert_pair(&fresh).await? {
                    InsertOutcome::Created => tick.new_pairs += 1,
                    InsertOutcome::Conflict => {
                        // a concurrent tick won the insert; fall through to
                        // the reinforce branch
                        match store.get_pair(&key).await? {
                            Some(mut pair) => {
                                if reinforce_pair(&mut pair, cat_a, cat_b, tick.message_index) {
                                    tick.promoted += 1;
                                }
                                store.update_pair(&pair).await?;
                                tick.reinforced += 1;
                            }
                            None => {
                                log::debug!("pair {} vanished after conflict, skipping", key);
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
