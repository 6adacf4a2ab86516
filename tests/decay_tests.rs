
use aria_rs::{Store, Tier};
use pretty_assertions::assert_eq;
use test_helpers::*;

#[tokio::test]
async fn repeated_reinforcement_saturates_strength_and_reaches_long_tier() {
    let aria = engine();

    let mut long_by = None;
    for i in 0..50 {
        feed_one(&aria, "good morning", &format!("rep-{}", i)).await;
        let p = pair(&aria, "good_morning").await;
        assert!(p.strength <= 1.0);
        assert_eq!(p.tier, Tier::from_strength(p.strength));
        if long_by.is_none() && p.tier == Tier::Long {
            long_by = Some(i + 1);
        }
    }

    let p = pair(&aria, "good_morning").await;
    assert_eq!(p.strength, 1.0, "strength saturates at the ceiling");
    assert_eq!(p.tier, Tier::Long);
    assert_eq!(p.frequency, 50);
    assert_eq!(p.reinforcement_count, 50);
    let reached = long_by.expect("pair should reach the long tier");
    assert!(reached <= 40, "long tier reached at repetition {}", reached);
}

#[tokio::test]
async fn stable_endpoints_reinforce_faster_than_unclassified_ones() {
    let aria = engine();
    feed_repeated(&aria, "good morning", 5).await;

    let before = pair(&aria, "good_morning").await.strength;
    feed_one(&aria, "good morning", "boosted").await;
    let after = pair(&aria, "good_morning").await.strength;

    // both endpoints are stable by now: 0.02 x 1.5
    assert!((after - before - 0.03).abs() < 1e-9);
}

#[tokio::test]
async fn one_short_interval_decays_a_fresh_pair_by_its_rate() {
    let aria = engine();
    feed_one(&aria, "alpha beta", "seed").await;

    // ticks 2..=51; the deadline at 51 fires on the last one
    advance_ticks(&aria, 50, "a").await;

    let p = pair(&aria, "alpha_beta").await;
    assert!(
        (p.strength - 0.02 * (1.0 - 0.15)).abs() < 1e-9,
        "one decay event: {}",
        p.strength
    );
    assert_eq!(p.tier, Tier::Short);
    assert_eq!(p.decay_count, 1);
    assert_eq!(p.decay_at_message, 51 + 50);
}

#[tokio::test]
async fn a_full_decay_cycle_weakens_every_unreinforced_pair() {
    let aria = engine();
    feed(&aria, &["alpha beta", "gamma delta notion", "keep sake"]).await;

    let before: Vec<(String, f64)> = aria
        .get_top_pairs(100, None)
        .await
        .expect("pairs")
        .into_iter()
        .map(|p| (p.pattern_key(), p.strength))
        .collect();
    assert!(!before.is_empty());

    advance_ticks(&aria, 60, "b").await;

    for (key, old_strength) in before {
        let p = pair(&aria, &key).await;
        assert!(
            p.tier == Tier::Decay || p.strength < old_strength,
            "pair {} neither retired nor weakened",
            key
        );
    }
}

#[tokio::test]
async fn pairs_below_the_floor_retire_to_the_decay_tier() {
    let aria = engine();
    feed_one(&aria, "brief spark", "seed").await;

    // five short-tier decay events push 0.02 under the 0.01 floor
    advance_ticks(&aria, 260, "c").await;

    let p = pair(&aria, "brief_spark").await;
    assert_eq!(p.tier, Tier::Decay);
    assert!(p.strength < 0.01);
    assert_eq!(p.decay_count, 5);
}

#[tokio::test]
async fn a_retired_pair_revives_as_a_fresh_short_pair() {
    let aria = engine();
    feed_one(&aria, "brief spark", "seed").await;
    advance_ticks(&aria, 260, "d").await;
    assert_eq!(pair(&aria, "brief_spark").await.tier, Tier::Decay);

    let report = feed_one(&aria, "brief spark", "revival").await;
    assert_eq!(report.new_pairs, Some(1));
    assert_eq!(report.reinforced, Some(0));

    let revived = pair(&aria, "brief_spark").await;
    assert_eq!(revived.tier, Tier::Short);
    assert_eq!(revived.strength, 0.02);
    assert_eq!(revived.frequency, 1);
    assert_eq!(revived.decay_count, 0);
}

#[tokio::test]
async fn an_overdue_pair_reseen_decays_before_it_reinforces() {
    let aria = engine();
    feed_one(&aria, "alpha beta", "seed").await;

    // stop one tick short of the deadline so the pair is overdue but
    // untouched when the next real message arrives
    advance_ticks(&aria, 49, "e").await;
    assert_eq!(pair(&aria, "alpha_beta").await.decay_count, 0);

    let report = feed_one(&aria, "alpha beta", "reseen").await;
    assert_eq!(report.reinforced, Some(1));

    let p = pair(&aria, "alpha_beta").await;
    // 0.02 decayed once, then one unclassified reinforcement
    assert!((p.strength - (0.02 * 0.85 + 0.02)).abs() < 1e-9);
    assert_eq!(p.decay_count, 1);
    assert_eq!(p.last_seen_message_index, 51);
    assert!(p.decay_at_message > 51);
}

#[tokio::test]
async fn decay_report_distinguishes_weakened_from_retired() {
    let aria = engine();
    feed_one(&aria, "alpha beta", "seed").await;
    advance_ticks(&aria, 49, "f").await;

    // tick 51 fires the deadline for the surviving pair
    let report = feed_one(&aria, "padfinal", "tick-51").await;
    assert_eq!(report.decayed, Some(1));
    assert_eq!(report.removed, Some(0));

    let p = aria
        .store()
        .get_pair("alpha_beta")
        .await
        .expect("store")
        .expect("pair");
    assert_eq!(p.decay_count, 1);
}
