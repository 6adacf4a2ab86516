use aria_rs::{
    Category, GlobalDelta, InsertOutcome, MemoryStore, Pair, Store, Tier, TokenStat,
};
use pretty_assertions::assert_eq;

fn sample_pair(a: &str, b: &str) -> Pair {
    Pair::new(a, b, 1, "unclassified->unclassified".to_string())
}

#[tokio::test]
async fn pattern_keys_are_canonical_regardless_of_endpoint_order() {
    assert_eq!(Pair::key_for("beta", "alpha"), "alpha_beta");
    assert_eq!(Pair::key_for("alpha", "beta"), "alpha_beta");

    let reversed = sample_pair("zulu", "alpha");
    assert_eq!(reversed.token_a, "alpha");
    assert_eq!(reversed.token_b, "zulu");
    assert_eq!(reversed.pattern_key(), "alpha_zulu");
}

#[tokio::test]
async fn inserting_over_a_live_pair_reports_a_conflict() {
    let store = MemoryStore::new();
    let pair = sample_pair("alpha", "beta");

    assert_eq!(store.insert_pair(&pair).await.unwrap(), InsertOutcome::Created);
    assert_eq!(store.insert_pair(&pair).await.unwrap(), InsertOutcome::Conflict);
}

#[tokio::test]
async fn inserting_over_a_retired_pair_overwrites_it() {
    let store = MemoryStore::new();
    let mut retired = sample_pair("alpha", "beta");
    retired.tier = Tier::Decay;
    retired.strength = 0.004;
    retired.decay_count = 5;
    store.insert_pair(&retired).await.unwrap();

    let fresh = sample_pair("alpha", "beta");
    assert_eq!(store.insert_pair(&fresh).await.unwrap(), InsertOutcome::Created);

    let stored = store.get_pair("alpha_beta").await.unwrap().expect("pair");
    assert_eq!(stored.tier, Tier::Short);
    assert_eq!(stored.strength, 0.02);
    assert_eq!(stored.decay_count, 0);
}

#[tokio::test]
async fn position_history_is_bounded_to_the_most_recent_samples() {
    let store = MemoryStore::new();
    for i in 0..150u32 {
        store.append_token_position("word", i, i as u64 + 1).await.unwrap();
    }

    let positions = store.recent_positions("word", 100).await.unwrap();
    assert_eq!(positions.len(), 100);
    assert_eq!(positions.first(), Some(&50));
    assert_eq!(positions.last(), Some(&149));

    let few = store.recent_positions("word", 10).await.unwrap();
    assert_eq!(few, (140..150).collect::<Vec<u32>>());
}

#[tokio::test]
async fn unknown_tokens_map_to_unclassified_in_batch_lookups() {
    let store = MemoryStore::new();
    let mut known = TokenStat::new("known");
    known.category = Category::Stable;
    store.upsert_token_stat(&known).await.unwrap();

    let categories = store
        .get_many_categories(&["known".to_string(), "missing".to_string()])
        .await
        .unwrap();
    assert_eq!(categories.get("known"), Some(&Category::Stable));
    assert_eq!(categories.get("missing"), Some(&Category::Unclassified));
}

#[tokio::test]
async fn search_and_top_queries_hide_the_decay_tier() {
    let store = MemoryStore::new();
    store.insert_pair(&sample_pair("alpha", "beta")).await.unwrap();
    let mut retired = sample_pair("alpha", "gamma");
    retired.tier = Tier::Decay;
    store.insert_pair(&retired).await.unwrap();

    let by_word = store.search_pairs_by_word("alpha").await.unwrap();
    assert_eq!(by_word.len(), 1);
    assert_eq!(by_word[0].pattern_key(), "alpha_beta");

    let top = store.top_pairs(10, None).await.unwrap();
    assert_eq!(top.len(), 1);

    let retired_only = store.top_pairs(10, Some(Tier::Decay)).await.unwrap();
    assert_eq!(retired_only.len(), 1);
    assert_eq!(retired_only[0].pattern_key(), "alpha_gamma");
}

#[tokio::test]
async fn search_results_are_ordered_strongest_first() {
    let store = MemoryStore::new();
    let mut weak = sample_pair("hub", "weakling");
    weak.strength = 0.05;
    let mut strong = sample_pair("hub", "champion");
    strong.strength = 0.9;
    strong.tier = Tier::Long;
    let mut middle = sample_pair("hub", "midway");
    middle.strength = 0.4;
    middle.tier = Tier::Medium;
    for pair in [&weak, &strong, &middle] {
        store.insert_pair(pair).await.unwrap();
    }

    let results = store.search_pairs_by_word("hub").await.unwrap();
    let strengths: Vec<f64> = results.iter().map(|p| p.strength).collect();
    assert_eq!(strengths, vec![0.9, 0.4, 0.05]);
}

#[tokio::test]
async fn due_pairs_are_selected_by_deadline_and_tier() {
    let store = MemoryStore::new();
    let mut due = sample_pair("aa", "bb");
    due.decay_at_message = 10;
    let mut not_due = sample_pair("cc", "dd");
    not_due.decay_at_message = 11;
    let mut retired = sample_pair("ee", "ff");
    retired.decay_at_message = 5;
    retired.tier = Tier::Decay;
    for pair in [&due, &not_due, &retired] {
        store.insert_pair(pair).await.unwrap();
    }

    let selected = store.pairs_due_for_decay(10).await.unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].pattern_key(), "aa_bb");
}

#[tokio::test]
async fn moving_a_missing_pair_is_a_not_found_error() {
    let store = MemoryStore::new();
    let err = store.move_pair_tier("no_such", Tier::Decay).await.unwrap_err();
    assert!(matches!(err, aria_rs::AriaError::NotFound(_)));
}

#[tokio::test]
async fn the_variance_high_water_mark_never_lowers() {
    let store = MemoryStore::new();
    store
        .update_global_stats(GlobalDelta::default(), Some(4.0))
        .await
        .unwrap();
    store
        .update_global_stats(GlobalDelta::default(), Some(2.5))
        .await
        .unwrap();

    let global = store.get_global_stats().await.unwrap();
    assert_eq!(global.max_positional_variance, 4.0);
}

#[tokio::test]
async fn the_counter_is_dense_and_monotonic() {
    let store = MemoryStore::new();
    assert_eq!(store.current_message_index().await.unwrap(), 0);
    assert_eq!(store.next_message_index().await.unwrap(), 1);
    assert_eq!(store.next_message_index().await.unwrap(), 2);
    assert_eq!(store.current_message_index().await.unwrap(), 2);
}
