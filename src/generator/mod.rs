//! The response generator.
//!
//! Four stages run in order, each accepting only outputs of at least
//! `min_words`: emergent phrase discovery over pair chains, a
//! category-aware weighted walk of the pair graph, slot-based category
//! composition around a stable base, and a raw-pair fallback. The
//! generator is intentionally stochastic and never surfaces an error;
//! every internal failure collapses to `"..."`.

mod graph;

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GeneratorConfig;
use crate::store::Store;
use crate::types::{AriaResult, Category, EmergentChain};
use crate::utils::tokenizer::tokenize;

use graph::ResponseGraph;

/// Returned whenever the engine has nothing to say
pub const EMPTY_RESPONSE: &str = "...";

pub(crate) struct Generator<'a> {
    store: &'a dyn Store,
    config: &'a GeneratorConfig,
}

impl<'a> Generator<'a> {
    pub fn new(store: &'a dyn Store, config: &'a GeneratorConfig) -> Self {
        Self { store, config }
    }

    pub async fn respond(&self, text: &str, max_length: usize) -> String {
        match self.try_respond(text, max_length).await {
            Ok(Some(response)) if !response.is_empty() => response,
            Ok(_) => EMPTY_RESPONSE.to_string(),
            Err(err) => {
                log::debug!("generation failed, falling back to silence: {}", err);
                EMPTY_RESPONSE.to_string()
            }
        }
    }

    async fn try_respond(&self, text: &str, max_length: usize) -> AriaResult<Option<String>> {
        let mut keywords = tokenize(text);
        dedup_preserving_order(&mut keywords);
        let mut rng = StdRng::from_entropy();

        if let Some(words) = self.emergent_phrase(&keywords).await? {
            return Ok(non_empty(postprocess(&words, max_length)));
        }

        let response_graph = self.build_graph(&keywords).await?;
        if let Some(words) = graph::walk(&response_graph, &keywords, self.config, &mut rng) {
            return Ok(non_empty(postprocess(&words, max_length)));
        }

        if let Some(words) = self.compose(&keywords, &mut rng).await? {
            return Ok(non_empty(postprocess(&words, max_length)));
        }

        let words = self.raw_pairs(&keywords).await?;
        if words.is_empty() {
            return Ok(None);
        }
        Ok(non_empty(postprocess(&words, max_length)))
    }

    /// Depth-first chains from the leading keywords, strongest-first
    /// concatenation of non-overlapping chains.
    async fn emergent_phrase(&self, keywords: &[String]) -> AriaResult<Option<Vec<String>>> {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut chains: Vec<EmergentChain> = Vec::new();

        for keyword in keywords.iter().take(self.config.chain_keyword_limit) {
            self.chains_from(
                keyword,
                self.config.chain_max_len,
                &mut adjacency,
                &mut seen_keys,
                &mut chains,
            )
            .await?;
        }
        if chains.is_empty() {
            return Ok(None);
        }

        chains.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut used: HashSet<String> = HashSet::new();
        let mut words: Vec<String> = Vec::new();
        for chain in &chains {
            if words.len() >= self.config.max_words {
                break;
            }
            let overlap = chain
                .words
                .iter()
                .filter(|word| used.contains(*word))
                .count();
            if overlap * 2 > chain.words.len() {
                continue;
            }
            for word in &chain.words {
                if words.len() >= self.config.max_words {
                    break;
                }
                used.insert(word.clone());
                words.push(word.clone());
            }
        }

        if words.len() >= self.config.min_words {
            Ok(Some(words))
        } else {
            Ok(None)
        }
    }

    /// Chains reachable from `seed`, strongest (shortest) first
    pub(crate) async fn discover_chains(
        &self,
        seed: &str,
        max_len: usize,
    ) -> AriaResult<Vec<EmergentChain>> {
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut seen_keys: HashSet<String> = HashSet::new();
        let mut chains: Vec<EmergentChain> = Vec::new();
        self.chains_from(seed, max_len.max(2), &mut adjacency, &mut seen_keys, &mut chains)
            .await?;
        chains.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(chains)
    }

    /// Collect every chain of length 2..=`max_len` reachable from `seed`,
    /// visiting a token at most once per chain and following at most
    /// `chain_fanout` edges per node. Chains deduplicate by joined key.
    pub(crate) async fn chains_from(
        &self,
        seed: &str,
        max_len: usize,
        adjacency: &mut HashMap<String, Vec<String>>,
        seen_keys: &mut HashSet<String>,
        chains: &mut Vec<EmergentChain>,
    ) -> AriaResult<()> {
        let mut stack: Vec<Vec<String>> = vec![vec![seed.to_string()]];

        while let Some(path) = stack.pop() {
            if path.len() >= 2 {
                let key = path.join(" ");
                if seen_keys.insert(key) {
                    chains.push(EmergentChain {
                        weight: 1.0 / path.len() as f64,
                        words: path.clone(),
                    });
                }
            }
            if path.len() >= max_len {
                continue;
            }
            let last = match path.last() {
                Some(last) => last.clone(),
                None => continue,
            };
            for neighbor in self.neighbors(&last, adjacency).await? {
                if !path.contains(&neighbor) {
                    let mut extended = path.clone();
                    extended.push(neighbor);
                    stack.push(extended);
                }
            }
        }
        Ok(())
    }

    async fn neighbors(
        &self,
        token: &str,
        adjacency: &mut HashMap<String, Vec<String>>,
    ) -> AriaResult<Vec<String>> {
        if let Some(cached) = adjacency.get(token) {
            return Ok(cached.clone());
        }
        let pairs = self.store.search_pairs_by_word(token).await?;
        let neighbors: Vec<String> = pairs
            .iter()
            .filter_map(|pair| pair.other_endpoint(token).map(str::to_string))
            .take(self.config.chain_fanout)
            .collect();
        adjacency.insert(token.to_string(), neighbors.clone());
        Ok(neighbors)
    }

    /// Graph assembly: keyword pairs plus the global top pool, deduped
    /// by pattern key, categories fetched in one round-trip.
    async fn build_graph(&self, keywords: &[String]) -> AriaResult<ResponseGraph> {
        let mut by_key: HashMap<String, crate::types::Pair> = HashMap::new();
        for keyword in keywords.iter().take(self.config.keyword_limit) {
            for pair in self.store.search_pairs_by_word(keyword).await? {
                by_key.entry(pair.pattern_key()).or_insert(pair);
            }
        }
        for pair in self.store.top_pairs(self.config.top_pair_pool, None).await? {
            by_key.entry(pair.pattern_key()).or_insert(pair);
        }

        let mut tokens: Vec<String> = by_key
            .values()
            .flat_map(|pair| [pair.token_a.clone(), pair.token_b.clone()])
            .collect();
        tokens.sort();
        tokens.dedup();
        let categories = self.store.get_many_categories(&tokens).await?;

        Ok(ResponseGraph::build(
            by_key.into_values(),
            &categories,
            self.config.strength_threshold,
        ))
    }

    /// Slot-based composition around a stable base token.
    async fn compose(
        &self,
        keywords: &[String],
        rng: &mut StdRng,
    ) -> AriaResult<Option<Vec<String>>> {
        let stable = self.store.tokens_by_category(Category::Stable, 25).await?;
        if stable.is_empty() {
            return Ok(None);
        }

        let overlaps = |token: &str| {
            keywords
                .iter()
                .any(|kw| kw == token || kw.contains(token) || token.contains(kw))
        };
        let mut candidates: Vec<&str> = stable
            .iter()
            .filter(|stat| overlaps(&stat.token))
            .map(|stat| stat.token.as_str())
            .collect();
        for stat in &stable {
            if candidates.len() >= 5 {
                break;
            }
            if !candidates.contains(&stat.token.as_str()) {
                candidates.push(&stat.token);
            }
        }
        candidates.truncate(5);

        let base = candidates[rng.gen_range(0..candidates.len())].to_string();

        let pairs = self.store.search_pairs_by_word(&base).await?;
        let partners: Vec<String> = pairs
            .iter()
            .filter_map(|pair| pair.other_endpoint(&base).map(str::to_string))
            .collect();
        if partners.is_empty() {
            return Ok(None);
        }
        let categories = self.store.get_many_categories(&partners).await?;

        let slot = |wanted: Category| {
            partners
                .iter()
                .find(|partner| categories.get(*partner).copied() == Some(wanted))
                .cloned()
        };
        let modifier = slot(Category::Modifier);
        let structural = slot(Category::Structural);
        let transition = slot(Category::Transition);

        let mut words: Vec<String> = Vec::new();
        let include_modifier = modifier.is_some() && rng.gen::<f64>() >= 0.3;
        let reversed = rng.gen::<f64>() < 0.3;

        if include_modifier && !reversed {
            if let Some(word) = modifier.clone() {
                words.push(word);
            }
        }
        words.push(base);
        if include_modifier && reversed {
            if let Some(word) = modifier {
                words.push(word);
            }
        }
        if let Some(word) = structural {
            if rng.gen::<f64>() < 0.2 {
                words.push(word);
            }
        }
        if let Some(word) = transition {
            words.push(word);
        }

        if words.len() >= self.config.min_words {
            Ok(Some(words))
        } else {
            Ok(None)
        }
    }

    /// Raw-pair fallback: up to three top pairs flattened as "a b a b a b"
    async fn raw_pairs(&self, keywords: &[String]) -> AriaResult<Vec<String>> {
        let mut pairs = Vec::new();
        for keyword in keywords.iter().take(self.config.keyword_limit) {
            pairs = self.store.search_pairs_by_word(keyword).await?;
            if !pairs.is_empty() {
                break;
            }
        }
        if pairs.is_empty() {
            pairs = self.store.top_pairs(3, None).await?;
        }

        let mut words = Vec::new();
        for pair in pairs.iter().take(3) {
            words.push(pair.token_a.clone());
            words.push(pair.token_b.clone());
        }
        Ok(words)
    }
}

fn dedup_preserving_order(words: &mut Vec<String>) {
    let mut seen = HashSet::new();
    words.retain(|word| seen.insert(word.clone()));
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Lowercase, collapse whitespace, drop immediate repeats, truncate at a
/// word boundary past 70% of the limit when possible.
pub(crate) fn postprocess(words: &[String], max_length: usize) -> String {
    let joined = words.join(" ").to_lowercase();
    let mut deduped: Vec<&str> = Vec::new();
    for word in joined.split_whitespace() {
        if deduped.last().copied() != Some(word) {
            deduped.push(word);
        }
    }
    let mut text = deduped.join(" ");

    if text.len() > max_length {
        let mut cut_at = max_length;
        while cut_at > 0 && !text.is_char_boundary(cut_at) {
            cut_at -= 1;
        }
        let clipped = &text[..cut_at];
        let floor = (max_length as f64 * 0.7) as usize;
        text = match clipped.rfind(' ') {
            Some(space) if space >= floor => clipped[..space].to_string(),
            _ => clipped.to_string(),
        };
    }

    text.trim().to_string()
}
