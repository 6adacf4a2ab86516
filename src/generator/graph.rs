// Response graph and the category-aware weighted walk

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::config::GeneratorConfig;
use crate::types::{Category, Pair};

pub(crate) struct Edge {
    pub to: String,
    pub weight: f64,
}

pub(crate) struct Node {
    pub category: Category,
    /// Sorted by weight, strongest first
    pub edges: Vec<Edge>,
}

/// Undirected pair graph annotated with current token categories
pub(crate) struct ResponseGraph {
    nodes: HashMap<String, Node>,
}

impl ResponseGraph {
    pub fn build(
        pairs: impl IntoIterator<Item = Pair>,
        categories: &HashMap<String, Category>,
        strength_threshold: f64,
    ) -> Self {
        let mut nodes: HashMap<String, Node> = HashMap::new();

        let mut node_for = |token: &str, nodes: &mut HashMap<String, Node>| {
            if !nodes.contains_key(token) {
                nodes.insert(
                    token.to_string(),
                    Node {
                        category: categories.get(token).copied().unwrap_or_default(),
                        edges: Vec::new(),
                    },
                );
            }
        };

        for pair in pairs {
            if pair.strength < strength_threshold {
                continue;
            }
            node_for(&pair.token_a, &mut nodes);
            node_for(&pair.token_b, &mut nodes);
            if let Some(node) = nodes.get_mut(&pair.token_a) {
                node.edges.push(Edge {
                    to: pair.token_b.clone(),
                    weight: pair.strength,
                });
            }
            if let Some(node) = nodes.get_mut(&pair.token_b) {
                node.edges.push(Edge {
                    to: pair.token_a.clone(),
                    weight: pair.strength,
                });
            }
        }

        for node in nodes.values_mut() {
            node.edges.sort_by(|a, b| {
                b.weight
                    .partial_cmp(&a.weight)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.nodes.contains_key(token)
    }

    fn node(&self, token: &str) -> Option<&Node> {
        self.nodes.get(token)
    }

    /// Highest-degree node passing `category` and not in `excluded`
    fn best_by_degree(
        &self,
        category: Option<Category>,
        excluded: &HashSet<String>,
    ) -> Option<String> {
        self.nodes
            .iter()
            .filter(|(token, node)| {
                !excluded.contains(*token)
                    && category.map_or(true, |wanted| node.category == wanted)
            })
            .max_by_key(|(_, node)| node.edges.len())
            .map(|(token, _)| token.clone())
    }
}

/// Starting node: the best-scoring keyword present in the graph, then the
/// best-connected stable node, then the best-connected node overall.
fn pick_start(
    graph: &ResponseGraph,
    keywords: &[String],
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Option<String> {
    let mut best: Option<(String, f64)> = None;
    for keyword in keywords {
        if let Some(node) = graph.node(keyword) {
            let degree_boost = 1.0 + (node.edges.len() as f64 / 10.0).min(1.0);
            let score =
                config.start_weight(node.category) * degree_boost * (1.0 + rng.gen_range(0.0..0.3));
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((keyword.clone(), score));
            }
        }
    }
    if let Some((token, _)) = best {
        return Some(token);
    }

    let none = HashSet::new();
    graph
        .best_by_degree(Some(Category::Stable), &none)
        .or_else(|| graph.best_by_degree(None, &none))
}

/// Alternative start for a walk that dead-ended too early. Recovery tokens
/// land in `retry_set` so each is attempted at most once per query.
fn pick_recovery(
    graph: &ResponseGraph,
    keywords: &[String],
    visited: &HashSet<String>,
    retry_set: &HashSet<String>,
) -> Option<String> {
    for keyword in keywords {
        if graph.contains(keyword) && !visited.contains(keyword) && !retry_set.contains(keyword) {
            return Some(keyword.clone());
        }
    }

    let mut excluded: HashSet<String> = visited.clone();
    excluded.extend(retry_set.iter().cloned());
    graph
        .best_by_degree(Some(Category::Stable), &excluded)
        .or_else(|| graph.best_by_degree(None, &excluded))
}

/// Category-aware weighted random walk over the pair graph.
///
/// Returns at least `min_words` tokens or nothing.
pub(crate) fn walk(
    graph: &ResponseGraph,
    keywords: &[String],
    config: &GeneratorConfig,
    rng: &mut impl Rng,
) -> Option<Vec<String>> {
    if graph.is_empty() {
        return None;
    }

    let start = pick_start(graph, keywords, config, rng)?;
    let mut visited: HashSet<String> = HashSet::new();
    let mut retry_set: HashSet<String> = HashSet::new();
    let mut path: Vec<String> = Vec::new();

    visited.insert(start.clone());
    path.push(start.clone());
    let mut current = start;

    while path.len() < config.max_words {
        let node = match graph.node(&current) {
            Some(node) => node,
            None => break,
        };
        let favored = config.favored_transitions(node.category);

        let mut scored: Vec<(&str, f64)> = node
            .edges
            .iter()
            .filter(|edge| !visited.contains(&edge.to))
            .map(|edge| {
                let noise = if config.randomness > 0.0 {
                    rng.gen_range(0.0..config.randomness)
                } else {
                    0.0
                };
                let mut score = edge.weight * (1.0 + noise);
                let neighbor_category = graph
                    .node(&edge.to)
                    .map(|n| n.category)
                    .unwrap_or_default();
                if favored.contains(&neighbor_category) {
                    score *= 1.5;
                }
                (edge.to.as_str(), score)
            })
            .collect();

        if scored.is_empty() {
            if path.len() >= config.min_words {
                break;
            }
            match pick_recovery(graph, keywords, &visited, &retry_set) {
                Some(alternative) => {
                    retry_set.insert(alternative.clone());
                    visited.insert(alternative.clone());
                    path.push(alternative.clone());
                    current = alternative;
                    continue;
                }
                None => break,
            }
        }

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        // 70% strongest, 20% second, 10% third
        let roll: f64 = rng.gen();
        let rank = if roll < 0.7 {
            0
        } else if roll < 0.9 {
            1
        } else {
            2
        };
        let next = scored[rank.min(scored.len() - 1)].0.to_string();

        visited.insert(next.clone());
        path.push(next.clone());
        current = next;
    }

    if path.len() >= config.min_words {
        Some(path)
    } else {
        None
    }
}
