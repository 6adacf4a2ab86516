//! # aria-rs: an online, unsupervised text-learning engine
//!
//! ARIA ingests a stream of user messages and maintains an evolving
//! statistical model of tokens, two-token co-occurrences ("pairs") and
//! behavioral token categories, from which it generates short textual
//! responses by walking the resulting graph. It is deliberately not a
//! probabilistic language model: there is no pre-trained vocabulary, no
//! grammar rules, no stopword list, no neural component.
//!
//! ## Key Features
//!
//! - Online learning: every accepted message updates token statistics,
//!   pair strengths and category assignments in one logical tick
//! - Tiered memory: pairs move across short/medium/long tiers by strength
//!   and decay on a schedule driven by the message counter
//! - Behavioral categories with an inertia protocol, so a single noisy
//!   message cannot flip a token's classification
//! - A stochastic, category-aware response generator that degrades to
//!   `"..."` instead of failing
//! - Storage behind an async [`Store`] trait, with a concurrent in-memory
//!   reference implementation
//!
//! ## Basic Usage
//!
//! ```no_run
//! use aria_rs::{with_memory_store, GenerateOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let aria = with_memory_store();
//!
//!     let report = aria
//!         .process_message("the weather is beautiful today", "msg-1", "user-1")
//!         .await?;
//!     println!("learned {} new pairs", report.new_pairs.unwrap_or(0));
//!
//!     let response = aria
//!         .generate_response("weather", GenerateOptions::default())
//!         .await;
//!     println!("{}", response);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod types;
mod engine;
mod generator;
mod pipeline;
pub mod store;
pub mod utils;

// Re-export core components
pub use engine::{Aria, GenerateOptions};
pub use generator::EMPTY_RESPONSE;
pub use store::{MemoryStore, Store};
pub use types::{
    AriaError, AriaResult, Category, EmergentChain, GlobalDelta, GlobalStats, InsertOutcome,
    MemoryStats, Pair, ProcessReport, Tier, TierCounts, TokenStat,
};
pub use utils::tokenizer::tokenize;

pub mod prelude {
    //! Convenient imports for commonly used types and functions
    pub use crate::{
        with_memory_store, Aria, AriaError, AriaResult, Category, GenerateOptions, MemoryStore,
        Pair, ProcessReport, Store, Tier, TokenStat,
    };
}

use std::sync::Arc;

/// Engine over a caller-provided store
pub fn new_engine(store: Arc<dyn Store>) -> Aria {
    Aria::new(store)
}

/// Engine over a fresh in-memory store
pub fn with_memory_store() -> Aria {
    Aria::new(Arc::new(MemoryStore::new()))
}
