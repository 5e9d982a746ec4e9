//! Signal analysis engine.
//!
//! This module is the *public entry point* for turning a cleaned capture into
//! ranked protocol hypotheses. It is split into focused submodules under
//! `src/analyzer/` while keeping public paths stable (for example
//! `crate::Analyzer` and `crate::SignalTraits`).
//!
//! ## How the parts work together
//!
//! At a high level, analyzing a capture is a pipeline:
//!
//! ```text
//! durations ── CleanedData::from_* ─── pair counting + naming  (cleaned.rs)
//!                      │
//!                      v
//!            BurstCatalog::new                      (catalog.rs)
//!              - distinct (flash, gap) pairs
//!              - occurrence-ranked and lexical orders
//!                      │
//! SignalTraits::scan ──┼─ coarse gating of decoders (catalog.rs)
//!                      │
//! find_repeat ─────────┼─ intro / repeat / ending   (repeats.rs)
//!                      v
//!            Analyzer::run_search                   (search.rs)
//!              - decoders selected by name or regex (registry.rs)
//!              - attempts in registration order
//!              - every attempt recorded             (trace.rs)
//!                      │
//!                      v
//!            Vec<Protocol>, ranked by weight
//! ```
//!
//! Every step is deterministic: the same durations and parameters always
//! produce the same hypotheses in the same order, which keeps captured-signal
//! regressions diffable.
//!
//! ## Responsibilities by module
//!
//! - `catalog.rs`: derives the [`BurstCatalog`] and the coarse [`SignalTraits`]
//!   used to gate decoders; renders the [`Statistics`] dump.
//! - `registry.rs`: the static decoder registry plus selection by
//!   case-insensitive prefix or regex.
//! - `repeats.rs`: finds the repeating frame inside a single capture, or takes
//!   the split from a pre-split signal.
//! - `search.rs`: drives the attempts over every sub-sequence and ranks the
//!   surviving hypotheses.
//! - `trace.rs`: per-attempt outcome records for diagnostics.
//!
//! ## Adding a decoder
//!
//! New decoding strategies live under `src/decoders/**` and are registered in
//! `registry.rs` with a name, the [`SignalTraits`] that justify trying them,
//! and a factory. Registration order is ranking tie-break order, so append.

#[path = "analyzer/catalog.rs"]
mod catalog;
#[path = "analyzer/registry.rs"]
mod registry;
#[path = "analyzer/repeats.rs"]
mod repeats;
#[path = "analyzer/search.rs"]
mod search;
#[path = "analyzer/trace.rs"]
mod trace;

pub use catalog::{Burst, BurstCatalog, SignalTraits, Statistics};
pub use registry::{DecoderSelectError, decoder_names};
pub use repeats::RepeatStructure;
pub use search::{Analyzer, select_best_protocol};
pub use trace::{AttemptOutcome, AttemptRecord, SearchTrace};
