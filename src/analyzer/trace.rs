//! Per-attempt records for one search run.
//!
//! The search does not log; it records what happened to every (decoder,
//! sub-sequence) attempt in value form, so callers can render or assert on
//! the outcome after the fact.

use crate::analyzer::catalog::SignalTraits;
use crate::decoders::DecodeError;

/// What one decoding attempt came to.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// A hypothesis with this weight was produced.
    Produced { weight: u32 },
    /// The decoder's gating traits were absent from the capture.
    Skipped,
    /// Construction or decoding failed; the attempt contributed nothing.
    Failed { error: DecodeError },
}

/// One (decoder, sub-sequence) attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptRecord {
    pub sequence_index: usize,
    pub decoder: &'static str,
    pub outcome: AttemptOutcome,
}

/// Everything observed during one search call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTrace {
    /// Traits the decoders were gated on.
    pub traits: SignalTraits,
    /// One record per attempt, in attempt order.
    pub attempts: Vec<AttemptRecord>,
}

impl SearchTrace {
    pub(crate) fn new(traits: SignalTraits) -> Self {
        SearchTrace { traits, attempts: Vec::new() }
    }

    pub(crate) fn record(&mut self, sequence_index: usize, decoder: &'static str, outcome: AttemptOutcome) {
        self.attempts.push(AttemptRecord { sequence_index, decoder, outcome });
    }

    pub fn produced(&self) -> usize {
        self.count(|outcome| matches!(outcome, AttemptOutcome::Produced { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, AttemptOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, AttemptOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&AttemptOutcome) -> bool) -> usize {
        self.attempts.iter().filter(|record| pred(&record.outcome)).count()
    }
}
