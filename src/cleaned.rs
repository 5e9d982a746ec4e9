//! Cleaned capture handoff.
//!
//! The analyzer consumes its input from an external cleaner that has already
//! quantized raw durations to their common values. `CleanedData` is that
//! handoff: a flattened duration array (even offsets are flashes, odd are
//! gaps), a sub-sequence table, occurrence counts for the distinct durations
//! and adjacent (flash, gap) pairs, and the deterministic short-name scheme
//! shared by everything downstream. Durations are exact from here on; no
//! tolerance matching happens in this crate.

use std::collections::HashMap;
use thiserror::Error;

/// A sub-sequence whose duration count is odd, leaving a flash without its gap.
///
/// The cleaner guarantees even-length output, so this indicates an upstream
/// bug rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sub-sequence {index} has odd length {length}; flash/gap durations must come in pairs")]
pub struct OddSequenceLength {
    /// Index of the offending part (in signal mode: 0 = intro, 1 = repeat, 2 = ending).
    pub index: usize,
    /// The odd duration count.
    pub length: usize,
}

/// Quantized capture data as handed over by a cleaner.
///
/// Built once per analysis; everything here is immutable afterward.
#[derive(Debug, Clone)]
pub struct CleanedData {
    durations: Vec<i32>,
    begins: Vec<usize>,
    lengths: Vec<usize>,
    /// Part lengths when built from a pre-split intro/repeat/ending triple.
    signal_lengths: Option<(usize, usize, usize)>,
    flashes: Vec<i32>,
    gaps: Vec<i32>,
    flash_counts: HashMap<i32, usize>,
    gap_counts: HashMap<i32, usize>,
    pair_counts: HashMap<(i32, i32), usize>,
    names: HashMap<i32, String>,
}

impl CleanedData {
    /// Build from one capture per list entry ("raw list" mode).
    pub fn from_sequences(sequences: Vec<Vec<i32>>) -> Result<Self, OddSequenceLength> {
        for (index, sequence) in sequences.iter().enumerate() {
            if sequence.len() % 2 != 0 {
                return Err(OddSequenceLength { index, length: sequence.len() });
            }
        }

        let mut durations = Vec::new();
        let mut begins = Vec::with_capacity(sequences.len());
        let mut lengths = Vec::with_capacity(sequences.len());
        for sequence in &sequences {
            begins.push(durations.len());
            lengths.push(sequence.len());
            durations.extend_from_slice(sequence);
        }
        Ok(Self::build(durations, begins, lengths, None))
    }

    /// Build from a single capture.
    pub fn from_durations(durations: Vec<i32>) -> Result<Self, OddSequenceLength> {
        Self::from_sequences(vec![durations])
    }

    /// Build from a pre-split intro/repeat/ending triple ("signal" mode).
    ///
    /// The three parts are concatenated into one logical sub-sequence; their
    /// lengths are kept so the repeat structure can be derived directly
    /// instead of running the detector.
    pub fn from_signal(intro: Vec<i32>, repeat: Vec<i32>, ending: Vec<i32>) -> Result<Self, OddSequenceLength> {
        for (index, part) in [&intro, &repeat, &ending].into_iter().enumerate() {
            if part.len() % 2 != 0 {
                return Err(OddSequenceLength { index, length: part.len() });
            }
        }

        let signal_lengths = (intro.len(), repeat.len(), ending.len());
        let mut durations = intro;
        durations.extend_from_slice(&repeat);
        durations.extend_from_slice(&ending);
        let length = durations.len();
        Ok(Self::build(durations, vec![0], vec![length], Some(signal_lengths)))
    }

    fn build(
        durations: Vec<i32>,
        begins: Vec<usize>,
        lengths: Vec<usize>,
        signal_lengths: Option<(usize, usize, usize)>,
    ) -> Self {
        let mut flash_counts: HashMap<i32, usize> = HashMap::new();
        let mut gap_counts: HashMap<i32, usize> = HashMap::new();
        let mut pair_counts: HashMap<(i32, i32), usize> = HashMap::new();

        for (&begin, &length) in begins.iter().zip(&lengths) {
            for k in (begin..begin + length).step_by(2) {
                let flash = durations[k];
                let gap = durations[k + 1];
                *flash_counts.entry(flash).or_insert(0) += 1;
                *gap_counts.entry(gap).or_insert(0) += 1;
                *pair_counts.entry((flash, gap)).or_insert(0) += 1;
            }
        }

        let mut flashes: Vec<i32> = flash_counts.keys().copied().collect();
        flashes.sort_unstable();
        let mut gaps: Vec<i32> = gap_counts.keys().copied().collect();
        gaps.sort_unstable();

        // One name space over all distinct durations, ascending, so a value
        // that occurs both as flash and gap carries a single name.
        let mut all: Vec<i32> = flashes.iter().chain(&gaps).copied().collect();
        all.sort_unstable();
        all.dedup();
        let names = all.iter().enumerate().map(|(i, &d)| (d, crate::spreadsheet_name(i))).collect();

        CleanedData {
            durations,
            begins,
            lengths,
            signal_lengths,
            flashes,
            gaps,
            flash_counts,
            gap_counts,
            pair_counts,
            names,
        }
    }

    /// Slice of the flattened duration array.
    pub fn durations(&self, begin: usize, length: usize) -> &[i32] {
        &self.durations[begin..begin + length]
    }

    /// Number of logical sub-sequences (1 in signal mode).
    pub fn sequence_count(&self) -> usize {
        self.begins.len()
    }

    /// Begin offset of sub-sequence `index` into the flattened array.
    pub fn sequence_begin(&self, index: usize) -> usize {
        self.begins[index]
    }

    /// Duration count of sub-sequence `index`.
    pub fn sequence_length(&self, index: usize) -> usize {
        self.lengths[index]
    }

    /// Whether this capture came in as a pre-split intro/repeat/ending triple.
    pub fn is_signal_mode(&self) -> bool {
        self.signal_lengths.is_some()
    }

    /// Intro/repeat/ending part lengths in signal mode.
    pub fn signal_lengths(&self) -> Option<(usize, usize, usize)> {
        self.signal_lengths
    }

    /// Distinct flash durations, ascending.
    pub fn distinct_flashes(&self) -> &[i32] {
        &self.flashes
    }

    /// Distinct gap durations, ascending.
    pub fn distinct_gaps(&self) -> &[i32] {
        &self.gaps
    }

    /// How often `duration` occurs as a flash.
    pub fn flash_count(&self, duration: i32) -> usize {
        self.flash_counts.get(&duration).copied().unwrap_or(0)
    }

    /// How often `duration` occurs as a gap.
    pub fn gap_count(&self, duration: i32) -> usize {
        self.gap_counts.get(&duration).copied().unwrap_or(0)
    }

    /// How often the adjacent pair (`flash`, `gap`) occurs.
    pub fn pair_count(&self, flash: i32, gap: i32) -> usize {
        self.pair_counts.get(&(flash, gap)).copied().unwrap_or(0)
    }

    /// Short name of a distinct duration (`A` for the shortest, and so on).
    pub fn name_of(&self, duration: i32) -> &str {
        self.names.get(&duration).map(String::as_str).unwrap_or("?")
    }

    pub fn shortest_flash(&self) -> Option<i32> {
        self.flashes.first().copied()
    }

    pub fn shortest_gap(&self) -> Option<i32> {
        self.gaps.first().copied()
    }

    /// Shortest duration over flashes and gaps together.
    pub fn shortest_duration(&self) -> Option<i32> {
        match (self.shortest_flash(), self.shortest_gap()) {
            (Some(f), Some(g)) => Some(f.min(g)),
            (f, g) => f.or(g),
        }
    }
}
