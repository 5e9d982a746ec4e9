//! The analyzer itself: catalog once, search many times.

use crate::analyzer::catalog::{BurstCatalog, SignalTraits, Statistics};
use crate::analyzer::registry::{self, DecoderSelectError};
use crate::analyzer::repeats::RepeatStructure;
use crate::analyzer::trace::{AttemptOutcome, SearchTrace};
use crate::cleaned::CleanedData;
use crate::decoders::SubSequence;
use crate::irp::Protocol;
use crate::params::{AnalyzerParams, DEFAULT_FREQUENCY};

/// Protocol search over one cleaned capture.
///
/// Construction classifies the capture (burst catalog, signal traits, repeat
/// structures); the classification is immutable afterwards and shared by
/// every subsequent search.
pub struct Analyzer {
    cleaned: CleanedData,
    frequency: Option<f64>,
    catalog: BurstCatalog,
    traits: SignalTraits,
    repeats: Vec<RepeatStructure>,
}

impl Analyzer {
    /// Classify `cleaned` once.
    ///
    /// `frequency` is the measured carrier, if the capture hardware reported
    /// one. With `find_repeats`, every raw sub-sequence is scanned for a
    /// repeating tail; pre-split signals carry their own boundaries and are
    /// never scanned.
    pub fn new(cleaned: CleanedData, frequency: Option<f64>, find_repeats: bool) -> Self {
        let catalog = BurstCatalog::new(&cleaned);
        let traits = SignalTraits::scan(&cleaned, &catalog);
        let repeats = (0..cleaned.sequence_count())
            .map(|index| match cleaned.signal_lengths() {
                Some((intro, repeat, ending)) => RepeatStructure::from_signal_lengths(intro, repeat, ending),
                None if find_repeats => {
                    RepeatStructure::detect(cleaned.durations(cleaned.sequence_begin(index), cleaned.sequence_length(index)))
                }
                None => RepeatStructure::no_repeat(cleaned.sequence_length(index)),
            })
            .collect();
        Analyzer { cleaned, frequency, catalog, traits, repeats }
    }

    pub fn cleaned_data(&self) -> &CleanedData {
        &self.cleaned
    }

    pub fn catalog(&self) -> &BurstCatalog {
        &self.catalog
    }

    pub fn traits(&self) -> SignalTraits {
        self.traits
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn repeat_structure(&self, index: usize) -> RepeatStructure {
        self.repeats[index]
    }

    /// The measured carrier wins over the configured one.
    pub(crate) fn effective_frequency(&self, params: &AnalyzerParams) -> f64 {
        self.frequency.or(params.frequency()).unwrap_or(DEFAULT_FREQUENCY)
    }

    /// The forced timebase, else the shortest duration of the capture.
    pub(crate) fn effective_unit(&self, params: &AnalyzerParams) -> f64 {
        match params.timebase() {
            Some(timebase) => timebase.microseconds(self.effective_frequency(params)),
            None => f64::from(self.cleaned.shortest_duration().unwrap_or(1)),
        }
    }

    pub(crate) fn sub_sequence(&self, index: usize) -> SubSequence<'_> {
        let begin = self.cleaned.sequence_begin(index);
        let length = self.cleaned.sequence_length(index);
        SubSequence { durations: self.cleaned.durations(begin, length), structure: self.repeats[index] }
    }

    /// The (intro, repeat, ending) durations of one sub-sequence, with extra
    /// copies of the repeated unit stripped.
    pub fn repeat_reduced_signal(&self, index: usize) -> (Vec<i32>, Vec<i32>, Vec<i32>) {
        let sub = self.sub_sequence(index);
        let structure = sub.structure;
        let intro = sub.durations[..structure.begin_length()].to_vec();
        let repeat =
            sub.durations[structure.begin_length()..structure.begin_length() + structure.repeat_length()].to_vec();
        let ending =
            sub.durations[structure.ending_start()..structure.ending_start() + structure.ending_length()].to_vec();
        (intro, repeat, ending)
    }

    /// Capture summary for human eyes.
    pub fn statistics(&self, params: &AnalyzerParams) -> Statistics<'_> {
        Statistics {
            frequency_hz: self.effective_frequency(params),
            unit_us: self.effective_unit(params),
            cleaned: &self.cleaned,
            catalog: &self.catalog,
        }
    }

    /// Every hypothesis each selected decoder produced, per sub-sequence, in
    /// registration order.
    pub fn search_all_protocols(
        &self,
        params: &AnalyzerParams,
        pattern: Option<&str>,
        use_regex: bool,
    ) -> Result<Vec<Vec<Protocol>>, DecoderSelectError> {
        self.run_search(params, pattern, use_regex).map(|(all, _)| all)
    }

    /// Like [`search_all_protocols`](Self::search_all_protocols), plus the
    /// per-attempt trace.
    pub fn search_all_protocols_traced(
        &self,
        params: &AnalyzerParams,
        pattern: Option<&str>,
        use_regex: bool,
    ) -> Result<(Vec<Vec<Protocol>>, SearchTrace), DecoderSelectError> {
        self.run_search(params, pattern, use_regex)
    }

    /// The best hypothesis per sub-sequence; sub-sequences where nothing fit
    /// are omitted.
    pub fn search_best_protocol(
        &self,
        params: &AnalyzerParams,
        pattern: Option<&str>,
        use_regex: bool,
    ) -> Result<Vec<Protocol>, DecoderSelectError> {
        self.search_best_protocol_traced(params, pattern, use_regex).map(|(best, _)| best)
    }

    /// Like [`search_best_protocol`](Self::search_best_protocol), plus the
    /// per-attempt trace.
    pub fn search_best_protocol_traced(
        &self,
        params: &AnalyzerParams,
        pattern: Option<&str>,
        use_regex: bool,
    ) -> Result<(Vec<Protocol>, SearchTrace), DecoderSelectError> {
        let (all, trace) = self.run_search(params, pattern, use_regex)?;
        let best = all.into_iter().filter_map(select_best_protocol).collect();
        Ok((best, trace))
    }

    fn run_search(
        &self,
        params: &AnalyzerParams,
        pattern: Option<&str>,
        use_regex: bool,
    ) -> Result<(Vec<Vec<Protocol>>, SearchTrace), DecoderSelectError> {
        let entries = registry::select(pattern, use_regex)?;
        let mut trace = SearchTrace::new(self.traits);
        let mut all = Vec::with_capacity(self.cleaned.sequence_count());

        for index in 0..self.cleaned.sequence_count() {
            let mut candidates = Vec::new();
            if self.cleaned.sequence_length(index) == 0 {
                all.push(candidates);
                continue;
            }
            let sub = self.sub_sequence(index);
            for entry in &entries {
                if !entry.applies_to(self.traits) {
                    trace.record(index, entry.name, AttemptOutcome::Skipped);
                    continue;
                }
                match (entry.factory)(self, params).and_then(|mut decoder| decoder.decode(&sub)) {
                    Ok(protocol) => {
                        trace.record(index, entry.name, AttemptOutcome::Produced { weight: protocol.weight() });
                        candidates.push(protocol);
                    }
                    Err(error) => trace.record(index, entry.name, AttemptOutcome::Failed { error }),
                }
            }
            all.push(candidates);
        }
        Ok((all, trace))
    }
}

/// The lowest-weight candidate; on a tie the earlier one stays.
pub fn select_best_protocol(candidates: Vec<Protocol>) -> Option<Protocol> {
    let mut best: Option<Protocol> = None;
    for candidate in candidates {
        if best.as_ref().is_none_or(|held| candidate.weight() < held.weight()) {
            best = Some(candidate);
        }
    }
    best
}
