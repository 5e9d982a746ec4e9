//! Repeat structure detection.
//!
//! A captured keypress usually holds one intro frame followed by several
//! copies of a shorter repeat frame. The detector finds that split in a flat
//! duration array; pre-split signals skip detection and carry their own
//! boundaries.

/// Boundaries of the intro, repeat and ending segments of one sub-sequence,
/// as offsets into its duration array.
///
/// The repeat region spans `begin_length..ending_start` and holds
/// [`repeats`](Self::repeats) back-to-back copies of the repeated unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatStructure {
    begin_length: usize,
    repeat_length: usize,
    ending_start: usize,
    ending_length: usize,
}

impl RepeatStructure {
    fn new(begin_length: usize, repeat_length: usize, ending_start: usize, ending_length: usize) -> Self {
        debug_assert!(begin_length + repeat_length <= ending_start);
        RepeatStructure { begin_length, repeat_length, ending_start, ending_length }
    }

    /// The whole sequence is one non-repeating segment.
    pub(crate) fn no_repeat(sequence_length: usize) -> Self {
        RepeatStructure::new(0, 0, 0, sequence_length)
    }

    /// Boundaries of a pre-split signal; the repeat segment occurs once in
    /// the concatenated data.
    pub(crate) fn from_signal_lengths(intro: usize, repeat: usize, ending: usize) -> Self {
        RepeatStructure::new(intro, repeat, intro + repeat, ending)
    }

    /// Search `durations` for a repeating tail.
    ///
    /// The scan is anchored at the end of the sequence: repeat frames of a
    /// keypress trail the intro, so a credible period must tile the array
    /// from some offset to its very end. Units grow one burst at a time; the
    /// longest repeated tail wins, and among equally long tails the shorter
    /// unit gives the simpler split. Only exact periodicity is recognized;
    /// anything else falls back to [`no_repeat`](Self::no_repeat).
    pub(crate) fn detect(durations: &[i32]) -> Self {
        debug_assert!(durations.len() % 2 == 0);
        let len = durations.len();
        let mut best: Option<(usize, usize)> = None; // (coverage, unit)

        let mut unit = 2;
        while unit * 2 <= len {
            let mut reps = 1;
            while (reps + 1) * unit <= len
                && durations[len - (reps + 1) * unit..len - reps * unit] == durations[len - unit..]
            {
                reps += 1;
            }
            if reps >= 2 {
                let coverage = reps * unit;
                if best.is_none_or(|(c, _)| coverage > c) {
                    best = Some((coverage, unit));
                }
            }
            unit += 2;
        }

        match best {
            Some((coverage, unit)) => RepeatStructure::new(len - coverage, unit, len, 0),
            None => RepeatStructure::no_repeat(len),
        }
    }

    pub fn begin_length(&self) -> usize {
        self.begin_length
    }

    pub fn repeat_length(&self) -> usize {
        self.repeat_length
    }

    pub fn ending_start(&self) -> usize {
        self.ending_start
    }

    pub fn ending_length(&self) -> usize {
        self.ending_length
    }

    pub fn has_repeat(&self) -> bool {
        self.repeat_length > 0
    }

    /// Number of copies of the repeated unit present in the data.
    pub fn repeats(&self) -> usize {
        if self.repeat_length == 0 { 0 } else { (self.ending_start - self.begin_length) / self.repeat_length }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bounds(structure: &RepeatStructure, sequence_length: usize) {
        assert!(structure.begin_length() + structure.repeat_length() <= structure.ending_start());
        assert!(structure.ending_start() <= sequence_length - structure.ending_length());
    }

    #[test]
    fn detects_trailing_frame_repeats() {
        let frame = [600, 500, 600, 1500];
        let durations: Vec<i32> = frame.iter().cycle().take(12).copied().collect();

        let structure = RepeatStructure::detect(&durations);
        assert_eq!(structure, RepeatStructure::new(0, 4, 12, 0));
        assert_eq!(structure.repeats(), 3);
        assert!(structure.has_repeat());
        assert_bounds(&structure, durations.len());
    }

    #[test]
    fn detects_intro_before_repeats() {
        let mut durations = vec![9_000, 4_500];
        durations.extend([600, 500, 600, 1500].iter().cycle().take(12));

        let structure = RepeatStructure::detect(&durations);
        assert_eq!(structure, RepeatStructure::new(2, 4, 14, 0));
        assert_eq!(structure.repeats(), 3);
        assert_bounds(&structure, durations.len());
    }

    #[test]
    fn equal_coverage_prefers_the_smaller_unit() {
        let durations = [700, 600, 700, 600, 700, 600, 700, 600];

        let structure = RepeatStructure::detect(&durations);
        assert_eq!(structure, RepeatStructure::new(0, 2, 8, 0));
        assert_eq!(structure.repeats(), 4);
    }

    #[test]
    fn aperiodic_input_falls_back_to_no_repeat() {
        let durations = [900, 450, 700, 38_000];

        let structure = RepeatStructure::detect(&durations);
        assert_eq!(structure, RepeatStructure::no_repeat(4));
        assert!(!structure.has_repeat());
        assert_eq!(structure.repeats(), 0);
        assert_eq!(structure.ending_length(), 4);
        assert_bounds(&structure, durations.len());
    }

    #[test]
    fn signal_lengths_place_the_boundaries_directly() {
        let structure = RepeatStructure::from_signal_lengths(4, 6, 2);
        assert_eq!(structure.begin_length(), 4);
        assert_eq!(structure.repeat_length(), 6);
        assert_eq!(structure.ending_start(), 10);
        assert_eq!(structure.ending_length(), 2);
        assert_eq!(structure.repeats(), 1);
        assert_bounds(&structure, 12);
    }
}
