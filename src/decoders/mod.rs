//! Decoding strategies.
//!
//! Each strategy owns one attempt: it walks the segments of a sub-sequence,
//! feeding decoded bits and literal durations into a [`DecodeState`], and
//! finalizes into a [`Protocol`]. Segment handling, the bit buffer, field
//! naming and parameter collection are shared here; strategies differ only in
//! how bursts become bits.

use crate::analyzer::{Analyzer, RepeatStructure};
use crate::collector::{BitwiseParameter, NameConflict, ParameterCollector};
use crate::irp::{BitDirection, BitSpec, GeneralSpec, IrStreamItem, Protocol, TimeValue};
use crate::params::{AnalyzerParams, TooFewNames};
use std::mem;
use thiserror::Error;

mod biphase;
mod pwm;
mod trivial;

pub(crate) use biphase::{biphase, biphase_with_startbit};
pub(crate) use pwm::{pwm2, pwm4};
pub(crate) use trivial::trivial;

#[cfg(test)]
mod tests;

/// One logical captured signal with its segment boundaries.
#[derive(Debug, Clone, Copy)]
pub struct SubSequence<'a> {
    pub durations: &'a [i32],
    pub structure: RepeatStructure,
}

/// Why one decoding attempt produced nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The data does not fit this strategy's layout.
    #[error("signal does not fit: {0}")]
    NoFit(String),
    #[error(transparent)]
    Conflict(#[from] NameConflict),
    #[error(transparent)]
    TooFewNames(#[from] TooFewNames),
}

/// A decoding strategy bound to one analyzer and parameter set.
pub trait Decoder {
    fn decode(&mut self, sub_sequence: &SubSequence<'_>) -> Result<Protocol, DecodeError>;
}

/// Working state of one decoding attempt.
///
/// Bits are buffered in transmission order and flushed into named fields
/// whenever the current field's width limit is reached or a strategy hits a
/// non-bit burst. Stream items and elapsed time are per segment; the field
/// counter and the parameter collector span the whole attempt.
pub(crate) struct DecodeState<'a> {
    params: &'a AnalyzerParams,
    frequency_hz: f64,
    unit_us: f64,
    collector: ParameterCollector,
    field_index: usize,
    buffer_value: u64,
    buffer_width: u32,
    total_bits: u32,
    items: Vec<IrStreamItem>,
    elapsed_us: i64,
}

impl<'a> DecodeState<'a> {
    pub(crate) fn new(analyzer: &Analyzer, params: &'a AnalyzerParams) -> Self {
        DecodeState {
            params,
            frequency_hz: analyzer.effective_frequency(params),
            unit_us: analyzer.effective_unit(params),
            collector: ParameterCollector::new(),
            field_index: 0,
            buffer_value: 0,
            buffer_width: 0,
            total_bits: 0,
            items: Vec::new(),
            elapsed_us: 0,
        }
    }

    pub(crate) fn params(&self) -> &AnalyzerParams {
        self.params
    }

    pub(crate) fn unit_us(&self) -> f64 {
        self.unit_us
    }

    pub(crate) fn time_value(&self, us: i32) -> TimeValue {
        TimeValue::of(f64::from(us), self.unit_us, self.params.rounding())
    }

    /// Bits decoded so far, scratch walks included.
    pub(crate) fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub(crate) fn field_count(&self) -> usize {
        self.field_index
    }

    /// Reset field naming to `index`, so a re-walked segment observes the
    /// same names again.
    pub(crate) fn rewind_fields(&mut self, index: usize) {
        self.field_index = index;
    }

    /// Append `width` bits in transmission order. The bits of one call stay
    /// together, so a push that carries the buffer past the field's width
    /// limit flushes at its own symbol boundary, overshooting the limit by
    /// up to `width - 1` bits.
    pub(crate) fn push_bits(&mut self, value: u64, width: u32) -> Result<(), DecodeError> {
        if self.buffer_width + width > 64 {
            self.flush_bits()?;
        }
        self.buffer_value = (self.buffer_value << width) | value;
        self.buffer_width += width;
        self.total_bits += width;
        if self.buffer_width >= self.params.field_width_limit(self.field_index) {
            self.flush_bits()?;
        }
        Ok(())
    }

    /// Turn the buffered bits into the next named field. A no-op on an empty
    /// buffer.
    pub(crate) fn flush_bits(&mut self) -> Result<(), DecodeError> {
        if self.buffer_width == 0 {
            return Ok(());
        }
        let width = self.buffer_width;
        let value = match self.params.bit_direction() {
            BitDirection::Msb => self.buffer_value,
            BitDirection::Lsb => self.buffer_value.reverse_bits() >> (64 - width),
        };
        let name = self.params.parameter_name(self.field_index)?;
        self.collector.add(&name, BitwiseParameter::with_width(value, width))?;
        self.items.push(IrStreamItem::Bits { name, width });
        self.field_index += 1;
        self.buffer_value = 0;
        self.buffer_width = 0;
        Ok(())
    }

    /// Account time that produced no stream item of its own (bit bursts).
    pub(crate) fn note_elapsed(&mut self, us: i32) {
        self.elapsed_us += i64::from(us);
    }

    pub(crate) fn emit_flash(&mut self, us: i32) {
        self.items.push(IrStreamItem::Flash(self.time_value(us)));
        self.note_elapsed(us);
    }

    pub(crate) fn emit_gap(&mut self, us: i32) {
        self.items.push(IrStreamItem::Gap(self.time_value(us)));
        self.note_elapsed(us);
    }

    /// The last gap of a segment: an extent when extents are requested, a
    /// plain gap otherwise.
    pub(crate) fn emit_final_gap(&mut self, us: i32) {
        self.note_elapsed(us);
        self.emit_silence(us);
    }

    /// Trailing quiet whose duration is already accounted in the elapsed
    /// time (biphase borrows half a slot from it).
    pub(crate) fn emit_silence(&mut self, silence_us: i32) {
        if self.params.use_extents() {
            self.items.push(IrStreamItem::Extent(self.elapsed_us));
        } else if silence_us > 0 {
            self.items.push(IrStreamItem::Gap(self.time_value(silence_us)));
        }
    }

    pub(crate) fn emit_constant(&mut self, value: u64, width: u32) {
        self.items.push(IrStreamItem::Constant { value, width });
    }

    /// Close the current segment: flush pending bits, hand out its items and
    /// start timing the next one.
    pub(crate) fn finish_segment(&mut self) -> Result<Vec<IrStreamItem>, DecodeError> {
        self.flush_bits()?;
        self.elapsed_us = 0;
        Ok(mem::take(&mut self.items))
    }

    pub(crate) fn into_protocol(self, bit_spec: BitSpec, segments: Segments) -> Protocol {
        Protocol {
            general_spec: GeneralSpec {
                frequency_hz: self.frequency_hz,
                unit_us: self.unit_us,
                bit_direction: self.params.bit_direction(),
            },
            bit_spec,
            intro: segments.intro,
            repeat: segments.repeat,
            ending: segments.ending,
            definitions: self.collector.finalize(),
        }
    }
}

/// The three decoded stream sections of one attempt.
pub(crate) struct Segments {
    pub intro: Vec<IrStreamItem>,
    pub repeat: Vec<IrStreamItem>,
    pub ending: Vec<IrStreamItem>,
}

/// Drive `walk` over the intro, repeat and ending segments.
///
/// Extra copies of the repeated unit are re-walked with field naming rewound
/// to the repeat's first field: their items are discarded, but their
/// parameter observations land in the same collector, so every copy must
/// agree with the first.
pub(crate) fn decode_segments<W>(
    state: &mut DecodeState<'_>,
    sub_sequence: &SubSequence<'_>,
    mut walk: W,
) -> Result<Segments, DecodeError>
where
    W: FnMut(&mut DecodeState<'_>, &[i32]) -> Result<(), DecodeError>,
{
    let durations = sub_sequence.durations;
    let structure = sub_sequence.structure;

    walk(state, &durations[..structure.begin_length()])?;
    let intro = state.finish_segment()?;

    let repeat_begin = structure.begin_length();
    let repeat_end = repeat_begin + structure.repeat_length();
    let fields_at_repeat = state.field_count();
    walk(state, &durations[repeat_begin..repeat_end])?;
    let repeat = state.finish_segment()?;

    for copy in 1..structure.repeats() {
        state.rewind_fields(fields_at_repeat);
        let begin = repeat_begin + copy * structure.repeat_length();
        walk(state, &durations[begin..begin + structure.repeat_length()])?;
        state.finish_segment()?;
    }

    walk(state, &durations[structure.ending_start()..structure.ending_start() + structure.ending_length()])?;
    let ending = state.finish_segment()?;

    Ok(Segments { intro, repeat, ending })
}
