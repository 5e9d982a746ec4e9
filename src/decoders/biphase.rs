//! Biphase (Manchester) decoding.
//!
//! Every bit occupies two half-bit slots: flash then gap for one value, gap
//! then flash for the other. Each captured duration must therefore be one or
//! two half-bits long. The walk rebuilds the slot stream first and pairs it
//! off afterwards; a bit ending in a gap half at the end of a segment has
//! that half swallowed by the trailing silence, so the pairing borrows it
//! back. The capture never shows a leading idle half either, which is why
//! the start-bit variant seeds the slot stream with a virtual gap and then
//! requires the first decoded bit to be a constant one.

use crate::analyzer::Analyzer;
use crate::decoders::{decode_segments, DecodeError, DecodeState, Decoder, SubSequence};
use crate::irp::{BitSpec, IrStreamItem, Protocol, TimeValue};
use crate::params::AnalyzerParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Flash,
    Gap,
}

struct BiphaseDecoder<'a> {
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
    start_bit: bool,
}

pub(crate) fn biphase<'a>(
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
) -> Result<Box<dyn Decoder + 'a>, DecodeError> {
    Ok(Box::new(BiphaseDecoder { analyzer, params, start_bit: false }))
}

pub(crate) fn biphase_with_startbit<'a>(
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
) -> Result<Box<dyn Decoder + 'a>, DecodeError> {
    Ok(Box::new(BiphaseDecoder { analyzer, params, start_bit: true }))
}

impl BiphaseDecoder<'_> {
    fn half_slots(&self, state: &DecodeState<'_>, duration: i32) -> Result<u32, DecodeError> {
        match self.params.rounding().units_of(state.unit_us(), f64::from(duration)) {
            Some(halves @ (1 | 2)) => Ok(halves),
            _ => Err(DecodeError::NoFit(format!("duration {duration} is not one or two half-bits"))),
        }
    }

    fn walk_segment(&self, state: &mut DecodeState<'_>, segment: &[i32]) -> Result<(), DecodeError> {
        if segment.is_empty() {
            return Ok(());
        }
        let final_gap = segment[segment.len() - 1];

        let mut slots = Vec::new();
        if self.start_bit {
            slots.push(Slot::Gap);
        }
        for (index, &duration) in segment[..segment.len() - 1].iter().enumerate() {
            let slot = if index % 2 == 0 { Slot::Flash } else { Slot::Gap };
            for _ in 0..self.half_slots(state, duration)? {
                slots.push(slot);
            }
            state.note_elapsed(duration);
        }

        let mut silence = final_gap;
        if slots.len() % 2 == 1 {
            // The last bit ended in a gap half that merged into the silence.
            silence -= state.unit_us().round() as i32;
            if silence < 0 {
                return Err(DecodeError::NoFit("final gap shorter than a half-bit".into()));
            }
            slots.push(Slot::Gap);
        }

        let mut expect_start = self.start_bit;
        for pair in slots.chunks_exact(2) {
            let mut bit = match (pair[0], pair[1]) {
                (Slot::Flash, Slot::Gap) => 0u64,
                (Slot::Gap, Slot::Flash) => 1,
                _ => return Err(DecodeError::NoFit("two equal half-bits in a row".into())),
            };
            if self.params.invert() {
                bit ^= 1;
            }
            if expect_start {
                if bit != 1 {
                    return Err(DecodeError::NoFit("start bit is not a one".into()));
                }
                state.emit_constant(1, 1);
                expect_start = false;
            } else {
                state.push_bits(bit, 1)?;
            }
        }

        state.flush_bits()?;
        state.note_elapsed(final_gap);
        state.emit_silence(silence);
        Ok(())
    }

    fn bit_spec(&self) -> BitSpec {
        let half = TimeValue::Units(1.0);
        let flash_gap = vec![IrStreamItem::Flash(half), IrStreamItem::Gap(half)];
        let gap_flash = vec![IrStreamItem::Gap(half), IrStreamItem::Flash(half)];
        let alternatives = if self.params.invert() {
            vec![gap_flash, flash_gap]
        } else {
            vec![flash_gap, gap_flash]
        };
        BitSpec::new(alternatives)
    }
}

impl Decoder for BiphaseDecoder<'_> {
    fn decode(&mut self, sub_sequence: &SubSequence<'_>) -> Result<Protocol, DecodeError> {
        let mut state = DecodeState::new(self.analyzer, self.params);
        let segments = decode_segments(&mut state, sub_sequence, |state, segment| self.walk_segment(state, segment))?;
        if state.total_bits() == 0 {
            return Err(DecodeError::NoFit("no half-bit pair decodes as a bit".into()));
        }
        Ok(state.into_protocol(self.bit_spec(), segments))
    }
}
