//! Pulse-width decoding.
//!
//! The `n` most frequent bursts become `log2(n)`-bit symbols, numbered by
//! lexical burst order. Any other burst flushes the field under construction
//! and passes through as literal durations, which is how headers, ditto marks
//! and trailers survive inside an otherwise bit-carrying stream.

use crate::analyzer::{Analyzer, Burst};
use crate::decoders::{decode_segments, DecodeError, DecodeState, Decoder, SubSequence};
use crate::irp::{BitSpec, IrStreamItem, Protocol};
use crate::params::AnalyzerParams;

struct PwmDecoder<'a> {
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
    /// Symbol table; index is the symbol value.
    table: Vec<Burst>,
    bits_per_symbol: u32,
}

pub(crate) fn pwm2<'a>(
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
) -> Result<Box<dyn Decoder + 'a>, DecodeError> {
    Ok(Box::new(PwmDecoder::new(analyzer, params, 2)?))
}

pub(crate) fn pwm4<'a>(
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
) -> Result<Box<dyn Decoder + 'a>, DecodeError> {
    Ok(Box::new(PwmDecoder::new(analyzer, params, 4)?))
}

impl<'a> PwmDecoder<'a> {
    /// `symbols` must be a power of two.
    fn new(analyzer: &'a Analyzer, params: &'a AnalyzerParams, symbols: usize) -> Result<Self, DecodeError> {
        let mut table = analyzer
            .catalog()
            .most_common(symbols)
            .ok_or_else(|| DecodeError::NoFit(format!("fewer than {symbols} distinct bursts")))?;
        if params.invert() {
            table.reverse();
        }
        Ok(PwmDecoder { analyzer, params, table, bits_per_symbol: symbols.trailing_zeros() })
    }

    fn symbol_of(&self, burst: Burst) -> Option<u64> {
        self.table.iter().position(|&entry| entry == burst).map(|index| index as u64)
    }

    fn bit_spec(&self, state: &DecodeState<'_>) -> BitSpec {
        BitSpec::new(
            self.table
                .iter()
                .map(|burst| {
                    vec![
                        IrStreamItem::Flash(state.time_value(burst.flash)),
                        IrStreamItem::Gap(state.time_value(burst.gap)),
                    ]
                })
                .collect(),
        )
    }

    fn walk(&self, state: &mut DecodeState<'_>, segment: &[i32]) -> Result<(), DecodeError> {
        let mut pairs = segment.chunks_exact(2).peekable();
        while let Some(pair) = pairs.next() {
            match self.symbol_of(Burst::new(pair[0], pair[1])) {
                Some(symbol) => {
                    state.push_bits(symbol, self.bits_per_symbol)?;
                    state.note_elapsed(pair[0] + pair[1]);
                }
                None => {
                    state.flush_bits()?;
                    state.emit_flash(pair[0]);
                    if pairs.peek().is_some() {
                        state.emit_gap(pair[1]);
                    } else {
                        state.emit_final_gap(pair[1]);
                    }
                }
            }
        }
        Ok(())
    }
}

impl Decoder for PwmDecoder<'_> {
    fn decode(&mut self, sub_sequence: &SubSequence<'_>) -> Result<Protocol, DecodeError> {
        let mut state = DecodeState::new(self.analyzer, self.params);
        let segments = decode_segments(&mut state, sub_sequence, |state, segment| self.walk(state, segment))?;
        if state.total_bits() == 0 {
            return Err(DecodeError::NoFit("no burst decodes as a bit".into()));
        }
        let bit_spec = self.bit_spec(&state);
        Ok(state.into_protocol(bit_spec, segments))
    }
}
