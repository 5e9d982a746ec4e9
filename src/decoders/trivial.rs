use crate::analyzer::Analyzer;
use crate::decoders::{decode_segments, DecodeError, DecodeState, Decoder, SubSequence};
use crate::irp::{BitSpec, Protocol};
use crate::params::AnalyzerParams;

/// Renders every duration exactly as it came, with an empty bit spec and no
/// parameters. It cannot fail, so it puts a ceiling on the weight any other
/// hypothesis has to beat.
struct TrivialDecoder<'a> {
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
}

pub(crate) fn trivial<'a>(
    analyzer: &'a Analyzer,
    params: &'a AnalyzerParams,
) -> Result<Box<dyn Decoder + 'a>, DecodeError> {
    Ok(Box::new(TrivialDecoder { analyzer, params }))
}

impl Decoder for TrivialDecoder<'_> {
    fn decode(&mut self, sub_sequence: &SubSequence<'_>) -> Result<Protocol, DecodeError> {
        let mut state = DecodeState::new(self.analyzer, self.params);
        let segments = decode_segments(&mut state, sub_sequence, walk_verbatim)?;
        Ok(state.into_protocol(BitSpec::empty(), segments))
    }
}

fn walk_verbatim(state: &mut DecodeState<'_>, segment: &[i32]) -> Result<(), DecodeError> {
    let mut pairs = segment.chunks_exact(2).peekable();
    while let Some(pair) = pairs.next() {
        state.emit_flash(pair[0]);
        if pairs.peek().is_some() {
            state.emit_gap(pair[1]);
        } else {
            state.emit_final_gap(pair[1]);
        }
    }
    Ok(())
}
