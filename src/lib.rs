mod analyzer;
mod cleaned;
mod collector;
mod decoders;
mod irp;
mod params;

pub use analyzer::{
    Analyzer, AttemptOutcome, AttemptRecord, Burst, BurstCatalog, DecoderSelectError, RepeatStructure, SearchTrace,
    SignalTraits, Statistics, decoder_names, select_best_protocol,
};
pub use cleaned::{CleanedData, OddSequenceLength};
pub use collector::{BitwiseParameter, NameBinding, NameConflict, ParameterCollector};
pub use decoders::{DecodeError, Decoder, SubSequence};
pub use irp::{BitDirection, BitSpec, GeneralSpec, IrStreamItem, Protocol, TimeValue};
pub use params::{AnalyzerParams, DEFAULT_FREQUENCY, Rounding, Timebase, TimebaseParseError, TooFewNames};

// --- Shared helpers ----------------------------------------------------------

/// Spreadsheet-style name for index `n`: `A`..`Z`, then `AA`, `AB`, ...
///
/// Used both for duration names (the cleaner's scheme) and for generated
/// parameter names, so the two stay visually consistent.
pub(crate) fn spreadsheet_name(mut n: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    name
}
