//! The decoder registry.
//!
//! Every decoding strategy the crate knows is registered here, once, in a
//! fixed order. Registration order matters twice: attempts run in it, and
//! ranking ties resolve to the earlier entry.

use crate::analyzer::catalog::SignalTraits;
use crate::analyzer::search::Analyzer;
use crate::decoders::{self, DecodeError, Decoder};
use crate::params::AnalyzerParams;
use once_cell::sync::Lazy;
use regex::RegexBuilder;
use thiserror::Error;

/// Builds a decoder bound to one analyzer and one parameter set.
///
/// Construction may reject the configuration; that counts as a failed
/// attempt, same as a decode failure.
pub(crate) type DecoderFactory =
    for<'a> fn(&'a Analyzer, &'a AnalyzerParams) -> Result<Box<dyn Decoder + 'a>, DecodeError>;

/// One registered decoding strategy.
#[derive(Debug)]
pub(crate) struct DecoderEntry {
    pub name: &'static str,
    /// Included in every selection, whatever the pattern.
    pub always_run: bool,
    /// Attempted when any of these traits was observed; empty means always.
    pub traits: SignalTraits,
    pub factory: DecoderFactory,
}

impl DecoderEntry {
    pub(crate) fn applies_to(&self, observed: SignalTraits) -> bool {
        self.traits.is_empty() || self.traits.intersects(observed)
    }
}

pub(crate) static DECODERS: Lazy<Vec<DecoderEntry>> = Lazy::new(|| {
    vec![
        DecoderEntry {
            name: "trivial",
            always_run: true,
            traits: SignalTraits::empty(),
            factory: decoders::trivial,
        },
        DecoderEntry {
            name: "pwm2",
            always_run: false,
            traits: SignalTraits::MULTIPLE_BURSTS,
            factory: decoders::pwm2,
        },
        DecoderEntry {
            name: "pwm4",
            always_run: false,
            traits: SignalTraits::QUAD_BURSTS,
            factory: decoders::pwm4,
        },
        DecoderEntry {
            name: "biphase",
            always_run: false,
            traits: SignalTraits::MULTIPLE_BURSTS
                .union(SignalTraits::DOUBLED_DURATION)
                .union(SignalTraits::UNIFORM_BURST),
            factory: decoders::biphase,
        },
        DecoderEntry {
            name: "biphase-with-startbit",
            always_run: false,
            traits: SignalTraits::MULTIPLE_BURSTS
                .union(SignalTraits::DOUBLED_DURATION)
                .union(SignalTraits::UNIFORM_BURST),
            factory: decoders::biphase_with_startbit,
        },
    ]
});

/// Names of every registered decoder, in registration order.
pub fn decoder_names() -> Vec<&'static str> {
    DECODERS.iter().map(|entry| entry.name).collect()
}

/// A decoder name pattern that selects nothing, or does not compile.
#[derive(Debug, Clone, Error)]
pub enum DecoderSelectError {
    #[error("no decoder matches {pattern:?} (known: {})", .known.join(", "))]
    NoMatch { pattern: String, known: Vec<&'static str> },
    #[error("bad decoder pattern {pattern:?}")]
    BadPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Resolve a name pattern to the decoders to run.
///
/// `None` selects everything. Otherwise the pattern matches either as a
/// case-insensitive name prefix or, with `use_regex`, as a case-insensitive
/// regular expression against the whole name. Always-run decoders ride along
/// with any successful selection, but cannot save a pattern that matches no
/// name at all.
pub(crate) fn select(
    pattern: Option<&str>,
    use_regex: bool,
) -> Result<Vec<&'static DecoderEntry>, DecoderSelectError> {
    let Some(pattern) = pattern else {
        return Ok(DECODERS.iter().collect());
    };

    let matcher: Box<dyn Fn(&str) -> bool> = if use_regex {
        let regex = RegexBuilder::new(&format!("^(?:{pattern})$"))
            .case_insensitive(true)
            .build()
            .map_err(|source| DecoderSelectError::BadPattern { pattern: pattern.into(), source })?;
        Box::new(move |name: &str| regex.is_match(name))
    } else {
        let lowered = pattern.to_lowercase();
        Box::new(move |name: &str| name.to_lowercase().starts_with(&lowered))
    };

    let mut matched_any = false;
    let mut selected = Vec::new();
    for entry in DECODERS.iter() {
        let hit = matcher(entry.name);
        matched_any |= hit;
        if hit || entry.always_run {
            selected.push(entry);
        }
    }

    if matched_any {
        Ok(selected)
    } else {
        Err(DecoderSelectError::NoMatch { pattern: pattern.into(), known: decoder_names() })
    }
}
