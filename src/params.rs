//! Analysis parameters: carrier, timebase, bit order, field widths, names
//! and rounding tolerances.

use crate::irp::BitDirection;
use crate::spreadsheet_name;
use std::fmt;
use thiserror::Error;

/// Assumed carrier when the capture does not come with one, in Hz.
pub const DEFAULT_FREQUENCY: f64 = 38_000.0;

/// Tolerances deciding when a duration renders as a unit multiple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rounding {
    /// Largest accepted distance from a whole multiple, in units.
    pub max_rounding_error: f64,
    /// Durations above this many units always render as microseconds.
    pub max_units: f64,
    /// Durations above this always render as microseconds.
    pub max_microseconds: f64,
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding { max_rounding_error: 0.3, max_units: 30.0, max_microseconds: 10_000.0 }
    }
}

impl Rounding {
    /// The whole number of `unit_us`-sized units in `duration_us`, or `None`
    /// when the duration does not round acceptably.
    pub fn units_of(&self, unit_us: f64, duration_us: f64) -> Option<u32> {
        if unit_us <= 0.0 {
            return None;
        }
        let units = duration_us / unit_us;
        let rounded = units.round();
        let acceptable = rounded >= 1.0
            && units <= self.max_units
            && duration_us <= self.max_microseconds
            && (units - rounded).abs() < self.max_rounding_error;
        acceptable.then_some(rounded as u32)
    }
}

/// A user-supplied timing unit, either absolute or in carrier periods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timebase {
    Microseconds(f64),
    Periods(f64),
}

/// A timebase argument that is not a positive number with an optional
/// `u`/`p` suffix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid timebase {text:?}; expected a positive number, optionally suffixed with \"u\" or \"p\"")]
pub struct TimebaseParseError {
    pub text: String,
}

impl Timebase {
    /// Parse `"564"`, `"564u"` or `"21.3p"`.
    pub fn parse(text: &str) -> Result<Self, TimebaseParseError> {
        let bad = || TimebaseParseError { text: text.into() };
        let (number, periods) = match text.strip_suffix('p') {
            Some(head) => (head, true),
            None => (text.strip_suffix('u').unwrap_or(text), false),
        };
        let value: f64 = number.trim().parse().map_err(|_| bad())?;
        if !value.is_finite() || value <= 0.0 {
            return Err(bad());
        }
        Ok(if periods { Timebase::Periods(value) } else { Timebase::Microseconds(value) })
    }

    /// Resolve to microseconds against `frequency_hz`.
    pub fn microseconds(&self, frequency_hz: f64) -> f64 {
        match *self {
            Timebase::Microseconds(us) => us,
            Timebase::Periods(periods) => periods * 1_000_000.0 / frequency_hz,
        }
    }
}

impl fmt::Display for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Timebase::Microseconds(us) => write!(f, "{us}u"),
            Timebase::Periods(periods) => write!(f, "{periods}p"),
        }
    }
}

/// More parameter fields were decoded than names supplied, and the next
/// generated name is already taken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("too few parameter names supplied; generated name {name:?} is already in use")]
pub struct TooFewNames {
    pub name: String,
}

/// Knobs steering every decoding attempt of one search.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerParams {
    frequency: Option<f64>,
    timebase: Option<Timebase>,
    bit_direction: BitDirection,
    use_extents: bool,
    parameter_widths: Vec<u32>,
    max_parameter_width: u32,
    invert: bool,
    parameter_names: Vec<String>,
    rounding: Rounding,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        AnalyzerParams {
            frequency: None,
            timebase: None,
            bit_direction: BitDirection::default(),
            use_extents: false,
            parameter_widths: Vec::new(),
            max_parameter_width: 32,
            invert: false,
            parameter_names: Vec::new(),
            rounding: Rounding::default(),
        }
    }
}

impl AnalyzerParams {
    pub fn new(
        frequency: Option<f64>,
        timebase: Option<Timebase>,
        bit_direction: BitDirection,
        use_extents: bool,
        parameter_widths: Vec<u32>,
        max_parameter_width: u32,
        invert: bool,
    ) -> Self {
        AnalyzerParams {
            frequency,
            timebase,
            bit_direction,
            use_extents,
            parameter_widths,
            max_parameter_width,
            invert,
            ..Self::default()
        }
    }

    pub fn with_parameter_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameter_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rounding(mut self, rounding: Rounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    /// The carrier to analyze against: the supplied one, else
    /// [`DEFAULT_FREQUENCY`].
    pub fn effective_frequency(&self) -> f64 {
        self.frequency.unwrap_or(DEFAULT_FREQUENCY)
    }

    pub fn timebase(&self) -> Option<Timebase> {
        self.timebase
    }

    /// The forced timing unit in microseconds, if one was supplied.
    pub fn timebase_microseconds(&self) -> Option<f64> {
        self.timebase.map(|t| t.microseconds(self.effective_frequency()))
    }

    pub fn bit_direction(&self) -> BitDirection {
        self.bit_direction
    }

    pub fn use_extents(&self) -> bool {
        self.use_extents
    }

    pub fn invert(&self) -> bool {
        self.invert
    }

    pub fn rounding(&self) -> &Rounding {
        &self.rounding
    }

    /// Width ceiling for the parameter field at `index`. A decoder carrying
    /// several bits per burst never splits a burst, so a field can run past
    /// the ceiling to its next symbol boundary.
    pub fn field_width_limit(&self, index: usize) -> u32 {
        self.parameter_widths.get(index).copied().unwrap_or(u32::MAX).min(self.max_parameter_width)
    }

    /// Name for the parameter field at `index`: supplied names first; once
    /// those run out, the spreadsheet-style sequence starts over at `A`.
    pub fn parameter_name(&self, index: usize) -> Result<String, TooFewNames> {
        if let Some(name) = self.parameter_names.get(index) {
            return Ok(name.clone());
        }
        let generated = spreadsheet_name(index - self.parameter_names.len());
        if self.parameter_names.iter().any(|n| n == &generated) {
            return Err(TooFewNames { name: generated });
        }
        Ok(generated)
    }
}
