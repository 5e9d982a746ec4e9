//! Minimal protocol model and IRP rendering.
//!
//! Decoding strategies assemble their hypotheses from the pieces here: a
//! general spec (carrier, unit, bit order), a bit spec (the waveform of each
//! bit symbol), and flash/gap/bitfield stream items for the intro, repeat and
//! ending sections. The search itself treats a [`Protocol`] as opaque apart
//! from [`Protocol::weight`], the ranking score.

use crate::collector::NameBinding;
use crate::params::Rounding;
use std::fmt;

/// Bit transmission order within a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDirection {
    /// Least significant bit first (the IRP default).
    #[default]
    Lsb,
    Msb,
}

impl fmt::Display for BitDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BitDirection::Lsb => "lsb",
            BitDirection::Msb => "msb",
        })
    }
}

/// Carrier frequency, timing unit and bit order: `{38.4k,564,lsb}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralSpec {
    pub frequency_hz: f64,
    pub unit_us: f64,
    pub bit_direction: BitDirection,
}

impl fmt::Display for GeneralSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}k,{},{}}}", fmt_number(self.frequency_hz / 1000.0), fmt_number(self.unit_us), self.bit_direction)
    }
}

/// A flash or gap length committed to a rendering flavor: a multiple of the
/// protocol unit, or literal microseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeValue {
    Units(f64),
    Micros(f64),
}

impl TimeValue {
    /// Prefer a unit multiple when `rounding` accepts one.
    pub fn of(us: f64, unit_us: f64, rounding: &Rounding) -> Self {
        match rounding.units_of(unit_us, us) {
            Some(multiple) => TimeValue::Units(f64::from(multiple)),
            None => TimeValue::Micros(us),
        }
    }

    fn body(&self) -> String {
        match self {
            TimeValue::Units(n) => fmt_number(*n),
            TimeValue::Micros(us) => format!("{}u", fmt_number(*us)),
        }
    }
}

/// One rendered element of an IR stream.
#[derive(Debug, Clone, PartialEq)]
pub enum IrStreamItem {
    Flash(TimeValue),
    Gap(TimeValue),
    /// Total elapsed time of the containing section in microseconds: `^108m`.
    Extent(i64),
    /// A named bit field: `A:8`.
    Bits { name: String, width: u32 },
    /// A fixed bit field: `1:1`.
    Constant { value: u64, width: u32 },
}

impl IrStreamItem {
    pub(crate) fn weight(&self) -> u32 {
        match self {
            IrStreamItem::Flash(_) | IrStreamItem::Gap(_) | IrStreamItem::Extent(_) => 1,
            IrStreamItem::Bits { .. } | IrStreamItem::Constant { .. } => 2,
        }
    }
}

impl fmt::Display for IrStreamItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrStreamItem::Flash(tv) => f.write_str(&tv.body()),
            IrStreamItem::Gap(tv) => write!(f, "-{}", tv.body()),
            IrStreamItem::Extent(us) => {
                if us % 1000 == 0 {
                    write!(f, "^{}m", us / 1000)
                } else {
                    write!(f, "^{us}u")
                }
            }
            IrStreamItem::Bits { name, width } => write!(f, "{name}:{width}"),
            IrStreamItem::Constant { value, width } => write!(f, "{value}:{width}"),
        }
    }
}

/// The waveform alternatives of one bit symbol: `<1,-1|1,-3>`.
///
/// Alternative `i` is the waveform transmitted for symbol value `i`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BitSpec {
    alternatives: Vec<Vec<IrStreamItem>>,
}

impl BitSpec {
    pub fn new(alternatives: Vec<Vec<IrStreamItem>>) -> Self {
        BitSpec { alternatives }
    }

    /// No alternatives; used by decodings that assign no bit meaning.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Total weight of the alternative waveforms.
    pub fn weight(&self) -> u32 {
        self.alternatives.iter().flatten().map(IrStreamItem::weight).sum()
    }
}

impl fmt::Display for BitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alternatives: Vec<String> = self
            .alternatives
            .iter()
            .map(|alt| alt.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
            .collect();
        write!(f, "<{}>", alternatives.join("|"))
    }
}

/// One decoding hypothesis: general spec, bit spec, the three stream sections
/// and the finalized definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    pub general_spec: GeneralSpec,
    pub bit_spec: BitSpec,
    pub intro: Vec<IrStreamItem>,
    pub repeat: Vec<IrStreamItem>,
    pub ending: Vec<IrStreamItem>,
    pub definitions: NameBinding,
}

impl Protocol {
    /// Ranking score, lower is simpler: 1 per duration, 2 per bit field, plus
    /// the bit spec's own durations.
    pub fn weight(&self) -> u32 {
        let items = self.intro.iter().chain(&self.repeat).chain(&self.ending);
        self.bit_spec.weight() + items.map(IrStreamItem::weight).sum::<u32>()
    }

    /// Full IRP rendering with definition values in `radix`.
    pub fn to_irp_string(&self, radix: u32) -> String {
        let mut parts: Vec<String> = self.intro.iter().map(ToString::to_string).collect();
        if !self.repeat.is_empty() {
            let inner: Vec<String> = self.repeat.iter().map(ToString::to_string).collect();
            parts.push(format!("({})*", inner.join(",")));
        }
        parts.extend(self.ending.iter().map(ToString::to_string));

        let mut out = format!("{}{}({})", self.general_spec, self.bit_spec, parts.join(","));
        if !self.definitions.is_empty() {
            out.push_str(&self.definitions.to_irp_string(radix));
        }
        out
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_irp_string(10))
    }
}

/// Whole values print as integers, others with one decimal.
fn fmt_number(x: f64) -> String {
    if (x - x.round()).abs() < 1e-6 {
        format!("{}", x.round() as i64)
    } else {
        format!("{x:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: f64) -> TimeValue {
        TimeValue::Units(n)
    }

    #[test]
    fn general_spec_renders_frequency_in_khz() {
        let gs = GeneralSpec { frequency_hz: 38_400.0, unit_us: 564.0, bit_direction: BitDirection::Lsb };
        assert_eq!(gs.to_string(), "{38.4k,564,lsb}");

        let gs = GeneralSpec { frequency_hz: 36_000.0, unit_us: 889.0, bit_direction: BitDirection::Msb };
        assert_eq!(gs.to_string(), "{36k,889,msb}");
    }

    #[test]
    fn items_render_in_irp_notation() {
        assert_eq!(IrStreamItem::Flash(units(16.0)).to_string(), "16");
        assert_eq!(IrStreamItem::Gap(units(8.0)).to_string(), "-8");
        assert_eq!(IrStreamItem::Gap(TimeValue::Micros(44_268.0)).to_string(), "-44268u");
        assert_eq!(IrStreamItem::Extent(108_000).to_string(), "^108m");
        assert_eq!(IrStreamItem::Extent(45_500).to_string(), "^45500u");
        assert_eq!(IrStreamItem::Bits { name: "A".into(), width: 32 }.to_string(), "A:32");
        assert_eq!(IrStreamItem::Constant { value: 1, width: 1 }.to_string(), "1:1");
    }

    #[test]
    fn time_value_prefers_unit_multiples() {
        let rounding = Rounding::default();
        assert_eq!(TimeValue::of(1692.0, 564.0, &rounding), TimeValue::Units(3.0));
        assert_eq!(TimeValue::of(560.0, 564.0, &rounding), TimeValue::Units(1.0));
        assert_eq!(TimeValue::of(38_000.0, 450.0, &rounding), TimeValue::Micros(38_000.0));
    }

    #[test]
    fn bit_spec_renders_and_weighs_alternatives() {
        let spec = BitSpec::new(vec![
            vec![IrStreamItem::Flash(units(1.0)), IrStreamItem::Gap(units(1.0))],
            vec![IrStreamItem::Flash(units(1.0)), IrStreamItem::Gap(units(3.0))],
        ]);
        assert_eq!(spec.to_string(), "<1,-1|1,-3>");
        assert_eq!(spec.weight(), 4);
        assert_eq!(BitSpec::empty().to_string(), "<>");
        assert_eq!(BitSpec::empty().weight(), 0);
    }

    #[test]
    fn protocol_renders_sections_and_definitions() {
        let mut definitions = NameBinding::new();
        definitions.define("A", 0xC738_220C);

        let protocol = Protocol {
            general_spec: GeneralSpec { frequency_hz: 38_400.0, unit_us: 564.0, bit_direction: BitDirection::Lsb },
            bit_spec: BitSpec::new(vec![
                vec![IrStreamItem::Flash(units(1.0)), IrStreamItem::Gap(units(1.0))],
                vec![IrStreamItem::Flash(units(1.0)), IrStreamItem::Gap(units(3.0))],
            ]),
            intro: vec![
                IrStreamItem::Flash(units(16.0)),
                IrStreamItem::Gap(units(8.0)),
                IrStreamItem::Bits { name: "A".into(), width: 32 },
                IrStreamItem::Flash(units(1.0)),
                IrStreamItem::Extent(108_000),
            ],
            repeat: vec![
                IrStreamItem::Flash(units(16.0)),
                IrStreamItem::Gap(units(4.0)),
                IrStreamItem::Flash(units(1.0)),
                IrStreamItem::Extent(108_000),
            ],
            ending: vec![],
            definitions,
        };

        assert_eq!(
            protocol.to_irp_string(16),
            "{38.4k,564,lsb}<1,-1|1,-3>(16,-8,A:32,1,^108m,(16,-4,1,^108m)*){A=0xc738220c}"
        );
        assert_eq!(protocol.weight(), 4 + 6 + 4);
    }
}
