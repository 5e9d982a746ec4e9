//! Burst cataloging and coarse signal classification.
//!
//! A *burst* is one adjacent (flash, gap) pair. The catalog holds every
//! distinct burst of a capture in two fixed orders: by occurrence count for
//! picking symbol candidates, and lexically for stable symbol numbering.

use crate::cleaned::CleanedData;
use crate::params::Rounding;
use std::fmt;

/// One distinct (flash, gap) pair, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Burst {
    pub flash: i32,
    pub gap: i32,
}

impl Burst {
    pub fn new(flash: i32, gap: i32) -> Self {
        Burst { flash, gap }
    }
}

impl fmt::Display for Burst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.flash, self.gap)
    }
}

/// Every distinct burst of a capture, with occurrence counts.
#[derive(Debug, Clone)]
pub struct BurstCatalog {
    /// Descending by count; ties keep lexical burst order.
    by_count: Vec<(Burst, usize)>,
    /// Ascending lexical burst order.
    ordered: Vec<Burst>,
}

impl BurstCatalog {
    pub fn new(cleaned: &CleanedData) -> Self {
        let mut by_count = Vec::new();
        for &flash in cleaned.distinct_flashes() {
            for &gap in cleaned.distinct_gaps() {
                let count = cleaned.pair_count(flash, gap);
                if count > 0 {
                    by_count.push((Burst::new(flash, gap), count));
                }
            }
        }
        // The nested loops produce lexical order, which a stable sort keeps
        // among equal counts.
        by_count.sort_by(|a, b| b.1.cmp(&a.1));

        let mut ordered: Vec<Burst> = by_count.iter().map(|&(burst, _)| burst).collect();
        ordered.sort();

        BurstCatalog { by_count, ordered }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn bursts_by_count(&self) -> &[(Burst, usize)] {
        &self.by_count
    }

    pub fn bursts_ordered(&self) -> &[Burst] {
        &self.ordered
    }

    /// The `n` most frequent bursts in lexical order, or `None` when the
    /// capture has fewer than `n` distinct bursts.
    pub fn most_common(&self, n: usize) -> Option<Vec<Burst>> {
        if self.by_count.len() < n {
            return None;
        }
        let mut bursts: Vec<Burst> = self.by_count[..n].iter().map(|&(burst, _)| burst).collect();
        bursts.sort();
        Some(bursts)
    }
}

bitflags::bitflags! {
    /// Coarse waveform features used to gate decoding strategies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SignalTraits: u8 {
        /// At least two distinct bursts.
        const MULTIPLE_BURSTS  = 1 << 0;
        /// At least four distinct bursts.
        const QUAD_BURSTS      = 1 << 1;
        /// Some duration is twice another one.
        const DOUBLED_DURATION = 1 << 2;
        /// A single distinct burst with flash equal to gap.
        const UNIFORM_BURST    = 1 << 3;
    }
}

impl SignalTraits {
    /// Classify a capture. Doubling is judged with the default rounding
    /// tolerances so slightly ragged captures still qualify.
    pub fn scan(cleaned: &CleanedData, catalog: &BurstCatalog) -> Self {
        let mut traits = SignalTraits::empty();
        if catalog.len() >= 2 {
            traits |= SignalTraits::MULTIPLE_BURSTS;
        }
        if catalog.len() >= 4 {
            traits |= SignalTraits::QUAD_BURSTS;
        }
        // A lone symmetric burst carries no width contrast, yet still reads
        // as an alternating half-bit stream.
        if let [burst] = catalog.bursts_ordered() {
            if burst.flash == burst.gap {
                traits |= SignalTraits::UNIFORM_BURST;
            }
        }

        let rounding = Rounding::default();
        let mut durations: Vec<i32> = cleaned.distinct_flashes().to_vec();
        durations.extend_from_slice(cleaned.distinct_gaps());
        durations.sort_unstable();
        durations.dedup();
        let doubled = durations.iter().enumerate().any(|(i, &short)| {
            durations[i + 1..].iter().any(|&long| rounding.units_of(f64::from(short), f64::from(long)) == Some(2))
        });
        if doubled {
            traits |= SignalTraits::DOUBLED_DURATION;
        }
        traits
    }
}

/// Human-readable capture summary; created by `Analyzer::statistics`.
pub struct Statistics<'a> {
    pub(crate) frequency_hz: f64,
    pub(crate) unit_us: f64,
    pub(crate) cleaned: &'a CleanedData,
    pub(crate) catalog: &'a BurstCatalog,
}

impl fmt::Display for Statistics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounding = Rounding::default();
        let units = |duration: i32| match rounding.units_of(self.unit_us, f64::from(duration)) {
            Some(1) => "\t= 1 unit".to_string(),
            Some(n) => format!("\t= {n} units"),
            None => String::new(),
        };

        writeln!(f, "frequency: {}Hz", self.frequency_hz)?;
        writeln!(f, "unit: {}us", self.unit_us)?;
        writeln!(f, "flashes:")?;
        for &flash in self.cleaned.distinct_flashes() {
            let name = self.cleaned.name_of(flash);
            let count = self.cleaned.flash_count(flash);
            writeln!(f, "  {name} = {flash}: {count}{}", units(flash))?;
        }
        writeln!(f, "gaps:")?;
        for &gap in self.cleaned.distinct_gaps() {
            let name = self.cleaned.name_of(gap);
            let count = self.cleaned.gap_count(gap);
            writeln!(f, "  {name} = {gap}: {count}{}", units(gap))?;
        }
        writeln!(f, "bursts:")?;
        for &(burst, count) in self.catalog.bursts_by_count() {
            let name = format!("{}{}", self.cleaned.name_of(burst.flash), self.cleaned.name_of(burst.gap));
            writeln!(f, "  {name} = {burst}: {count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaned(durations: &[i32]) -> CleanedData {
        CleanedData::from_durations(durations.to_vec()).unwrap()
    }

    #[test]
    fn catalog_orders_by_count_then_lexically() {
        let data = cleaned(&[900, 450, 900, 450, 450, 38_000]);
        let catalog = BurstCatalog::new(&data);

        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.bursts_by_count(),
            &[(Burst::new(900, 450), 2), (Burst::new(450, 38_000), 1)]
        );
        assert_eq!(catalog.bursts_ordered(), &[Burst::new(450, 38_000), Burst::new(900, 450)]);
    }

    #[test]
    fn count_ties_keep_lexical_order() {
        let data = cleaned(&[300, 400, 100, 200]);
        let catalog = BurstCatalog::new(&data);
        assert_eq!(
            catalog.bursts_by_count(),
            &[(Burst::new(100, 200), 1), (Burst::new(300, 400), 1)]
        );
    }

    #[test]
    fn most_common_returns_lexically_sorted_candidates() {
        let data = cleaned(&[900, 450, 900, 450, 450, 38_000]);
        let catalog = BurstCatalog::new(&data);

        assert_eq!(catalog.most_common(1), Some(vec![Burst::new(900, 450)]));
        assert_eq!(
            catalog.most_common(2),
            Some(vec![Burst::new(450, 38_000), Burst::new(900, 450)])
        );
        assert_eq!(catalog.most_common(3), None);
    }

    #[test]
    fn traits_reflect_burst_variety_and_doubling() {
        let one_burst = cleaned(&[700, 450, 700, 450]);
        let catalog = BurstCatalog::new(&one_burst);
        assert_eq!(SignalTraits::scan(&one_burst, &catalog), SignalTraits::empty());

        let doubled = cleaned(&[500, 500, 1000, 500, 500, 1000, 1000, 30_000]);
        let catalog = BurstCatalog::new(&doubled);
        let traits = SignalTraits::scan(&doubled, &catalog);
        assert!(traits.contains(SignalTraits::MULTIPLE_BURSTS));
        assert!(traits.contains(SignalTraits::QUAD_BURSTS));
        assert!(traits.contains(SignalTraits::DOUBLED_DURATION));
    }

    #[test]
    fn a_lone_symmetric_burst_is_flagged() {
        let data = cleaned(&[500, 500, 500, 500]);
        let catalog = BurstCatalog::new(&data);
        assert_eq!(SignalTraits::scan(&data, &catalog), SignalTraits::UNIFORM_BURST);

        // Equality must be exact; near misses stay unflagged.
        let data = cleaned(&[500, 520, 500, 520]);
        let catalog = BurstCatalog::new(&data);
        assert_eq!(SignalTraits::scan(&data, &catalog), SignalTraits::empty());
    }

    #[test]
    fn near_doubles_count_within_tolerance() {
        let data = cleaned(&[500, 950, 500, 30_000]);
        let catalog = BurstCatalog::new(&data);
        assert!(SignalTraits::scan(&data, &catalog).contains(SignalTraits::DOUBLED_DURATION));

        let data = cleaned(&[564, 1692, 564, 30_000]);
        let catalog = BurstCatalog::new(&data);
        assert!(!SignalTraits::scan(&data, &catalog).contains(SignalTraits::DOUBLED_DURATION));
    }
}
