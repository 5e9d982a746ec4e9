use crate::analyzer::{Analyzer, AttemptOutcome};
use crate::cleaned::CleanedData;
use crate::decoders::DecodeError;
use crate::irp::BitDirection;
use crate::params::{AnalyzerParams, Timebase};

fn lsb_params() -> AnalyzerParams {
    AnalyzerParams::default()
}

fn msb_extent_params() -> AnalyzerParams {
    AnalyzerParams::new(None, None, BitDirection::Msb, true, Vec::new(), 32, false)
}

fn lsb_extent_params() -> AnalyzerParams {
    AnalyzerParams::new(None, None, BitDirection::Lsb, true, Vec::new(), 32, false)
}

fn analyzer(durations: Vec<i32>, frequency: Option<f64>) -> Analyzer {
    Analyzer::new(CleanedData::from_durations(durations).unwrap(), frequency, true)
}

fn best_irp(durations: Vec<i32>, frequency: Option<f64>, params: &AnalyzerParams, pattern: Option<&str>) -> String {
    let best = analyzer(durations, frequency).search_best_protocol(params, pattern, false).unwrap();
    assert_eq!(best.len(), 1);
    best[0].to_irp_string(16)
}

/// An NEC1-shaped frame for a 32-bit word, lsb first, padded to 108 ms.
fn nec_frame(word: u32) -> Vec<i32> {
    let mut durations = vec![9024, 4512];
    for bit in 0..32 {
        durations.push(564);
        durations.push(if word >> bit & 1 == 1 { 1692 } else { 564 });
    }
    durations.push(564);
    let elapsed: i32 = durations.iter().sum();
    durations.push(108_000 - elapsed);
    durations
}

/// Biphase-encode `bits` (gap-then-flash is a one) as half slots of
/// `half_us`, then run-length them into durations and pad the final gap so
/// the frame lasts `total_us`.
fn manchester_capture(bits: &[u64], half_us: i32, total_us: i32) -> Vec<i32> {
    let mut halves: Vec<bool> = Vec::new();
    for &bit in bits {
        halves.extend(if bit == 1 { [false, true] } else { [true, false] });
    }
    // The idle before the capture hides a leading gap half, the trailing
    // quiet any final one.
    if !halves[0] {
        halves.remove(0);
    }
    while halves.last() == Some(&false) {
        halves.pop();
    }
    assert!(halves[0]);

    let mut durations = vec![half_us];
    let mut current = true;
    for &half in &halves[1..] {
        if half == current {
            *durations.last_mut().unwrap() += half_us;
        } else {
            durations.push(half_us);
            current = half;
        }
    }
    let elapsed: i32 = durations.iter().sum();
    durations.push(total_us - elapsed);
    durations
}

/// One flash per symbol with a gap of `symbol + 1` units, then a one-unit
/// trailer flash and a final gap padding the frame to `total_us`.
fn quad_symbol_capture(symbols: &[i32], unit_us: i32, total_us: i32) -> Vec<i32> {
    let mut durations = Vec::new();
    for &symbol in symbols {
        durations.push(unit_us);
        durations.push(unit_us * (symbol + 1));
    }
    durations.push(unit_us);
    let elapsed: i32 = durations.iter().sum();
    durations.push(total_us - elapsed);
    durations
}

#[test]
fn verbatim_decoding_renders_every_duration() {
    // Array of (expected_irp, captured_durations)
    let cases: Vec<(&str, Vec<i32>)> = vec![
        ("{38k,450,lsb}<>(2,-1,2,-1,1,-38000u)", vec![900, 450, 900, 450, 450, 38_000]),
        ("{38k,500,lsb}<>(1,-1,2,-3,1,-30000u)", vec![500, 500, 1000, 1500, 500, 30_000]),
    ];

    for (expected, durations) in cases {
        assert_eq!(best_irp(durations, None, &lsb_params(), Some("trivial")), expected);
    }
}

#[test]
fn extents_replace_the_final_gap() {
    let irp = best_irp(vec![500, 500, 500, 98_500], Some(40_000.0), &lsb_extent_params(), Some("trivial"));
    assert_eq!(irp, "{40k,500,lsb}<>(1,-1,1,^100m)");

    // Extents not divisible by a millisecond stay in microseconds.
    let irp = best_irp(vec![500, 500, 500, 99_000], Some(40_000.0), &lsb_extent_params(), Some("trivial"));
    assert_eq!(irp, "{40k,500,lsb}<>(1,-1,1,^100500u)");
}

#[test]
fn ties_keep_the_earlier_decoder() {
    // Every pair of this capture doubles as a PWM symbol, so the two-burst
    // hypothesis lands on the same weight as the verbatim one.
    let analyzer = analyzer(vec![900, 450, 900, 450, 450, 38_000], None);
    let all = analyzer.search_all_protocols(&lsb_params(), None, false).unwrap();
    assert_eq!(all[0].len(), 2);
    assert_eq!(all[0][0].weight(), 6);
    assert_eq!(all[0][1].weight(), 6);
    assert_eq!(all[0][1].to_irp_string(16), "{38k,450,lsb}<1,-38000u|2,-1>(A:3){A=0x3}");

    let best = analyzer.search_best_protocol(&lsb_params(), None, false).unwrap();
    assert_eq!(best[0].to_irp_string(16), "{38k,450,lsb}<>(2,-1,2,-1,1,-38000u)");
}

#[test]
fn field_widths_split_the_payload() {
    let params = AnalyzerParams::new(None, None, BitDirection::Lsb, true, vec![8, 8, 8, 8], 32, false);
    let best = analyzer(nec_frame(0xc738_220c), Some(38_400.0)).search_best_protocol(&params, None, false).unwrap();
    assert_eq!(
        best[0].to_irp_string(16),
        "{38.4k,564,lsb}<1,-1|1,-3>(16,-8,A:8,B:8,C:8,D:8,1,^108m){A=0xc,B=0x22,C=0x38,D=0xc7}"
    );
    assert_eq!(best[0].weight(), 16);
}

#[test]
fn supplied_names_replace_the_generated_ones() {
    let params = AnalyzerParams::new(None, None, BitDirection::Lsb, true, vec![8, 8, 16], 32, false)
        .with_parameter_names(["D", "S", "F"]);
    let capture = nec_frame(0xc738_220c);

    let (best, trace) =
        analyzer(capture.clone(), Some(38_400.0)).search_best_protocol_traced(&params, None, false).unwrap();
    assert_eq!(
        best[0].to_irp_string(16),
        "{38.4k,564,lsb}<1,-1|1,-3>(16,-8,D:8,S:8,F:16,1,^108m){D=0xc,F=0xc738,S=0x22}"
    );
    // The four-burst hypothesis needs two fields beyond the supplied names;
    // generation starts over at "A" for those.
    assert_eq!(trace.produced(), 3);
    assert_eq!(trace.failed(), 2);
    assert!(trace.attempts.iter().any(|attempt| {
        attempt.decoder == "pwm4" && matches!(attempt.outcome, AttemptOutcome::Produced { weight: 18 })
    }));

    // Eight-bit fields leave a fourth, generated field holding the top byte.
    let params = AnalyzerParams::new(None, None, BitDirection::Lsb, true, vec![8, 8, 8, 8], 32, false)
        .with_parameter_names(["D", "S", "F"]);
    let (best, trace) =
        analyzer(capture.clone(), Some(38_400.0)).search_best_protocol_traced(&params, None, false).unwrap();
    assert_eq!(
        best[0].to_irp_string(16),
        "{38.4k,564,lsb}<1,-1|1,-3>(16,-8,D:8,S:8,F:8,A:8,1,^108m){A=0xc7,D=0xc,F=0x38,S=0x22}"
    );
    assert_eq!(trace.produced(), 3);
    assert_eq!(trace.failed(), 2);

    // A supplied name drawn from the generated alphabet still collides.
    let params = AnalyzerParams::new(None, None, BitDirection::Lsb, true, vec![8, 8, 16], 32, false)
        .with_parameter_names(["D", "A"]);
    let (best, trace) = analyzer(capture, Some(38_400.0)).search_best_protocol_traced(&params, None, false).unwrap();
    assert_eq!(best[0].weight(), 68);
    assert_eq!(trace.produced(), 1);
    assert_eq!(trace.failed(), 4);
    assert!(trace.attempts.iter().any(|attempt| {
        attempt.decoder == "pwm2"
            && matches!(attempt.outcome, AttemptOutcome::Failed { error: DecodeError::TooFewNames(_) })
    }));
}

#[test]
fn inverted_tables_swap_burst_roles() {
    // Array of (invert, expected_irp)
    let cases = [
        (false, "{38k,500,lsb}<1,-1|1,-3>(A:4,1,-20000u){A=0x6}"),
        (true, "{38k,500,lsb}<1,-3|1,-1>(A:4,1,-20000u){A=0x9}"),
    ];

    for (invert, expected) in cases {
        let params = AnalyzerParams::new(None, None, BitDirection::Lsb, false, Vec::new(), 32, invert);
        let capture = vec![500, 500, 500, 1500, 500, 1500, 500, 500, 500, 20_000];
        assert_eq!(best_irp(capture, None, &params, None), expected);
    }
}

#[test]
fn four_burst_symbols_pack_two_bits() {
    let capture = quad_symbol_capture(&[0, 1, 2, 3, 3, 1, 2, 0], 500, 45_000);

    let best = analyzer(capture.clone(), None).search_best_protocol(&msb_extent_params(), None, false).unwrap();
    assert_eq!(best[0].to_irp_string(16), "{38k,500,msb}<1,-1|1,-2|1,-3|1,-4>(A:16,1,^45m){A=0x1bd8}");
    assert_eq!(best[0].weight(), 12);

    // A forced timebase matching the derived unit changes nothing...
    let params = AnalyzerParams::new(None, Some(Timebase::parse("19p").unwrap()), BitDirection::Msb, true, Vec::new(), 32, false);
    let irp = best_irp(capture.clone(), None, &params, None);
    assert_eq!(irp, "{38k,500,msb}<1,-1|1,-2|1,-3|1,-4>(A:16,1,^45m){A=0x1bd8}");

    // ...while a half-unit timebase doubles every rendered duration.
    let params = AnalyzerParams::new(None, Some(Timebase::parse("250").unwrap()), BitDirection::Msb, true, Vec::new(), 32, false);
    let irp = best_irp(capture, None, &params, None);
    assert_eq!(irp, "{38k,250,msb}<2,-2|2,-4|2,-6|2,-8>(A:16,2,^45m){A=0x1bd8}");
}

#[test]
fn odd_width_limits_round_up_to_symbol_boundaries() {
    // Two-bit symbols never split: a three-bit limit flushes after the
    // fourth bit, and the remainder opens the next field.
    let capture = quad_symbol_capture(&[0, 1, 2, 3, 3, 1, 2, 0], 500, 45_000);
    let params = AnalyzerParams::new(None, None, BitDirection::Msb, true, vec![3], 32, false);
    assert_eq!(
        best_irp(capture, None, &params, None),
        "{38k,500,msb}<1,-1|1,-2|1,-3|1,-4>(A:4,B:12,1,^45m){A=0x1,B=0xbd8}"
    );
}

#[test]
fn manchester_with_a_start_bit() {
    // Start bit first, then 0xc5a msb.
    let bits = [1, 1, 1, 0, 0, 0, 1, 0, 1, 1, 0, 1, 0];
    let frame = manchester_capture(&bits, 500, 100_000);

    let (best, trace) =
        analyzer(frame.clone(), None).search_best_protocol_traced(&msb_extent_params(), None, false).unwrap();
    assert_eq!(best[0].to_irp_string(16), "{38k,500,msb}<1,-1|-1,1>(1:1,A:12,^100m){A=0xc5a}");
    assert_eq!(best[0].weight(), 9);
    assert_eq!(trace.produced(), 4);
    assert_eq!(trace.failed(), 1);
    assert!(trace.attempts.iter().any(|attempt| {
        attempt.decoder == "biphase" && matches!(attempt.outcome, AttemptOutcome::Failed { .. })
    }));

    // Three identical frames fold into a repeat section.
    let mut capture = Vec::new();
    for _ in 0..3 {
        capture.extend_from_slice(&frame);
    }
    let analyzer = analyzer(capture, None);
    assert_eq!(analyzer.repeat_structure(0).repeats(), 3);
    let best = analyzer.search_best_protocol(&msb_extent_params(), None, false).unwrap();
    assert_eq!(best[0].to_irp_string(16), "{38k,500,msb}<1,-1|-1,1>((1:1,A:12,^100m)*){A=0xc5a}");
}

#[test]
fn plain_manchester_needs_no_virtual_half() {
    // A frame opening with a zero keeps its first flash half on the air, so
    // the variant without a start bit is the one that fits.
    let bits = [0, 1, 1, 0, 1, 0, 0, 1];
    let frame = manchester_capture(&bits, 500, 50_000);
    assert_eq!(frame, vec![500, 1000, 500, 500, 1000, 1000, 1000, 500, 500, 1000, 500, 42_000]);

    let (best, trace) =
        analyzer(frame, None).search_best_protocol_traced(&msb_extent_params(), None, false).unwrap();
    assert_eq!(best[0].to_irp_string(16), "{38k,500,msb}<1,-1|-1,1>(A:8,^50m){A=0x69}");
    assert_eq!(best[0].weight(), 7);
    assert_eq!(trace.produced(), 4);
    assert!(trace.attempts.iter().any(|attempt| {
        attempt.decoder == "biphase-with-startbit"
            && matches!(attempt.outcome, AttemptOutcome::Failed { .. })
    }));
}

#[test]
fn a_capture_of_equal_halves_reaches_biphase() {
    // One distinct burst, flash equal to gap: no burst variety and no
    // doubling, yet every pair reads as a zero bit.
    let analyzer = analyzer(vec![500, 500, 500, 500], None);
    let (all, trace) = analyzer.search_all_protocols_traced(&lsb_params(), None, false).unwrap();

    assert_eq!(all[0].len(), 2);
    assert_eq!(all[0][1].to_irp_string(16), "{38k,500,lsb}<1,-1|-1,1>((A:1)*){A=0x0}");
    assert_eq!(trace.produced(), 2);
    assert_eq!(trace.skipped(), 2); // the PWM tables still need burst variety
    assert!(trace.attempts.iter().any(|attempt| {
        attempt.decoder == "biphase" && matches!(attempt.outcome, AttemptOutcome::Produced { .. })
    }));
}
