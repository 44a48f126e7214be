/*
 * proptest.rs
 *
 * property-based tests for parsing functions.
 * generates thousands of inputs to find edge cases.
 */

use proptest::prelude::*;
use std::time::Duration;

use unix_timeout::duration::parse_duration;
use unix_timeout::error::TimeoutError;
use unix_timeout::signal::{Signal, parse_signal, signal_name};

/* ============================================================================
 * Duration Parsing Properties
 * ============================================================================ */

/* valid duration strings always parse successfully */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn duration_valid_seconds_parse(secs in 0u64..1_000_000) {
        let d = parse_duration(&format!("{}s", secs)).expect("valid seconds should parse");
        prop_assert_eq!(d.as_secs(), secs);
    }

    #[test]
    fn duration_valid_minutes_parse(mins in 0u64..10_000) {
        let d = parse_duration(&format!("{}m", mins)).expect("valid minutes should parse");
        prop_assert_eq!(d.as_secs(), mins * 60);
    }

    #[test]
    fn duration_valid_hours_parse(hours in 0u64..1000) {
        let d = parse_duration(&format!("{}h", hours)).expect("valid hours should parse");
        prop_assert_eq!(d.as_secs(), hours * 3600);
    }

    #[test]
    fn duration_valid_days_parse(days in 0u64..100) {
        let d = parse_duration(&format!("{}d", days)).expect("valid days should parse");
        prop_assert_eq!(d.as_secs(), days * 86400);
    }

    #[test]
    fn duration_valid_milliseconds_parse(ms in 0u64..1_000_000) {
        let d = parse_duration(&format!("{}ms", ms)).expect("valid milliseconds should parse");
        prop_assert_eq!(d, Duration::from_millis(ms));
    }
}

/* same amount, different unit, same duration */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn duration_units_agree(n in 0u64..10_000) {
        let secs = parse_duration(&format!("{}s", n)).unwrap();
        prop_assert_eq!(parse_duration(&n.to_string()).unwrap(), secs);
        prop_assert_eq!(parse_duration(&format!("{}000ms", n)).unwrap(), secs);
        prop_assert_eq!(
            parse_duration(&format!("{}m", n)).unwrap(),
            parse_duration(&format!("{}s", n * 60)).unwrap()
        );
    }
}

/* duration ordering: if a > b numerically, then parse(a) >= parse(b) */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn duration_ordering_preserved(a in 0u64..100_000, b in 0u64..100_000) {
        let da = parse_duration(&format!("{}ms", a)).unwrap();
        let db = parse_duration(&format!("{}ms", b)).unwrap();
        prop_assert_eq!(a.cmp(&b), da.cmp(&db));
    }
}

/* fractional durations: 1.5s = 1500ms */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn duration_fractional_equivalence(whole in 0u32..1000, frac in 0u32..10) {
        /* X.Ys should equal X*1000 + Y*100 milliseconds */
        let d = parse_duration(&format!("{}.{}s", whole, frac)).expect("fractional should parse");
        let expected_ms = u64::from(whole) * 1000 + u64::from(frac) * 100;
        prop_assert_eq!(d, Duration::from_millis(expected_ms));
    }
}

/* whitespace handling */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn duration_whitespace_ignored(secs in 1u64..1000, spaces in 0usize..5) {
        let pad = " ".repeat(spaces);
        let d = parse_duration(&format!("{pad}{secs}s{pad}")).expect("whitespace should be trimmed");
        prop_assert_eq!(d.as_secs(), secs);
    }
}

/* case insensitivity */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn duration_case_insensitive(
        n in 1u64..1000,
        unit in prop::sample::select(vec!["s", "ms", "m", "h", "d"]),
    ) {
        let lower = parse_duration(&format!("{n}{unit}")).unwrap();
        let upper = parse_duration(&format!("{n}{}", unit.to_uppercase())).unwrap();
        prop_assert_eq!(lower, upper);
    }
}

/* invalid suffixes always error */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn duration_invalid_suffix_errors(num in 1u64..1000, suffix in "[a-z]{1,3}") {
        prop_assume!(!["s", "ms", "m", "h", "d"].contains(&suffix.as_str()));
        let s = format!("{}{}", num, suffix);
        prop_assert!(matches!(parse_duration(&s), Err(TimeoutError::InvalidDuration(_))));
    }
}

/* negative always errors */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn duration_negative_errors(secs in 1i64..1000) {
        let input = format!("-{}", secs);
        prop_assert!(parse_duration(&input).is_err());
    }
}

/* garbage never panics, it just fails or parses */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn duration_never_panics(input in "\\PC{0,24}") {
        let _ = parse_duration(&input);
    }

    #[test]
    fn duration_huge_values_overflow(exp in 30u32..300) {
        let s = format!("1{}d", "0".repeat(exp as usize));
        prop_assert!(matches!(parse_duration(&s), Err(TimeoutError::DurationOverflow(_))));
    }
}

/* ============================================================================
 * Signal Parsing Properties
 * ============================================================================ */

/* every number from 1 to 31 exists on every Unix we build for */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn signal_valid_numbers_parse(num in 1i32..=31) {
        let sig = parse_signal(&num.to_string()).expect("valid signal number");
        prop_assert_eq!(sig.as_raw(), num);
    }

    #[test]
    fn signal_invalid_numbers_error(num in 65i32..100_000) {
        prop_assert!(parse_signal(&num.to_string()).is_err());
    }

    #[test]
    fn signal_negative_errors(num in -1000i32..0) {
        prop_assert!(parse_signal(&num.to_string()).is_err());
    }

    #[test]
    fn signal_never_panics(input in "\\PC{0,16}") {
        let _ = parse_signal(&input);
    }
}

#[test]
fn signal_zero_errors() {
    assert!(matches!(parse_signal("0"), Err(TimeoutError::InvalidSignal(_))));
}

/* names we accept come back out of signal_name unchanged */
#[test]
fn signal_name_roundtrip() {
    for sig in [
        Signal::HUP,
        Signal::INT,
        Signal::KILL,
        Signal::USR1,
        Signal::USR2,
        Signal::TERM,
    ] {
        let name = signal_name(sig).expect("named signal");
        assert_eq!(parse_signal(name).expect("signal_name output should parse"), sig);
        assert_eq!(sig.to_string(), name);
    }
}

/* case insensitivity for signal names */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn signal_case_insensitive(
        base in prop::sample::select(vec!["TERM", "KILL", "HUP", "INT", "USR1", "USR2"]),
        mask in any::<u8>(),
    ) {
        /* flip the case of each letter according to the mask bits */
        let mixed: String = base
            .chars()
            .enumerate()
            .map(|(i, c)| if mask & (1 << (i % 8)) != 0 { c.to_ascii_lowercase() } else { c })
            .collect();
        prop_assert_eq!(parse_signal(&mixed).unwrap(), parse_signal(base).unwrap());
    }
}

/* SIG prefix optional */
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn signal_sig_prefix_optional(
        base in prop::sample::select(vec!["TERM", "KILL", "HUP", "INT", "USR1", "USR2"]),
        prefix in prop::sample::select(vec!["SIG", "sig", "Sig"]),
    ) {
        let without = parse_signal(base).expect("without prefix");
        let with = parse_signal(&format!("{prefix}{base}")).expect("with prefix");
        prop_assert_eq!(without, with);
    }
}
