use proptest::prelude::*;
use structura_types::{Error, ErrorKind, Multiplicity};

// ── Construction ─────────────────────────────────────────────────

#[test]
fn rejects_negative_min() {
    let err = Multiplicity::new(-1, 1).unwrap_err();
    assert!(matches!(err, Error::InvalidMultiplicity { min: -1, .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidParameter);
}

#[test]
fn rejects_zero_max() {
    assert!(Multiplicity::new(0, 0).is_err());
}

#[test]
fn rejects_min_above_max() {
    let err = Multiplicity::new(3, 2).unwrap_err();
    assert!(err.to_string().contains("minimum exceeds maximum"));
}

#[test]
fn accepts_unlimited() {
    let m = Multiplicity::new(0, Multiplicity::N).unwrap();
    assert!(m.is_unlimited());
    assert!(m.is_multiple());
    assert_eq!(m, Multiplicity::ZERO_N);
}

// ── Predicates ───────────────────────────────────────────────────

#[test]
fn optional_and_required() {
    assert!(Multiplicity::ZERO_ONE.is_optional());
    assert!(!Multiplicity::ZERO_ONE.is_required());
    assert!(Multiplicity::ONE_ONE.is_required());
    assert!(!Multiplicity::ONE_ONE.is_multiple());
}

#[test]
fn valid_max_ignores_min() {
    let m = Multiplicity::new(2, 4).unwrap();
    assert!(!m.is_valid(1));
    assert!(m.is_valid_max(1));
    assert!(!m.is_valid_max(0));
    assert!(!m.is_valid_max(5));
}

// ── Text form ────────────────────────────────────────────────────

#[test]
fn display_uses_n_for_unlimited() {
    assert_eq!(Multiplicity::ONE_N.to_string(), "1..N");
    assert_eq!(Multiplicity::new(2, 5).unwrap().to_string(), "2..5");
}

#[test]
fn parse_text_form() {
    assert_eq!("0..N".parse::<Multiplicity>().unwrap(), Multiplicity::ZERO_N);
    assert_eq!("[1..1]".parse::<Multiplicity>().unwrap(), Multiplicity::ONE_ONE);
    assert_eq!(" 2..n ".parse::<Multiplicity>().unwrap().min(), 2);
}

#[test]
fn parse_rejects_unlimited_min() {
    let err = "N..N".parse::<Multiplicity>().unwrap_err();
    assert!(matches!(err, Error::MalformedMultiplicity(_)));
}

#[test]
fn parse_rejects_garbage() {
    assert!("1-2".parse::<Multiplicity>().is_err());
    assert!("a..b".parse::<Multiplicity>().is_err());
    assert!("2..1".parse::<Multiplicity>().is_err());
}

#[test]
fn serde_uses_text_form() {
    let json = serde_json::to_string(&Multiplicity::ONE_N).unwrap();
    assert_eq!(json, "\"1..N\"");
    let parsed: Multiplicity = serde_json::from_str("\"0..3\"").unwrap();
    assert_eq!(parsed.max(), 3);
    assert!(serde_json::from_str::<Multiplicity>("\"3..0\"").is_err());
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn construction_matches_bounds_rule(min in -5i32..50, max in -5i32..50) {
        let result = Multiplicity::new(min, max);
        prop_assert_eq!(result.is_ok(), min >= 0 && max >= 1 && min <= max);
    }

    #[test]
    fn is_valid_is_range_check(min in 0i32..20, span in 0i32..20, index in 0u32..60) {
        let max = (min + span).max(1);
        let m = Multiplicity::new(min, max).unwrap();
        prop_assert_eq!(m.is_valid(index), index >= min as u32 && index <= max as u32);
    }

    #[test]
    fn text_form_roundtrips(min in 0i32..100, span in 0i32..100) {
        let m = Multiplicity::new(min, (min + span).max(1)).unwrap();
        prop_assert_eq!(m.to_string().parse::<Multiplicity>().unwrap(), m);
    }
}
