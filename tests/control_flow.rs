//! Conditionals, pattern matching and scoping of their bodies

mod common;

use common::{error_of, output_of, value_of};
use spl::interpreter::RuntimeError;
use spl::{Error, Value};

// =============================================================================
// KAMA / VINGINEVYO
// =============================================================================

#[test]
fn test_if_else() {
    let source = "\
x = 10
kama x > 5 {
  chapisha \"kubwa\"
} vinginevyo {
  chapisha \"ndogo\"
}";
    assert_eq!(output_of(source), "kubwa\n");
}

#[test]
fn test_nested_if() {
    let source = "\
kazi daraja(alama: int) -> str {
  kama alama >= 80 { rudisha \"A\" }
  kama alama >= 50 {
    kama alama >= 65 { rudisha \"B\" }
    rudisha \"C\"
  }
  \"F\"
}
chapisha daraja(90)
chapisha daraja(70)
chapisha daraja(55)
chapisha daraja(10)";
    assert_eq!(output_of(source), "A\nB\nC\nF\n");
}

#[test]
fn test_truthiness() {
    let source = "\
kama 0 { chapisha 1 }
kama \"\" { chapisha 2 }
kama orodha() { chapisha 3 }
kama hakuna { chapisha 4 }
kama sikweli { chapisha 5 }
kama 0.5 { chapisha 6 }
kama \"x\" { chapisha 7 }
kama orodha(0) { chapisha 8 }";
    assert_eq!(output_of(source), "6\n7\n8\n");
}

#[test]
fn test_single_statement_branches() {
    assert_eq!(value_of("kama 1 2 vinginevyo 3"), Value::int(2));
    assert_eq!(value_of("kama 0 2 vinginevyo 3"), Value::int(3));
}

#[test]
fn test_if_bindings_do_not_leak() {
    let err = error_of("kama kweli { mpya = 1 }\nmpya");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownIdentifier { ref name, .. }) if name == "mpya"));

    let err = error_of("kama sikweli { } vinginevyo { mpya = 1 }\nmpya");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownIdentifier { .. })));
}

#[test]
fn test_if_body_reads_outer_scope() {
    assert_eq!(output_of("x = 3\nkama x { chapisha x * 2 }"), "6\n");
}

// =============================================================================
// LINGANA
// =============================================================================

#[test]
fn test_first_matching_case_wins() {
    let source = "\
kazi eleza(n: any) -> str {
  lingana n {
    0 => \"sifuri\"
    1 => \"moja\"
    \"moja\" => \"neno\"
    _ => \"nyingine\"
  }
}
chapisha eleza(0)
chapisha eleza(1)
chapisha eleza(\"moja\")
chapisha eleza(5)";
    assert_eq!(output_of(source), "sifuri\nmoja\nneno\nnyingine\n");
}

#[test]
fn test_wildcard_before_literal_shadows_it() {
    assert_eq!(value_of("lingana 0 { _ => 1, 0 => 2 }"), Value::int(1));
}

#[test]
fn test_float_literal_pattern_matches_int_subject() {
    assert_eq!(value_of("lingana 2 { 2.0 => \"sawa\", _ => \"hapana\" }"), Value::str("sawa"));
}

#[test]
fn test_binding_captures_subject() {
    assert_eq!(value_of("lingana 6 { n => n * 7 }"), Value::int(42));
}

#[test]
fn test_bound_name_compares_by_value() {
    let source = "\
lengo = 3
kazi ni_lengo(x: int) -> str {
  lingana x {
    lengo => \"ndiyo\"
    _ => \"hapana\"
  }
}
chapisha ni_lengo(3)
chapisha ni_lengo(4)";
    assert_eq!(output_of(source), "ndiyo\nhapana\n");
}

#[test]
fn test_typed_binding_dispatches_on_type() {
    let source = "\
kazi tambua(x: any) -> str {
  lingana x {
    n: int => \"namba \"
    s: str => s
    _ => \"kitu\"
  }
}
chapisha tambua(1)
chapisha tambua(\"neno\")
chapisha tambua(1.5)";
    assert_eq!(output_of(source), "namba \nneno\nkitu\n");
}

#[test]
fn test_case_scope_is_discarded() {
    let err = error_of("lingana 1 { n => n }\nn");
    assert!(matches!(err, Error::Runtime(RuntimeError::UnknownIdentifier { ref name, .. }) if name == "n"));
}

#[test]
fn test_exhausted_cases_fail() {
    let err = error_of("lingana \"x\" { 1 => 1, 2 => 2 }");
    match err {
        Error::Runtime(RuntimeError::NoMatchingPattern { value, .. }) => assert_eq!(value, "\"x\""),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_match_on_expression_subject() {
    assert_eq!(value_of("lingana 2 + 2 { 4 => \"nne\", _ => \"?\" }"), Value::str("nne"));
}
