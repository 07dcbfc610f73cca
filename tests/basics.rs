//! End-to-end programs covering literals, operators, printing and builtins

mod common;

use common::{output_of, value_of};
use spl::Value;

// =============================================================================
// ARITHMETIC
// =============================================================================

#[test]
fn test_precedence() {
    assert_eq!(value_of("2 + 3 * 4"), Value::int(14));
    assert_eq!(value_of("(2 + 3) * 4"), Value::int(20));
    assert_eq!(value_of("10 - 4 - 3"), Value::int(3));
    assert_eq!(value_of("24 / 4 / 2"), Value::int(3));
}

#[test]
fn test_comparison_binds_loosest() {
    assert_eq!(value_of("1 + 1 == 2"), Value::Bool(true));
    assert_eq!(value_of("2 * 3 < 5"), Value::Bool(false));
}

#[test]
fn test_float_promotion() {
    assert_eq!(output_of("chapisha 1 + 2.0"), "3.0\n");
    assert_eq!(output_of("chapisha 7.0 / 2"), "3.5\n");
    assert_eq!(output_of("chapisha 7 / 2"), "3\n");
}

#[test]
fn test_int_and_float_compare_by_value() {
    assert_eq!(value_of("1 == 1.0"), Value::Bool(true));
}

#[test]
fn test_string_comparisons() {
    assert_eq!(value_of("\"abc\" < \"abd\""), Value::Bool(true));
    assert_eq!(value_of("\"a\" != \"a\""), Value::Bool(false));
}

// =============================================================================
// PRINTING
// =============================================================================

#[test]
fn test_print_formats() {
    let source = r#"
chapisha "habari"
chapisha 42
chapisha 2.0
chapisha kweli
chapisha sikweli
chapisha hakuna
chapisha orodha(1, "a", 2.5)
"#;
    assert_eq!(
        output_of(source),
        "habari\n42\n2.0\nkweli\nsikweli\nhakuna\n[1, \"a\", 2.5]\n"
    );
}

#[test]
fn test_print_builtin_with_several_arguments() {
    assert_eq!(output_of("chapisha(\"jibu\", 6 * 7)"), "jibu 42\n");
}

#[test]
fn test_parenthesised_print_operand_continues() {
    assert_eq!(output_of("chapisha (1 + 2) * 3"), "9\n");
    assert_eq!(output_of("chapisha(10) - 4 > 5"), "kweli\n");
    assert_eq!(output_of("x = 2.5\nchapisha (x) |> mshono"), "2.5\n");
    assert_eq!(output_of("jina = \"dunia\"\nchapisha (jina) |> herufi_kubwa"), "DUNIA\n");
}

#[test]
fn test_string_escapes() {
    assert_eq!(output_of(r#"chapisha "a\tb\\c\"d""#), "a\tb\\c\"d\n");
    assert_eq!(output_of("chapisha 'moja\\nmbili'"), "moja\nmbili\n");
}

#[test]
fn test_comments_and_blank_lines() {
    let source = "# mwanzo\n\nx = 1 # moja\n\n   # ndani\nchapisha x\n";
    assert_eq!(output_of(source), "1\n");
}

#[test]
fn test_indentation_is_ignored_by_the_grammar() {
    let source = "\
kazi f(x: int) -> int {
    y = x + 1
        z = y * 2
    z
}
chapisha f(1)
";
    assert_eq!(output_of(source), "4\n");
}

// =============================================================================
// BUILTINS
// =============================================================================

#[test]
fn test_string_builtins() {
    let source = r#"
maneno = gawa("moja mbili tatu")
chapisha urefu(maneno)
chapisha unganisha(maneno, "-")
chapisha herufi_kubwa("jambo")
chapisha herufi_ndogo("JAMBO")
"#;
    assert_eq!(output_of(source), "3\nmoja-mbili-tatu\nJAMBO\njambo\n");
}

#[test]
fn test_math_builtins() {
    assert_eq!(value_of("jumlisha(orodha(1, 2, 3, 4))"), Value::int(10));
    assert_eq!(value_of("kiasi(orodha(1, 2, 3, 4))"), Value::int(24));
    assert_eq!(value_of("kipeo(2, 10)"), Value::int(1024));
    assert_eq!(value_of("mzizi(81)"), Value::float(9.0));
    assert_eq!(value_of("mzizi(27, 3)"), Value::float(3.0));
}

#[test]
fn test_random_is_in_unit_interval() {
    for _ in 0..20 {
        match value_of("nasibu()") {
            Value::Number(n, true) => assert!((0.0..1.0).contains(&n)),
            other => panic!("expected float, got {}", other),
        }
    }
}

#[test]
fn test_conversions() {
    assert_eq!(value_of("kamili(\"12\") + 1"), Value::int(13));
    assert_eq!(value_of("kamili(3.9)"), Value::int(3));
    assert_eq!(output_of("chapisha desimali(2)"), "2.0\n");
    assert_eq!(value_of("mshono(5)"), Value::str("5"));
    assert_eq!(value_of("mshono(2.0)"), Value::str("2.0"));
    assert_eq!(value_of("aina_ya(1.5)"), Value::str("float"));
    assert_eq!(value_of("aina_ya(\"s\")"), Value::str("str"));
}

#[test]
fn test_higher_order_builtins() {
    let source = r#"
kazi mraba(x: int) -> int { x * x }
kazi shufwa(x: int) -> int { x - x / 2 * 2 == 0 }
kazi ongeza(a: int, b: int) -> int { a + b }
namba = orodha(1, 2, 3, 4)
chapisha panga(mraba, namba)
chapisha chuja(shufwa, namba)
chapisha punguza(ongeza, namba)
chapisha punguza(ongeza, namba, 100)
"#;
    assert_eq!(output_of(source), "[1, 4, 9, 16]\n[2, 4]\n10\n110\n");
}

#[test]
fn test_pipe_desugars_to_calls() {
    let source = r#"
kazi mara(x: int, n: int) -> int { x * n }
chapisha orodha(1, 2, 3) |> jumlisha
chapisha 5 |> mara(3)
chapisha "a b" |> gawa |> urefu
"#;
    assert_eq!(output_of(source), "6\n15\n2\n");
}
