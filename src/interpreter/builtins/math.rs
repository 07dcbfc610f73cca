//! Mathematical built-in functions.

use super::super::error::RuntimeError;
use super::{require_args, with_list, with_number, CallContext};
use crate::value::Value;
use rand::Rng;

/// Folds a list of numbers; the result is a float if any element is.
fn fold_numbers(
    ctx: &CallContext<'_>,
    name: &'static str,
    items: &[Value],
    init: f64,
    op: fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    let mut is_float = false;
    let mut acc = init;
    for item in items {
        match item {
            Value::Number(n, f) => {
                is_float |= *f;
                acc = op(acc, *n);
            }
            other => return Err(ctx.error(name, format!("expected numbers, found {}", other.type_name()))),
        }
    }
    Ok(Value::Number(acc, is_float))
}

pub fn builtin_sum(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "jumlisha");
    with_list!(ctx, args, 0, "jumlisha", |items: &[Value]| fold_numbers(
        ctx,
        "jumlisha",
        items,
        0.0,
        |a, b| a + b
    ))
}

pub fn builtin_product(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "kiasi");
    with_list!(ctx, args, 0, "kiasi", |items: &[Value]| fold_numbers(
        ctx,
        "kiasi",
        items,
        1.0,
        |a, b| a * b
    ))
}

/// `kipeo(x, y)`: stays an int for int operands with a non-negative exponent.
pub fn builtin_pow(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 2, "kipeo");
    match (&args[0], &args[1]) {
        (Value::Number(base, base_float), Value::Number(exp, exp_float)) => {
            let is_float = *base_float || *exp_float || *exp < 0.0;
            Ok(Value::Number(base.powf(*exp), is_float))
        }
        (a, b) => Err(ctx.error(
            "kipeo",
            format!("expected two numbers, found {} and {}", a.type_name(), b.type_name()),
        )),
    }
}

/// `mzizi(x, n = 2)`: the nth root of a non-negative number.
pub fn builtin_root(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "mzizi");
    let degree = match args.get(1) {
        None => 2.0,
        Some(Value::Number(n, _)) if *n != 0.0 => *n,
        Some(other) => return Err(ctx.error("mzizi", format!("invalid root degree {}", other))),
    };
    with_number!(ctx, args, 0, "mzizi", |n: f64, _| {
        if n < 0.0 {
            Err(ctx.error("mzizi", "negative number"))
        } else if degree == 2.0 {
            Ok(Value::float(n.sqrt()))
        } else if degree == 3.0 {
            Ok(Value::float(n.cbrt()))
        } else {
            Ok(Value::float(n.powf(1.0 / degree)))
        }
    })
}

pub fn builtin_random(_ctx: &CallContext<'_>, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::float(rand::thread_rng().r#gen::<f64>()))
}
