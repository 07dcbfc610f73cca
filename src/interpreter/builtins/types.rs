//! Conversion built-in functions.

use super::super::error::RuntimeError;
use super::{require_args, CallContext};
use crate::value::Value;

pub fn builtin_to_int(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "kamili");
    match &args[0] {
        Value::Number(n, _) => Ok(Value::Number(n.trunc(), false)),
        Value::Bool(b) => Ok(Value::int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(|n| Value::Number(n.trunc(), false))
            .ok_or_else(|| ctx.error("kamili", format!("cannot convert {:?} to int", s.as_ref()))),
        other => Err(ctx.error("kamili", format!("cannot convert {} to int", other.type_name()))),
    }
}

pub fn builtin_to_float(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "desimali");
    match &args[0] {
        Value::Number(n, _) => Ok(Value::float(*n)),
        Value::Bool(b) => Ok(Value::float(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::float)
            .map_err(|_| ctx.error("desimali", format!("cannot convert {:?} to float", s.as_ref()))),
        other => Err(ctx.error("desimali", format!("cannot convert {} to float", other.type_name()))),
    }
}

pub fn builtin_to_string(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "mshono");
    Ok(Value::Str(args[0].to_string().into()))
}

pub fn builtin_type_of(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "aina_ya");
    Ok(Value::str(args[0].type_name()))
}
