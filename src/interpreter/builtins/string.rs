//! String built-in functions.

use super::super::error::RuntimeError;
use super::{require_args, with_list, with_string, CallContext};
use crate::value::Value;

/// `gawa(s, sep)`; without a separator splits on runs of whitespace.
pub fn builtin_split(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "gawa");
    with_string!(ctx, args, 0, "gawa", |s: &str| {
        let parts: Vec<Value> = match args.get(1) {
            None => s.split_whitespace().map(Value::str).collect(),
            Some(Value::Str(sep)) if sep.is_empty() => {
                s.chars().map(|c| Value::str(c.encode_utf8(&mut [0; 4]))).collect()
            }
            Some(Value::Str(sep)) => s.split(sep.as_ref()).map(Value::str).collect(),
            Some(other) => {
                return Err(ctx.error("gawa", format!("separator must be str, found {}", other.type_name())))
            }
        };
        Ok(Value::list(parts))
    })
}

pub fn builtin_join(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "unganisha");
    let sep = match args.get(1) {
        None => "",
        Some(Value::Str(sep)) => sep.as_ref(),
        Some(other) => {
            return Err(ctx.error(
                "unganisha",
                format!("separator must be str, found {}", other.type_name()),
            ))
        }
    };
    with_list!(ctx, args, 0, "unganisha", |items: &[Value]| {
        let parts: Vec<String> = items.iter().map(Value::to_string).collect();
        Ok(Value::Str(parts.join(sep).into()))
    })
}

pub fn builtin_upper(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "herufi_kubwa");
    with_string!(ctx, args, 0, "herufi_kubwa", |s: &str| Ok(Value::Str(
        s.to_uppercase().into()
    )))
}

pub fn builtin_lower(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "herufi_ndogo");
    with_string!(ctx, args, 0, "herufi_ndogo", |s: &str| Ok(Value::Str(
        s.to_lowercase().into()
    )))
}
