//! List construction and higher-order built-in functions.

use super::super::error::RuntimeError;
use super::{require_args, with_list, CallContext};
use crate::value::Value;

pub fn builtin_list(_ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::list(args.to_vec()))
}

pub fn builtin_length(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 1, "urefu");
    match &args[0] {
        Value::Str(s) => Ok(Value::int(s.chars().count() as i64)),
        Value::List(items) => Ok(Value::int(items.len() as i64)),
        other => Err(ctx.error("urefu", format!("expected str or orodha, found {}", other.type_name()))),
    }
}

/// `panga(f, list)`
pub fn builtin_map(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 2, "panga");
    with_list!(ctx, args, 1, "panga", |items: &[Value]| {
        let mapped = items
            .iter()
            .map(|item| ctx.call(&args[0], vec![item.clone()]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::list(mapped))
    })
}

/// `chuja(f, list)`
pub fn builtin_filter(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 2, "chuja");
    with_list!(ctx, args, 1, "chuja", |items: &[Value]| {
        let mut kept = Vec::new();
        for item in items {
            if ctx.call(&args[0], vec![item.clone()])?.is_truthy() {
                kept.push(item.clone());
            }
        }
        Ok(Value::list(kept))
    })
}

/// `punguza(f, list, initial?)`; without an initial value the first element seeds the fold.
pub fn builtin_reduce(ctx: &CallContext<'_>, args: &[Value]) -> Result<Value, RuntimeError> {
    require_args!(ctx, args, 2, "punguza");
    with_list!(ctx, args, 1, "punguza", |items: &[Value]| {
        let (mut acc, rest) = match args.get(2) {
            Some(initial) => (initial.clone(), items),
            None => match items.split_first() {
                Some((first, rest)) => (first.clone(), rest),
                None => return Err(ctx.error("punguza", "empty orodha with no initial value")),
            },
        };
        for item in rest {
            acc = ctx.call(&args[0], vec![acc, item.clone()])?;
        }
        Ok(acc)
    })
}
