#![allow(dead_code)]

use spl::interpreter::{parse_and_run, Output, RunOptions};
use spl::{Error, Value};

/// Runs `source` with captured output and returns (result, printed text).
pub fn run_with(source: &str, options: RunOptions) -> (Result<Value, Error>, String) {
    let output = Output::captured();
    let options = RunOptions {
        output: output.clone(),
        ..options
    };
    let result = parse_and_run(source, &options);
    (result, output.contents().unwrap_or_default())
}

pub fn run(source: &str) -> (Result<Value, Error>, String) {
    run_with(source, RunOptions::default())
}

/// Printed output of a program that must succeed.
pub fn output_of(source: &str) -> String {
    let (result, printed) = run(source);
    if let Err(e) = result {
        panic!("program failed: {}\n--- source ---\n{}", e, source);
    }
    printed
}

pub fn value_of(source: &str) -> Value {
    run(source).0.unwrap_or_else(|e| panic!("program failed: {}", e))
}

pub fn error_of(source: &str) -> Error {
    match run(source).0 {
        Ok(value) => panic!("expected an error, got {}", value),
        Err(e) => e,
    }
}

pub fn checked(source: &str) -> (Result<Value, Error>, String) {
    run_with(
        source,
        RunOptions {
            type_check: true,
            ..RunOptions::default()
        },
    )
}
