use crate::cli::{Args, ColorChoice};
use crate::interpreter::{Builtins, DenyList, RunOptions, SandboxPolicy, WorkerPool, DEFAULT_MAX_DEPTH};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("Invalid config {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Settings loaded from `--config`. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub sandbox: Option<bool>,
    pub deny: Vec<String>,
    pub workers: Option<usize>,
    pub check: Option<bool>,
    pub max_depth: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

pub struct AppConfig {
    pub color_enabled: bool,
    pub verbose: u8,
    pub check: bool,
    pub sandbox: bool,
    pub deny: Vec<String>,
    pub workers: Option<usize>,
    pub max_depth: usize,
}

impl AppConfig {
    /// Flags given on the command line override the file.
    pub fn from_args(args: &Args, file: FileConfig) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };

        let mut deny = file.deny;
        deny.extend(args.deny.iter().cloned());

        AppConfig {
            color_enabled,
            verbose: args.verbose,
            check: args.check || args.check_only || file.check.unwrap_or(false),
            sandbox: args.sandbox || file.sandbox.unwrap_or(false),
            deny,
            workers: args.workers.or(file.workers).filter(|&n| n > 0),
            max_depth: args.max_depth.or(file.max_depth).unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }

    /// The write policy implied by `--sandbox` and `--deny`, if any.
    pub fn policy(&self, builtins: &Builtins) -> Option<Arc<dyn SandboxPolicy>> {
        if !self.sandbox && self.deny.is_empty() {
            return None;
        }
        let mut list = if self.sandbox {
            DenyList::builtins(builtins)
        } else {
            DenyList::default()
        };
        list.extend(self.deny.iter().cloned());
        Some(Arc::new(list))
    }

    pub fn run_options(&self, builtins: &Builtins) -> RunOptions {
        RunOptions {
            type_check: self.check,
            policy: self.policy(builtins),
            pool: self.workers.map(|n| Arc::new(WorkerPool::new(n))),
            max_depth: self.max_depth,
            ..RunOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("spl").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn test_file_config_keys() {
        let file = FileConfig::from_json(r#"{"sandbox": true, "deny": ["x"], "workers": 4}"#).unwrap();
        assert_eq!(file.sandbox, Some(true));
        assert_eq!(file.deny, vec!["x"]);
        assert_eq!(file.workers, Some(4));
        assert_eq!(file.max_depth, None);
        assert_eq!(FileConfig::from_json("{}").unwrap(), FileConfig::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(FileConfig::from_json(r#"{"colour": "never"}"#).is_err());
    }

    #[test]
    fn test_flags_win() {
        let file = FileConfig {
            workers: Some(8),
            max_depth: Some(10),
            ..FileConfig::default()
        };
        let config = AppConfig::from_args(&args(&["--workers", "2", "--color", "never"]), file);
        assert_eq!(config.workers, Some(2));
        assert_eq!(config.max_depth, 10);
        assert!(!config.color_enabled);
    }

    #[test]
    fn test_policy() {
        let builtins = Builtins::standard();
        let plain = AppConfig::from_args(&args(&[]), FileConfig::default());
        assert!(plain.policy(&builtins).is_none());

        let sandboxed = AppConfig::from_args(&args(&["--sandbox", "--deny", "siri"]), FileConfig::default());
        let policy = sandboxed.policy(&builtins).unwrap();
        assert!(policy.is_restricted("chapisha"));
        assert!(policy.is_restricted("siri"));
        assert!(!policy.is_restricted("x"));
    }

    #[test]
    fn test_check_only_implies_check() {
        let config = AppConfig::from_args(&args(&["a.spl", "--check-only"]), FileConfig::default());
        assert!(config.check);
    }
}
