/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use clap::Parser;

use crate::{EngineOptions, UciEngineConfig, DEFAULT_CAPACITY, DEFAULT_DEPTH};

/// Serve a pool of chess engine sessions over HTTP.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Cli {
    /// Address to listen on.
    #[arg(short, long, env = "STOCKHUB_BIND", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// Path to a UCI engine executable.
    #[arg(short, long, env = "STOCKHUB_ENGINE", default_value = "stockfish")]
    pub engine: PathBuf,

    /// Maximum number of concurrent sessions.
    #[arg(short, long, env = "STOCKHUB_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Depth of every engine search.
    #[arg(short, long, default_value_t = DEFAULT_DEPTH)]
    pub depth: u32,

    /// Engine option applied to every new session, overriding the defaults.
    ///
    /// May be repeated, e.g. `--option Threads=2 --option "Skill Level=10"`.
    #[arg(short, long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<EngineOption>,

    /// Log filter, used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log: String,
}

impl Cli {
    /// Builds the configuration every session's engine is launched with.
    pub fn engine_config(&self) -> UciEngineConfig {
        let mut options = EngineOptions::default();
        for opt in &self.options {
            options.set(&opt.name, &opt.value);
        }

        UciEngineConfig {
            path: self.engine.clone(),
            depth: self.depth,
            options,
        }
    }
}

/// A single `NAME=VALUE` engine option from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOption {
    pub name: String,
    pub value: String,
}

impl FromStr for EngineOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((name, value)) = s.split_once('=') else {
            return Err(format!("expected NAME=VALUE, found {s:?}"));
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(format!("option {s:?} has no name"));
        }

        Ok(Self {
            name: name.to_string(),
            value: value.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["stockhub"]).unwrap();
        assert_eq!(cli.capacity, DEFAULT_CAPACITY);
        assert_eq!(cli.depth, DEFAULT_DEPTH);
        assert!(cli.options.is_empty());

        let config = cli.engine_config();
        assert_eq!(config.options, EngineOptions::default());
    }

    #[test]
    fn test_option_overrides() {
        let cli = Cli::try_parse_from([
            "stockhub",
            "--engine",
            "/opt/stockfish",
            "-o",
            "Threads=4",
            "--option",
            "Skill Level = 5",
        ])
        .unwrap();

        let config = cli.engine_config();
        assert_eq!(config.path, PathBuf::from("/opt/stockfish"));
        assert_eq!(config.options.get("Threads"), Some("4"));
        assert_eq!(config.options.get("Skill Level"), Some("5"));
    }

    #[test]
    fn test_malformed_option() {
        assert!("Threads".parse::<EngineOption>().is_err());
        assert!("=4".parse::<EngineOption>().is_err());
        assert!(Cli::try_parse_from(["stockhub", "--option", "Hash"]).is_err());
    }
}
