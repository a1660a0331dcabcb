//! Script replay against a single-owner cache.
//!
//! A script holds one command per line. Keys are single words; a `put`
//! value is the rest of the line, inner whitespace included:
//!
//! ```text
//! # comments and blank lines are skipped
//! put a 1
//! put greeting hello there
//! get a
//! peek a
//! remove a
//! keys
//! len
//! clear
//! ```

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use lrucache_core::{CacheStats, LruCache};
use serde::Serialize;
use tracing::debug;

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Put { key: String, value: String },
    Get(String),
    Peek(String),
    Remove(String),
    Keys,
    Len,
    Clear,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let (verb, rest) = split_word(line).ok_or_else(|| anyhow!("empty command"))?;

        let single = |name: &str| -> Result<String> {
            match split_word(rest) {
                Some((word, "")) => Ok(word.to_string()),
                Some((_, extra)) => bail!("unexpected argument '{}'", extra),
                None => bail!("'{}' expects a {}", verb, name),
            }
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "put" => {
                let (key, value) =
                    split_word(rest).ok_or_else(|| anyhow!("'{}' expects a key", verb))?;
                if value.is_empty() {
                    bail!("'{}' expects a value", verb);
                }
                Command::Put {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            "get" => Command::Get(single("key")?),
            "peek" => Command::Peek(single("key")?),
            "remove" | "del" => Command::Remove(single("key")?),
            "keys" | "len" | "clear" if !rest.is_empty() => {
                bail!("unexpected argument '{}'", rest)
            }
            "keys" => Command::Keys,
            "len" => Command::Len,
            "clear" => Command::Clear,
            other => bail!("unknown command '{}'", other),
        };

        Ok(command)
    }
}

/// Splits off the first whitespace-delimited word. The remainder has its
/// surrounding whitespace trimmed.
fn split_word(input: &str) -> Option<(&str, &str)> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    Some(match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    })
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Put { key, value } => write!(f, "put {} {}", key, value),
            Command::Get(key) => write!(f, "get {}", key),
            Command::Peek(key) => write!(f, "peek {}", key),
            Command::Remove(key) => write!(f, "remove {}", key),
            Command::Keys => f.write_str("keys"),
            Command::Len => f.write_str("len"),
            Command::Clear => f.write_str("clear"),
        }
    }
}

/// Parses a whole script, skipping blank lines and `#` comments.
/// Errors carry the 1-based line number.
pub fn parse_script(source: &str) -> Result<Vec<Command>> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(lineno, line)| {
            line.parse::<Command>()
                .with_context(|| format!("line {}: '{}'", lineno, line))
        })
        .collect()
}

/// Applies one command and returns its output line.
pub fn execute(cache: &mut LruCache<String, String>, command: &Command) -> String {
    debug!("Executing '{}'", command);
    match command {
        Command::Put { key, value } => match cache.put(key.clone(), value.clone()) {
            Some((evicted, _)) => format!("OK evicted {}", evicted),
            None => "OK".to_string(),
        },
        Command::Get(key) => cache.get(key.as_str()).cloned().unwrap_or_else(nil),
        Command::Peek(key) => cache.peek(key.as_str()).cloned().unwrap_or_else(nil),
        Command::Remove(key) => cache.remove(key.as_str()).unwrap_or_else(nil),
        Command::Keys => format!("[{}]", cache.keys().join(", ")),
        Command::Len => cache.len().to_string(),
        Command::Clear => {
            cache.clear();
            "OK".to_string()
        }
    }
}

fn nil() -> String {
    "(nil)".to_string()
}

/// Final cache state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub capacity: usize,
    pub len: usize,
    /// Least recently used first.
    pub keys: Vec<String>,
    pub stats: CacheStats,
}

impl ReplaySummary {
    pub fn from_cache(cache: &LruCache<String, String>) -> Self {
        Self {
            capacity: cache.capacity(),
            len: cache.len(),
            keys: cache.keys(),
            stats: cache.stats(),
        }
    }
}

/// Parses and runs `source` against a fresh cache of `capacity`.
/// Returns one output line per command plus the final state.
pub fn replay(source: &str, capacity: usize) -> Result<(Vec<String>, ReplaySummary)> {
    let commands = parse_script(source)?;
    let mut cache = LruCache::new(capacity)?;

    let output: Vec<String> = commands
        .iter()
        .map(|command| execute(&mut cache, command))
        .collect();

    Ok((output, ReplaySummary::from_cache(&cache)))
}
