//! Simulation parameters.
//!
//! A parameter file is a sequence of single-character tags, each followed by
//! its value(s):
//!
//! ```text
//! N 5
//! L 3
//! M 4
//! R 2 4 8 16
//! T 1000
//! ```
//!
//! `N`, `L`, `M` and `T` take one integer; `R` takes every integer up to the
//! next tag and becomes the backoff table. Parsing produces
//! [`RawParameters`], which must pass [`RawParameters::validate`] before a
//! run may start.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::error::{ConfigError, Error, Result};

/// Moduli indexed by a node's collision count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffTable {
    moduli: Vec<u64>,
}

impl BackoffTable {
    /// Builds a table, refusing empty tables and non-positive moduli.
    pub fn new(values: &[i64]) -> std::result::Result<BackoffTable, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::EmptyBackoffTable);
        }
        let mut moduli = Vec::with_capacity(values.len());
        for (index, &value) in values.iter().enumerate() {
            if value <= 0 {
                return Err(ConfigError::NonPositiveModulus { index, value });
            }
            moduli.push(value as u64);
        }
        Ok(BackoffTable { moduli })
    }

    pub fn first(&self) -> u64 {
        self.moduli[0]
    }

    /// Modulus for `collision_count`. Counts past the end of the table use the
    /// last entry; validation keeps that from happening when collisions are
    /// possible.
    pub fn modulus(&self, collision_count: usize) -> u64 {
        let index = collision_count.min(self.moduli.len() - 1);
        self.moduli[index]
    }

    pub fn len(&self) -> usize {
        self.moduli.len()
    }

    /// Always false: construction refuses an empty table.
    pub fn is_empty(&self) -> bool {
        self.moduli.is_empty()
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.moduli
    }
}

/// A validated parameter set. Only [`RawParameters::validate`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// N
    pub num_nodes: usize,
    /// L, in ticks.
    pub packet_length: u64,
    /// M
    pub max_retries: usize,
    /// R
    pub backoff_table: BackoffTable,
    /// T, in ticks.
    pub duration: u64,
}

/// Parameters as read from a file, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParameters {
    pub num_nodes: Option<i64>,
    pub packet_length: Option<i64>,
    pub max_retries: Option<i64>,
    pub backoff_table: Option<Vec<i64>>,
    pub duration: Option<i64>,
}

impl RawParameters {
    pub fn validate(&self) -> std::result::Result<SimConfig, ConfigError> {
        let num_nodes = self.num_nodes.ok_or(ConfigError::MissingParameter('N'))?;
        let packet_length = self.packet_length.ok_or(ConfigError::MissingParameter('L'))?;
        let max_retries = self.max_retries.ok_or(ConfigError::MissingParameter('M'))?;
        let table = self
            .backoff_table
            .as_deref()
            .ok_or(ConfigError::MissingParameter('R'))?;
        let duration = self.duration.ok_or(ConfigError::MissingParameter('T'))?;

        if num_nodes <= 0 {
            return Err(ConfigError::NonPositiveNodeCount(num_nodes));
        }
        if packet_length <= 0 {
            return Err(ConfigError::NonPositivePacketLength(packet_length));
        }
        if max_retries <= 0 {
            return Err(ConfigError::NonPositiveMaxRetries(max_retries));
        }
        if duration <= 0 {
            return Err(ConfigError::NonPositiveDuration(duration));
        }

        let backoff_table = BackoffTable::new(table)?;
        let max_retries = max_retries as usize;
        // A lone node never collides, so only the first modulus is ever read.
        if num_nodes > 1 && backoff_table.len() < max_retries {
            return Err(ConfigError::BackoffTableTooShort {
                len: backoff_table.len(),
                max_retries,
            });
        }

        Ok(SimConfig {
            num_nodes: num_nodes as usize,
            packet_length: packet_length as u64,
            max_retries,
            backoff_table,
            duration: duration as u64,
        })
    }
}

/// Reads and validates a parameter file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SimConfig> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    debug!("read {} bytes of parameters from {}", text.len(), path.display());
    let raw = parse_parameters(&text)?;
    Ok(raw.validate()?)
}

/// Parses the tagged parameter format. Unknown tags are logged and skipped.
pub fn parse_parameters(input: &str) -> Result<RawParameters> {
    let mut cursor = Cursor { input, pos: 0 };
    let mut raw = RawParameters::default();

    while let Some(tag) = cursor.next_tag() {
        match tag {
            'N' => raw.num_nodes = Some(cursor.expect_int(tag)?),
            'L' => raw.packet_length = Some(cursor.expect_int(tag)?),
            'M' => raw.max_retries = Some(cursor.expect_int(tag)?),
            'T' => raw.duration = Some(cursor.expect_int(tag)?),
            'R' => {
                let mut values = Vec::new();
                while let Some(value) = cursor.try_int(tag)? {
                    values.push(value);
                }
                raw.backoff_table = Some(values);
            }
            other => warn!("unknown parameter tag '{}' at byte {}", other, cursor.pos),
        }
    }

    Ok(raw)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn next_tag(&mut self) -> Option<char> {
        self.skip_whitespace();
        let tag = self.rest().chars().next()?;
        self.pos += tag.len_utf8();
        Some(tag)
    }

    /// Length of the integer literal at the cursor, if there is one.
    fn int_len(&self) -> usize {
        let bytes = self.rest().as_bytes();
        let sign = matches!(bytes.first(), Some(b'+') | Some(b'-')) as usize;
        let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            0
        } else {
            sign + digits
        }
    }

    fn try_int(&mut self, tag: char) -> Result<Option<i64>> {
        self.skip_whitespace();
        let len = self.int_len();
        if len == 0 {
            return Ok(None);
        }
        let literal = &self.rest()[..len];
        let value = literal.parse::<i64>().map_err(|e| Error::Parse {
            tag,
            offset: self.pos,
            reason: e.to_string(),
        })?;
        self.pos += len;
        Ok(Some(value))
    }

    fn expect_int(&mut self, tag: char) -> Result<i64> {
        match self.try_int(tag)? {
            Some(value) => Ok(value),
            None => Err(Error::Parse {
                tag,
                offset: self.pos,
                reason: "expected an integer".to_string(),
            }),
        }
    }
}
