// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::error::FormatError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// bit length of the worker id
pub const WORKER_ID_BITS: u32 = 48;
/// largest worker id that fits in [`WORKER_ID_BITS`]
pub const MAX_WORKER_ID: u64 = (1 << WORKER_ID_BITS) - 1;

/// hex digits of each field in the canonical text form
const TIMESTAMP_DIGITS: usize = 16;
const WORKER_ID_DIGITS: usize = 12;
const SEQUENCE_DIGITS: usize = 4;
const SEPARATOR: char = '-';
const FIELD_COUNT: usize = 3;

/// Length of an encoded [`FlakeId`], separators included.
pub const ENCODED_LEN: usize =
    TIMESTAMP_DIGITS + WORKER_ID_DIGITS + SEQUENCE_DIGITS + FIELD_COUNT - 1;

/// Returns true if `value` can be used as a worker id.
pub fn is_within_worker_id_range(value: u64) -> bool {
    value <= MAX_WORKER_ID
}

/// One generated identifier.
///
/// Ordering is by timestamp, then worker id, then sequence, which matches the
/// lexicographic ordering of the encoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlakeId {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Issuing worker, at most [`MAX_WORKER_ID`].
    pub worker_id: u64,
    /// Disambiguates IDs issued in the same millisecond.
    pub sequence: u16,
}

impl FlakeId {
    pub fn new(timestamp: u64, worker_id: u64, sequence: u16) -> Self {
        Self {
            timestamp,
            worker_id,
            sequence,
        }
    }

    /// The timestamp as a UTC instant, or `None` if chrono cannot represent it.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

/// Renders `TTTTTTTTTTTTTTTT-WWWWWWWWWWWW-SSSS` in upper-case hex.
impl fmt::Display for FlakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:016X}-{:012X}-{:04X}",
            self.timestamp, self.worker_id, self.sequence
        )
    }
}

impl FromStr for FlakeId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Fields of the canonical text form, named in decode errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Timestamp,
    WorkerId,
    Sequence,
}

impl Field {
    fn digits(self) -> usize {
        match self {
            Self::Timestamp => TIMESTAMP_DIGITS,
            Self::WorkerId => WORKER_ID_DIGITS,
            Self::Sequence => SEQUENCE_DIGITS,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Timestamp => "timestamp",
            Self::WorkerId => "worker_id",
            Self::Sequence => "sequence",
        })
    }
}

/// Encode an id into its canonical text form.
pub fn encode(id: &FlakeId) -> String {
    id.to_string()
}

/// Parse the canonical text form back into a [`FlakeId`].
///
/// Hex digits of either case are accepted; anything else, including signs and
/// whitespace, is rejected.
pub fn decode(s: &str) -> Result<FlakeId, FormatError> {
    if s.len() != ENCODED_LEN {
        return Err(FormatError::InvalidLength {
            expected: ENCODED_LEN,
            actual: s.len(),
        });
    }

    let parts: Vec<&str> = s.split(SEPARATOR).collect();
    let [timestamp, worker_id, sequence] = parts.as_slice() else {
        return Err(FormatError::FieldCount {
            expected: FIELD_COUNT,
            actual: parts.len(),
        });
    };

    let timestamp = parse_field(Field::Timestamp, timestamp)?;
    let worker_id = parse_field(Field::WorkerId, worker_id)?;
    // four hex digits always fit in a u16
    let sequence = parse_field(Field::Sequence, sequence)? as u16;

    Ok(FlakeId {
        timestamp,
        worker_id,
        sequence,
    })
}

fn parse_field(field: Field, value: &str) -> Result<u64, FormatError> {
    if value.len() != field.digits() {
        return Err(FormatError::FieldWidth {
            field,
            expected: field.digits(),
            actual: value.len(),
        });
    }
    if !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(FormatError::NotHex {
            field,
            value: value.to_owned(),
        });
    }
    u64::from_str_radix(value, 16).map_err(|_| FormatError::NotHex {
        field,
        value: value.to_owned(),
    })
}
