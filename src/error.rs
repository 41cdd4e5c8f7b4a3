// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::id::{Field, MAX_WORKER_ID};
use thiserror::Error;

/// Invalid or missing generator configuration, reported by [`Builder::finalize`].
///
/// [`Builder::finalize`]: crate::Builder::finalize
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker_id must be provided")]
    MissingWorkerId,
    #[error("worker_id `{0}` is greater than the max allowed value {max}", max = MAX_WORKER_ID)]
    WorkerIdOutOfRange(u64),
    #[error("check_worker_id returned false for worker_id `{0}`")]
    CheckWorkerIdFailed(u64),
}

/// Malformed input handed to [`decode`](crate::decode).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("invalid ID length: expected {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("invalid ID format: expected {expected} hyphen-separated fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },
    #[error("invalid {field}: expected {expected} hex digits, got {actual}")]
    FieldWidth {
        field: Field,
        expected: usize,
        actual: usize,
    },
    #[error("invalid {field}: `{value}` is not hexadecimal")]
    NotHex { field: Field, value: String },
}

impl FormatError {
    /// The field that failed to parse, if the error is specific to one.
    pub fn field(&self) -> Option<Field> {
        match self {
            Self::FieldWidth { field, .. } | Self::NotHex { field, .. } => Some(*field),
            Self::InvalidLength { .. } | Self::FieldCount { .. } => None,
        }
    }
}
