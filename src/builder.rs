// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::clock::{SystemClock, TimeSource};
use crate::error::ConfigError;
use crate::generator::{Generator, Internals, SharedGenerator};
use crate::id::is_within_worker_id_range;
use std::sync::{Arc, Mutex};

/// A builder for building the [`Generator`].
///
/// A worker id is mandatory; everything else has a default.
pub struct Builder<'a> {
    worker_id: Option<u64>,
    time: Option<Box<dyn TimeSource>>,
    check_worker_id: Option<&'a dyn Fn(u64) -> bool>,
}

impl<'a> Default for Builder<'a> {
    fn default() -> Self {
        Builder::new()
    }
}

impl<'a> Builder<'a> {
    /// Construct a new builder for the build of [`Generator`].
    pub fn new() -> Self {
        Self {
            worker_id: None,
            time: None,
            check_worker_id: None,
        }
    }

    /// Set the worker ID.
    /// If it does not fit in 48 bits, `finalize` will fail.
    pub fn worker_id(mut self, worker_id: u64) -> Self {
        self.worker_id = Some(worker_id);
        self
    }

    /// Replace the system clock, mostly for deterministic tests.
    pub fn time_source<T>(mut self, time: T) -> Self
    where
        T: TimeSource + 'static,
    {
        self.time = Some(Box::new(time));
        self
    }

    /// Set up a function to check the worker ID.
    /// If the function returns `false`, `finalize` will fail.
    pub fn check_worker_id(mut self, check_worker_id: &'a dyn Fn(u64) -> bool) -> Self {
        self.check_worker_id = Some(check_worker_id);
        self
    }

    /// Finish building and create a Generator instance.
    pub fn finalize(self) -> Result<Generator, ConfigError> {
        let worker_id = self.worker_id.ok_or(ConfigError::MissingWorkerId)?;

        if !is_within_worker_id_range(worker_id) {
            return Err(ConfigError::WorkerIdOutOfRange(worker_id));
        }

        if let Some(check_worker_id) = self.check_worker_id
            && !check_worker_id(worker_id)
        {
            return Err(ConfigError::CheckWorkerIdFailed(worker_id));
        }

        let shared = Arc::new(SharedGenerator {
            worker_id,
            time: self.time.unwrap_or_else(|| Box::new(SystemClock)),
            internals: Mutex::new(Internals::default()),
        });
        Ok(Generator::new_inner(shared))
    }
}
