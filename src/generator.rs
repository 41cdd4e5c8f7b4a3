// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::builder::Builder;
use crate::clock::TimeSource;
use crate::error::ConfigError;
use crate::id::FlakeId;
use std::sync::{Arc, Mutex, PoisonError};

/// Internals of Generator.
/// This struct is not exposed to the public.
#[derive(Debug, Default)]
pub(crate) struct Internals {
    /// `None` until the first ID is issued.
    pub(crate) last_timestamp: Option<u64>,
    pub(crate) sequence: u16,
}

/// SharedGenerator is shared between Generator clones.
/// This struct is not exposed to the public.
pub(crate) struct SharedGenerator {
    pub(crate) worker_id: u64,
    pub(crate) time: Box<dyn TimeSource>,
    pub(crate) internals: Mutex<Internals>,
}

/// Generator issues [`FlakeId`]s for one worker id.
/// It is thread-safe and can be cloned to be used in multiple threads; clones
/// share the same sequence.
///
/// If the host clock steps backwards, the generator neither blocks nor fails:
/// it keeps issuing IDs at the last timestamp it saw and keeps counting the
/// sequence up until the clock catches up.
///
/// The sequence is 16 bits wide and wraps after 65536 IDs in one millisecond,
/// at which point duplicates become possible.
#[derive(Clone)]
pub struct Generator(pub(crate) Arc<SharedGenerator>);

impl Generator {
    /// Create a new Generator for `worker_id` reading the system clock.
    /// For custom configuration see [`builder`].
    ///
    /// [`builder`]: Generator::builder
    pub fn new(worker_id: u64) -> Result<Self, ConfigError> {
        Builder::new().worker_id(worker_id).finalize()
    }

    /// Create a new [`Builder`] to construct a Generator.
    pub fn builder<'a>() -> Builder<'a> {
        Builder::new()
    }

    pub(crate) fn new_inner(shared: Arc<SharedGenerator>) -> Self {
        Self(shared)
    }

    pub fn worker_id(&self) -> u64 {
        self.0.worker_id
    }

    /// Generate the next id. Never fails.
    pub fn generate(&self) -> FlakeId {
        let now = self.0.time.current_millis();

        let (timestamp, sequence, skewed_from) = {
            // The guarded pair is two integers and is never left half-updated,
            // so a poisoned lock is still safe to use.
            let mut internals = self
                .0
                .internals
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let mut skewed_from = None;
            match internals.last_timestamp {
                Some(last) if now < last => {
                    skewed_from = Some(last);
                    internals.sequence = internals.sequence.wrapping_add(1);
                }
                Some(last) if now == last => {
                    internals.sequence = internals.sequence.wrapping_add(1);
                }
                _ => {
                    internals.last_timestamp = Some(now);
                    internals.sequence = 0;
                }
            }

            (
                internals.last_timestamp.unwrap_or(now),
                internals.sequence,
                skewed_from,
            )
        };

        if let Some(last) = skewed_from {
            tracing::warn!(
                worker_id = self.0.worker_id,
                now,
                last,
                "clock moved backwards, reusing last timestamp"
            );
        }

        FlakeId {
            timestamp,
            worker_id: self.0.worker_id,
            sequence,
        }
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("worker_id", &self.0.worker_id)
            .finish_non_exhaustive()
    }
}

/// The "produce one ID" capability the CLI and HTTP layers depend on.
pub trait IdSource: Send + Sync {
    fn generate(&self) -> FlakeId;
}

impl IdSource for Generator {
    fn generate(&self) -> FlakeId {
        Generator::generate(self)
    }
}
