// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background compositing — runs the compositor off the event loop on tokio's
// blocking pool, one composite at a time, discarding results that a newer
// submission has superseded.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, instrument};
use veil_core::RedactionParams;
use veil_core::error::{Result, VeilError};

use crate::compositor::{CompositeReport, Compositor};
use crate::coords::CoordinateMapper;
use crate::mask::Mask;
use crate::raster::Raster;

/// Shared handle to the background compositor. Cheap to clone.
#[derive(Clone)]
pub struct CompositeWorker {
    /// Read-only pristine pixels shared with every task.
    original: Arc<Raster>,
    /// Incremented on every submission; a task whose ticket no longer
    /// matches is stale.
    generation: Arc<AtomicU64>,
    /// Single permit: at most one composite in flight.
    in_flight: Arc<Semaphore>,
}

impl CompositeWorker {
    pub fn new(original: Arc<Raster>) -> Self {
        Self {
            original,
            generation: Arc::new(AtomicU64::new(0)),
            in_flight: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn original(&self) -> &Arc<Raster> {
        &self.original
    }

    /// Ticket of the most recent submission.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Composite a snapshot of the mask in the background.
    ///
    /// Returns `Ok(None)` when a later submission arrived before this one
    /// finished; its result would be out of date.
    #[instrument(skip_all)]
    pub async fn submit(
        &self,
        mask: Mask,
        mapper: CoordinateMapper,
        params: RedactionParams,
    ) -> Result<Option<CompositeReport>> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _permit = self
            .in_flight
            .acquire()
            .await
            .map_err(|err| VeilError::Worker(format!("worker closed: {err}")))?;

        if self.generation() != ticket {
            debug!(ticket, "Superseded before start");
            return Ok(None);
        }

        let original = Arc::clone(&self.original);
        let report = tokio::task::spawn_blocking(move || {
            Compositor::composite(&original, &mask, &mapper, &params)
        })
        .await
        .map_err(|err| VeilError::Worker(format!("composite task failed: {err}")))??;

        if self.generation() != ticket {
            debug!(ticket, latest = self.generation(), "Discarding stale composite");
            return Ok(None);
        }
        Ok(Some(report))
    }
}
