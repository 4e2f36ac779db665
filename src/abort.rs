//! Cooperative cancellation (spec §5).
//!
//! Long operations accept an `&AbortToken` and check it at well-defined
//! checkpoints between resample / FFT / filter / IFFT / plan-line generation
//! / correction / quality. No suspension points are observable; this is a
//! plain `Arc<AtomicBool>` flag, not an async primitive, matching the spec's
//! "single-threaded by contract, synchronous, CPU-bound" model.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, TrackGeomError};

/// A shared, cloneable flag a caller can set from another thread to request
/// cancellation of an in-flight pipeline call.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        AbortToken(Arc::new(AtomicBool::new(false)))
    }

    /// A token that never cancels, for callers that don't need the feature.
    pub fn never() -> Self {
        AbortToken::new()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Checkpoint helper: returns `Err(Cancelled)` if the token has been set.
    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(TrackGeomError::Cancelled)
        } else {
            Ok(())
        }
    }
}
