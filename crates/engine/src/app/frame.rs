use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::render::PixelAndTextGrid;

/// Hand-off point for finished frames. The simulation thread publishes whole grids;
/// the window thread only ever sees the latest one.
#[derive(Debug, Clone, Default)]
pub struct FrameSlot {
    latest: Arc<Mutex<Option<Arc<PixelAndTextGrid>>>>,
    published: Arc<AtomicU64>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: PixelAndTextGrid) {
        let frame = Arc::new(frame);
        match self.latest.lock() {
            Ok(mut guard) => *guard = Some(frame),
            Err(poisoned) => {
                warn!("frame_slot_lock_poisoned_recovered");
                *poisoned.into_inner() = Some(frame);
            }
        }
        self.published.fetch_add(1, Ordering::Release);
    }

    pub fn latest(&self) -> Option<Arc<PixelAndTextGrid>> {
        match self.latest.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of frames published so far; lets the presenter skip unchanged frames.
    pub fn generation(&self) -> u64 {
        self.published.load(Ordering::Acquire)
    }
}
