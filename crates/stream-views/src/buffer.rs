use std::sync::{Arc, RwLock};

use crate::StreamError;

/// One captured frame: pixel payload plus its hardware sequence number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub number: u64,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(number: u64, data: Vec<u8>) -> Self {
        Self { number, data }
    }
}

/// Front end of the capture double-buffer, shared between an external
/// capture thread and a native stream.
///
/// `publish` swaps the whole front frame atomically, so `front` always
/// observes a consistent number/data pair. Frame numbers must strictly
/// increase; regressions are rejected.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    front: RwLock<Option<Arc<Frame>>>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a newly captured frame.
    pub fn publish(&self, frame: Frame) -> Result<(), StreamError> {
        let mut front = self.front.write().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = front.as_ref() {
            if frame.number <= current.number {
                log::warn!(
                    "dropping frame {}: front buffer already at {}",
                    frame.number,
                    current.number
                );
                return Err(StreamError::NonMonotonicFrame {
                    last: current.number,
                    offered: frame.number,
                });
            }
        }
        *front = Some(Arc::new(frame));
        Ok(())
    }

    /// Latest published frame, if any.
    pub fn front(&self) -> Option<Arc<Frame>> {
        self.front.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
