use std::sync::Arc;

use stream_geometry::{Intrinsics, Pose};

use crate::{
    DeviceConfig, Format, Frame, StreamBuffer, StreamError, StreamId, StreamMode, StreamView,
};

/// Leaf stage bridging the view contract to one physical capture channel.
///
/// Frame access delegates straight to the shared front buffer: no copying,
/// no caching. This is the ground truth every derived stage observes.
pub struct NativeStream {
    config: Arc<DeviceConfig>,
    stream: StreamId,
    modes: Vec<StreamMode>,
    bound: Option<StreamMode>,
    buffer: Option<Arc<StreamBuffer>>,
}

impl NativeStream {
    /// Create an unbound stream for one sensor channel. Created once per
    /// channel at device configuration time.
    pub fn new(config: Arc<DeviceConfig>, stream: StreamId, modes: Vec<StreamMode>) -> Self {
        Self {
            config,
            stream,
            modes,
            bound: None,
            buffer: None,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream
    }

    /// Bind a negotiated mode and its capture buffer, enabling the stream.
    pub fn bind(&mut self, mode_index: usize, buffer: Arc<StreamBuffer>) -> Result<(), StreamError> {
        let mode = self
            .modes
            .get(mode_index)
            .copied()
            .ok_or(StreamError::ModeOutOfRange {
                index: mode_index,
                count: self.modes.len(),
            })?;
        log::info!(
            "binding {:?} to {}x{} {:?} @ {} fps",
            self.stream,
            mode.width,
            mode.height,
            mode.format,
            mode.fps
        );
        self.bound = Some(mode);
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Release the bound mode and buffer, disabling the stream.
    pub fn unbind(&mut self) {
        log::info!("unbinding {:?}", self.stream);
        self.bound = None;
        self.buffer = None;
    }

    /// Currently bound mode.
    pub fn bound_mode(&self) -> Result<StreamMode, StreamError> {
        self.bound.ok_or(StreamError::NoModeBound)
    }

    fn front(&self) -> Result<Arc<Frame>, StreamError> {
        let buffer = self.buffer.as_ref().ok_or(StreamError::NoModeBound)?;
        buffer.front().ok_or(StreamError::NoFrame)
    }
}

impl StreamView for NativeStream {
    fn pose(&self) -> Pose {
        self.config.pose(self.stream)
    }

    fn depth_scale(&self) -> f32 {
        match self.bound {
            Some(mode) if mode.format.is_depth() => self.config.depth_scale,
            _ => 0.0,
        }
    }

    fn is_enabled(&self) -> bool {
        self.buffer.is_some()
    }

    fn intrinsics(&self) -> Result<Intrinsics, StreamError> {
        self.config
            .intrinsics
            .get(self.bound_mode()?.intrinsics_index)
    }

    fn rectified_intrinsics(&self) -> Result<Intrinsics, StreamError> {
        self.config
            .intrinsics
            .get_rectified(self.bound_mode()?.intrinsics_index)
    }

    fn format(&self) -> Result<Format, StreamError> {
        Ok(self.bound_mode()?.format)
    }

    fn framerate(&self) -> Result<u32, StreamError> {
        Ok(self.bound_mode()?.fps)
    }

    fn frame_number(&self) -> Result<u64, StreamError> {
        Ok(self.front()?.number)
    }

    fn frame(&self) -> Result<Arc<Frame>, StreamError> {
        self.front()
    }

    fn mode_count(&self) -> usize {
        self.modes.len()
    }

    fn mode(&self, index: usize) -> Result<StreamMode, StreamError> {
        self.modes
            .get(index)
            .copied()
            .ok_or(StreamError::ModeOutOfRange {
                index,
                count: self.modes.len(),
            })
    }
}
