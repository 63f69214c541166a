use std::sync::Arc;

use stream_geometry::{Extrinsics, Intrinsics, Pose};

use crate::{Format, Frame, StreamError, StreamMode};

/// Uniform contract over raw, rectified, and aligned stream stages.
///
/// Downstream consumers read any stage through this trait without knowing
/// which transform (if any) produced the pixels. [`StreamView::frame`] is
/// logically an accessor, but on derived stages it may refresh the stage's
/// private cache as a side effect; see the stage docs.
pub trait StreamView {
    /// This stream's pose in the common device reference frame.
    fn pose(&self) -> Pose;

    /// Factor converting raw depth samples to metres; 0.0 for non-depth
    /// streams.
    fn depth_scale(&self) -> f32;

    /// Whether this stream currently has live data.
    fn is_enabled(&self) -> bool;

    fn intrinsics(&self) -> Result<Intrinsics, StreamError>;

    /// Distortion-free camera model of this stream.
    fn rectified_intrinsics(&self) -> Result<Intrinsics, StreamError>;

    fn format(&self) -> Result<Format, StreamError>;

    fn framerate(&self) -> Result<u32, StreamError>;

    /// Sequence number of the latest available frame.
    fn frame_number(&self) -> Result<u64, StreamError>;

    /// Latest frame as a consistent number/data snapshot.
    fn frame(&self) -> Result<Arc<Frame>, StreamError>;

    /// Rigid transform carrying points from this stream's frame into
    /// `other`'s.
    ///
    /// Computed generically from the two poses; stages never override it.
    fn extrinsics_to(&self, other: &dyn StreamView) -> Extrinsics {
        Extrinsics::between(&self.pose(), &other.pose())
    }

    /// Number of negotiated modes. Derived stages have none.
    fn mode_count(&self) -> usize {
        0
    }

    /// Negotiated mode by index. Derived stages do not enumerate modes.
    fn mode(&self, index: usize) -> Result<StreamMode, StreamError> {
        let _ = index;
        Err(StreamError::UnsupportedOperation {
            what: "mode enumeration",
        })
    }
}
