//! Composable video/depth stream views over a camera device.
//!
//! Three stages share one polymorphic contract ([`StreamView`]):
//!
//! - [`NativeStream`] reads the hardware front buffer directly,
//! - [`RectifiedStream`] undistorts a source through a cached remap table,
//! - [`AlignedStream`] reprojects a source into a target stream's pixel grid.
//!
//! Derived stages recompute lazily: a [`StreamView::frame`] read refreshes
//! the stage's private cache only when the source has published a newer frame
//! number. The crate neither captures frames nor manages buffer memory; it
//! consumes calibration ([`DeviceConfig`]) and front frames ([`StreamBuffer`])
//! from the device layer.

mod aligned;
mod buffer;
mod config;
mod error;
mod logger;
mod native;
mod rectified;
mod view;

pub use aligned::AlignedStream;
pub use buffer::{Frame, StreamBuffer};
pub use config::{DeviceConfig, Format, IntrinsicsTable, StreamId, StreamMode};
pub use error::StreamError;
pub use logger::init_with_level;
pub use native::NativeStream;
pub use rectified::RectifiedStream;
pub use view::StreamView;

pub use stream_geometry::{Distortion, Extrinsics, Intrinsics, Pose};
