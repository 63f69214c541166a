use serde::{Deserialize, Serialize};
use stream_geometry::{Intrinsics, Pose};

use crate::StreamError;

/// Physical sensor channels a device may expose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamId {
    Depth,
    Color,
    Infrared,
    Infrared2,
}

impl StreamId {
    pub const COUNT: usize = 4;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Pixel layout of a stream payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Z16,
    Y8,
    Y16,
    Rgb8,
    Rgba8,
    Bgr8,
    Bgra8,
}

impl Format {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Format::Y8 => 1,
            Format::Z16 | Format::Y16 => 2,
            Format::Rgb8 | Format::Bgr8 => 3,
            Format::Rgba8 | Format::Bgra8 => 4,
        }
    }

    /// Whether samples are raw depth units convertible via the depth scale.
    pub fn is_depth(self) -> bool {
        matches!(self, Format::Z16)
    }
}

/// One negotiated (resolution, format, framerate, intrinsics) tuple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMode {
    pub width: u32,
    pub height: u32,
    pub format: Format,
    pub fps: u32,
    pub intrinsics_index: usize,
}

impl StreamMode {
    /// Byte length of one frame in this mode.
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Raw and rectified camera models addressed by a mode's intrinsics index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntrinsicsTable {
    raw: Vec<Intrinsics>,
    rectified: Vec<Intrinsics>,
}

impl IntrinsicsTable {
    /// Entry `i` of `raw` and `rectified` describe the same mode; the two
    /// lists must have equal length.
    pub fn new(raw: Vec<Intrinsics>, rectified: Vec<Intrinsics>) -> Self {
        debug_assert_eq!(raw.len(), rectified.len());
        Self { raw, rectified }
    }

    pub fn get(&self, index: usize) -> Result<Intrinsics, StreamError> {
        self.raw
            .get(index)
            .copied()
            .ok_or(StreamError::IntrinsicsOutOfRange {
                index,
                count: self.raw.len(),
            })
    }

    pub fn get_rectified(&self, index: usize) -> Result<Intrinsics, StreamError> {
        self.rectified
            .get(index)
            .copied()
            .ok_or(StreamError::IntrinsicsOutOfRange {
                index,
                count: self.rectified.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// Shared device-level calibration and stream layout, produced by the device
/// configuration layer and read-only for this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub stream_poses: [Pose; StreamId::COUNT],
    pub depth_scale: f32,
    pub intrinsics: IntrinsicsTable,
}

impl DeviceConfig {
    pub fn pose(&self, stream: StreamId) -> Pose {
        self.stream_poses[stream.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_widths() {
        assert_eq!(Format::Y8.bytes_per_pixel(), 1);
        assert_eq!(Format::Z16.bytes_per_pixel(), 2);
        assert_eq!(Format::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(Format::Bgra8.bytes_per_pixel(), 4);
        assert!(Format::Z16.is_depth());
        assert!(!Format::Y16.is_depth());
    }

    #[test]
    fn intrinsics_lookup_fails_out_of_range() {
        let table = IntrinsicsTable::new(
            vec![Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0)],
            vec![Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0)],
        );
        assert!(table.get(0).is_ok());
        assert_eq!(
            table.get(1),
            Err(StreamError::IntrinsicsOutOfRange { index: 1, count: 1 })
        );
    }

    #[test]
    fn device_profile_round_trips_through_json() {
        let config = DeviceConfig {
            stream_poses: [Pose::identity(); StreamId::COUNT],
            depth_scale: 0.001,
            intrinsics: IntrinsicsTable::new(
                vec![Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0)],
                vec![Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0)],
            ),
        };
        let json = serde_json::to_string(&config).expect("serialize profile");
        let back: DeviceConfig = serde_json::from_str(&json).expect("parse profile");
        assert_eq!(back, config);
    }
}
