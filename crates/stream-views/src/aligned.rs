use std::cell::RefCell;
use std::sync::Arc;

use nalgebra::Point2;
use stream_geometry::{Extrinsics, Intrinsics, Pose};

use crate::{Format, Frame, StreamError, StreamView};

/// Reprojection of a source stream into a target stream's pixel grid.
///
/// Geometry (pose, depth scale, raw and rectified intrinsics) is the
/// target's — alignment adopts the target's viewpoint and resolution. The
/// payload keeps the source's format and framerate, since reprojection does
/// not change what the samples mean. The stage is enabled only when both
/// inputs are.
///
/// `frame` refreshes the private cache only when the source has published a
/// newer frame number.
pub struct AlignedStream<'a> {
    source: &'a dyn StreamView,
    target: &'a dyn StreamView,
    cache: RefCell<AlignCache>,
}

#[derive(Default)]
struct AlignCache {
    frame: Option<Arc<Frame>>,
}

impl<'a> AlignedStream<'a> {
    pub fn new(source: &'a dyn StreamView, target: &'a dyn StreamView) -> Self {
        Self {
            source,
            target,
            cache: RefCell::new(AlignCache::default()),
        }
    }

    fn refresh(&self) -> Result<Arc<Frame>, StreamError> {
        let src_frame = self.source.frame()?;
        let mut cache = self.cache.borrow_mut();
        if let Some(cached) = &cache.frame {
            if cached.number == src_frame.number {
                return Ok(Arc::clone(cached));
            }
        }

        let src_intrin = self.source.intrinsics()?;
        let dst_intrin = self.target.intrinsics()?;
        let format = self.source.format()?;
        let extrin = self.source.extrinsics_to(self.target);
        let data = reproject(
            &src_frame.data,
            format,
            self.source.depth_scale(),
            &src_intrin,
            &dst_intrin,
            &extrin,
        );
        let frame = Arc::new(Frame::new(src_frame.number, data));
        cache.frame = Some(Arc::clone(&frame));
        Ok(frame)
    }
}

impl StreamView for AlignedStream<'_> {
    fn pose(&self) -> Pose {
        self.target.pose()
    }

    fn depth_scale(&self) -> f32 {
        self.target.depth_scale()
    }

    fn is_enabled(&self) -> bool {
        self.source.is_enabled() && self.target.is_enabled()
    }

    fn intrinsics(&self) -> Result<Intrinsics, StreamError> {
        self.target.intrinsics()
    }

    fn rectified_intrinsics(&self) -> Result<Intrinsics, StreamError> {
        self.target.rectified_intrinsics()
    }

    fn format(&self) -> Result<Format, StreamError> {
        self.source.format()
    }

    fn framerate(&self) -> Result<u32, StreamError> {
        self.source.framerate()
    }

    fn frame_number(&self) -> Result<u64, StreamError> {
        self.source.frame_number()
    }

    fn frame(&self) -> Result<Arc<Frame>, StreamError> {
        self.refresh()
    }
}

/// Deproject every source pixel, carry it through the rigid transform, and
/// write its sample at the nearest target pixel.
///
/// Depth payloads deproject at their metric depth (zero samples carry no
/// data and are skipped) and resolve collisions by keeping the sample
/// closest to the target camera. Other payloads deproject at unit depth and
/// are last-write-wins in row-major scan order. Untouched target pixels keep
/// the zero background.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
fn reproject(
    src: &[u8],
    format: Format,
    depth_scale: f32,
    src_intrin: &Intrinsics,
    dst_intrin: &Intrinsics,
    extrin: &Extrinsics,
) -> Vec<u8> {
    let bpp = format.bytes_per_pixel();
    let mut out = vec![0u8; dst_intrin.pixel_count() * bpp];

    if src.len() < src_intrin.pixel_count() * bpp {
        log::warn!(
            "source frame too short for {}x{} {:?}: {} bytes",
            src_intrin.width,
            src_intrin.height,
            format,
            src.len()
        );
        return out;
    }

    let depth = format.is_depth();
    let mut zbuf = if depth {
        vec![f32::INFINITY; dst_intrin.pixel_count()]
    } else {
        Vec::new()
    };

    for y in 0..src_intrin.height {
        for x in 0..src_intrin.width {
            let idx = (y * src_intrin.width + x) as usize;
            let z = if depth {
                let raw = u16::from_le_bytes([src[idx * 2], src[idx * 2 + 1]]);
                if raw == 0 {
                    continue;
                }
                raw as f32 * depth_scale
            } else {
                1.0
            };

            let point = src_intrin.deproject(Point2::new(x as f32, y as f32), z);
            let moved = extrin.transform(point);
            if moved.z <= 0.0 {
                continue;
            }
            let Some((tx, ty)) = dst_intrin.nearest_pixel(dst_intrin.project(moved)) else {
                continue;
            };
            let t = (ty * dst_intrin.width + tx) as usize;
            if depth {
                if moved.z >= zbuf[t] {
                    continue;
                }
                zbuf[t] = moved.z;
            }
            out[t * bpp..t * bpp + bpp].copy_from_slice(&src[idx * bpp..idx * bpp + bpp]);
        }
    }
    out
}
