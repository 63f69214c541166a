use std::cell::RefCell;
use std::sync::Arc;

use nalgebra::Point2;
use stream_geometry::{Intrinsics, Pose};

use crate::{Format, Frame, StreamError, StreamView};

/// Undistorted view over a source stream.
///
/// The output image is expressed in the source's rectified camera model, so
/// this stage exposes the rectified intrinsics as both `intrinsics` and
/// `rectified_intrinsics` — rectifying twice is a no-op transform. The pose
/// keeps the source's position with an identity rotation: rectification
/// changes the camera model, not the viewpoint.
///
/// `frame` refreshes the private cache only when the source has published a
/// newer frame number. The pixel remap table depends only on intrinsics and
/// is built once, then reused until the source intrinsics change (mode
/// rebind).
pub struct RectifiedStream<'a> {
    source: &'a dyn StreamView,
    cache: RefCell<RectifyCache>,
}

#[derive(Default)]
struct RectifyCache {
    /// Intrinsics pair (raw, rectified) the table was built for.
    table_for: Option<(Intrinsics, Intrinsics)>,
    /// Output pixel -> source pixel index; `None` where the distortion model
    /// maps outside the source image.
    table: Vec<Option<u32>>,
    frame: Option<Arc<Frame>>,
}

impl<'a> RectifiedStream<'a> {
    pub fn new(source: &'a dyn StreamView) -> Self {
        Self {
            source,
            cache: RefCell::new(RectifyCache::default()),
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

        let raw = self.source.intrinsics()?;
        let rect = self.source.rectified_intrinsics()?;
        if cache.table_for != Some((raw, rect)) {
            cache.table = build_remap_table(&raw, &rect);
            cache.table_for = Some((raw, rect));
            log::debug!(
                "built rectification table for {}x{} output",
                rect.width,
                rect.height
            );
        }

        let bpp = self.source.format()?.bytes_per_pixel();
        let data = remap(&src_frame.data, &cache.table, bpp);
        let frame = Arc::new(Frame::new(src_frame.number, data));
        cache.frame = Some(Arc::clone(&frame));
        Ok(frame)
    }
}

impl StreamView for RectifiedStream<'_> {
    fn pose(&self) -> Pose {
        Pose::from_translation(self.source.pose().translation)
    }

    fn depth_scale(&self) -> f32 {
        self.source.depth_scale()
    }

    fn is_enabled(&self) -> bool {
        self.source.is_enabled()
    }

    fn intrinsics(&self) -> Result<Intrinsics, StreamError> {
        self.source.rectified_intrinsics()
    }

    fn rectified_intrinsics(&self) -> Result<Intrinsics, StreamError> {
        self.source.rectified_intrinsics()
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

/// For each rectified output pixel, trace the ideal ray and push it through
/// the raw model's forward distortion to find the nearest source pixel.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
fn build_remap_table(raw: &Intrinsics, rect: &Intrinsics) -> Vec<Option<u32>> {
    let mut table = Vec::with_capacity(rect.pixel_count());
    for y in 0..rect.height {
        for x in 0..rect.width {
            let ray = rect.deproject(Point2::new(x as f32, y as f32), 1.0);
            let src = raw.project(ray);
            table.push(raw.nearest_pixel(src).map(|(sx, sy)| sy * raw.width + sx));
        }
    }
    table
}

/// Sample the source buffer through the table; unmapped output pixels keep
/// the zero background.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
fn remap(src: &[u8], table: &[Option<u32>], bpp: usize) -> Vec<u8> {
    let mut out = vec![0u8; table.len() * bpp];
    for (i, entry) in table.iter().enumerate() {
        if let Some(s) = entry {
            let s = *s as usize * bpp;
            if s + bpp <= src.len() {
                out[i * bpp..i * bpp + bpp].copy_from_slice(&src[s..s + bpp]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_models_yield_the_identity_table() {
        let intrin = Intrinsics::pinhole(8, 6, 10.0, 10.0, 4.0, 3.0);
        let table = build_remap_table(&intrin, &intrin);
        assert_eq!(table.len(), 48);
        for (i, entry) in table.iter().enumerate() {
            assert_eq!(*entry, Some(i as u32));
        }
    }

    #[test]
    fn barrel_distortion_unmaps_the_border() {
        let raw = Intrinsics::brown_conrady(
            640,
            480,
            600.0,
            600.0,
            320.0,
            240.0,
            [0.1, 0.0, 0.0, 0.0, 0.0],
        );
        let rect = Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0);
        let table = build_remap_table(&raw, &rect);

        // Left edge at mid-height maps outside the raw image; the center
        // maps to itself.
        assert_eq!(table[240 * 640], None);
        assert_eq!(table[240 * 640 + 320], Some(240 * 640 + 320));
    }

    #[test]
    fn remap_fills_unmapped_pixels_with_background() {
        let src = vec![7u8, 8, 9, 10];
        let table = vec![Some(1u32), None, Some(0u32)];
        assert_eq!(remap(&src, &table, 2), vec![9, 10, 0, 0, 7, 8]);
    }
}
