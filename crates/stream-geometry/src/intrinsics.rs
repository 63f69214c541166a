use nalgebra::{Point2, Point3, Vector2};
use serde::{Deserialize, Serialize};

/// Lens distortion applied on top of the pinhole projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distortion {
    /// Ideal pinhole; coefficients are ignored.
    None,
    /// Brown-Conrady model with coefficients `[k1, k2, p1, p2, k3]`.
    BrownConrady,
}

/// Camera model for one stream mode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub width: u32,
    pub height: u32,
    pub fx: f32,
    pub fy: f32,
    pub ppx: f32,
    pub ppy: f32,
    pub model: Distortion,
    pub coeffs: [f32; 5],
}

/// Fixed-point undistortion iterations. Converges quickly for the moderate
/// distortion of depth/RGB modules.
const UNDISTORT_ITERATIONS: usize = 10;

impl Intrinsics {
    /// Distortion-free model.
    pub fn pinhole(width: u32, height: u32, fx: f32, fy: f32, ppx: f32, ppy: f32) -> Self {
        Self {
            width,
            height,
            fx,
            fy,
            ppx,
            ppy,
            model: Distortion::None,
            coeffs: [0.0; 5],
        }
    }

    /// Brown-Conrady model with coefficients `[k1, k2, p1, p2, k3]`.
    pub fn brown_conrady(
        width: u32,
        height: u32,
        fx: f32,
        fy: f32,
        ppx: f32,
        ppy: f32,
        coeffs: [f32; 5],
    ) -> Self {
        Self {
            width,
            height,
            fx,
            fy,
            ppx,
            ppy,
            model: Distortion::BrownConrady,
            coeffs,
        }
    }

    /// Forward distortion on the normalized image plane.
    fn distort(&self, p: Vector2<f32>) -> Vector2<f32> {
        match self.model {
            Distortion::None => p,
            Distortion::BrownConrady => {
                let [k1, k2, p1, p2, k3] = self.coeffs;
                let r2 = p.x * p.x + p.y * p.y;
                let radial = 1.0 + r2 * (k1 + r2 * (k2 + r2 * k3));
                let x = p.x * radial + 2.0 * p1 * p.x * p.y + p2 * (r2 + 2.0 * p.x * p.x);
                let y = p.y * radial + 2.0 * p2 * p.x * p.y + p1 * (r2 + 2.0 * p.y * p.y);
                Vector2::new(x, y)
            }
        }
    }

    /// Invert the distortion by fixed-point iteration: solve `distort(p) = d`
    /// starting from `p = d`.
    fn undistort(&self, d: Vector2<f32>) -> Vector2<f32> {
        match self.model {
            Distortion::None => d,
            Distortion::BrownConrady => {
                let mut p = d;
                for _ in 0..UNDISTORT_ITERATIONS {
                    p = d - (self.distort(p) - p);
                }
                p
            }
        }
    }

    /// Project a 3-D point in the camera frame onto the pixel grid.
    ///
    /// The point must have positive depth.
    pub fn project(&self, p: Point3<f32>) -> Point2<f32> {
        let n = Vector2::new(p.x / p.z, p.y / p.z);
        let d = self.distort(n);
        Point2::new(d.x * self.fx + self.ppx, d.y * self.fy + self.ppy)
    }

    /// Deproject a pixel with a metric depth back into the camera frame.
    pub fn deproject(&self, pixel: Point2<f32>, depth: f32) -> Point3<f32> {
        let d = Vector2::new((pixel.x - self.ppx) / self.fx, (pixel.y - self.ppy) / self.fy);
        let n = self.undistort(d);
        Point3::new(n.x * depth, n.y * depth, depth)
    }

    /// Round to the nearest integer pixel, if it falls inside the image.
    pub fn nearest_pixel(&self, p: Point2<f32>) -> Option<(u32, u32)> {
        let x = p.x.round();
        let y = p.y.round();
        if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
            return None;
        }
        Some((x as u32, y as u32))
    }

    /// Number of pixels in one image of this model.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // Kinect-like 640x480 depth module.
    fn distorted() -> Intrinsics {
        Intrinsics::brown_conrady(
            640,
            480,
            594.21,
            591.04,
            339.5,
            242.7,
            [0.12, -0.03, 0.001, -0.0005, 0.0],
        )
    }

    #[test]
    fn pinhole_project_deproject_round_trip() {
        let intrin = Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0);
        let p = Point3::new(0.2, -0.1, 1.5);
        let pixel = intrin.project(p);
        let back = intrin.deproject(pixel, p.z);
        assert_relative_eq!(back, p, epsilon = 1e-5);
    }

    #[test]
    fn distorted_project_deproject_round_trip() {
        let intrin = distorted();
        for p in [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.3, 0.2, 2.0),
            Point3::new(-0.25, 0.15, 0.8),
        ] {
            let pixel = intrin.project(p);
            let back = intrin.deproject(pixel, p.z);
            assert_relative_eq!(back, p, epsilon = 1e-3);
        }
    }

    #[test]
    fn distortion_moves_off_center_pixels() {
        let distorted = distorted();
        let pinhole = Intrinsics::pinhole(640, 480, 594.21, 591.04, 339.5, 242.7);
        let p = Point3::new(0.4, 0.3, 1.0);
        let a = distorted.project(p);
        let b = pinhole.project(p);
        assert!((a - b).norm() > 1.0, "expected a visible distortion shift");
    }

    #[test]
    fn nearest_pixel_respects_bounds() {
        let intrin = Intrinsics::pinhole(640, 480, 600.0, 600.0, 320.0, 240.0);
        assert_eq!(intrin.nearest_pixel(Point2::new(0.4, 0.4)), Some((0, 0)));
        assert_eq!(
            intrin.nearest_pixel(Point2::new(639.4, 479.4)),
            Some((639, 479))
        );
        assert_eq!(intrin.nearest_pixel(Point2::new(-0.6, 10.0)), None);
        assert_eq!(intrin.nearest_pixel(Point2::new(639.6, 10.0)), None);
    }
}
