use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A stream's position and orientation in the common device reference frame.
///
/// `rotation` is orthonormal. [`Pose::transform`] maps stream-local
/// coordinates into the common frame; `translation` is the stream's position
/// in that frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub rotation: Matrix3<f32>,
    pub translation: Vector3<f32>,
}

impl Pose {
    pub fn new(rotation: Matrix3<f32>, translation: Vector3<f32>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }

    /// Identity rotation at the given position.
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self::new(Matrix3::identity(), translation)
    }

    #[inline]
    pub fn transform(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    /// Inverse pose. Uses the transpose since the rotation is orthonormal.
    pub fn inverse(&self) -> Self {
        let rt = self.rotation.transpose();
        Self::new(rt, -(rt * self.translation))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Rigid transform between the reference frames of two streams.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extrinsics {
    pub rotation: Matrix3<f32>,
    pub translation: Vector3<f32>,
}

impl Extrinsics {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Transform carrying points expressed in `from`'s frame into `to`'s
    /// frame: `to.inverse() ∘ from`.
    pub fn between(from: &Pose, to: &Pose) -> Self {
        let rt = to.rotation.transpose();
        Self {
            rotation: rt * from.rotation,
            translation: rt * (from.translation - to.translation),
        }
    }

    #[inline]
    pub fn transform(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::from(self.rotation * p.coords + self.translation)
    }

    pub fn inverse(&self) -> Self {
        let rt = self.rotation.transpose();
        Self {
            rotation: rt,
            translation: -(rt * self.translation),
        }
    }
}
