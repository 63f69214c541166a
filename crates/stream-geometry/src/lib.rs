//! Camera geometry for composable stream views.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about devices, buffers, or pixel payloads: it models stream poses, rigid
//! transforms between stream frames, and pinhole camera models with an
//! optional Brown-Conrady distortion.

mod intrinsics;
mod pose;

pub use intrinsics::{Distortion, Intrinsics};
pub use pose::{Extrinsics, Pose};
