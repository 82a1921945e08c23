//! Rig math helpers
//!
//! Quaternion extraction, checked inversion and the armature-to-engine axis
//! remap shared by the skeleton and animation stages.

use glam::{Mat4, Quat, Vec3};
use thiserror::Error;

/// Determinant magnitude below this is treated as singular.
const DET_EPSILON: f32 = 1e-8;

/// Error returned when inverting a degenerate transform.
#[derive(Debug, Clone, Copy, Error)]
#[error("matrix is singular (determinant {determinant:e})")]
pub struct SingularMatrixError {
    pub determinant: f32,
}

/// Invert an affine transform, failing on a near-zero determinant.
///
/// Bone rest matrices are invertible for any sane rig; this surfaces the
/// degenerate case as an error instead of silently producing NaNs.
pub fn checked_inverse(matrix: &Mat4) -> Result<Mat4, SingularMatrixError> {
    let determinant = matrix.determinant();
    if determinant.abs() < DET_EPSILON {
        return Err(SingularMatrixError { determinant });
    }
    Ok(matrix.inverse())
}

/// Extract the rotation of an affine transform as a unit quaternion.
///
/// Basis columns are normalized first, which strips scale (including
/// non-uniform scale applied bone-locally); shear passes through
/// deterministically. Extraction branches on the trace (Shepperd's method)
/// under the right-handed column-vector convention, with `w >= 0` on the
/// trace branch. `q` and `-q` encode the same rotation; consumers must not
/// assume sign beyond this rule.
pub fn rotation_quat(matrix: &Mat4) -> Quat {
    let x = matrix.x_axis.truncate().normalize_or_zero();
    let y = matrix.y_axis.truncate().normalize_or_zero();
    let z = matrix.z_axis.truncate().normalize_or_zero();

    let trace = x.x + y.y + z.z;
    let quat = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        Quat::from_xyzw((y.z - z.y) / s, (z.x - x.z) / s, (x.y - y.x) / s, 0.25 * s)
    } else if x.x > y.y && x.x > z.z {
        let s = (1.0 + x.x - y.y - z.z).sqrt() * 2.0;
        Quat::from_xyzw(0.25 * s, (y.x + x.y) / s, (z.x + x.z) / s, (y.z - z.y) / s)
    } else if y.y > z.z {
        let s = (1.0 + y.y - x.x - z.z).sqrt() * 2.0;
        Quat::from_xyzw((y.x + x.y) / s, 0.25 * s, (z.y + y.z) / s, (z.x - x.z) / s)
    } else {
        let s = (1.0 + z.z - x.x - y.y).sqrt() * 2.0;
        Quat::from_xyzw((z.x + x.z) / s, (z.y + y.z) / s, 0.25 * s, (x.y - y.x) / s)
    };
    quat.normalize()
}

/// Remap an armature-space position to engine axes: `(x, y, z) -> (x, z, -y)`.
///
/// Converts the Z-up armature convention to the viewer's Y-up frame.
pub fn remap_to_engine(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, -v.y)
}
