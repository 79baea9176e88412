//! Math type aliases and helper functions.
//!
//! Rendering math is always f32. Data-carrying structs across the engine
//! store matrices as column-major `[f32; 16]` arrays to keep them plain;
//! these helpers bridge to `nalgebra` at the point of arithmetic.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
pub type Quat = nalgebra::Quaternion<f32>;

/// Column-major identity matrix for plain-array transform fields.
pub const IDENTITY_MATRIX: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Convert a matrix to a column-major `[f32; 16]` array.
pub fn mat4_to_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Build a matrix from a column-major `[f32; 16]` array.
pub fn mat4_from_array(a: &[f32; 16]) -> Mat4 {
    Mat4::from_column_slice(a)
}

/// Multiply two column-major array matrices: `a * b`.
pub fn mat4_array_mul(a: &[f32; 16], b: &[f32; 16]) -> [f32; 16] {
    mat4_to_array(&(mat4_from_array(a) * mat4_from_array(b)))
}

/// Build a 4x4 TRS matrix from scale, rotation (quaternion), and translation.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let r = nalgebra::UnitQuaternion::new_unchecked(rotation);
    let m = r.to_rotation_matrix();
    let rm = m.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Create a quaternion from rotation around the X axis.
pub fn quat_from_rotation_x(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::x_axis(), angle).into_inner()
}

/// Create a quaternion from rotation around the Y axis.
pub fn quat_from_rotation_y(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::y_axis(), angle).into_inner()
}

/// Create a quaternion from rotation around the Z axis.
pub fn quat_from_rotation_z(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), angle).into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_array_roundtrip() {
        let m = mat4_from_array(&IDENTITY_MATRIX);
        assert_eq!(m, Mat4::identity());
        assert_eq!(mat4_to_array(&m), IDENTITY_MATRIX);
    }

    #[test]
    fn identity_trs_matrix() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            Quat::identity(),
            Vec3::zeros(),
        );
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn translation_matrix() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = mat4_from_translation(t);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn array_mul_composes_translations() {
        let a = mat4_to_array(&mat4_from_translation(Vec3::new(1.0, 0.0, 0.0)));
        let b = mat4_to_array(&mat4_from_translation(Vec3::new(0.0, 2.0, 0.0)));
        let c = mat4_from_array(&mat4_array_mul(&a, &b));
        assert_eq!(c[(0, 3)], 1.0);
        assert_eq!(c[(1, 3)], 2.0);
    }

    #[test]
    fn rotation_y_90_matrix() {
        let m = mat4_from_scale_rotation_translation(
            Vec3::new(1.0, 1.0, 1.0),
            quat_from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::zeros(),
        );
        // +X maps to -Z under a 90 degree yaw.
        let v = m * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!(v.x.abs() < 1e-5);
        assert!((v.z + 1.0).abs() < 1e-5);
    }
}
