//! Small math helpers shared by the decoder and the geometry builder.

use glam::{EulerRot, Quat, Vec3};

/// Wrap `value` into `[0, length)`, matching a floored modulo.
pub fn repeat(value: f32, length: f32) -> f32 {
    (value - (value / length).floor() * length).clamp(0.0, length)
}

/// Wrap every axis of an Euler angle (degrees) into `[0, 360)`.
pub fn wrap_angles(angle: Vec3) -> Vec3 {
    let wrapped = Vec3::new(
        repeat(angle.x, 360.0),
        repeat(angle.y, 360.0),
        repeat(angle.z, 360.0),
    );
    // Floating error in `repeat` can land exactly on 360.
    Vec3::select(wrapped.cmpge(Vec3::splat(360.0)), Vec3::ZERO, wrapped)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Rotation for Euler degrees applied Z first, then X, then Y.
pub fn euler_degrees(angle: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        angle.y.to_radians(),
        angle.x.to_radians(),
        angle.z.to_radians(),
    )
}
