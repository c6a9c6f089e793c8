use glam::{EulerRot, Quat, Vec3};

use crate::format::{default_orientation, ModelFormat};

pub const ROTATION_STEP: f32 = std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// User rotation offsets in radians, applied on top of the format's default orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelRotation {
    offset: Vec3,
}

impl ModelRotation {
    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    /// Turns a quarter step around `axis`; `direction` is usually 1 or -1.
    pub fn rotate(&mut self, axis: Axis, direction: f32) {
        let delta = ROTATION_STEP * direction;
        match axis {
            Axis::X => self.offset.x += delta,
            Axis::Y => self.offset.y += delta,
            Axis::Z => self.offset.z += delta,
        }
    }

    pub fn reset(&mut self) {
        self.offset = Vec3::ZERO;
    }

    pub fn to_quat(&self, format: Option<ModelFormat>) -> Quat {
        let base = format
            .map(default_orientation)
            .unwrap_or(Quat::IDENTITY)
            .to_euler(EulerRot::XYZ);
        let angles = Vec3::from(base) + self.offset;

        Quat::from_euler(EulerRot::XYZ, angles.x, angles.y, angles.z)
    }
}
