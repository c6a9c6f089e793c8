use glam::{Mat4, Quat, Vec3};

/// Local translation/rotation/scale of a scene node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_matrix_applies_scale_then_rotation_then_translation() {
        let transform = Transform::new(
            Vec3::new(1.0, 0.0, 0.0),
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::splat(2.0),
        );

        let point = transform.local_matrix().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-6));
        assert_eq!(transform.scale(), Vec3::splat(2.0));
    }

    #[test]
    fn from_translation_keeps_identity_rotation_and_scale() {
        let transform = Transform::from_translation(Vec3::Y);

        assert_eq!(transform.translation(), Vec3::Y);
        assert_eq!(transform.rotation(), Quat::IDENTITY);
        assert_eq!(transform.scale(), Vec3::ONE);
        assert_eq!(Transform::default(), Transform::IDENTITY);
    }
}
