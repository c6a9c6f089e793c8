use glam::{Mat4, Quat, Vec3};

use crate::model::LoadedModel;

/// Uniform scale plus translation that fits a model into a cube of a given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitTransform {
    pub position: Vec3,
    pub scale: f32,
}

impl FitTransform {
    pub const DEFAULT: FitTransform = FitTransform {
        position: Vec3::ZERO,
        scale: 1.0,
    };

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.scale.is_finite()
    }

    /// Model matrix for the presentation layer: translate, then rotate, then scale.
    pub fn matrix(&self, rotation: Quat) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }
}

impl Default for FitTransform {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Centers `model` on the origin and scales its largest extent to `target_size`.
/// Degenerate bounds never produce non-finite output, they fall back to the default.
pub fn fit_transform(model: Option<&LoadedModel>, target_size: f32) -> FitTransform {
    let Some(model) = model else {
        return FitTransform::DEFAULT;
    };

    let bounds = model.scene.bounding_box();
    let center = bounds.center();
    let size = bounds.size();

    let max_extent = size
        .to_array()
        .into_iter()
        .filter(|extent| extent.is_finite() && *extent > 0.0)
        .reduce(f32::max)
        .unwrap_or(1.0);

    let scale = target_size / max_extent;
    if !scale.is_finite() || scale <= 0.0 {
        return FitTransform::DEFAULT;
    }

    let offset = |component: f32| {
        let offset = -component * scale;
        if offset.is_finite() {
            offset
        } else {
            0.0
        }
    };

    FitTransform {
        position: Vec3::new(offset(center.x), offset(center.y), offset(center.z)),
        scale,
    }
}
