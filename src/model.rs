use glam::{Vec3, Vec4};
use id_arena::Id;
use itertools::Itertools;

use crate::format::ModelFormat;
use crate::math::bounds::Aabb;
use crate::scene_graph::Scene;

pub type MeshId = Id<MeshPrimitive>;

/// Display color in linear RGB. Hex values are sRGB and converted on the way in and out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub Vec3);

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(value: f32) -> f32 {
    if value <= 0.003_130_8 {
        value * 12.92
    } else {
        1.055 * value.powf(1.0 / 2.4) - 0.055
    }
}

impl Color {
    /// STL meshes and meshes built without a color.
    pub const DEFAULT_HEX: u32 = 0x385d7a;
    /// OBJ meshes and glTF primitives without a material.
    pub const WHITE: Color = Color(Vec3::ONE);

    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Color(Vec3::new(channel(16), channel(8), channel(0)))
    }

    pub fn to_hex(self) -> u32 {
        let channel =
            |value: f32| (linear_to_srgb(value.clamp(0.0, 1.0)) * 255.0).round() as u32;
        (channel(self.0.x) << 16) | (channel(self.0.y) << 8) | channel(self.0.z)
    }

    pub fn with_alpha(self, alpha: f32) -> Vec4 {
        self.0.extend(alpha)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::from_hex(Self::DEFAULT_HEX)
    }
}

#[derive(Debug)]
pub struct MeshPrimitive {
    pub name: String,
    /// `None` when the source had no position data for this primitive.
    pub positions: Option<Vec<Vec3>>,
    pub normals: Option<Vec<Vec3>>,
    pub indices: Option<Vec<u32>>,
    pub color: Option<Color>,
    pub material_name: Option<String>,
}

impl MeshPrimitive {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            positions: Some(positions),
            normals: None,
            indices: None,
            color: None,
            material_name: None,
        }
    }

    pub fn without_positions(name: impl Into<String>) -> Self {
        Self {
            positions: None,
            ..Self::new(name, Vec::new())
        }
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn positions(&self) -> &[Vec3] {
        self.positions.as_deref().unwrap_or(&[])
    }

    pub fn has_positions(&self) -> bool {
        self.positions.is_some()
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.as_ref().is_some_and(|indices| !indices.is_empty())
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.positions())
    }

    /// Derives per-vertex normals from triangle winding. Indexed meshes
    /// average the normals of every face sharing a vertex.
    pub fn compute_vertex_normals(&mut self) {
        let positions = self.positions();
        let mut normals = vec![Vec3::ZERO; positions.len()];

        let face_normal = |a: Vec3, b: Vec3, c: Vec3| (c - b).cross(a - b);

        match self.indices.as_deref() {
            Some(indices) if !indices.is_empty() => {
                for (&ia, &ib, &ic) in indices.iter().tuples() {
                    let (ia, ib, ic) = (ia as usize, ib as usize, ic as usize);
                    let (Some(&a), Some(&b), Some(&c)) =
                        (positions.get(ia), positions.get(ib), positions.get(ic))
                    else {
                        continue;
                    };

                    let normal = face_normal(a, b, c);
                    normals[ia] += normal;
                    normals[ib] += normal;
                    normals[ic] += normal;
                }
            }
            _ => {
                let triangles = positions.chunks_exact(3);
                for (triangle, corners) in triangles.zip(normals.chunks_exact_mut(3)) {
                    corners.fill(face_normal(triangle[0], triangle[1], triangle[2]));
                }
            }
        }

        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }

        self.normals = Some(normals);
    }

    /// Moves the geometry so its bounding box is centered on the origin.
    /// Returns the applied offset.
    pub fn center(&mut self) -> Vec3 {
        let offset = -self.bounding_box().center();

        if let Some(positions) = self.positions.as_mut() {
            for position in positions {
                *position += offset;
            }
        }

        offset
    }
}

/// A parsed scene tagged with the format it came from.
#[derive(Debug)]
pub struct LoadedModel {
    pub scene: Scene,
    pub format: ModelFormat,
}

impl LoadedModel {
    pub fn new(scene: Scene, format: ModelFormat) -> Self {
        Self { scene, format }
    }
}
