use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{bail, Context};
use glam::{Quat, Vec3};
use gltf::{buffer, mesh::Mode};

use crate::error::LoadError;
use crate::model::{Color, MeshId, MeshPrimitive};
use crate::scene_graph::{NodeId, Scene, SceneNode, Transform};

pub type Buffers<'a> = &'a [buffer::Data];

/// Decodes a GLB container or a GLTF JSON document into a scene.
/// Side-car buffers resolve relative to `base_dir`; without one only the
/// GLB blob and `data:` URIs are available.
pub fn parse_gltf(data: &[u8], base_dir: Option<&Path>) -> anyhow::Result<Scene> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(data).context("Invalid GLTF/GLB document")?;
    let buffers = gltf::import_buffers(&document, base_dir, blob)
        .context("Failed to resolve GLTF buffers")?;

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(LoadError::EmptyScene)?;

    if gltf_scene.nodes().next().is_none() {
        return Err(LoadError::EmptyScene.into());
    }

    let root_name = gltf_scene.name().unwrap_or("Scene");
    let mut builder = GltfSceneBuilder::new(&buffers, root_name);
    builder.spawn_gltf_scene(&gltf_scene)?;

    log::debug!(
        "GLTF scene {}: {} nodes, {} primitives from {} buffers",
        root_name,
        builder.scene.node_count(),
        builder.primitives.len(),
        buffers.len()
    );

    Ok(builder.scene)
}

struct GltfSceneBuilder<'a> {
    buffers: Buffers<'a>,
    scene: Scene,
    /// Decoded primitives keyed by (mesh index, primitive index). `None` marks a skipped primitive.
    primitives: HashMap<(usize, usize), Option<MeshId>>,
}

impl<'a> GltfSceneBuilder<'a> {
    fn new(buffers: Buffers<'a>, root_name: &str) -> Self {
        Self {
            buffers,
            scene: Scene::new(SceneNode::new(root_name)),
            primitives: HashMap::new(),
        }
    }

    fn spawn_gltf_scene(&mut self, gltf_scene: &gltf::Scene) -> anyhow::Result<()> {
        let root_id = self.scene.root_id();
        let mut visited = HashSet::new();
        let mut stack: Vec<(gltf::Node, NodeId)> = gltf_scene
            .nodes()
            .map(|node| (node, root_id))
            .collect();
        stack.reverse();

        while let Some((node, parent_id)) = stack.pop() {
            // Nodes must form disjoint trees; a repeated node would make a cycle.
            if !visited.insert(node.index()) {
                log::warn!("Skipping GLTF node {} referenced more than once", node.index());
                continue;
            }

            let node_id = self.spawn_gltf_node(&node, parent_id)?;
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, node_id)));
        }

        Ok(())
    }

    fn spawn_gltf_node(&mut self, node: &gltf::Node, parent_id: NodeId) -> anyhow::Result<NodeId> {
        let node_name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Node {}", node.index()));
        let (translation, rotation, scale) = node.transform().decomposed();
        let transform = Transform::new(
            Vec3::from(translation),
            Quat::from_array(rotation),
            Vec3::from(scale),
        );

        let mut object = SceneNode::new(node_name.clone()).with_transform(transform);
        let mut mesh_ids = Vec::new();

        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                if let Some(mesh_id) = self.primitive(&mesh, &primitive)? {
                    mesh_ids.push(mesh_id);
                }
            }
        }

        // A node carries at most one primitive; extra primitives become children.
        if let [mesh_id] = mesh_ids.as_slice() {
            object = object.with_mesh(*mesh_id);
            mesh_ids.clear();
        }

        let node_id = self.scene.add_child(parent_id, object);

        for (index, mesh_id) in mesh_ids.into_iter().enumerate() {
            self.scene.add_child(
                node_id,
                SceneNode::new(format!("{} (primitive {})", node_name, index)).with_mesh(mesh_id),
            );
        }

        Ok(node_id)
    }

    fn primitive(
        &mut self,
        mesh: &gltf::Mesh,
        primitive: &gltf::Primitive,
    ) -> anyhow::Result<Option<MeshId>> {
        let key = (mesh.index(), primitive.index());

        if let Some(mesh_id) = self.primitives.get(&key) {
            return Ok(*mesh_id);
        }

        let mesh_id = decode_primitive(mesh, primitive, self.buffers)?
            .map(|decoded| self.scene.add_mesh(decoded));
        self.primitives.insert(key, mesh_id);

        Ok(mesh_id)
    }
}

fn decode_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: Buffers,
) -> anyhow::Result<Option<MeshPrimitive>> {
    let mesh_name = mesh
        .name()
        .map(String::from)
        .unwrap_or_else(|| format!("Mesh {}", mesh.index()));

    if primitive.mode() != Mode::Triangles {
        log::warn!(
            "Skipping primitive {} of {}: unsupported mode {:?}",
            primitive.index(),
            mesh_name,
            primitive.mode()
        );
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let mut decoded = match reader.read_positions() {
        Some(positions) => MeshPrimitive::new(mesh_name.clone(), positions.map(Vec3::from).collect()),
        None => MeshPrimitive::without_positions(mesh_name.clone()),
    };

    if let Some(normals) = reader.read_normals() {
        decoded = decoded.with_normals(normals.map(Vec3::from).collect());
    }

    if let Some(indices) = reader.read_indices() {
        let indices: Vec<u32> = indices.into_u32().collect();
        let vertex_count = decoded.positions().len();

        if decoded.has_positions() {
            if let Some(&bad) = indices.iter().find(|&&index| index as usize >= vertex_count) {
                bail!(
                    "Primitive {} of {} references vertex {} but only {} vertices exist",
                    primitive.index(),
                    mesh_name,
                    bad,
                    vertex_count
                );
            }
        }

        decoded = decoded.with_indices(indices);
    }

    // The default material's base color factor is white.
    let material = primitive.material();
    let [r, g, b, _] = material.pbr_metallic_roughness().base_color_factor();
    decoded = decoded.with_color(Color(Vec3::new(r, g, b)));
    decoded.material_name = material.name().map(String::from);

    Ok(Some(decoded))
}
