use crate::scene_graph::Scene;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub vertex_count: usize,
    pub face_count: usize,
    pub mesh_count: usize,
}

/// Counts meshes, vertices and triangles in one walk over the scene.
///
/// Nodes without a mesh, or whose mesh has no position buffer, are left out of
/// the tally. Index (or position) counts are summed first and divided by 3 at
/// the end, so partial triangles from malformed buffers are truncated.
pub fn calculate_model_stats(scene: &Scene) -> ModelStats {
    let mut stats = ModelStats::default();
    let mut face_corners = 0;

    for mesh_node in scene.mesh_nodes() {
        let mesh = mesh_node.mesh;
        if !mesh.has_positions() {
            continue;
        }

        let vertex_count = mesh.positions().len();
        stats.mesh_count += 1;
        stats.vertex_count += vertex_count;
        face_corners += match &mesh.indices {
            Some(indices) if mesh.is_indexed() => indices.len(),
            _ => vertex_count,
        };
    }

    stats.face_count = face_corners / 3;
    stats
}
