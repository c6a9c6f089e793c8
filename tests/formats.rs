use approx::assert_relative_eq;
use glam::Vec3;

use modelview::parsers::parse_model;
use modelview::{
    build_drawables, calculate_model_stats, fit_transform, Color, LoadError, ModelFormat,
    ModelSource, ModelStats, ViewMode,
};

const TRIANGLE_BUFFER: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA=";

fn triangle_bytes() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(44);
    for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    for index in [0u16, 1, 2] {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

/// One indexed triangle instanced by two nodes.
fn shared_mesh_document(buffer_uri: Option<&str>) -> String {
    let uri = buffer_uri
        .map(|uri| format!(r#""uri": "{}", "#, uri))
        .unwrap_or_default();

    format!(
        r#"{{
  "asset": {{ "version": "2.0" }},
  "scene": 0,
  "scenes": [{{ "name": "Shared", "nodes": [0, 1] }}],
  "nodes": [
    {{ "name": "left", "mesh": 0 }},
    {{ "name": "right", "mesh": 0, "translation": [2.0, 0.0, 0.0] }}
  ],
  "meshes": [{{ "name": "triangle", "primitives": [{{ "attributes": {{ "POSITION": 0 }}, "indices": 1 }}] }}],
  "buffers": [{{ {}"byteLength": 44 }}],
  "bufferViews": [
    {{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }},
    {{ "buffer": 0, "byteOffset": 36, "byteLength": 6 }}
  ],
  "accessors": [
    {{ "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] }},
    {{ "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }}
  ]
}}"#,
        uri
    )
}

fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut data = Vec::with_capacity(total);
    data.extend_from_slice(b"glTF");
    data.extend_from_slice(&2u32.to_le_bytes());
    data.extend_from_slice(&(total as u32).to_le_bytes());
    data.extend_from_slice(&(json.len() as u32).to_le_bytes());
    data.extend_from_slice(b"JSON");
    data.extend_from_slice(&json);
    data.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    data.extend_from_slice(b"BIN\0");
    data.extend_from_slice(&bin);
    data
}

fn binary_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
    let mut data = vec![0u8; 80];
    data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for triangle in triangles {
        data.extend_from_slice(&[0u8; 12]);
        for vertex in triangle {
            for component in vertex.to_array() {
                data.extend_from_slice(&component.to_le_bytes());
            }
        }
        data.extend_from_slice(&[0u8; 2]);
    }
    data
}

#[test]
fn obj_triangle_is_counted_and_fitted() {
    let source = ModelSource::new(
        "triangle.obj",
        "# one face\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n",
    );
    let model = parse_model(&source).unwrap();

    assert_eq!(model.format, ModelFormat::Obj);
    assert_eq!(
        calculate_model_stats(&model.scene),
        ModelStats {
            vertex_count: 3,
            face_count: 1,
            mesh_count: 1,
        }
    );

    let transform = fit_transform(Some(&model), 3.0);
    assert_relative_eq!(transform.scale, 3.0);
    assert_relative_eq!(transform.position.x, -1.5);
    assert_relative_eq!(transform.position.y, -1.5);
    assert_relative_eq!(transform.position.z, 0.0);
}

#[test]
fn obj_extension_is_case_insensitive() {
    let source = ModelSource::new("TRIANGLE.OBJ", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
    assert_eq!(parse_model(&source).unwrap().format, ModelFormat::Obj);
}

#[test]
fn binary_and_ascii_stl_are_equivalent_and_centered() {
    let triangle = [
        Vec3::new(4.0, 4.0, 1.0),
        Vec3::new(6.0, 4.0, 1.0),
        Vec3::new(4.0, 6.0, 1.0),
    ];
    let ascii = "solid part
  facet normal 0 0 1
    outer loop
      vertex 4 4 1
      vertex 6 4 1
      vertex 4 6 1
    endloop
  endfacet
endsolid part
";

    let binary = parse_model(&ModelSource::new("part.stl", binary_stl(&[triangle]))).unwrap();
    let text = parse_model(&ModelSource::new("part.stl", ascii)).unwrap();

    for model in [&binary, &text] {
        assert_eq!(model.format, ModelFormat::Stl);
        assert_eq!(calculate_model_stats(&model.scene).face_count, 1);

        let center = model.scene.bounding_box().center();
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, 0.0);
        assert_relative_eq!(center.z, 0.0);
    }
}

#[test]
fn glb_nodes_sharing_a_mesh_count_twice() {
    let data = glb(&shared_mesh_document(None), &triangle_bytes());
    let model = parse_model(&ModelSource::new("shared.glb", data)).unwrap();

    assert_eq!(model.format, ModelFormat::Glb);
    assert_eq!(
        calculate_model_stats(&model.scene),
        ModelStats {
            vertex_count: 6,
            face_count: 2,
            mesh_count: 2,
        }
    );

    let bounds = model.scene.bounding_box();
    assert_relative_eq!(bounds.max.x, 3.0);

    let right = model
        .scene
        .get_node_by_name("right")
        .and_then(|id| model.scene.node(id))
        .unwrap();
    assert_eq!(right.transform.translation(), Vec3::new(2.0, 0.0, 0.0));

    let mesh = model.scene.mesh_nodes().next().unwrap().mesh;
    assert!(mesh.is_indexed());
    assert_eq!(mesh.color, Some(Color::WHITE));

    let drawables = build_drawables(&model, ViewMode::Edges, true);
    assert_eq!(drawables.len(), 4);
    assert_eq!(drawables[1].mesh_id, drawables[3].mesh_id);
    assert_ne!(drawables[1].world_matrix, drawables[3].world_matrix);
}

#[test]
fn gltf_with_embedded_buffer() {
    let uri = format!("data:application/octet-stream;base64,{}", TRIANGLE_BUFFER);
    let source = ModelSource::new("embedded.gltf", shared_mesh_document(Some(&uri)));
    let model = parse_model(&source).unwrap();

    assert_eq!(model.format, ModelFormat::Gltf);
    assert_eq!(calculate_model_stats(&model.scene).mesh_count, 2);
    assert!(model.scene.get_node_by_name("right").is_some());
}

#[test]
fn gltf_with_side_car_buffer_resolves_against_base_dir() {
    let dir = std::env::temp_dir().join(format!("modelview-sidecar-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("triangle.bin"), triangle_bytes()).unwrap();

    let source = ModelSource::new("sidecar.gltf", shared_mesh_document(Some("triangle.bin")))
        .with_base_dir(&dir);
    let result = parse_model(&source);
    std::fs::remove_dir_all(&dir).unwrap();

    let model = result.unwrap();
    assert_eq!(calculate_model_stats(&model.scene).vertex_count, 6);
}

#[test]
fn gltf_without_nodes_is_an_empty_scene() {
    let no_scene = r#"{ "asset": { "version": "2.0" } }"#;
    let empty_scene = r#"{ "asset": { "version": "2.0" }, "scenes": [{ "nodes": [] }] }"#;

    for document in [no_scene, empty_scene] {
        let result = parse_model(&ModelSource::new("empty.gltf", document));
        assert_eq!(result.err(), Some(LoadError::EmptyScene));
    }
}

#[test]
fn broken_files_report_their_format() {
    let result = parse_model(&ModelSource::new("broken.obj", "v 0 0 0\nf 1 2 7\n"));

    match result {
        Err(LoadError::ParseFailure { format, cause }) => {
            assert_eq!(format, ModelFormat::Obj);
            assert!(cause.contains("line 2"), "{}", cause);
        }
        other => panic!("expected a parse failure, got {:?}", other.err()),
    }
}
