use anyhow::{anyhow, bail, Context};
use glam::Vec3;
use nom::{
    character::complete::{char, i64 as obj_index, space0, space1},
    combinator::{all_consuming, opt, rest},
    multi::separated_list1,
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    Finish, IResult,
};

use crate::model::{Color, MeshPrimitive};
use crate::scene_graph::{Scene, SceneNode};

/// One `v/vt/vn` reference of a face statement, still 1-based or negative.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Corner {
    position: i64,
    tex_coord: Option<i64>,
    normal: Option<i64>,
}

fn vec3(input: &str) -> IResult<&str, Vec3> {
    let (input, (x, y, z)) = tuple((
        preceded(space0, float),
        preceded(space1, float),
        preceded(space1, float),
    ))(input)?;

    Ok((input, Vec3::new(x, y, z)))
}

/// `v x y z`, optionally followed by vertex colors which are ignored.
fn position_statement(input: &str) -> IResult<&str, Vec3> {
    terminated(vec3, rest)(input)
}

fn normal_statement(input: &str) -> IResult<&str, Vec3> {
    terminated(vec3, space0)(input)
}

fn corner(input: &str) -> IResult<&str, Corner> {
    let (input, position) = obj_index(input)?;
    let (input, tex_coord) = opt(preceded(char('/'), opt(obj_index)))(input)?;
    let (input, normal) = match tex_coord {
        Some(_) => opt(preceded(char('/'), obj_index))(input)?,
        None => (input, None),
    };

    Ok((
        input,
        Corner {
            position,
            tex_coord: tex_coord.flatten(),
            normal,
        },
    ))
}

fn face_statement(input: &str) -> IResult<&str, Vec<Corner>> {
    preceded(space0, terminated(separated_list1(space1, corner), space0))(input)
}

fn run<'a, O>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
    input: &'a str,
) -> anyhow::Result<O> {
    all_consuming(parser)(input)
        .finish()
        .map(|(_, output)| output)
        .map_err(|error| anyhow!("{}", error))
}

/// Resolves a 1-based (or negative, relative) OBJ index against `len` elements.
fn resolve_index(index: i64, len: usize) -> anyhow::Result<usize> {
    let resolved = match index {
        0 => bail!("index 0 is not valid, OBJ indices start at 1"),
        index if index > 0 => index - 1,
        index => len as i64 + index,
    };

    if resolved < 0 || resolved as usize >= len {
        bail!("index {} is out of range ({} elements defined)", index, len);
    }

    Ok(resolved as usize)
}

struct ObjMesh {
    name: String,
    material_name: Option<String>,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl ObjMesh {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            material_name: None,
            positions: Vec::new(),
            normals: Vec::new(),
        }
    }

    fn into_primitive(self) -> MeshPrimitive {
        let has_normals = self.normals.len() == self.positions.len();
        let mut primitive =
            MeshPrimitive::new(self.name, self.positions).with_color(Color::WHITE);
        if has_normals {
            primitive = primitive.with_normals(self.normals);
        }
        primitive.material_name = self.material_name;
        primitive
    }
}

#[derive(Default)]
struct ObjBuilder {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coord_count: usize,
    meshes: Vec<ObjMesh>,
}

impl ObjBuilder {
    fn current_mesh(&mut self) -> &mut ObjMesh {
        if self.meshes.is_empty() {
            self.meshes.push(ObjMesh::new(""));
        }

        let last = self.meshes.len() - 1;
        &mut self.meshes[last]
    }

    /// `o` and `g` both start a new mesh, unless the current one is still empty.
    fn start_mesh(&mut self, name: &str) {
        match self.meshes.last_mut() {
            Some(mesh) if mesh.positions.is_empty() => mesh.name = name.to_string(),
            _ => self.meshes.push(ObjMesh::new(name)),
        }
    }

    fn set_material(&mut self, material_name: &str) {
        let mesh = self.current_mesh();
        if mesh.material_name.is_none() {
            mesh.material_name = Some(material_name.to_string());
        }
    }

    fn add_face(&mut self, corners: &[Corner]) -> anyhow::Result<()> {
        if corners.len() < 3 {
            log::warn!("Skipping OBJ face with {} corners", corners.len());
            return Ok(());
        }

        let mut resolved = Vec::with_capacity(corners.len());
        for corner in corners {
            let position = self.positions[resolve_index(corner.position, self.positions.len())
                .context("vertex reference")?];
            if let Some(tex_coord) = corner.tex_coord {
                resolve_index(tex_coord, self.tex_coord_count).context("texture reference")?;
            }
            let normal = match corner.normal {
                Some(normal) => Some(
                    self.normals[resolve_index(normal, self.normals.len())
                        .context("normal reference")?],
                ),
                None => None,
            };
            resolved.push((position, normal));
        }

        let mesh = self.current_mesh();
        for i in 1..resolved.len() - 1 {
            for (position, normal) in [resolved[0], resolved[i], resolved[i + 1]] {
                mesh.positions.push(position);
                if let Some(normal) = normal {
                    mesh.normals.push(normal);
                }
            }
        }

        Ok(())
    }

    fn statement(&mut self, keyword: &str, arguments: &str) -> anyhow::Result<()> {
        match keyword {
            "v" => {
                let position = run(position_statement, arguments)?;
                self.positions.push(position);
            }
            "vn" => {
                let normal = run(normal_statement, arguments)?;
                self.normals.push(normal);
            }
            "vt" => self.tex_coord_count += 1,
            "f" => {
                let corners = run(face_statement, arguments)?;
                self.add_face(&corners)?;
            }
            "o" | "g" => self.start_mesh(arguments.trim()),
            "usemtl" => self.set_material(arguments.trim()),
            "mtllib" | "s" | "vp" => {}
            "l" | "p" => log::debug!("Ignoring OBJ {} statement", keyword),
            other => log::warn!("Unexpected OBJ statement: {}", other),
        }

        Ok(())
    }

    fn build(self, name: &str) -> Scene {
        let mut scene = Scene::new(SceneNode::new(name));
        let root_id = scene.root_id();

        for mesh in self.meshes {
            if mesh.positions.is_empty() {
                continue;
            }

            let node_name = mesh.name.clone();
            let mesh_id = scene.add_mesh(mesh.into_primitive());
            scene.add_child(root_id, SceneNode::new(node_name).with_mesh(mesh_id));
        }

        scene
    }
}

/// Yields `(line_number, logical_line)`, joining lines that end in `\`.
fn logical_lines(text: &str) -> impl Iterator<Item = (usize, String)> + '_ {
    let mut lines = text.lines().enumerate();

    std::iter::from_fn(move || {
        let (index, first) = lines.next()?;
        let mut line = first.to_string();

        while line.ends_with('\\') {
            line.pop();
            match lines.next() {
                Some((_, next)) => {
                    line.push(' ');
                    line.push_str(next);
                }
                None => break,
            }
        }

        Some((index + 1, line))
    })
}

/// Parses OBJ text into a root node with one child per object or group.
pub fn parse_obj(name: &str, text: &str) -> anyhow::Result<Scene> {
    let mut builder = ObjBuilder::default();

    for (line_number, line) in logical_lines(text) {
        let line = match line.split_once('#') {
            Some((content, _)) => content,
            None => line.as_str(),
        }
        .trim();

        if line.is_empty() || line == "\0" {
            continue;
        }

        let (keyword, arguments) = line
            .split_once(|c: char| c.is_ascii_whitespace())
            .unwrap_or((line, ""));

        builder
            .statement(keyword, arguments)
            .with_context(|| format!("line {}: invalid `{}` statement", line_number, keyword))?;
    }

    log::debug!(
        "OBJ {}: {} positions, {} meshes",
        name,
        builder.positions.len(),
        builder.meshes.len()
    );

    Ok(builder.build(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meshes(scene: &Scene) -> Vec<&MeshPrimitive> {
        scene.mesh_nodes().map(|mesh_node| mesh_node.mesh).collect()
    }

    #[test]
    fn parses_corner_forms() {
        let corners = run(face_statement, "1 2/3 -1//4 5/6/7").unwrap();
        assert_eq!(
            corners,
            vec![
                Corner { position: 1, tex_coord: None, normal: None },
                Corner { position: 2, tex_coord: Some(3), normal: None },
                Corner { position: -1, tex_coord: None, normal: Some(4) },
                Corner { position: 5, tex_coord: Some(6), normal: Some(7) },
            ]
        );
    }

    #[test]
    fn single_triangle() {
        let scene = parse_obj("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let meshes = meshes(&scene);
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].positions(), &[Vec3::ZERO, Vec3::X, Vec3::Y]);
        assert!(meshes[0].indices.is_none());
        assert!(meshes[0].normals.is_none());
    }

    #[test]
    fn quads_are_fan_triangulated_and_groups_split_meshes() {
        let text = "\
# a quad and a triangle
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vn 0 0 1
o quad
usemtl red
f 1//1 2//1 3//1 4//1
g tri
f -4 -3 -2
";
        let scene = parse_obj("mixed.obj", text).unwrap();
        let meshes = meshes(&scene);

        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name, "quad");
        assert_eq!(meshes[0].material_name.as_deref(), Some("red"));
        assert_eq!(meshes[0].positions().len(), 6);
        assert_eq!(meshes[0].normals.as_ref().map(Vec::len), Some(6));
        assert_eq!(meshes[1].name, "tri");
        assert_eq!(meshes[1].positions(), &[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)]);
    }

    #[test]
    fn continuation_lines_and_vertex_colors() {
        let text = "v 0 0 0 1 0 0\nv 1 0 0\nv 0 1 0\nf 1 \\\n 2 3\n";
        let scene = parse_obj("cont.obj", text).unwrap();
        assert_eq!(meshes(&scene)[0].positions().len(), 3);
    }

    #[test]
    fn obj_meshes_are_white() {
        let scene = parse_obj("tri.obj", "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(meshes(&scene)[0].color, Some(Color::WHITE));
    }

    #[test]
    fn out_of_range_references_fail_with_line_number() {
        let error = parse_obj("bad.obj", "v 0 0 0\nf 1 2 3\n").unwrap_err();
        let message = format!("{:#}", error);
        assert!(message.contains("line 2"), "{message}");
        assert!(message.contains("out of range"), "{message}");
    }

    #[test]
    fn malformed_numbers_fail() {
        assert!(parse_obj("bad.obj", "v 0 zero 0\n").is_err());
    }

    #[test]
    fn files_without_faces_produce_an_empty_root() {
        let scene = parse_obj("points.obj", "v 0 0 0\nv 1 1 1\np 1 2\n").unwrap();
        assert_eq!(scene.mesh_nodes().count(), 0);
        assert_eq!(scene.root().name, "points.obj");
    }
}
