use anyhow::{anyhow, bail, Context};
use glam::Vec3;
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::all_consuming,
    multi::{many0, many1},
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    Finish, IResult,
};

use crate::model::{Color, MeshPrimitive};
use crate::scene_graph::{Scene, SceneNode};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Binary when the declared facet count matches the buffer length exactly,
/// otherwise ASCII when `solid` shows up in the first bytes.
pub fn is_binary_stl(data: &[u8]) -> bool {
    if data.len() >= HEADER_LEN + 4 {
        let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
        if HEADER_LEN + 4 + count * FACET_LEN == data.len() {
            return true;
        }
    }

    !(0..5).any(|offset| data.get(offset..offset + 5) == Some(b"solid".as_slice()))
}

fn read_vec3(chunk: &[u8]) -> Vec3 {
    let component = |i: usize| {
        f32::from_le_bytes([chunk[i * 4], chunk[i * 4 + 1], chunk[i * 4 + 2], chunk[i * 4 + 3]])
    };
    Vec3::new(component(0), component(1), component(2))
}

/// Reads the facets of a binary STL as a flat list of positions.
pub fn parse_binary_stl(data: &[u8]) -> anyhow::Result<Vec<Vec3>> {
    if data.len() < HEADER_LEN + 4 {
        bail!("File too small to be a valid STL ({} bytes)", data.len());
    }

    let count = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let facets = &data[HEADER_LEN + 4..];

    if facets.len() < count * FACET_LEN {
        bail!(
            "Unexpected end of file: header declares {} facets but only {} bytes follow",
            count,
            facets.len()
        );
    }

    let mut positions = Vec::with_capacity(count * 3);
    for facet in facets.chunks_exact(FACET_LEN).take(count) {
        // 12 bytes of facet normal, three vertices, 2 bytes of attributes
        for vertex in facet[12..48].chunks_exact(12) {
            positions.push(read_vec3(vertex));
        }
    }

    Ok(positions)
}

fn vector3(input: &str) -> IResult<&str, Vec3> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace1, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;

    Ok((input, Vec3::new(x, y, z)))
}

fn vertex(input: &str) -> IResult<&str, Vec3> {
    preceded(tuple((multispace0, tag("vertex"))), vector3)(input)
}

fn facet(input: &str) -> IResult<&str, [Vec3; 3]> {
    let (input, _) = tuple((multispace0, tag("facet"), multispace1, tag("normal")))(input)?;
    let (input, _normal) = vector3(input)?;
    let (input, _) = tuple((multispace0, tag("outer"), multispace1, tag("loop")))(input)?;
    let (input, (a, b, c)) = tuple((vertex, vertex, vertex))(input)?;
    let (input, _) = tuple((multispace0, tag("endloop"), multispace0, tag("endfacet")))(input)?;

    Ok((input, [a, b, c]))
}

fn solid(input: &str) -> IResult<&str, Vec<[Vec3; 3]>> {
    let (input, _) = tuple((multispace0, tag("solid"), not_line_ending))(input)?;
    let (input, facets) = many0(facet)(input)?;
    let (input, _) = tuple((multispace0, tag("endsolid"), not_line_ending))(input)?;

    Ok((input, facets))
}

/// Reads one or more `solid ... endsolid` blocks as a flat list of positions.
pub fn parse_ascii_stl(input: &str) -> anyhow::Result<Vec<Vec3>> {
    let (_, solids) = all_consuming(terminated(many1(solid), multispace0))(input)
        .finish()
        .map_err(|error| anyhow!("Failed to parse ASCII STL near {:?}", snippet(error.input)))?;

    Ok(solids.into_iter().flatten().flatten().collect())
}

fn snippet(input: &str) -> &str {
    let end = input
        .char_indices()
        .nth(40)
        .map(|(index, _)| index)
        .unwrap_or(input.len());
    &input[..end]
}

/// Decodes a binary or ASCII STL into a single centered mesh node.
pub fn parse_stl(name: &str, data: &[u8]) -> anyhow::Result<Scene> {
    let positions = if is_binary_stl(data) {
        parse_binary_stl(data).context("Invalid binary STL")?
    } else {
        let text = std::str::from_utf8(data).context("ASCII STL is not valid UTF-8")?;
        parse_ascii_stl(text)?
    };

    log::debug!("STL {}: {} triangles", name, positions.len() / 3);

    let mut mesh = MeshPrimitive::new(name, positions).with_color(Color::default());
    mesh.compute_vertex_normals();
    mesh.center();

    let mut scene = Scene::new(SceneNode::new(name));
    let mesh_id = scene.add_mesh(mesh);
    scene.add_child(scene.root_id(), SceneNode::new(name).with_mesh(mesh_id));

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ASCII_TRIANGLE: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";

    fn binary_stl(triangles: &[[Vec3; 3]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
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
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let positions = parse_binary_stl(&data).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn binary_with_solid_header_is_still_binary() {
        let mut data = binary_stl(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]);
        data[..5].copy_from_slice(b"solid");

        assert!(is_binary_stl(&data));
        assert_eq!(parse_binary_stl(&data).unwrap().len(), 3);
    }

    #[test]
    fn truncated_binary_fails() {
        let mut data = binary_stl(&[[Vec3::ZERO, Vec3::X, Vec3::Y]]);
        data[80..84].copy_from_slice(&2u32.to_le_bytes());

        assert!(parse_stl("short.stl", &data).is_err());
    }

    #[test]
    fn ascii_and_binary_agree() {
        let ascii = parse_ascii_stl(ASCII_TRIANGLE).unwrap();
        let binary = parse_binary_stl(&binary_stl(&[[Vec3::ZERO, Vec3::X, Vec3::Y]])).unwrap();
        assert_eq!(ascii, binary);
    }

    #[test]
    fn ascii_accepts_several_solids() {
        let text = format!("{ASCII_TRIANGLE}{ASCII_TRIANGLE}");
        assert_eq!(parse_ascii_stl(&text).unwrap().len(), 6);
    }

    #[test]
    fn ascii_trailing_garbage_fails() {
        let text = format!("{ASCII_TRIANGLE}facet");
        assert!(parse_ascii_stl(&text).is_err());
    }

    #[test]
    fn stl_mesh_is_centered_with_normals_and_default_color() {
        let data = binary_stl(&[[
            Vec3::new(10.0, 10.0, 10.0),
            Vec3::new(12.0, 10.0, 10.0),
            Vec3::new(10.0, 14.0, 10.0),
        ]]);
        let scene = parse_stl("part.stl", &data).unwrap();

        let mesh_node = scene.mesh_nodes().next().unwrap();
        let mesh = mesh_node.mesh;
        assert_eq!(mesh.bounding_box().center(), Vec3::ZERO);
        assert_eq!(mesh.normals.as_deref(), Some(&[Vec3::Z; 3][..]));
        assert_eq!(mesh.color, Some(Color::default()));
        assert!(mesh.indices.is_none());
        assert_eq!(scene.mesh_nodes().count(), 1);
    }
}
