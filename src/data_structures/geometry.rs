//! Procedural geometry for the primitive shapes a [`Mesh`](super::mesh::Mesh) can take.
//!
//! Shapes are stored on meshes as small descriptors and only expanded into
//! vertex/index data when the engine uploads them. Every generated triangle is
//! wound counter-clockwise when looked at from outside the shape.

use std::f32::consts::PI;

/// Vertex layout shared by every pipeline: position, normal and texture coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// CPU side vertex and index data of a shape.
#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over the triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize].position,
                self.vertices[tri[1] as usize].position,
                self.vertices[tri[2] as usize].position,
            ]
        })
    }
}

/// The primitive a mesh is built from.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// An axis aligned cube with edge length `size`, centred on the origin.
    Box { size: f32 },
    /// A UV sphere. `segments` controls the tessellation, not the exact ring count.
    Sphere { segments: u32, diameter: f32 },
    /// A flat plane in XZ facing +Y, split into `subdivisions` squares per side.
    Ground {
        width: f32,
        depth: f32,
        subdivisions: u32,
    },
}

impl Shape {
    pub fn build(&self) -> Geometry {
        match *self {
            Shape::Box { size } => build_box(size),
            Shape::Sphere { segments, diameter } => build_sphere(segments, diameter),
            Shape::Ground {
                width,
                depth,
                subdivisions,
            } => build_ground(width, depth, subdivisions),
        }
    }
}

fn build_box(size: f32) -> Geometry {
    let half = size / 2.0;
    // (normal, u, v) with u x v == normal so that the quads below come out counter-clockwise
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];
    let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

    let mut geometry = Geometry::default();
    for (normal, u, v) in faces {
        let base = geometry.vertices.len() as u32;
        for (su, sv) in corners {
            let position = [
                (normal[0] + su * u[0] + sv * v[0]) * half,
                (normal[1] + su * u[1] + sv * v[1]) * half,
                (normal[2] + su * u[2] + sv * v[2]) * half,
            ];
            geometry.vertices.push(Vertex {
                position,
                normal,
                uv: [(su + 1.0) / 2.0, (1.0 - sv) / 2.0],
            });
        }
        geometry
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    geometry
}

fn build_sphere(segments: u32, diameter: f32) -> Geometry {
    let radius = diameter / 2.0;
    let rings = 2 + segments;
    let slices = 2 * rings;

    let mut geometry = Geometry::default();
    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        // theta runs from the +Y pole (0) to the -Y pole (PI)
        let theta = v * PI;
        for slice in 0..=slices {
            let u = slice as f32 / slices as f32;
            let phi = u * 2.0 * PI;
            let normal = [theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin()];
            geometry.vertices.push(Vertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
                uv: [u, v],
            });
        }
    }

    let row = slices + 1;
    for ring in 0..rings {
        for slice in 0..slices {
            let a = ring * row + slice;
            let b = (ring + 1) * row + slice;
            let c = (ring + 1) * row + slice + 1;
            let d = ring * row + slice + 1;
            // the first triangle collapses at the top pole, the second at the bottom one
            if ring != 0 {
                geometry.indices.extend_from_slice(&[a, d, b]);
            }
            if ring != rings - 1 {
                geometry.indices.extend_from_slice(&[d, c, b]);
            }
        }
    }
    geometry
}

fn build_ground(width: f32, depth: f32, subdivisions: u32) -> Geometry {
    let subdivisions = subdivisions.max(1);
    let mut geometry = Geometry::default();
    for row in 0..=subdivisions {
        let v = row as f32 / subdivisions as f32;
        for col in 0..=subdivisions {
            let u = col as f32 / subdivisions as f32;
            geometry.vertices.push(Vertex {
                position: [-width / 2.0 + u * width, 0.0, -depth / 2.0 + v * depth],
                normal: [0.0, 1.0, 0.0],
                uv: [u, v],
            });
        }
    }

    let row_len = subdivisions + 1;
    for row in 0..subdivisions {
        for col in 0..subdivisions {
            let a = row * row_len + col;
            let b = row * row_len + col + 1;
            let c = (row + 1) * row_len + col + 1;
            let d = (row + 1) * row_len + col;
            geometry.indices.extend_from_slice(&[a, d, b, b, d, c]);
        }
    }
    geometry
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn face_normal(tri: [[f32; 3]; 3]) -> Vector3<f32> {
        let p0: Vector3<f32> = tri[0].into();
        let p1: Vector3<f32> = tri[1].into();
        let p2: Vector3<f32> = tri[2].into();
        (p1 - p0).cross(p2 - p0)
    }

    fn centroid(tri: [[f32; 3]; 3]) -> Vector3<f32> {
        let p0: Vector3<f32> = tri[0].into();
        let p1: Vector3<f32> = tri[1].into();
        let p2: Vector3<f32> = tri[2].into();
        (p0 + p1 + p2) / 3.0
    }

    #[test]
    fn box_has_four_vertices_per_face() {
        let geometry = Shape::Box { size: 100.0 }.build();
        assert_eq!(geometry.vertices.len(), 24);
        assert_eq!(geometry.indices.len(), 36);
        for vertex in &geometry.vertices {
            assert!(vertex.position.iter().all(|c| c.abs() <= 50.0 + f32::EPSILON));
        }
    }

    #[test]
    fn box_faces_point_outwards() {
        let geometry = Shape::Box { size: 2.0 }.build();
        for tri in geometry.triangles() {
            assert!(face_normal(tri).dot(centroid(tri)) > 0.0);
        }
    }

    #[test]
    fn sphere_tessellation_matches_segments() {
        let geometry = Shape::Sphere {
            segments: 16,
            diameter: 2.0,
        }
        .build();
        // 18 rings and 36 slices, both inclusive of the seam
        assert_eq!(geometry.vertices.len(), 19 * 37);
        assert_eq!(geometry.indices.len(), 6 * 36 * 17);
        for vertex in &geometry.vertices {
            let length = Vector3::from(vertex.position).magnitude();
            assert!((length - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn sphere_faces_point_outwards() {
        let geometry = Shape::Sphere {
            segments: 4,
            diameter: 2.0,
        }
        .build();
        for tri in geometry.triangles() {
            assert!(face_normal(tri).dot(centroid(tri)) > 0.0);
        }
    }

    #[test]
    fn ground_is_flat_and_faces_up() {
        let geometry = Shape::Ground {
            width: 6.0,
            depth: 6.0,
            subdivisions: 2,
        }
        .build();
        assert_eq!(geometry.vertices.len(), 9);
        assert_eq!(geometry.triangle_count(), 8);
        assert!(geometry.vertices.iter().all(|v| v.position[1] == 0.0));
        for tri in geometry.triangles() {
            assert!(face_normal(tri).y > 0.0);
        }
    }

    #[test]
    fn zero_subdivisions_still_yield_a_quad() {
        let geometry = Shape::Ground {
            width: 1.0,
            depth: 1.0,
            subdivisions: 0,
        }
        .build();
        assert_eq!(geometry.triangle_count(), 2);
    }
}
