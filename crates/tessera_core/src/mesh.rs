use glam::{Vec2, Vec3};

use crate::error::GenerationError;

/// Named index subset rendered with one material.
#[derive(Debug, Clone, PartialEq)]
pub struct Submesh {
    pub name: String,
    pub indices: Vec<u32>,
}

/// Renderer-agnostic triangle mesh.
///
/// Front faces wind counter-clockwise (right-handed, +Y up).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub submeshes: Vec<Submesh>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len() / 3).sum()
    }

    pub fn submesh(&self, name: &str) -> Option<&Submesh> {
        self.submeshes.iter().find(|s| s.name == name)
    }

    /// All indices, submeshes concatenated in order.
    pub fn all_indices(&self) -> Vec<u32> {
        self.submeshes
            .iter()
            .flat_map(|s| s.indices.iter().copied())
            .collect()
    }

    /// Collapse every submesh into a single group.
    pub fn merged(mut self, name: impl Into<String>) -> Self {
        let indices = self.all_indices();
        self.submeshes = vec![Submesh {
            name: name.into(),
            indices,
        }];
        self
    }

    /// Check every index points at a vertex and UVs run parallel to vertices.
    pub fn validate(&self) -> Result<(), GenerationError> {
        let vertex_count = self.vertices.len();
        debug_assert_eq!(self.uvs.len(), vertex_count);

        for submesh in &self.submeshes {
            if let Some(&index) = submesh
                .indices
                .iter()
                .find(|&&i| i as usize >= vertex_count)
            {
                return Err(GenerationError::InvalidMeshIndex {
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Face normal of every triangle, unnormalized.
    pub fn face_normals(&self) -> Vec<Vec3> {
        self.all_indices()
            .chunks_exact(3)
            .map(|tri| {
                let p0 = Vec3::from_array(self.vertices[tri[0] as usize]);
                let p1 = Vec3::from_array(self.vertices[tri[1] as usize]);
                let p2 = Vec3::from_array(self.vertices[tri[2] as usize]);
                (p1 - p0).cross(p2 - p0)
            })
            .collect()
    }

    /// Smooth vertex normals by averaging the face normals around each vertex.
    pub fn smooth_normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        let indices = self.all_indices();
        for (tri, face_normal) in indices.chunks_exact(3).zip(self.face_normals()) {
            for &i in tri {
                normals[i as usize] += face_normal;
            }
        }

        normals
            .into_iter()
            .map(|n| n.normalize_or_zero().to_array())
            .collect()
    }

    /// Raw vertex positions for GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }
}

/// Incremental mesh assembly with per-material index groups.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    submeshes: Vec<Submesh>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new index group and return its handle.
    pub fn add_submesh(&mut self, name: impl Into<String>) -> usize {
        self.submeshes.push(Submesh {
            name: name.into(),
            indices: Vec::new(),
        });
        self.submeshes.len() - 1
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn add_vertex(&mut self, position: Vec3, uv: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position.to_array());
        self.uvs.push(uv.to_array());
        index
    }

    pub fn add_triangle(&mut self, submesh: usize, a: u32, b: u32, c: u32) {
        self.submeshes[submesh].indices.extend_from_slice(&[a, b, c]);
    }

    /// Quad with corners given counter-clockwise as seen from its front.
    pub fn add_quad(&mut self, submesh: usize, corners: [Vec3; 4], uvs: [Vec2; 4]) {
        let base = self.vertex_count();
        for (p, uv) in corners.into_iter().zip(uvs) {
            self.add_vertex(p, uv);
        }
        self.submeshes[submesh]
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Quad visible from both sides: the front face plus a reversed copy on
    /// its own vertices.
    pub fn add_double_sided_quad(&mut self, submesh: usize, corners: [Vec3; 4], uvs: [Vec2; 4]) {
        self.add_quad(submesh, corners, uvs);

        let base = self.vertex_count();
        for (p, uv) in corners.into_iter().zip(uvs) {
            self.add_vertex(p, uv);
        }
        self.submeshes[submesh]
            .indices
            .extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
    }

    pub fn build(self) -> MeshGeometry {
        MeshGeometry {
            vertices: self.vertices,
            uvs: self.uvs,
            submeshes: self.submeshes,
        }
    }
}
