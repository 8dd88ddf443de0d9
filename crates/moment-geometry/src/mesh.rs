//! RWG edge-element mesh.
//!
//! An RWG basis function lives on an edge shared by two triangles $T^+$ and
//! $T^-$. For every such edge the mesh stores the two vertices of the edge,
//! the vertex of each adjoining triangle that lies opposite the edge, the
//! signed pair of triangle indices and whether the edge takes part in
//! combined-field (CFIE) testing.
//!
//! The edge vertices are ordered the way $T^+$ traverses them, so $T^-$
//! traverses them in reverse. Kernels rely on this to orient triangle
//! normals consistently across the surface.

use std::collections::BTreeMap;

use ndarray::Array2;
use thiserror::Error;

/// Triangle index used in the minus slot of a boundary edge.
pub const NO_TRIANGLE: i32 = -1;

/// Errors raised while building or querying an RWG mesh.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Edge {edge} references vertex {vertex} but only {count} vertices exist")]
    VertexOutOfRange {
        edge: usize,
        vertex: usize,
        count: usize,
    },

    #[error("Edge index {edge} is out of range for a mesh with {count} edges")]
    EdgeOutOfRange { edge: usize, count: usize },

    #[error("Edge ({a}, {b}) is shared by {triangles} triangles; RWG edges need exactly two")]
    NonManifoldEdge { a: usize, b: usize, triangles: usize },

    #[error("Triangle {triangle} references vertex {vertex} but only {count} vertices exist")]
    TriangleOutOfRange {
        triangle: usize,
        vertex: usize,
        count: usize,
    },

    #[error("Mesh has no RWG edges")]
    NoEdges,
}

/// One RWG edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RwgEdge {
    /// The two vertices defining the shared edge, in $T^+$ traversal order.
    pub vertices: [usize; 2],
    /// Opposite vertex in $T^+$ and in $T^-$.
    pub opposite: [usize; 2],
    /// Indices of $T^+$ and $T^-$. The minus slot holds [`NO_TRIANGLE`] on a
    /// boundary edge.
    pub triangles: [i32; 2],
    /// Whether the edge participates in CFIE testing.
    pub cfie_ok: bool,
}

impl RwgEdge {
    /// True if only $T^+$ adjoins the edge.
    pub fn is_boundary(&self) -> bool {
        self.triangles[1] < 0
    }
}

/// Immutable RWG mesh: vertex table plus edge records.
#[derive(Debug, Clone)]
pub struct RwgMesh {
    vertices: Vec<[f64; 3]>,
    edges: Vec<RwgEdge>,
    boundary_edges: usize,
}

impl RwgMesh {
    /// Build a mesh from explicit edge records, checking every vertex index.
    pub fn new(vertices: Vec<[f64; 3]>, edges: Vec<RwgEdge>) -> Result<Self, MeshError> {
        let count = vertices.len();
        for (e, edge) in edges.iter().enumerate() {
            for &vertex in edge.vertices.iter().chain(edge.opposite.iter()) {
                if vertex >= count {
                    return Err(MeshError::VertexOutOfRange {
                        edge: e,
                        vertex,
                        count,
                    });
                }
            }
        }
        let boundary_edges = edges.iter().filter(|e| e.is_boundary()).count();
        Ok(Self {
            vertices,
            edges,
            boundary_edges,
        })
    }

    /// Derive RWG edges from a triangle list.
    ///
    /// Every edge shared by exactly two triangles becomes one RWG edge, with
    /// the lower-numbered triangle as $T^+$. Edges owned by a single triangle
    /// lie on the rim of an open surface and carry no basis function; they
    /// are only counted. CFIE testing needs a closed surface, so the CFIE flag
    /// is set on every edge if and only if no rim edge was found.
    ///
    /// Edges are numbered in ascending order of their sorted vertex pair.
    pub fn from_triangles(
        vertices: Vec<[f64; 3]>,
        triangles: &[[usize; 3]],
    ) -> Result<Self, MeshError> {
        let count = vertices.len();
        // sorted vertex pair -> (triangle, first vertex in traversal, opposite vertex)
        let mut adjacency: BTreeMap<(usize, usize), Vec<(usize, usize, usize)>> = BTreeMap::new();

        for (t, tri) in triangles.iter().enumerate() {
            for &vertex in tri {
                if vertex >= count {
                    return Err(MeshError::TriangleOutOfRange {
                        triangle: t,
                        vertex,
                        count,
                    });
                }
            }
            for i in 0..3 {
                let a = tri[i];
                let b = tri[(i + 1) % 3];
                let opp = tri[(i + 2) % 3];
                adjacency
                    .entry((a.min(b), a.max(b)))
                    .or_default()
                    .push((t, a, opp));
            }
        }

        let mut edges = Vec::new();
        let mut boundary_edges = 0;
        for ((a, b), owners) in &adjacency {
            match owners.as_slice() {
                [_] => boundary_edges += 1,
                [plus, minus] => {
                    let (t_plus, first, opp_plus) = *plus;
                    let (t_minus, _, opp_minus) = *minus;
                    let second = if first == *a { *b } else { *a };
                    edges.push(RwgEdge {
                        vertices: [first, second],
                        opposite: [opp_plus, opp_minus],
                        triangles: [t_plus as i32, t_minus as i32],
                        cfie_ok: false,
                    });
                }
                _ => {
                    return Err(MeshError::NonManifoldEdge {
                        a: *a,
                        b: *b,
                        triangles: owners.len(),
                    })
                }
            }
        }

        if edges.is_empty() {
            return Err(MeshError::NoEdges);
        }
        if boundary_edges == 0 {
            for edge in &mut edges {
                edge.cfie_ok = true;
            }
        }

        Ok(Self {
            vertices,
            edges,
            boundary_edges,
        })
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn edges(&self) -> &[RwgEdge] {
        &self.edges
    }

    /// Number of RWG edges (unknowns).
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of rim edges: those found by [`RwgMesh::from_triangles`], or the
    /// edges flagged as boundary for a mesh built with [`RwgMesh::new`].
    pub fn num_boundary_edges(&self) -> usize {
        self.boundary_edges
    }

    /// True if the surface has no rim edges.
    pub fn is_closed(&self) -> bool {
        self.boundary_edges == 0
    }

    /// All edge indices in order, the usual subset for a full solve.
    pub fn all_edges(&self) -> Vec<usize> {
        (0..self.edges.len()).collect()
    }

    /// Apply a point map to every vertex, keeping the topology.
    pub fn map_vertices(&mut self, f: impl Fn(&[f64; 3]) -> [f64; 3]) {
        for v in &mut self.vertices {
            *v = f(v);
        }
    }

    /// Gather the fixed-width geometry records of `edge_subset`, in the order
    /// given.
    pub fn edge_geometry(&self, edge_subset: &[usize]) -> Result<EdgeGeometry, MeshError> {
        let n = edge_subset.len();
        let mut vertex_coords = Array2::<f64>::zeros((n, 6));
        let mut opposite_coords = Array2::<f64>::zeros((n, 6));
        let mut triangle_signs = Array2::<i32>::zeros((n, 2));
        let mut cfie_ok = Vec::with_capacity(n);

        for (row, &e) in edge_subset.iter().enumerate() {
            let edge = self.edges.get(e).ok_or(MeshError::EdgeOutOfRange {
                edge: e,
                count: self.edges.len(),
            })?;
            for slot in 0..2 {
                let v = self.vertices[edge.vertices[slot]];
                let o = self.vertices[edge.opposite[slot]];
                for c in 0..3 {
                    vertex_coords[[row, 3 * slot + c]] = v[c];
                    opposite_coords[[row, 3 * slot + c]] = o[c];
                }
                triangle_signs[[row, slot]] = edge.triangles[slot];
            }
            cfie_ok.push(edge.cfie_ok);
        }

        Ok(EdgeGeometry {
            vertex_coords,
            opposite_coords,
            cfie_ok,
            triangle_signs,
        })
    }
}

/// Flat per-edge buffers handed to an excitation kernel.
///
/// Row `i` describes the `i`-th edge of the requested subset:
/// `vertex_coords[i] = [r0 | r1]`, `opposite_coords[i] = [r+ | r-]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeGeometry {
    /// Shape (E, 6): edge vertex coordinates.
    pub vertex_coords: Array2<f64>,
    /// Shape (E, 6): opposite vertex coordinates in $T^+$ then $T^-$.
    pub opposite_coords: Array2<f64>,
    /// CFIE flag per edge.
    pub cfie_ok: Vec<bool>,
    /// Shape (E, 2): signed triangle pair per edge.
    pub triangle_signs: Array2<i32>,
}

impl EdgeGeometry {
    pub fn len(&self) -> usize {
        self.cfie_ok.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cfie_ok.is_empty()
    }

    /// Edge vertex `slot` (0 or 1) of row `i`.
    pub fn vertex(&self, i: usize, slot: usize) -> [f64; 3] {
        let base = 3 * slot;
        [
            self.vertex_coords[[i, base]],
            self.vertex_coords[[i, base + 1]],
            self.vertex_coords[[i, base + 2]],
        ]
    }

    /// Opposite vertex of $T^+$ (`slot = 0`) or $T^-$ (`slot = 1`) for row `i`.
    pub fn opposite(&self, i: usize, slot: usize) -> [f64; 3] {
        let base = 3 * slot;
        [
            self.opposite_coords[[i, base]],
            self.opposite_coords[[i, base + 1]],
            self.opposite_coords[[i, base + 2]],
        ]
    }

    /// True if row `i` has no $T^-$.
    pub fn is_boundary(&self, i: usize) -> bool {
        self.triangle_signs[[i, 1]] < 0
    }
}

/// Corner tetrahedron with unit legs, a small closed surface for tests.
#[cfg(test)]
pub(crate) fn tetrahedron() -> (Vec<[f64; 3]>, Vec<[usize; 3]>) {
    let vertices = vec![
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 1.0],
    ];
    // outward-facing, consistently oriented
    let triangles = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
    (vertices, triangles)
}
