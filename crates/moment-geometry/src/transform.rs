//! Placement of a target mesh in the simulation frame.
//!
//! Mesh files are authored in their own units and origin. Before excitation
//! assembly the target is scaled about the origin and lifted along z, the two
//! placement parameters of a simulation.

use nalgebra::{Matrix3, Vector3};

use crate::mesh::RwgMesh;

/// An affine map: linear part followed by translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub matrix: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }
}

impl Transform {
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            matrix: Matrix3::identity(),
            translation: Vector3::new(dx, dy, dz),
        }
    }

    pub fn uniform_scale(factor: f64) -> Self {
        Self {
            matrix: Matrix3::identity() * factor,
            translation: Vector3::zeros(),
        }
    }

    /// Scale by `scale` about the origin, then shift by `z_offset` along z.
    pub fn placement(scale: f64, z_offset: f64) -> Self {
        Self::uniform_scale(scale).then(&Self::translation(0.0, 0.0, z_offset))
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let v = Vector3::new(point[0], point[1], point[2]);
        let result = self.matrix * v + self.translation;
        [result.x, result.y, result.z]
    }

    /// Compose: `self` followed by `other`.
    pub fn then(&self, other: &Transform) -> Transform {
        Transform {
            matrix: other.matrix * self.matrix,
            translation: other.matrix * self.translation + other.translation,
        }
    }

    /// Move every vertex of `mesh`. Edge topology is untouched.
    pub fn apply_to_mesh(&self, mesh: &mut RwgMesh) {
        if !self.is_identity() {
            mesh.map_vertices(|p| self.apply(p));
        }
    }
}
