//! Symmetric quadrature on triangles.

/// A barycentric point $(\lambda_1, \lambda_2, \lambda_3)$ and its weight.
/// Weights sum to one, so the integral over a triangle of area $A$ is
/// $A \sum_q w_q f(\mathbf{r}_q)$.
#[derive(Debug, Clone, Copy)]
pub struct TrianglePoint {
    pub barycentric: [f64; 3],
    pub weight: f64,
}

const A1: f64 = 0.445_948_490_915_965;
const B1: f64 = 0.108_103_018_168_070;
const W1: f64 = 0.223_381_589_678_011;
const A2: f64 = 0.091_576_213_509_771;
const B2: f64 = 0.816_847_572_980_459;
const W2: f64 = 0.109_951_743_655_322;

/// Six-point rule, exact for polynomials of degree 4 (Dunavant, 1985).
pub const DUNAVANT_6: [TrianglePoint; 6] = [
    TrianglePoint { barycentric: [B1, A1, A1], weight: W1 },
    TrianglePoint { barycentric: [A1, B1, A1], weight: W1 },
    TrianglePoint { barycentric: [A1, A1, B1], weight: W1 },
    TrianglePoint { barycentric: [B2, A2, A2], weight: W2 },
    TrianglePoint { barycentric: [A2, B2, A2], weight: W2 },
    TrianglePoint { barycentric: [A2, A2, B2], weight: W2 },
];

impl TrianglePoint {
    /// Cartesian position inside the triangle `(p0, p1, p2)`.
    pub fn position(&self, p0: &[f64; 3], p1: &[f64; 3], p2: &[f64; 3]) -> [f64; 3] {
        let [l0, l1, l2] = self.barycentric;
        [
            l0 * p0[0] + l1 * p1[0] + l2 * p2[0],
            l0 * p0[1] + l1 * p1[1] + l2 * p2[1],
            l0 * p0[2] + l1 * p1[2] + l2 * p2[2],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = DUNAVANT_6.iter().map(|p| p.weight).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-12);
        for p in &DUNAVANT_6 {
            assert_abs_diff_eq!(p.barycentric.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_exact_for_quadratic() {
        // mean of x^2 over the unit right triangle is 1/6
        let p0 = [0.0, 0.0, 0.0];
        let p1 = [1.0, 0.0, 0.0];
        let p2 = [0.0, 1.0, 0.0];
        let mean: f64 = DUNAVANT_6
            .iter()
            .map(|q| {
                let r = q.position(&p0, &p1, &p2);
                q.weight * r[0] * r[0]
            })
            .sum();
        assert_abs_diff_eq!(mean, 1.0 / 6.0, epsilon = 1e-12);
    }
}
