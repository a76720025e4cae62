use masgent_core::{MasgentError, MasgentResult};
use serde::{Deserialize, Serialize};

/// A 3-vector.
pub type Vec3 = [f64; 3];

/// A periodic cell whose rows are the lattice vectors, in Ångström.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lattice {
    matrix: [Vec3; 3],
}

impl Lattice {
    /// Builds a lattice from row vectors; rejects degenerate (zero-volume) cells.
    pub fn new(matrix: [Vec3; 3]) -> MasgentResult<Self> {
        let lattice = Self { matrix };
        if lattice.volume().abs() < 1e-8 || !matrix.iter().flatten().all(|x| x.is_finite()) {
            return Err(MasgentError::Structure(
                "lattice vectors are degenerate".to_string(),
            ));
        }
        Ok(lattice)
    }

    /// Builds a lattice from lengths (Å) and angles (degrees), with `a` along x and
    /// `b` in the xy-plane.
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> MasgentResult<Self> {
        let (alpha, beta, gamma) = (alpha.to_radians(), beta.to_radians(), gamma.to_radians());
        let cx = c * beta.cos();
        let cy = c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
        let cz_sq = c * c - cx * cx - cy * cy;
        if cz_sq <= 0.0 {
            return Err(MasgentError::Structure(
                "cell angles do not describe a valid lattice".to_string(),
            ));
        }
        Self::new([
            [a, 0.0, 0.0],
            [b * gamma.cos(), b * gamma.sin(), 0.0],
            [cx, cy, cz_sq.sqrt()],
        ])
    }

    /// Row-vector matrix.
    pub fn matrix(&self) -> &[Vec3; 3] {
        &self.matrix
    }

    /// Lengths `(a, b, c)`.
    pub fn lengths(&self) -> Vec3 {
        [norm(self.matrix[0]), norm(self.matrix[1]), norm(self.matrix[2])]
    }

    /// Angles `(alpha, beta, gamma)` in degrees.
    pub fn angles(&self) -> Vec3 {
        let [a, b, c] = self.matrix;
        [angle(b, c), angle(a, c), angle(a, b)]
    }

    /// Signed cell volume.
    pub fn volume(&self) -> f64 {
        let [a, b, c] = self.matrix;
        dot(a, cross(b, c))
    }

    /// Fractional → Cartesian.
    pub fn to_cartesian(&self, frac: Vec3) -> Vec3 {
        let m = &self.matrix;
        [0, 1, 2].map(|j| frac[0] * m[0][j] + frac[1] * m[1][j] + frac[2] * m[2][j])
    }

    /// Cartesian → fractional.
    pub fn to_fractional(&self, cart: Vec3) -> Vec3 {
        let inv = self.inverse();
        [0, 1, 2].map(|j| cart[0] * inv[0][j] + cart[1] * inv[1][j] + cart[2] * inv[2][j])
    }

    fn inverse(&self) -> [Vec3; 3] {
        let [a, b, c] = self.matrix;
        let det = self.volume();
        let (bc, ca, ab) = (cross(b, c), cross(c, a), cross(a, b));
        // Inverse of a row matrix: columns are the scaled cross products.
        [
            [bc[0] / det, ca[0] / det, ab[0] / det],
            [bc[1] / det, ca[1] / det, ab[1] / det],
            [bc[2] / det, ca[2] / det, ab[2] / det],
        ]
    }

    /// Reciprocal lattice lengths including the 2π factor.
    pub fn reciprocal_lengths(&self) -> Vec3 {
        let [a, b, c] = self.matrix;
        let scale = 2.0 * std::f64::consts::PI / self.volume();
        [
            norm(cross(b, c)) * scale.abs(),
            norm(cross(c, a)) * scale.abs(),
            norm(cross(a, b)) * scale.abs(),
        ]
    }

    /// Returns `true` for a hexagonal metric (a = b, gamma = 120°, alpha = beta = 90°).
    pub fn is_hexagonal(&self) -> bool {
        let [a, b, _] = self.lengths();
        let [alpha, beta, gamma] = self.angles();
        (a - b).abs() < 1e-4
            && (alpha - 90.0).abs() < 1e-3
            && (beta - 90.0).abs() < 1e-3
            && ((gamma - 120.0).abs() < 1e-3 || (gamma - 60.0).abs() < 1e-3)
    }

    /// Scales every lattice vector by `factor`.
    pub fn scaled(&self, factor: f64) -> MasgentResult<Self> {
        Self::new(self.matrix.map(|row| row.map(|x| x * factor)))
    }
}

pub(crate) fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub(crate) fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub(crate) fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn angle(a: Vec3, b: Vec3) -> f64 {
    (dot(a, b) / (norm(a) * norm(b))).clamp(-1.0, 1.0).acos().to_degrees()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cubic_parameters() {
        let lattice = Lattice::from_parameters(4.0, 4.0, 4.0, 90.0, 90.0, 90.0).unwrap();
        assert!((lattice.volume() - 64.0).abs() < 1e-9);
        let [alpha, beta, gamma] = lattice.angles();
        assert!((alpha - 90.0).abs() < 1e-9 && (beta - 90.0).abs() < 1e-9 && (gamma - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_fractional_cartesian_roundtrip() {
        let lattice = Lattice::from_parameters(3.2, 3.2, 5.1, 90.0, 90.0, 120.0).unwrap();
        let frac = [0.3333, 0.6667, 0.25];
        let back = lattice.to_fractional(lattice.to_cartesian(frac));
        for i in 0..3 {
            assert!((back[i] - frac[i]).abs() < 1e-12);
        }
        assert!(lattice.is_hexagonal());
    }

    #[test]
    fn test_degenerate_lattice_rejected() {
        assert!(Lattice::new([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]).is_err());
    }
}
