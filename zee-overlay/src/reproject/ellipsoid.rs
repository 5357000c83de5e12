//! Définitions des ellipsoïdes

/// Ellipsoïde GRS80 (SIRGAS 2000)
/// Note: Quasi identique à WGS84, différence < 0.1mm
pub struct GRS80;

impl GRS80 {
    /// Demi-grand axe (rayon équatorial) en mètres
    pub const A: f64 = 6378137.0;

    /// Aplatissement
    pub const F: f64 = 1.0 / 298.257222101;

    /// Première excentricité au carré
    pub const E2: f64 = 2.0 * Self::F - Self::F * Self::F;

    /// Deuxième excentricité au carré
    pub const EP2: f64 = Self::E2 / (1.0 - Self::E2);

    /// Longueur de l'arc de méridien de l'équateur à `lat` (radians), en mètres
    pub fn meridian_arc(lat: f64) -> f64 {
        let e2 = Self::E2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        Self::A
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }

    /// Rayon de courbure dans le premier vertical
    pub fn prime_vertical_radius(lat: f64) -> f64 {
        Self::A / (1.0 - Self::E2 * lat.sin().powi(2)).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meridian_arc() {
        assert_eq!(GRS80::meridian_arc(0.0), 0.0);
        // Quart de méridien ≈ 10 001 965.7 m
        let quarter = GRS80::meridian_arc(std::f64::consts::FRAC_PI_2);
        assert!((quarter - 10_001_965.7).abs() < 1.0, "quarter={}", quarter);
        // Antisymétrique
        assert_eq!(GRS80::meridian_arc(-0.3), -GRS80::meridian_arc(0.3));
    }
}
