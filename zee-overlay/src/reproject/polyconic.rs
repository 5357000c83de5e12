//! Projection Polyconique Brésil (SIRGAS 2000 / Brazil Polyconic, EPSG:5880)
//!
//! Polyconique américaine sur GRS80 : latitude origine 0°, méridien central
//! 54°W, false easting 5 000 000 m, false northing 10 000 000 m.

use super::ellipsoid::GRS80;
use super::{Geographic, ReprojectError, Result};

/// Méridien central (radians)
const LON0: f64 = -54.0 * std::f64::consts::PI / 180.0;
/// False easting
const X0: f64 = 5000000.0;
/// False northing
const Y0: f64 = 10000000.0;

const TOL: f64 = 1e-10;
const MAX_ITER: usize = 20;

/// Convertit des coordonnées géographiques vers la Polyconique Brésil
pub fn geographic_to_polyconic(geo: Geographic) -> Result<(f64, f64)> {
    let lam = geo.lon - LON0;
    let phi = geo.lat;

    if phi.abs() <= TOL {
        return Ok((X0 + GRS80::A * lam, Y0));
    }

    let cot_n = GRS80::prime_vertical_radius(phi) / phi.tan();
    let e = lam * phi.sin();

    let x = cot_n * e.sin();
    let y = GRS80::meridian_arc(phi) + cot_n * (1.0 - e.cos());

    Ok((X0 + x, Y0 + y))
}

/// Convertit la Polyconique Brésil vers coordonnées géographiques (Newton)
pub fn polyconic_to_geographic(x: f64, y: f64) -> Result<Geographic> {
    let a = GRS80::A;
    let es = GRS80::E2;

    // Coordonnées réduites, en rayons équatoriaux
    let x = (x - X0) / a;
    let y = (y - Y0) / a;

    if y.abs() <= TOL {
        return Ok(Geographic::new(x + LON0, 0.0));
    }

    let r = x * x + y * y;
    let mut phi = y;
    let mut converged = false;

    for _ in 0..MAX_ITER {
        let (sp, cp) = phi.sin_cos();
        if cp.abs() < TOL {
            return Err(ReprojectError::new("polyconic inverse reached a pole"));
        }
        let s2ph = sp * cp;
        let root = (1.0 - es * sp * sp).sqrt();
        let c = sp * root / cp;
        let ml = GRS80::meridian_arc(phi) / a;
        let mlb = ml * ml + r;
        let mlp = (1.0 - es) / (root * root * root);

        let d_phi = (ml + ml + c * mlb - 2.0 * y * (c * ml + 1.0))
            / (es * s2ph * (mlb - 2.0 * y * ml) / c + 2.0 * (y - ml) * (c * mlp - 1.0 / s2ph)
                - mlp
                - mlp);
        phi += d_phi;

        if d_phi.abs() <= TOL {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(ReprojectError::new("polyconic inverse did not converge"));
    }

    let sp = phi.sin();
    let lam = (x * phi.tan() * (1.0 - es * sp * sp).sqrt()).asin() / sp;

    Ok(Geographic::new(lam + LON0, phi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin() {
        let (x, y) = geographic_to_polyconic(Geographic::from_degrees(-54.0, 0.0)).unwrap();
        assert!((x - X0).abs() < 1e-6);
        assert!((y - Y0).abs() < 1e-6);
    }

    #[test]
    fn test_central_meridian_is_meridian_arc() {
        // Sur le méridien central, y = arc de méridien
        let (x, y) = geographic_to_polyconic(Geographic::from_degrees(-54.0, -10.0)).unwrap();
        assert!((x - X0).abs() < 1e-6, "x={}", x);
        let expected = Y0 + GRS80::meridian_arc((-10.0_f64).to_radians());
        assert!((y - expected).abs() < 1e-6, "y={}", y);
        // ≈ 1 105 855 m au sud de l'équateur
        assert!((Y0 - y - 1_105_855.0).abs() < 50.0, "y={}", y);
    }

    #[test]
    fn test_palmas_east_of_central_meridian() {
        // Palmas (TO) est à ~5.7° à l'est du méridien central
        let (x, y) = geographic_to_polyconic(Geographic::from_degrees(-48.33, -10.18)).unwrap();
        assert!(x > X0 + 600_000.0 && x < X0 + 650_000.0, "x={}", x);
        assert!(y < Y0 - 1_100_000.0 && y > Y0 - 1_140_000.0, "y={}", y);
    }

    #[test]
    fn test_forward_inverse() {
        for (lon, lat) in [(-48.33, -10.18), (-60.0, -3.1), (-47.0, 2.5)] {
            let (x, y) = geographic_to_polyconic(Geographic::from_degrees(lon, lat)).unwrap();
            let (lon2, lat2) = polyconic_to_geographic(x, y).unwrap().to_degrees();
            assert!((lon2 - lon).abs() < 1e-8, "lon={} -> {}", lon, lon2);
            assert!((lat2 - lat).abs() < 1e-8, "lat={} -> {}", lat, lat2);
        }
    }
}
