//! Projection UTM (Universal Transverse Mercator), hémisphère sud inclus
//!
//! Zones utilisées au Brésil : 18S à 25S (SIRGAS 2000, EPSG:31978 à 31985).
//! Le Tocantins est couvert par les zones 22S et 23S.

use super::ellipsoid::GRS80;
use super::{Geographic, Result};

/// Facteur d'échelle
const K0: f64 = 0.9996;
/// False easting
const X0: f64 = 500000.0;

/// Paramètres d'une zone UTM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    pub zone: u32,
    pub south: bool,
}

impl UtmZone {
    /// Déduit la zone depuis un code EPSG (SIRGAS 2000 sud, WGS84 nord/sud)
    pub fn from_epsg(epsg: u32) -> Option<Self> {
        match epsg {
            31978..=31985 => Some(Self {
                zone: epsg - 31960,
                south: true,
            }),
            32601..=32660 => Some(Self {
                zone: epsg - 32600,
                south: false,
            }),
            32701..=32760 => Some(Self {
                zone: epsg - 32700,
                south: true,
            }),
            _ => None,
        }
    }

    /// Longitude centrale de la zone (radians)
    fn central_meridian(&self) -> f64 {
        ((self.zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
    }

    /// False northing
    fn y0(&self) -> f64 {
        if self.south {
            10000000.0
        } else {
            0.0
        }
    }
}

/// Convertit des coordonnées géographiques vers UTM
pub fn geographic_to_utm(geo: Geographic, zone: UtmZone) -> Result<(f64, f64)> {
    let ep2 = GRS80::EP2;
    let lat = geo.lat;

    let n = GRS80::prime_vertical_radius(lat);
    let t = lat.tan().powi(2);
    let c = ep2 * lat.cos().powi(2);
    let a = (geo.lon - zone.central_meridian()) * lat.cos();
    let m = GRS80::meridian_arc(lat);

    let x = X0
        + K0 * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0);

    let y = zone.y0()
        + K0 * (m
            + n * lat.tan()
                * (a.powi(2) / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * a.powi(6)
                        / 720.0));

    Ok((x, y))
}

/// Convertit UTM vers coordonnées géographiques
pub fn utm_to_geographic(x: f64, y: f64, zone: UtmZone) -> Result<Geographic> {
    let a = GRS80::A;
    let e2 = GRS80::E2;
    let ep2 = GRS80::EP2;

    let lon0 = zone.central_meridian();

    // Coordonnées réduites
    let x = x - X0;
    let y = y - zone.y0();

    // Calcul du footprint latitude
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2) - 252.0 * ep2 - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Ok(Geographic::new(lon, lat))
}
