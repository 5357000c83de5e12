//! Lecture des couches ESRI Shapefile (.shp + .dbf, CRS depuis le .prj)

use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use regex::Regex;
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use tracing::{debug, trace, warn};

use crate::types::{Crs, Feature, FeatureCollection};
use crate::OverlayError;

/// Charge un Shapefile de polygones
///
/// Le CRS vient du `.prj` voisin ; s'il manque ou n'est pas reconnu, la
/// couche n'a pas de CRS et la normalisation échouera.
///
/// # Errors
///
/// - `DatasetNotFound` si le `.shp` est absent
/// - `DatasetFormatError` si le fichier est illisible ou contient autre
///   chose que des polygones
pub fn load_shapefile(path: &Path) -> Result<FeatureCollection, OverlayError> {
    std::fs::metadata(path).map_err(|e| OverlayError::dataset_not_found(path, e))?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut reader = shapefile::Reader::from_path(path)
        .map_err(|e| OverlayError::format(path, e.to_string()))?;

    let mut features = Vec::new();
    for (index, item) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) =
            item.map_err(|e| OverlayError::format(path, format!("record #{index}: {e}")))?;

        let geometry = match shape {
            Shape::NullShape => {
                warn!(layer = %name, index, "Feature without geometry skipped");
                continue;
            }
            Shape::Polygon(p) => to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonM(p) => to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            Shape::PolygonZ(p) => to_multipolygon(p.rings(), |pt| Coord { x: pt.x, y: pt.y }),
            _ => {
                return Err(OverlayError::format(
                    path,
                    format!("record #{index}: non-polygon geometry in polygon layer"),
                ))
            }
        }
        .map_err(|reason| OverlayError::format(path, format!("record #{index}: {reason}")))?;

        features.push(Feature {
            id: index.to_string(),
            geometry,
            properties: convert_record(record),
        });
    }

    let crs = read_prj(path);
    debug!(
        path = %path.display(),
        features = features.len(),
        crs = ?crs.map(|c| c.epsg),
        "Shapefile loaded"
    );

    Ok(FeatureCollection::new(name, crs, features))
}

/// Anneau extérieur : nouveau polygone ; anneau intérieur : trou du précédent
fn to_multipolygon<P>(
    rings: &[PolygonRing<P>],
    xy: impl Fn(&P) -> Coord<f64>,
) -> Result<MultiPolygon<f64>, String> {
    let mut polygons: Vec<Polygon<f64>> = Vec::new();

    for ring in rings {
        let line = LineString::new(ring.points().iter().map(&xy).collect());
        match ring {
            PolygonRing::Outer(_) => polygons.push(Polygon::new(line, vec![])),
            PolygonRing::Inner(_) => match polygons.last_mut() {
                Some(polygon) => polygon.interiors_push(line),
                None => return Err("inner ring before any outer ring".into()),
            },
        }
    }

    Ok(MultiPolygon::new(polygons))
}

/// Champs dBASE en chaînes ; valeurs vides = attribut absent
fn convert_record(record: Record) -> HashMap<String, String> {
    record
        .into_iter()
        .filter_map(|(field, value)| {
            let value = match value {
                FieldValue::Character(Some(s)) => s.trim_end().to_string(),
                FieldValue::Memo(s) => s,
                FieldValue::Numeric(Some(n)) | FieldValue::Double(n) | FieldValue::Currency(n) => {
                    n.to_string()
                }
                FieldValue::Float(Some(n)) => n.to_string(),
                FieldValue::Integer(n) => n.to_string(),
                FieldValue::Logical(Some(b)) => b.to_string(),
                FieldValue::Character(None)
                | FieldValue::Numeric(None)
                | FieldValue::Float(None)
                | FieldValue::Logical(None) => return None,
                other => {
                    trace!(field = %field, "Unsupported dBASE value skipped: {:?}", other);
                    return None;
                }
            };
            (!value.is_empty()).then_some((field, value))
        })
        .collect()
}

fn read_prj(path: &Path) -> Option<Crs> {
    let prj = path.with_extension("prj");
    let wkt = match std::fs::read_to_string(&prj) {
        Ok(wkt) => wkt,
        Err(_) => {
            warn!(path = %path.display(), "No .prj next to the shapefile, CRS undefined");
            return None;
        }
    };

    let crs = crs_from_wkt(&wkt);
    if crs.is_none() {
        warn!(path = %prj.display(), "Unrecognised .prj, CRS undefined");
    }
    crs
}

/// Code EPSG d'un WKT `.prj` (OGC ou variante ESRI)
///
/// L'`AUTHORITY` de plus haut niveau (la dernière du texte) l'emporte ;
/// sans elle, le nom du `PROJCS` ou du `GEOGCS` est reconnu pour les CRS
/// en usage au Brésil.
pub fn crs_from_wkt(wkt: &str) -> Option<Crs> {
    static AUTHORITY_RE: OnceLock<Regex> = OnceLock::new();
    static NAME_RE: OnceLock<Regex> = OnceLock::new();
    static UTM_RE: OnceLock<Regex> = OnceLock::new();

    let authority = AUTHORITY_RE.get_or_init(|| {
        Regex::new(r#"(?i)AUTHORITY\s*\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]"#)
            .expect("valid AUTHORITY regex")
    });
    if let Some(code) = authority.captures_iter(wkt).last().and_then(|c| c[1].parse().ok()) {
        return Some(Crs::new(code));
    }

    let name_re = NAME_RE.get_or_init(|| {
        Regex::new(r#"(?i)^\s*(?:PROJCS|GEOGCS|PROJCRS|GEOGCRS)\s*\[\s*"([^"]+)""#)
            .expect("valid CRS name regex")
    });
    let name = name_re.captures(wkt)?[1]
        .to_uppercase()
        .replace([' ', '/', '-'], "_");

    let utm_re = UTM_RE.get_or_init(|| {
        Regex::new(r"UTM_ZONE_(\d{1,2})([NS])").expect("valid UTM regex")
    });
    if let Some(caps) = utm_re.captures(&name) {
        let zone: u32 = caps[1].parse().ok()?;
        let south = &caps[2] == "S";
        let base = if name.contains("SIRGAS") && south {
            31960
        } else if name.contains("SAD") && south {
            29170
        } else if name.contains("WGS") {
            if south {
                32700
            } else {
                32600
            }
        } else {
            return None;
        };
        return Some(Crs::new(base + zone));
    }

    if name.contains("POLYCONIC") {
        return name.contains("SIRGAS").then_some(Crs::BRAZIL_POLYCONIC);
    }
    if name.contains("SIRGAS") {
        return Some(Crs::SIRGAS_2000);
    }
    if name.contains("SAD") || name.contains("SOUTH_AMERICAN_1969") {
        return Some(Crs::new(4618));
    }
    if name.contains("WGS_1984") || name.contains("WGS_84") {
        return Some(Crs::WGS84);
    }

    None
}
