//! Chargement des couches vectorielles (GeoJSON, Shapefile) et cache par chemin

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use geojson::{feature::Id, GeoJson, JsonObject, JsonValue, PolygonType, Value};
use tracing::{debug, trace, warn};

use crate::shp::load_shapefile;
use crate::types::{Crs, Feature, FeatureCollection};
use crate::OverlayError;

/// Charge une couche de polygones, le format étant choisi par l'extension
///
/// `.shp` passe par le lecteur Shapefile, tout le reste est lu en GeoJSON.
///
/// # Errors
///
/// - `DatasetNotFound` si le fichier est absent ou illisible
/// - `DatasetFormatError` si le contenu n'est pas une couche de polygones
pub fn load_collection(path: &Path) -> Result<FeatureCollection, OverlayError> {
    let is_shapefile = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("shp"));
    if is_shapefile {
        return load_shapefile(path);
    }
    load_geojson(path)
}

/// Charge un fichier GeoJSON (FeatureCollection de polygones)
pub fn load_geojson(path: &Path) -> Result<FeatureCollection, OverlayError> {
    let bytes = std::fs::read(path).map_err(|e| OverlayError::dataset_not_found(path, e))?;

    let content = simdutf8::basic::from_utf8(&bytes)
        .map_err(|_| OverlayError::format(path, "file is not valid UTF-8"))?;

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let collection =
        parse_collection(&name, content).map_err(|reason| OverlayError::format(path, reason))?;

    debug!(
        path = %path.display(),
        features = collection.len(),
        crs = ?collection.crs.map(|c| c.epsg),
        "Dataset loaded"
    );

    Ok(collection)
}

/// Parse le texte d'une FeatureCollection GeoJSON
pub fn parse_collection(name: &str, content: &str) -> Result<FeatureCollection, String> {
    let geojson: GeoJson = content.parse().map_err(|e| format!("invalid GeoJSON: {e}"))?;

    let GeoJson::FeatureCollection(fc) = geojson else {
        return Err("expected a FeatureCollection".to_string());
    };

    let crs = match fc.foreign_members.as_ref().and_then(|m| m.get("crs")) {
        Some(member) => Some(crs_from_member(member)?),
        None => None,
    };

    let mut features = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!(layer = name, index, "Feature without geometry skipped");
            continue;
        };

        let geometry = to_multipolygon(geometry.value)
            .map_err(|reason| format!("feature #{index}: {reason}"))?;

        let id = match feature.id {
            Some(Id::String(s)) => s,
            Some(Id::Number(n)) => n.to_string(),
            None => index.to_string(),
        };

        let properties = feature
            .properties
            .map(convert_properties)
            .unwrap_or_default();

        features.push(Feature {
            id,
            geometry,
            properties,
        });
    }

    Ok(FeatureCollection::new(name, crs, features))
}

/// Lit le membre `crs` (ancienne spécification GeoJSON 2008, toujours écrite par GDAL)
fn crs_from_member(member: &JsonValue) -> Result<Crs, String> {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(JsonValue::as_str)
        .ok_or_else(|| "crs member without properties.name".to_string())?;

    Crs::parse(name).ok_or_else(|| format!("unrecognised CRS name '{name}'"))
}

fn to_multipolygon(value: Value) -> Result<MultiPolygon<f64>, String> {
    match value {
        Value::Polygon(rings) => Ok(MultiPolygon::new(vec![to_polygon(&rings)?])),
        Value::MultiPolygon(polygons) => {
            let polygons: Result<Vec<Polygon<f64>>, String> =
                polygons.iter().map(|rings| to_polygon(rings)).collect();
            Ok(MultiPolygon::new(polygons?))
        }
        Value::Point(_) | Value::MultiPoint(_) => Err("point geometry in polygon layer".into()),
        Value::LineString(_) | Value::MultiLineString(_) => {
            Err("line geometry in polygon layer".into())
        }
        Value::GeometryCollection(_) => Err("geometry collections are not supported".into()),
    }
}

fn to_polygon(rings: &PolygonType) -> Result<Polygon<f64>, String> {
    let mut rings = rings.iter().map(|ring| to_ring(ring));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(vec![]));
    let interiors: Result<Vec<LineString<f64>>, String> = rings.collect();
    Ok(Polygon::new(exterior, interiors?))
}

fn to_ring(positions: &[Vec<f64>]) -> Result<LineString<f64>, String> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err("position with fewer than two coordinates".to_string()),
        })
        .collect::<Result<Vec<Coord<f64>>, String>>()
        .map(LineString::new)
}

/// Convertit les propriétés JSON en chaînes ; `null` = attribut absent
fn convert_properties(object: JsonObject) -> HashMap<String, String> {
    object
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                JsonValue::Null => return None,
                JsonValue::String(s) => s,
                JsonValue::Bool(b) => b.to_string(),
                JsonValue::Number(n) => n.to_string(),
                other => other.to_string(),
            };
            Some((key, value))
        })
        .collect()
}

/// Source de couches, injectée dans le pipeline de requête
pub trait LayerSource: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<FeatureCollection>, OverlayError>;
}

/// Relit le fichier (GeoJSON ou Shapefile) à chaque appel
#[derive(Debug, Default, Clone, Copy)]
pub struct DatasetLoader;

impl LayerSource for DatasetLoader {
    fn load(&self, path: &Path) -> Result<Arc<FeatureCollection>, OverlayError> {
        load_collection(path).map(Arc::new)
    }
}

type Slot = Arc<Mutex<Option<Arc<FeatureCollection>>>>;

/// Cache « charger une seule fois par chemin »
///
/// Chaque chemin possède son propre verrou : deux requêtes concurrentes sur
/// la même couche attendent un unique chargement, tandis que des couches
/// différentes se chargent en parallèle. Un échec n'est pas mis en cache.
pub struct LayerCache<L = DatasetLoader> {
    inner: L,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl Default for LayerCache<DatasetLoader> {
    fn default() -> Self {
        Self::new(DatasetLoader)
    }
}

impl<L: LayerSource> LayerCache<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, path: &Path) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(path.to_path_buf()).or_default())
    }

    /// Nombre de couches effectivement chargées
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Oublie une couche (ex: fichier remplacé sur disque)
    pub fn invalidate(&self, path: &Path) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(path).is_some()
    }
}

impl<L: LayerSource> LayerSource for LayerCache<L> {
    fn load(&self, path: &Path) -> Result<Arc<FeatureCollection>, OverlayError> {
        let slot = self.slot(path);
        let mut cached = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(collection) = cached.as_ref() {
            trace!(path = %path.display(), "Layer cache hit");
            return Ok(Arc::clone(collection));
        }

        let collection = self.inner.load(path)?;
        *cached = Some(Arc::clone(&collection));
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ZEE_SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "crs": {"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::5880"}},
        "features": [
            {"type": "Feature", "id": 7,
             "properties": {"zona": "Zonas de Desenvolvimento Integrado 1", "cod": 11, "obs": null},
             "geometry": {"type": "Polygon", "coordinates": [[[0,0],[100,0],[100,100],[0,100],[0,0]]]}},
            {"type": "Feature",
             "properties": {"zona": "Zonas de Consolidação Estratégica 1"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[100,0],[200,0],[200,100],[100,100],[100,0]]],
                [[[300,0],[400,0],[400,100],[300,100],[300,0]]]
             ]}},
            {"type": "Feature", "properties": {"zona": "vide"}, "geometry": null}
        ]
    }"#;

    #[test]
    fn test_parse_collection() {
        let layer = parse_collection("zee", ZEE_SAMPLE).unwrap();

        assert_eq!(layer.name, "zee");
        assert_eq!(layer.crs, Some(Crs::BRAZIL_POLYCONIC));
        assert_eq!(layer.len(), 2);
        assert_eq!(layer.features[0].id, "7");
        assert_eq!(layer.features[1].id, "1");
        assert_eq!(layer.features[0].get("cod"), Some("11"));
        assert_eq!(layer.features[0].get("obs"), None);
        assert_eq!(layer.features[1].geometry.0.len(), 2);
    }

    #[test]
    fn test_parse_without_crs() {
        let layer = parse_collection(
            "car",
            r#"{"type":"FeatureCollection","features":[]}"#,
        )
        .unwrap();
        assert_eq!(layer.crs, None);
        assert!(layer.is_empty());
    }

    #[test]
    fn test_parse_rejects_points_and_bare_geometries() {
        let points = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,2]}}]}"#;
        assert!(parse_collection("p", points).unwrap_err().contains("point"));

        let bare = r#"{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}"#;
        assert!(parse_collection("p", bare).is_err());

        assert!(parse_collection("p", "not json").is_err());
    }

    #[test]
    fn test_unknown_crs_name_is_format_error() {
        let doc = r#"{"type":"FeatureCollection",
            "crs":{"type":"name","properties":{"name":"Mystery grid"}},"features":[]}"#;
        assert!(parse_collection("x", doc).unwrap_err().contains("Mystery grid"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_collection(Path::new("/nonexistent/zee.geojson")).unwrap_err();
        assert!(matches!(err, OverlayError::DatasetNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_utf8() {
        let path = std::env::temp_dir().join("zee_overlay_invalid_utf8.geojson");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = load_collection(&path).unwrap_err();
        assert!(matches!(err, OverlayError::DatasetFormatError { .. }));

        std::fs::remove_file(path).ok();
    }

    /// Source factice qui compte les chargements
    struct CountingSource {
        loads: AtomicUsize,
        fail_first: bool,
    }

    impl LayerSource for CountingSource {
        fn load(&self, path: &Path) -> Result<Arc<FeatureCollection>, OverlayError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && n == 0 {
                return Err(OverlayError::dataset_not_found(
                    path,
                    std::io::Error::new(std::io::ErrorKind::Interrupted, "transient"),
                ));
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
            Ok(Arc::new(FeatureCollection::new("zee", None, vec![])))
        }
    }

    #[test]
    fn test_cache_loads_once_under_concurrency() {
        let cache = LayerCache::new(CountingSource {
            loads: AtomicUsize::new(0),
            fail_first: false,
        });
        let path = Path::new("app/data/zee.geojson");

        let layers: Vec<Arc<FeatureCollection>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| cache.load(path).unwrap())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.inner.loads.load(Ordering::SeqCst), 1);
        assert!(layers.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_does_not_keep_failures() {
        let cache = LayerCache::new(CountingSource {
            loads: AtomicUsize::new(0),
            fail_first: true,
        });
        let path = Path::new("zee.geojson");

        assert!(cache.load(path).is_err());
        assert!(cache.is_empty());
        assert!(cache.load(path).is_ok());
        assert!(cache.load(path).is_ok());
        assert_eq!(cache.inner.loads.load(Ordering::SeqCst), 2);

        assert!(cache.invalidate(path));
        assert!(cache.is_empty());
    }
}
