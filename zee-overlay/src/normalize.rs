//! Normalisation du CRS avant tout calcul de surface

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use geo::{Densify, MultiPolygon};
use tracing::{debug, trace};

use crate::reproject::SmartReprojector;
use crate::types::{Crs, Feature, FeatureCollection};
use crate::OverlayError;

/// Longueur maximale (degrés) d'un segment géographique avant reprojection
///
/// Seuls les sommets sont reprojetés : un long côté suivant un méridien ou un
/// parallèle deviendrait une corde.
pub const GEOGRAPHIC_MAX_SEGMENT: f64 = 0.01;

/// Politique de normalisation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CrsPolicy {
    /// Reprojeter tout CRS différent de la cible (défaut)
    #[default]
    Strict,
    /// Laisser tel quel tout CRS déjà projeté
    AcceptProjected,
}

impl FromStr for CrsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(CrsPolicy::Strict),
            "accept-projected" | "relaxed" => Ok(CrsPolicy::AcceptProjected),
            _ => Err(format!(
                "Invalid CRS policy: {}. Use: strict, accept-projected",
                s
            )),
        }
    }
}

/// Garantit un CRS projeté avant le calcul des surfaces
///
/// Retourne la collection empruntée si aucune reprojection n'est nécessaire,
/// ce qui rend l'opération idempotente.
///
/// # Errors
///
/// `ReprojectionError` si le CRS source est indéfini ou non supporté.
pub fn normalize(
    collection: &FeatureCollection,
    target: Crs,
    policy: CrsPolicy,
) -> Result<Cow<'_, FeatureCollection>, OverlayError> {
    let source = source_crs(collection)?;

    let keep = source == target || (policy == CrsPolicy::AcceptProjected && source.is_projected());
    if keep {
        return Ok(Cow::Borrowed(collection));
    }

    reproject(collection, source, target).map(Cow::Owned)
}

/// Aligne une collection sur un CRS exact (imóvel et APSE sur le CRS du ZEE)
pub fn align(
    collection: &FeatureCollection,
    target: Crs,
) -> Result<Cow<'_, FeatureCollection>, OverlayError> {
    normalize(collection, target, CrsPolicy::Strict)
}

/// Reprojette une seule feature depuis le CRS de sa collection
pub fn align_feature<'a>(
    feature: &'a Feature,
    source: Option<Crs>,
    target: Crs,
    layer: &str,
) -> Result<Cow<'a, Feature>, OverlayError> {
    let source = source.ok_or_else(|| OverlayError::reprojection(layer, "undefined source CRS"))?;
    if source == target {
        return Ok(Cow::Borrowed(feature));
    }

    let reprojector = SmartReprojector::new(source.epsg, target.epsg)
        .map_err(|e| OverlayError::reprojection(layer, e.to_string()))?;
    let geometry = transform(&reprojector, &feature.geometry, source)
        .map_err(|e| OverlayError::reprojection(layer, e))?;

    Ok(Cow::Owned(Feature {
        id: feature.id.clone(),
        geometry,
        properties: feature.properties.clone(),
    }))
}

fn source_crs(collection: &FeatureCollection) -> Result<Crs, OverlayError> {
    collection
        .crs
        .ok_or_else(|| OverlayError::reprojection(&collection.name, "undefined source CRS"))
}

fn reproject(
    collection: &FeatureCollection,
    source: Crs,
    target: Crs,
) -> Result<FeatureCollection, OverlayError> {
    let reprojector = SmartReprojector::new(source.epsg, target.epsg)
        .map_err(|e| OverlayError::reprojection(&collection.name, e.to_string()))?;

    debug!(
        layer = %collection.name,
        from = %source,
        to = %target,
        features = collection.len(),
        method = reprojector.description(),
        "Reprojecting layer"
    );

    let features: Result<Vec<Feature>, OverlayError> = collection
        .features
        .iter()
        .map(|f| {
            let geometry = transform(&reprojector, &f.geometry, source).map_err(|e| {
                OverlayError::reprojection(&collection.name, format!("feature {}: {}", f.id, e))
            })?;
            Ok(Feature {
                id: f.id.clone(),
                geometry,
                properties: f.properties.clone(),
            })
        })
        .collect();

    Ok(FeatureCollection::new(
        collection.name.clone(),
        Some(target),
        features?,
    ))
}

fn transform(
    reprojector: &SmartReprojector,
    geometry: &MultiPolygon<f64>,
    source: Crs,
) -> Result<MultiPolygon<f64>, String> {
    let result = if source.is_geographic() {
        reprojector.transform_multipolygon(&geometry.densify(GEOGRAPHIC_MAX_SEGMENT))
    } else {
        reprojector.transform_multipolygon(geometry)
    };
    result.map_err(|e| e.to_string())
}

type NormalizedKey = (PathBuf, Crs, CrsPolicy);

/// Couche brute et sa version normalisée
type NormalizedEntry = (Arc<FeatureCollection>, Arc<FeatureCollection>);

/// Cache des couches normalisées, par chemin, CRS cible et politique
///
/// L'entrée retient la couche brute d'origine : si la source rend une autre
/// instance (fichier rechargé), la normalisation est refaite.
#[derive(Default)]
pub struct NormalizedCache {
    entries: Mutex<HashMap<NormalizedKey, NormalizedEntry>>,
}

impl NormalizedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Couche `raw` (lue depuis `path`) normalisée vers `target`
    ///
    /// Deux appels concurrents sur une entrée absente peuvent normaliser
    /// deux fois ; le dernier résultat est gardé.
    pub fn get_or_normalize(
        &self,
        path: &Path,
        raw: &Arc<FeatureCollection>,
        target: Crs,
        policy: CrsPolicy,
    ) -> Result<Arc<FeatureCollection>, OverlayError> {
        let key = (path.to_path_buf(), target, policy);

        {
            let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some((source, normalized)) = entries.get(&key) {
                if Arc::ptr_eq(source, raw) {
                    trace!(path = %path.display(), crs = %target, "Normalized layer cache hit");
                    return Ok(Arc::clone(normalized));
                }
            }
        }

        let normalized = match normalize(raw, target, policy)? {
            Cow::Borrowed(_) => Arc::clone(raw),
            Cow::Owned(collection) => Arc::new(collection),
        };

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, (Arc::clone(raw), Arc::clone(&normalized)));
        Ok(normalized)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
