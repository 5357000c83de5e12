//! Types de données pour le crate zee-overlay

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use geo::{Area, BoundingRect, MultiPolygon, Rect};
use regex::Regex;

/// Système de coordonnées identifié par son code EPSG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crs {
    /// Code EPSG
    pub epsg: u32,
}

impl Crs {
    /// WGS84 géographique
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// SIRGAS 2000 géographique
    pub const SIRGAS_2000: Crs = Crs { epsg: 4674 };

    /// SIRGAS 2000 / Brazil Polyconic, projection métrique de référence
    pub const BRAZIL_POLYCONIC: Crs = Crs { epsg: 5880 };

    pub const fn new(epsg: u32) -> Self {
        Self { epsg }
    }

    /// Coordonnées en degrés (surface non calculable)
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, 4019 | 4258 | 4269 | 4326 | 4618 | 4674)
    }

    /// Coordonnées en unités linéaires
    pub fn is_projected(&self) -> bool {
        !self.is_geographic()
    }

    /// Interprète un nom de CRS GeoJSON
    ///
    /// Formes acceptées : `EPSG:4674`, `urn:ogc:def:crs:EPSG::4674`,
    /// `urn:ogc:def:crs:EPSG:6.6:4674` et `urn:ogc:def:crs:OGC:1.3:CRS84`.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.ends_with("CRS84") {
            return Some(Self::WGS84);
        }

        static EPSG_RE: OnceLock<Regex> = OnceLock::new();
        let re = EPSG_RE.get_or_init(|| {
            Regex::new(r"(?i)EPSG:(?:[0-9.]*:)?(\d+)$").expect("valid EPSG regex")
        });

        re.captures(name)?.get(1)?.as_str().parse().ok().map(Self::new)
    }

    /// Nom OGC utilisé dans le membre `crs` des fichiers GeoJSON
    pub fn urn(&self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Un enregistrement : (multi)polygone + attributs scalaires
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Identifiant GeoJSON, ou la position dans le fichier à défaut
    pub id: String,

    /// Géométrie, toujours stockée en multipolygone
    pub geometry: MultiPolygon<f64>,

    /// Attributs de la feature (clé -> valeur)
    pub properties: HashMap<String, String>,
}

impl Feature {
    /// Valeur d'un attribut
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Surface en hectares (valide seulement en CRS projeté métrique)
    pub fn area_ha(&self) -> f64 {
        crate::aggregate::hectares(&self.geometry)
    }
}

/// Collection ordonnée de features partageant un même CRS
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    /// Nom de la couche (nom du fichier source)
    pub name: String,

    /// CRS de la couche, `None` si le fichier n'en déclare pas
    pub crs: Option<Crs>,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: impl Into<String>, crs: Option<Crs>, features: Vec<Feature>) -> Self {
        Self {
            name: name.into(),
            crs,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Une colonne existe dès qu'au moins un enregistrement la renseigne
    pub fn has_field(&self, field: &str) -> bool {
        self.features
            .iter()
            .any(|f| f.properties.contains_key(field))
    }

    /// Noms de colonnes présents dans la couche, triés
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Emprise de toute la couche
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        self.features
            .iter()
            .filter_map(Feature::bounding_rect)
            .reduce(|acc, r| {
                Rect::new(
                    (acc.min().x.min(r.min().x), acc.min().y.min(r.min().y)),
                    (acc.max().x.max(r.max().x), acc.max().y.max(r.max().y)),
                )
            })
    }

    /// Surface totale (m² en CRS projeté)
    pub fn unsigned_area(&self) -> f64 {
        self.features.iter().map(|f| f.geometry.unsigned_area()).sum()
    }
}
