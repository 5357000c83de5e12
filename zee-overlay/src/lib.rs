//! # zee-overlay
//!
//! Croisement d'un imóvel rural (CAR) avec les couches du Zoneamento
//! Ecológico-Econômico (ZEE) et des Áreas Prioritárias para Serviços
//! Ecossistêmicos (APSE).
//!
//! ## Étapes
//!
//! - Chargement GeoJSON (CRS embarqué) ou Shapefile (CRS du `.prj`), cache
//!   par chemin ([`LayerCache`])
//! - Normalisation vers un CRS projeté métrique (EPSG:5880 par défaut)
//! - Recherche de l'imóvel par numéro CAR (égalité stricte)
//! - Pré-filtre par emprise, puis intersection polygonale (`geo::BooleanOps`)
//! - Surfaces en hectares et pourcentages par fragment
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zee_overlay::{aggregate, find_property, intersect, load_collection, normalize, Crs, CrsPolicy};
//! use std::path::Path;
//!
//! let car = load_collection(Path::new("car.geojson"))?;
//! let zee = load_collection(Path::new("zee.geojson"))?;
//! let zee = normalize(&zee, Crs::BRAZIL_POLYCONIC, CrsPolicy::Strict)?;
//!
//! let imovel = find_property(&car, "numero_car", "TO-1721000-ABCD")?;
//! let fragments = intersect(imovel, &zee);
//! for share in aggregate(&fragments, "zona", imovel.area_ha()) {
//!     println!("{}: {:.2} %", share.category, share.percentage);
//! }
//! ```

pub mod aggregate;
pub mod error;
pub mod filter;
pub mod loader;
pub mod lookup;
pub mod normalize;
pub mod overlay;
pub mod reproject;
pub mod shp;
pub mod types;

pub use aggregate::{aggregate, hectares, AreaShare};
pub use error::OverlayError;
pub use filter::clip_to_bbox;
pub use loader::{load_collection, load_geojson, DatasetLoader, LayerCache, LayerSource};
pub use shp::{crs_from_wkt, load_shapefile};
pub use lookup::find_property;
pub use normalize::{align, align_feature, normalize, CrsPolicy, NormalizedCache};
pub use overlay::{intersect, Fragment};
pub use types::{Crs, Feature, FeatureCollection};
