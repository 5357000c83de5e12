//! # consulta-car
//!
//! Consultation d'un imóvel rural (CAR) contre le Zoneamento
//! Ecológico-Econômico du Tocantins (ZEE-TO) et les Áreas Prioritárias para
//! Serviços Ecossistêmicos (APSE).
//!
//! ## Features
//!
//! - Pipeline complet : chargement, normalisation CRS, overlay, agrégation
//! - Table statique des zones (embarquée ou fichier externe)
//! - Réponse JSON avec pourcentages « dd,dd »
//! - Export GeoJSON des fragments
//!
//! ## Usage CLI
//!
//! ```bash
//! consulta-car query TO-1721000-ABCD --pretty
//! consulta-car query TO-1 TO-2 --zee ./zee_to.geojson --fragments-out ./out/
//! consulta-car inspect ./app/data/zee.shp
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod export;
pub mod metadata;
pub mod query;
pub mod response;

pub use compose::{compose, PropertyInfo, QueryResult};
pub use config::Settings;
pub use error::ConsultaError;
pub use metadata::{ApseNotice, MetadataTable, ZoneMetadata};
pub use query::{query, Consulta, Datasets, OverlayFragments, QueryOptions, QueryOutcome};
pub use response::{format_decimal_br, QueryResponse};
