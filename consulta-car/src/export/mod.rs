//! Export des fragments d'overlay

pub mod geojson;

pub use geojson::{export_fragments, export_to_geojson};
