//! Définition et implémentation des commandes CLI
//!
//! - `query`: numéro(s) CAR → réponse JSON (ZEE + APSE)
//! - `inspect`: résumé d'un jeu de données GeoJSON ou Shapefile

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Subcommand;
use consulta_car::config::Settings;
use consulta_car::export::export_fragments;
use consulta_car::{Consulta, ConsultaError, QueryOutcome, QueryResponse};
use rayon::prelude::*;
use tracing::{info, warn};
use zee_overlay::aggregate::M2_PER_HECTARE;
use zee_overlay::{load_collection, DatasetLoader, LayerCache};

#[derive(Subcommand)]
pub enum Commands {
    /// Find the ZEE zones and APSE areas overlapping one or more CAR properties
    Query {
        /// CAR number(s) to look up
        #[arg(required = true)]
        cars: Vec<String>,

        /// CAR registry dataset (default: env ZEE_CAR_PATH)
        #[arg(long)]
        car: Option<PathBuf>,

        /// ZEE zoning dataset (default: env ZEE_ZONING_PATH)
        #[arg(long)]
        zee: Option<PathBuf>,

        /// APSE dataset (default: env ZEE_SERVICE_PATH)
        #[arg(long)]
        apse: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Write the overlay fragments as GeoJSON into this directory
        #[arg(long)]
        fragments_out: Option<PathBuf>,
    },

    /// Print feature count, CRS, fields and extent of a dataset
    Inspect {
        /// GeoJSON or Shapefile dataset
        path: PathBuf,
    },
}

/// Exécute la commande query
///
/// Les cas métier (non trouvé, hors ZEE) sortent en JSON avec le code 0 ;
/// seules les pannes font échouer la commande.
pub fn cmd_query(
    cars: &[String],
    settings: &Settings,
    pretty: bool,
    fragments_out: Option<&Path>,
) -> Result<()> {
    let started_at = Instant::now();
    let metadata = settings.load_metadata()?;

    // Registre partagé entre les requêtes d'une même invocation
    let consulta = Consulta::new(metadata, settings.query_options())
        .with_registry_source(Arc::new(LayerCache::new(DatasetLoader)));

    info!(
        cars = cars.len(),
        car = %settings.datasets.car.display(),
        zee = %settings.datasets.zee.display(),
        apse = %settings.datasets.apse.display(),
        "Starting query"
    );

    let results: Vec<Result<QueryOutcome, ConsultaError>> = cars
        .par_iter()
        .map(|car| {
            let (outcome, fragments) = consulta.query_with_fragments(car, &settings.datasets)?;
            if let (Some(dir), Some(fragments)) = (fragments_out, fragments.as_ref()) {
                if let Err(e) = export_fragments(car, fragments, dir) {
                    warn!(car = car.as_str(), "Fragment export failed: {:#}", e);
                }
            }
            Ok(outcome)
        })
        .collect();

    let mut failures = 0usize;
    let responses: Vec<QueryResponse> = cars
        .iter()
        .zip(results)
        .map(|(car, result)| {
            if let Err(e) = &result {
                failures += 1;
                warn!(car = car.as_str(), "Query failed: {}", e);
            }
            QueryResponse::from_result(result)
        })
        .collect();

    let json = match responses.as_slice() {
        [single] => to_json(single, pretty)?,
        many => to_json(&many, pretty)?,
    };
    println!("{}", json);

    info!(elapsed = ?started_at.elapsed(), failures, "Query finished");

    if failures > 0 {
        anyhow::bail!("{} of {} queries failed", failures, cars.len());
    }
    Ok(())
}

/// Exécute la commande inspect
pub fn cmd_inspect(path: &Path) -> Result<()> {
    let layer = load_collection(path).context(format!("Failed to load {}", path.display()))?;

    println!("=== {} ===", layer.name);
    println!("Path: {}", path.display());
    println!("Features: {}", layer.len());
    match layer.crs {
        Some(crs) if crs.is_geographic() => println!("CRS: {} (geographic)", crs),
        Some(crs) => println!("CRS: {} (projected)", crs),
        None => println!("CRS: undefined"),
    }
    println!("Fields: {}", layer.field_names().join(", "));

    if let Some(bbox) = layer.bounding_rect() {
        println!(
            "Extent: [{}, {}, {}, {}]",
            bbox.min().x,
            bbox.min().y,
            bbox.max().x,
            bbox.max().y
        );
    }
    if layer.crs.is_some_and(|c| c.is_projected()) {
        println!("Area: {:.2} ha", layer.unsigned_area() / M2_PER_HECTARE);
    }

    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
