//! Configuration de la consultation (variables d'environnement + CLI)

use std::path::PathBuf;

use anyhow::{Context, Result};
use zee_overlay::{Crs, CrsPolicy};

use crate::metadata::MetadataTable;
use crate::query::{Datasets, QueryOptions};

/// Réglages effectifs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub datasets: Datasets,
    pub target_crs: Crs,
    pub crs_policy: CrsPolicy,
    pub prefilter: bool,
    pub id_field: String,
    pub name_field: String,
    /// Table de métadonnées externe (sinon table embarquée)
    pub metadata_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Settings {
    /// Lit les variables `ZEE_*` (après chargement du `.env`)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Les valeurs illisibles retombent sur les défauts
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str, default: &str| {
            var(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            datasets: Datasets {
                car: path("ZEE_CAR_PATH", "app/data/car.shp"),
                zee: path("ZEE_ZONING_PATH", "app/data/zee.shp"),
                apse: path("ZEE_SERVICE_PATH", "app/data/servicos_ecossistemicos_4674.shp"),
            },
            target_crs: var("ZEE_TARGET_EPSG")
                .and_then(|s| s.trim().parse().ok())
                .map(Crs::new)
                .unwrap_or(Crs::BRAZIL_POLYCONIC),
            crs_policy: var("ZEE_CRS_POLICY")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            prefilter: var("ZEE_PREFILTER")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(true),
            id_field: var("ZEE_ID_FIELD").unwrap_or_else(|| "numero_car".into()),
            name_field: var("ZEE_NAME_FIELD").unwrap_or_else(|| "nom_imovel".into()),
            metadata_path: var("ZEE_METADATA").map(PathBuf::from),
        }
    }

    /// Applique les chemins passés en ligne de commande
    pub fn with_overrides(
        mut self,
        car: Option<PathBuf>,
        zee: Option<PathBuf>,
        apse: Option<PathBuf>,
    ) -> Self {
        if let Some(p) = car {
            self.datasets.car = p;
        }
        if let Some(p) = zee {
            self.datasets.zee = p;
        }
        if let Some(p) = apse {
            self.datasets.apse = p;
        }
        self
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions {
            target_crs: self.target_crs,
            crs_policy: self.crs_policy,
            prefilter: self.prefilter,
            id_field: self.id_field.clone(),
            name_field: self.name_field.clone(),
            ..QueryOptions::default()
        }
    }

    /// Table externe si configurée, sinon table embarquée
    pub fn load_metadata(&self) -> Result<MetadataTable> {
        match &self.metadata_path {
            Some(path) => MetadataTable::load(path)
                .context(format!("Failed to load metadata: {}", path.display())),
            None => MetadataTable::embedded().context("Failed to parse embedded metadata"),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
