//! Pipeline de consultation : CAR → ZEE / APSE

use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, info_span, warn};
use zee_overlay::{
    aggregate, align_feature, clip_to_bbox, find_property, intersect, AreaShare, Crs, CrsPolicy,
    Feature, FeatureCollection, Fragment, DatasetLoader, LayerCache, LayerSource, NormalizedCache,
    OverlayError,
};

use crate::compose::{compose, PropertyInfo, QueryResult};
use crate::metadata::MetadataTable;
use crate::ConsultaError;

/// Chemins des trois jeux de données
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datasets {
    /// Registre des imóveis (CAR)
    pub car: PathBuf,
    /// Zonage ZEE
    pub zee: PathBuf,
    /// Áreas prioritárias (APSE)
    pub apse: PathBuf,
}

/// Paramètres de la consultation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// CRS métrique des calculs de surface
    pub target_crs: Crs,
    pub crs_policy: CrsPolicy,
    /// Pré-filtre par emprise avant l'overlay
    pub prefilter: bool,
    /// Colonne du numéro CAR
    pub id_field: String,
    /// Colonne du nom de l'imóvel
    pub name_field: String,
    /// Colonne de catégorie du ZEE
    pub zoning_field: String,
    /// Colonne de catégorie des APSE
    pub service_field: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            target_crs: Crs::BRAZIL_POLYCONIC,
            crs_policy: CrsPolicy::Strict,
            prefilter: true,
            id_field: "numero_car".into(),
            name_field: "nom_imovel".into(),
            zoning_field: "zona".into(),
            service_field: "serv_ecos".into(),
        }
    }
}

/// Issue d'une consultation : les cas métier ne sont pas des erreurs
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Found(Box<QueryResult>),
    /// Aucun imóvel avec ce numéro
    NotFound { identifier: String },
    /// Imóvel hors de toute zone du ZEE
    NoOverlap { identifier: String },
}

/// Service de consultation, partageable entre threads
///
/// Les couches de référence passent par une [`LayerSource`] (cache par
/// défaut) et leur version reprojetée est gardée d'une requête à l'autre ;
/// le registre CAR est relu à chaque requête.
pub struct Consulta {
    reference: Arc<dyn LayerSource>,
    registry: Arc<dyn LayerSource>,
    normalized: NormalizedCache,
    metadata: Arc<MetadataTable>,
    options: QueryOptions,
}

impl Consulta {
    pub fn new(metadata: MetadataTable, options: QueryOptions) -> Self {
        Self {
            reference: Arc::new(LayerCache::new(DatasetLoader)),
            registry: Arc::new(DatasetLoader),
            normalized: NormalizedCache::new(),
            metadata: Arc::new(metadata),
            options,
        }
    }

    /// Remplace la source des couches ZEE / APSE
    pub fn with_reference_source(mut self, source: Arc<dyn LayerSource>) -> Self {
        self.reference = source;
        self
    }

    /// Remplace la source du registre CAR
    pub fn with_registry_source(mut self, source: Arc<dyn LayerSource>) -> Self {
        self.registry = source;
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn metadata(&self) -> &MetadataTable {
        &self.metadata
    }

    /// Nombre de couches normalisées gardées en mémoire
    pub fn normalized_layers(&self) -> usize {
        self.normalized.len()
    }

    /// Exécute une consultation complète
    ///
    /// # Errors
    ///
    /// Fichiers absents ou invalides, CRS indéfini ou non supporté.
    pub fn query(&self, identifier: &str, datasets: &Datasets) -> Result<QueryOutcome, ConsultaError> {
        self.run(identifier, datasets).map(|(outcome, _)| outcome)
    }

    /// Comme [`Consulta::query`], en renvoyant aussi les fragments (export)
    pub fn query_with_fragments(
        &self,
        identifier: &str,
        datasets: &Datasets,
    ) -> Result<(QueryOutcome, Option<OverlayFragments>), ConsultaError> {
        self.run(identifier, datasets)
    }

    fn run(
        &self,
        identifier: &str,
        datasets: &Datasets,
    ) -> Result<(QueryOutcome, Option<OverlayFragments>), ConsultaError> {
        let span = info_span!("query", car = identifier);
        let _guard = span.enter();
        let started_at = Instant::now();
        let opts = &self.options;

        let registry = self.registry.load(&datasets.car)?;
        let zee_raw = self.reference.load(&datasets.zee)?;
        let apse_raw = self.reference.load(&datasets.apse)?;

        let property = match find_property(&registry, &opts.id_field, identifier) {
            Ok(feature) => feature,
            Err(OverlayError::PropertyNotFound(_)) => {
                info!("CAR not found");
                return Ok((
                    QueryOutcome::NotFound {
                        identifier: identifier.to_string(),
                    },
                    None,
                ));
            }
            Err(e) => return Err(e.into()),
        };

        let zee = self.normalized.get_or_normalize(
            &datasets.zee,
            &zee_raw,
            opts.target_crs,
            opts.crs_policy,
        )?;
        let work_crs = zee.crs.ok_or_else(|| {
            OverlayError::reprojection(&zee.name, "undefined CRS after normalization")
        })?;

        let property = align_feature(property, registry.crs, work_crs, &registry.name)?;
        let apse = self.normalized.get_or_normalize(
            &datasets.apse,
            &apse_raw,
            work_crs,
            CrsPolicy::Strict,
        )?;

        let total_area_ha = property.area_ha();
        debug!(total_area_ha, crs = %work_crs, "Property aligned");

        let mut warnings = Vec::new();

        let zee_fragments = self.overlay_layer(&property, &zee, &opts.zoning_field, &mut warnings);
        let zee_shares = shares(zee_fragments.as_deref(), &opts.zoning_field, total_area_ha);

        if zee_fragments.is_some() && zee_shares.is_empty() {
            info!("Property outside the zoning layer");
            return Ok((
                QueryOutcome::NoOverlap {
                    identifier: identifier.to_string(),
                },
                None,
            ));
        }

        let apse_fragments = self.overlay_layer(&property, &apse, &opts.service_field, &mut warnings);
        let apse_shares = shares(apse_fragments.as_deref(), &opts.service_field, total_area_ha);

        let identity = PropertyInfo {
            identifier: identifier.to_string(),
            name: property.get(&opts.name_field).unwrap_or_default().to_string(),
            total_area_ha,
            crs: work_crs,
        };

        let mut result = compose(identity, zee_shares, apse_shares, &self.metadata);
        result.warnings = warnings;

        info!(
            zee = result.zee_overlaps.len(),
            apse = result.apse_overlaps.len(),
            elapsed = ?started_at.elapsed(),
            "Query done"
        );

        let fragments = OverlayFragments {
            crs: work_crs,
            zee: zee_fragments.unwrap_or_default(),
            apse: apse_fragments.unwrap_or_default(),
        };

        Ok((QueryOutcome::Found(Box::new(result)), Some(fragments)))
    }

    /// Overlay d'une couche ; `None` si la colonne de catégorie manque
    fn overlay_layer(
        &self,
        property: &Feature,
        layer: &FeatureCollection,
        field: &str,
        warnings: &mut Vec<String>,
    ) -> Option<Vec<Fragment>> {
        if !layer.has_field(field) {
            let err = OverlayError::missing_field(&layer.name, field);
            warn!(layer = %layer.name, field, "{}", err);
            warnings.push(err.to_string());
            return None;
        }

        let candidates = match (self.options.prefilter, property.bounding_rect()) {
            (true, Some(bbox)) => Cow::Owned(clip_to_bbox(layer, &bbox)),
            _ => Cow::Borrowed(layer),
        };

        Some(intersect(property, &candidates))
    }
}

fn shares(fragments: Option<&[Fragment]>, field: &str, total_area_ha: f64) -> Vec<AreaShare> {
    fragments
        .map(|f| aggregate(f, field, total_area_ha))
        .unwrap_or_default()
}

/// Fragments bruts d'une consultation réussie
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFragments {
    pub crs: Crs,
    pub zee: Vec<Fragment>,
    pub apse: Vec<Fragment>,
}

/// Consultation ponctuelle avec la table embarquée et les options par défaut
pub fn query(
    identifier: &str,
    property_dataset: &Path,
    zoning_dataset: &Path,
    service_dataset: &Path,
) -> Result<QueryOutcome, ConsultaError> {
    let consulta = Consulta::new(MetadataTable::embedded()?, QueryOptions::default());
    let datasets = Datasets {
        car: property_dataset.to_path_buf(),
        zee: zoning_dataset.to_path_buf(),
        apse: service_dataset.to_path_buf(),
    };
    consulta.query(identifier, &datasets)
}
