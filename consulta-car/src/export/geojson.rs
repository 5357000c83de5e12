//! Export des fragments d'overlay vers GeoJSON avec geozero (streaming)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::Geometry;
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use tracing::debug;
use zee_overlay::{Crs, Fragment};

use crate::query::OverlayFragments;

/// Écrit `<CAR>_zee.geojson` et `<CAR>_apse.geojson` dans `output_dir`
///
/// Retourne les chemins écrits.
pub fn export_fragments(
    identifier: &str,
    fragments: &OverlayFragments,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .context(format!("Failed to create directory: {}", output_dir.display()))?;

    let stem = file_stem(identifier);
    let mut written = Vec::with_capacity(2);

    for (suffix, layer) in [("zee", &fragments.zee), ("apse", &fragments.apse)] {
        let path = output_dir.join(format!("{}_{}.geojson", stem, suffix));
        export_to_geojson(layer, fragments.crs, &path)?;
        debug!(path = %path.display(), fragments = layer.len(), "Fragments written");
        written.push(path);
    }

    Ok(written)
}

/// Exporte des fragments en FeatureCollection GeoJSON
pub fn export_to_geojson(fragments: &[Fragment], crs: Crs, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    // Header FeatureCollection avec CRS
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"{}"}}}},"features":["#,
        crs.urn()
    )?;

    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_fragment(&mut writer, fragment)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

fn write_fragment<W: Write>(writer: &mut W, fragment: &Fragment) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":{},"geometry":"#,
        serde_json::to_string(&fragment.source_id)?
    )?;

    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    Geometry::MultiPolygon(fragment.geometry.clone()).process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    // Propriétés triées pour une sortie stable
    let mut attributes: Vec<(&str, &str)> = fragment.attributes().into_iter().collect();
    attributes.sort_unstable();

    write!(writer, r#","properties":{{"area_m2":{}"#, fragment.area())?;
    for (key, value) in attributes {
        write!(
            writer,
            ",{}:{}",
            serde_json::to_string(key)?,
            serde_json::to_string(value)?
        )?;
    }
    write!(writer, "}}}}")?;

    Ok(())
}

/// Numéro CAR utilisable comme nom de fichier
fn file_stem(identifier: &str) -> String {
    identifier
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
