//! Dataset loading and run bundle output (JSON).

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use contracts::{Dataset, RunBundle};
use tracing::{debug, info};

use crate::error::{CliError, Result};

/// Load a dataset exported as JSON
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(CliError::not_found("Dataset", path));
    }

    let reader = BufReader::new(File::open(path)?);
    let dataset: Dataset =
        serde_json::from_reader(reader).map_err(|source| CliError::DatasetParse {
            path: path.to_path_buf(),
            source,
        })?;

    info!(
        path = %path.display(),
        station = %dataset.station_id,
        channels = dataset.channels.len(),
        location = dataset.location.is_some(),
        sync_exchanges = dataset.synchronization.len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Write the bundle as pretty JSON (missing values become `null`)
pub fn write_bundle(bundle: &RunBundle, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, bundle).map_err(CliError::BundleWrite)?;
    writer.flush()?;

    debug!(path = %path.display(), meshes = bundle.mesh_count(), "Run bundle written");
    Ok(())
}
