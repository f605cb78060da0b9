//! CSV input and output.

use crate::config::PipelineConfig;
use crate::error::{EdaError, Result, ResultExt};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::{debug, info};

/// Load a CSV table with a header row.
///
/// The configured null markers are read as missing values and column types
/// are inferred from `infer_schema_length` rows (`None` = whole file).
pub fn load_csv(path: &Path, config: &PipelineConfig) -> Result<DataFrame> {
    if !path.exists() {
        return Err(EdaError::InputNotFound(path.to_path_buf()));
    }

    let null_values: Vec<PlSmallStr> = config
        .null_values
        .iter()
        .map(|s| PlSmallStr::from(s.as_str()))
        .collect();
    let parse_options = CsvParseOptions::default()
        .with_quote_char(Some(b'"'))
        .with_null_values(Some(NullValues::AllColumns(null_values)));

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(config.infer_schema_length)
        .with_parse_options(parse_options)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening {}", path.display()))?
        .finish()
        .context(format!("Reading {}", path.display()))?;

    info!(
        "Loaded {}: {} rows x {} columns",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Write a table as CSV with a header row and no index column.
///
/// Parent directories are created when missing.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Writing {}", path.display()))?;

    debug!("Wrote {} rows to {}", df.height(), path.display());
    info!("Dataset saved: {}", path.display());
    Ok(())
}
