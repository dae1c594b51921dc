use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use log::info;

use carthorse_core::pipeline::{PipelineContext, RawTrail};

use crate::error::CarthorseError;
use crate::{config, export, ingest};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Geojson,
}

/// builds a per-region routable trail database from raw trail polylines.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// pipeline configuration TOML file
    #[arg(short, long, value_name = "*.toml")]
    pub config_file: PathBuf,

    /// raw trail input file (CSV or GeoJSON)
    #[arg(short, long, value_name = "FILE")]
    pub input_file: PathBuf,

    /// input format; inferred from the input file's extension if omitted
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<InputFormat>,

    /// directory the output database and GeoJSON sidecars are written to
    #[arg(short, long, value_name = "DIR", default_value = "output")]
    pub output_dir: PathBuf,
}

impl CliArgs {
    fn resolve_format(&self) -> Result<InputFormat, CarthorseError> {
        if let Some(format) = self.format {
            return Ok(format);
        }
        match self.input_file.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Ok(InputFormat::Csv),
            Some("geojson") | Some("json") => Ok(InputFormat::Geojson),
            _ => Err(CarthorseError::UnsupportedInputFormat {
                path: self.input_file.display().to_string(),
            }),
        }
    }
}

/// loads configuration, reads the raw trail input, runs the full pipeline,
/// and writes the resulting tables to `output_dir`.
pub fn command_line_runner(args: &CliArgs) -> Result<(), CarthorseError> {
    let pipeline_config = config::load(&args.config_file)?;
    info!(
        "loaded configuration for region '{}'",
        pipeline_config.region_key
    );

    let raw_trails = read_input(&args.input_file, args.resolve_format()?)?;
    info!("read {} raw trail(s) from {}", raw_trails.len(), args.input_file.display());

    let mut ctx = PipelineContext::new(pipeline_config);
    let report = carthorse_core::pipeline::run_all(raw_trails, &mut ctx)?;
    info!(
        "pipeline complete: {} trails prepared, {} vertices / {} edges noded, {} routes emitted",
        report.preparer.accepted,
        report.noder.n_vertices,
        report.noder.n_edges,
        report.route_enumerator.candidates_emitted,
    );

    export::write_all(&ctx.workspace, &args.output_dir)?;
    info!("wrote output database and geojson sidecars to {}", args.output_dir.display());

    Ok(())
}

fn read_input(path: &Path, format: InputFormat) -> Result<Vec<RawTrail>, CarthorseError> {
    match format {
        InputFormat::Csv => ingest::read_csv(path),
        InputFormat::Geojson => ingest::read_geojson(path),
    }
}
