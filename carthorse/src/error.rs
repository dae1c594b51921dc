use thiserror::Error;

use carthorse_core::pipeline::PipelineError;

/// top-level CLI error, wrapping every failure mode between reading the
/// config/input files and writing the output database (spec.md §7, CLI
/// supplement).
#[derive(Error, Debug)]
pub enum CarthorseError {
    #[error("i/o error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("could not read csv input: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("could not parse json: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("could not read geojson: {source}")]
    GeoJson {
        #[from]
        source: geojson::Error,
    },

    #[error("invalid trail geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("could not load configuration: {source}")]
    Configuration {
        #[from]
        source: config::ConfigError,
    },

    #[error("pipeline failure: {source}")]
    Pipeline {
        #[from]
        source: PipelineError,
    },

    #[error("could not write output database: {source}")]
    Sqlite {
        #[from]
        source: rusqlite::Error,
    },

    #[error("unsupported input format for file: {path}")]
    UnsupportedInputFormat { path: String },
}
