//! Loads the [`PipelineConfig`] from a user TOML file layered over the
//! crate's built-in defaults, mirroring the teacher's
//! `CompassAppConfig::try_from(&Path)` layering of a bundled
//! `config.default.toml` under the user's file.

use std::path::Path;

use carthorse_core::pipeline::PipelineConfig;
use config::Config;

use crate::error::CarthorseError;

const DEFAULT_CONFIG_TOML: &str = include_str!("config.default.toml");

pub fn load(config_path: &Path) -> Result<PipelineConfig, CarthorseError> {
    let default_source = config::File::from_str(DEFAULT_CONFIG_TOML, config::FileFormat::Toml);
    let user_source = config::File::from(config_path);

    let built = Config::builder()
        .add_source(default_source)
        .add_source(user_source)
        .build()?;

    let pipeline_config: PipelineConfig = built.try_deserialize()?;
    Ok(pipeline_config)
}
