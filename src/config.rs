use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detection::DetectorOptions;
use crate::error::{Error, Result};
use crate::render::RenderOptions;

/// Runtime configuration, usually read from a TOML file.
///
/// Every section and field is optional; missing values fall back to [`Default`].
///
/// ```toml
/// [detector]
/// max_results = 50
/// score_threshold = 0.3
///
/// [render]
/// box_color = [255, 0, 0]
/// stroke_width = 4
/// draw_path = true
/// path_saturation = 0.9
/// path_lightness = 0.5
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub detector: DetectorOptions,
    pub render: RenderOptions,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }
}
