use std::collections::HashMap;
use std::path::Path;

use config_parser::FromYaml;
use config_parser_derive::FromYaml;

use crate::error::Result;

/// Optional `config.yaml` overlay sitting next to the web root. Every
/// field is optional: a missing file, or a missing field within it,
/// just means "use the CLI-derived default".
#[derive(Debug, Default, FromYaml)]
pub struct ConfigOverlay {
    pub default_file: Option<String>,
    pub directory_listing: Option<bool>,
    pub mime_overrides: Option<HashMap<String, String>>,
}

impl ConfigOverlay {
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        let overlay = ConfigOverlay::from_str(&raw)?;
        Ok(Some(overlay))
    }
}
