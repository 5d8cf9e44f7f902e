use anyhow::Context;
use radiocore::radio::UsrpConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Radio link endpoints, loadable from YAML. Tuning parameters come from
/// the command line; only the transport addresses live in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub bind_addr: String,
    pub remote_addr: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:0".into(),
            remote_addr: "127.0.0.1:9940".into(),
        }
    }
}

impl LinkConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading link config {}", path_ref.display()))?;
        let config: LinkConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing link config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Loads the given file, or falls back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn into_usrp(self, center_freq: f64, sample_rate: f64) -> UsrpConfig {
        UsrpConfig {
            center_freq,
            sample_rate,
            bind_addr: self.bind_addr,
            remote_addr: self.remote_addr,
        }
    }
}
