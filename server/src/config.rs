use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use plots::settings::Settings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory of the plot database.
    pub db_path: PathBuf,
    /// Radius in chunks around the origin generated before players join.
    pub pregenerate_radius: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: 19132,
            db_path: PathBuf::from("plots"),
            pregenerate_radius: 4,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub plots: Settings,
}

impl Config {
    /// Reads the config file, writing one with the default values first if there is none.
    pub fn load_or_init(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            let config = Config::default();
            let text = toml::to_string_pretty(&config).context("could not serialize default config")?;
            fs::write(path, text).with_context(|| format!("could not write {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote default config");
            return Ok(config);
        }

        let text = fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?;
        let config: Config = toml::from_str(&text).with_context(|| format!("could not parse {}", path.display()))?;
        if let Err(e) = config.plots.validate() {
            bail!("invalid plot settings in {}: {e}", path.display());
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use plots::{block::Block, colour::Colour};

    use super::*;

    #[test]
    fn missing_file_is_written_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.toml");

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(Config::load_or_init(&path).unwrap(), config);
    }

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.toml");
        fs::write(&path, "[server]\nport = 1302\n\n[plots]\nplot_width = 64\nroad_block = { type = \"wool\", colour = \"black\" }\n").unwrap();

        let config = Config::load_or_init(&path).unwrap();
        assert_eq!(config.server.port, 1302);
        assert_eq!(config.server.db_path, PathBuf::from("plots"));
        assert_eq!(config.plots.plot_width, 64);
        assert_eq!(config.plots.maximum_plots, 16);
        assert_eq!(config.plots.road_block, Block::Wool { colour: Colour::Black });
    }

    #[test]
    fn invalid_width_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots.toml");
        fs::write(&path, "[plots]\nplot_width = 0\n").unwrap();
        assert!(Config::load_or_init(&path).is_err());
    }
}
