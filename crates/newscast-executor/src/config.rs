use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use newscast_bridge::config::Config;
use tokio::{
    fs::{OpenOptions, create_dir_all, read_to_string},
    io::AsyncWriteExt,
};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No home directory could be resolved for the current user.
    #[error("failed to locate the user's config and data directories")]
    DirectoriesNotFound,
    #[error("failed to access config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    DeserializeError(#[from] toml::de::Error),
    #[error("failed to write default config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("dev", "newscast", "newscast").ok_or(ConfigError::DirectoriesNotFound)
}

/// Directory holding the persisted playback snapshot.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// `config.toml` from the per-user config directory, plus the data directory.
pub async fn load_config() -> Result<(Config, PathBuf), ConfigError> {
    let dirs = project_dirs()?;
    let config = load_config_at(&dirs.config_dir().join("config.toml")).await?;
    Ok((config, dirs.data_dir().to_path_buf()))
}

/// Read the config at `config_path`. A missing file is created holding the
/// defaults; missing fields take their defaults.
pub async fn load_config_at(config_path: &Path) -> Result<Config, ConfigError> {
    log::info!("Loading configuration from {config_path:?}");
    let config = if config_path.exists() {
        toml::from_str(&read_to_string(config_path).await?)?
    } else {
        write_defaults(config_path).await?
    };

    validate(&config)?;
    Ok(config)
}

async fn write_defaults(config_path: &Path) -> Result<Config, ConfigError> {
    let config = Config::default();
    if let Some(parent) = config_path.parent() {
        create_dir_all(parent).await?;
    }

    let contents = toml::to_string_pretty(&config)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(config_path)
        .await?;
    file.write_all(contents.as_bytes()).await?;
    file.sync_all().await?;

    log::info!("Wrote default configuration to {config_path:?}");
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.bus.command_timeout_ms == 0 {
        return Err(ConfigError::Invalid("bus.command_timeout_ms must be positive"));
    }
    if config.service.request_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "service.request_timeout_secs must be positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use newscast_bridge::{
        StyleId,
        config::{AudioOutput, AutoplayPolicy},
    };

    use super::*;

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = load_config_at(&path).await.unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());
        assert_eq!(load_config_at(&path).await.unwrap(), Config::default());
    }

    #[tokio::test]
    async fn partial_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[playback]\noutput = \"headless\"\nautoplay = \"requiresGesture\"\n\n[panel]\ndefault_style = \"RAP\"\n",
        )
        .unwrap();

        let config = load_config_at(&path).await.unwrap();
        assert_eq!(config.playback.output, AudioOutput::Headless);
        assert_eq!(config.playback.autoplay, AutoplayPolicy::RequiresGesture);
        assert_eq!(config.playback.assumed_bitrate_kbps, 128);
        assert_eq!(config.panel.default_style, StyleId::Rap);
        assert_eq!(config.service, Default::default());
    }

    #[tokio::test]
    async fn zero_timeouts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bus]\ncommand_timeout_ms = 0\n").unwrap();

        assert!(matches!(
            load_config_at(&path).await,
            Err(ConfigError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[playback]\nautoplay = \"sometimes\"\n").unwrap();

        assert!(matches!(
            load_config_at(&path).await,
            Err(ConfigError::DeserializeError(_))
        ));
    }
}
