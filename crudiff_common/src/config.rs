use crate::{AppConfig, CrudiffError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "crudiff.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
    pub portable: bool,
}

pub fn load_config(prefer_portable: bool) -> Result<LoadedConfig, CrudiffError> {
    let (path, portable) = resolve_config_path(prefer_portable)?;
    let mut loaded = load_config_from(&path)?;
    loaded.config.portable_mode = portable;
    loaded.portable = portable;
    Ok(loaded)
}

/// Load the configuration stored at `path`, falling back to defaults when absent
pub fn load_config_from(path: &Path) -> Result<LoadedConfig, CrudiffError> {
    let exists = path.exists();

    let config = if exists {
        let data = fs::read_to_string(path)?;
        toml::from_str(&data).map_err(|e| CrudiffError::Config(e.to_string()))?
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        portable: config.portable_mode,
        config,
        path: path.to_path_buf(),
        exists,
    })
}

pub fn ensure_config(prefer_portable: bool) -> Result<LoadedConfig, CrudiffError> {
    let loaded = load_config(prefer_portable)?;
    if !loaded.exists {
        save_config(&loaded.path, &loaded.config)?;
    }
    Ok(loaded)
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), CrudiffError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| CrudiffError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

fn resolve_config_path(prefer_portable: bool) -> Result<(PathBuf, bool), CrudiffError> {
    if let Some(portable_path) = portable_config_path() {
        if prefer_portable || portable_path.exists() {
            return Ok((portable_path, true));
        }
    }

    let dirs = ProjectDirs::from("", "aecs4u", "crudiff")
        .ok_or_else(|| CrudiffError::Config("Unable to determine config directory".to_string()))?;
    Ok((dirs.config_dir().join(CONFIG_FILE_NAME), false))
}

fn portable_config_path() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
}
