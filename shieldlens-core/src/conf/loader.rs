use crate::conf::ConfigError;
use crate::conf::types::ShieldlensConfig;
use crate::conf::validate::validate;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "shieldlens.hcl";

/// Load and validate a config.
///
/// `path` may name the file itself or a directory holding `shieldlens.hcl`.
/// Relative paths inside the file resolve against the file's directory.
pub fn load_config(path: &Path) -> Result<ShieldlensConfig, ConfigError> {
    let file = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };

    //--------------------------------------------------------------------------
    // Hard fail: IO and parsing
    //--------------------------------------------------------------------------
    let contents = fs::read_to_string(&file).map_err(|e| ConfigError::read_file(&file, e))?;
    let mut cfg: ShieldlensConfig =
        hcl::from_str(&contents).map_err(|e| ConfigError::parse(&file, e))?;

    let root = file.parent().unwrap_or_else(|| Path::new("."));
    resolve_paths(&mut cfg, root);

    //--------------------------------------------------------------------------
    // Semantic validation (aggregate all errors)
    //--------------------------------------------------------------------------
    validate(&cfg).map_err(|errors| ConfigError::Validation { errors })?;

    Ok(cfg)
}

fn resolve_paths(cfg: &mut ShieldlensConfig, root: &Path) {
    resolve(&mut cfg.sources.access_log, root);

    let optional = [
        &mut cfg.sources.error_log,
        &mut cfg.enrichment.geoip_city_db,
        &mut cfg.enrichment.geoip_isp_db,
        &mut cfg.enrichment.geoip_connection_type_db,
        &mut cfg.enrichment.ua_regexes,
    ];
    for path in optional.into_iter().flatten() {
        resolve(path, root);
    }
}

fn resolve(path: &mut PathBuf, root: &Path) {
    if path.is_relative() {
        *path = root.join(&*path);
    }
}
