use crate::error::{AppError, Result};
use crate::gather::{CollectOptions, PathStyle};
use crate::generation::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::rules::DEFAULT_RULES_FILE;
use log;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = ".xtools/treeprompt";
pub const DEFAULT_CONFIG_FILENAME: &str = "treeprompt.toml";
pub const DEFAULT_PROMPT_FILENAME: &str = "Prompt.md";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default = "default_rules_file")]
    pub rules_file: String,
    #[serde(default)]
    pub absolute_paths: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

fn default_rules_file() -> String {
    DEFAULT_RULES_FILE.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            rules_file: default_rules_file(),
            absolute_paths: false,
        }
    }
}
impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            prompt_file: None,
        }
    }
}

impl Config {
    pub fn determine_project_root(cli_project_root: Option<&PathBuf>) -> Result<PathBuf> {
        let path_str_opt = cli_project_root
            .map(|p| p.to_string_lossy().to_string())
            .or_else(|| env::var("PROJECT_ROOT").ok().filter(|s| !s.is_empty()));

        let path_to_resolve = match path_str_opt {
            Some(p_str) => PathBuf::from(shellexpand::tilde(&p_str).as_ref()),
            None => env::current_dir().map_err(AppError::Io)?,
        };

        path_to_resolve.canonicalize().map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to canonicalize project root '{}': {}",
                    path_to_resolve.display(),
                    e
                ),
            ))
        })
    }

    pub fn resolve_config_path(
        project_root: &Path,
        cli_config_file: Option<&String>,
        cli_disable_config: bool,
    ) -> Result<Option<PathBuf>> {
        if cli_disable_config {
            log::debug!("Config file loading disabled via CLI flag.");
            return Ok(None);
        }

        match cli_config_file {
            Some(p_str) => {
                let mut path = PathBuf::from(shellexpand::tilde(p_str).as_ref());
                if !path.is_absolute() && path.components().count() == 1 {
                    path = project_root.join(DEFAULT_CONFIG_DIR).join(path);
                }
                if !path.exists() && path.extension().is_none() {
                    path.set_extension("toml");
                }
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Specified config file not found at path: {}",
                        path.display()
                    )));
                }
                log::debug!("Using specified config file path: {}", path.display());
                Ok(Some(path))
            }
            None => {
                let default_path = project_root
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILENAME);
                if default_path.exists() {
                    log::debug!("Using default config file path: {}", default_path.display());
                    Ok(Some(default_path))
                } else {
                    log::debug!(
                        "No config file specified and default not found at: {}",
                        default_path.display()
                    );
                    Ok(None)
                }
            }
        }
    }

    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        log::info!("Loading configuration from: {}", config_path.display());
        let toml_content = fs::read_to_string(config_path).map_err(|e| AppError::FileRead {
            path: config_path.to_path_buf(),
            source: e,
        })?;
        toml::from_str::<Config>(&toml_content).map_err(|e| {
            AppError::TomlParse(format!(
                "Error parsing config file '{}': {}. Check TOML syntax and structure.",
                config_path.display(),
                e
            ))
        })
    }

    pub fn collect_options(&self) -> CollectOptions {
        CollectOptions {
            rules_file: self.general.rules_file.clone(),
            path_style: if self.general.absolute_paths {
                PathStyle::Absolute
            } else {
                PathStyle::Relative
            },
        }
    }

    /// Prompt file from config (tilde-expanded), else `Prompt.md` next to
    /// the running executable.
    pub fn effective_prompt_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.generation.prompt_file {
            let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
            return Ok(PathBuf::from(expanded));
        }
        let exe = env::current_exe().map_err(|e| {
            AppError::Config(format!("Could not determine executable location: {}", e))
        })?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(DEFAULT_PROMPT_FILENAME))
    }
}

/// Reads the whole prompt file; failure is a configuration error.
pub fn read_prompt_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| AppError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = Config::default();
        assert_eq!(config.general.rules_file, ".gitignore");
        assert!(!config.general.absolute_paths);
        assert_eq!(config.generation.model, "gpt-oss");
        assert_eq!(
            config.generation.endpoint,
            "http://localhost:11434/api/generate"
        );
        assert_eq!(config.collect_options().path_style, PathStyle::Relative);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            "[generation]\nmodel = \"llama3\"\n\n[general]\nabsolute_paths = true\n",
        )
        .unwrap();
        assert_eq!(config.generation.model, "llama3");
        assert_eq!(config.generation.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.general.rules_file, DEFAULT_RULES_FILE);
        assert_eq!(config.collect_options().path_style, PathStyle::Absolute);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[generation]\ntemperature = 1\n").unwrap();
        assert!(matches!(
            Config::load_from_path(&path),
            Err(AppError::TomlParse(_))
        ));
    }

    #[test]
    fn default_config_path_is_found() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join(DEFAULT_CONFIG_FILENAME), "").unwrap();

        let resolved = Config::resolve_config_path(dir.path(), None, false).unwrap();
        assert_eq!(resolved, Some(config_dir.join(DEFAULT_CONFIG_FILENAME)));
        assert_eq!(
            Config::resolve_config_path(dir.path(), None, true).unwrap(),
            None
        );
    }

    #[test]
    fn bare_config_name_resolves_in_default_dir() {
        let dir = TempDir::new().unwrap();
        let config_dir = dir.path().join(DEFAULT_CONFIG_DIR);
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(config_dir.join("work.toml"), "").unwrap();

        let name = "work".to_string();
        let resolved = Config::resolve_config_path(dir.path(), Some(&name), false).unwrap();
        assert_eq!(resolved, Some(config_dir.join("work.toml")));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let name = "nope.toml".to_string();
        assert!(Config::resolve_config_path(dir.path(), Some(&name), false).is_err());
    }

    #[test]
    fn prompt_file_from_config_wins() {
        let mut config = Config::default();
        config.generation.prompt_file = Some(PathBuf::from("/tmp/prompt.md"));
        assert_eq!(
            config.effective_prompt_file().unwrap(),
            PathBuf::from("/tmp/prompt.md")
        );
    }

    #[test]
    fn default_prompt_file_sits_next_to_executable() {
        let path = Config::default().effective_prompt_file().unwrap();
        assert_eq!(path.file_name().unwrap(), DEFAULT_PROMPT_FILENAME);
    }

    #[test]
    fn unreadable_prompt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("Prompt.md");
        assert!(matches!(
            read_prompt_file(&missing),
            Err(AppError::FileRead { .. })
        ));
        fs::write(&missing, "Write a README.").unwrap();
        assert_eq!(read_prompt_file(&missing).unwrap(), "Write a README.");
    }
}
