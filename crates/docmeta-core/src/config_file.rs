use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub openai: Option<OpenAiConfig>,
    pub pipeline: Option<PipelineConfig>,
    pub server: Option<ServerConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_prompt_chars: Option<usize>,
    pub extract_timeout_secs: Option<u64>,
    pub generate_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: Option<String>,
    pub max_upload_mb: Option<usize>,
}

/// Platform config directory path: `<config_dir>/docmeta/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docmeta").join("config.toml"))
}

/// Load config by cascading CWD `.docmeta.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".docmeta.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        openai: Some(OpenAiConfig {
            api_key: overlay
                .openai
                .as_ref()
                .and_then(|o| o.api_key.clone())
                .or_else(|| base.openai.as_ref().and_then(|o| o.api_key.clone())),
            base_url: overlay
                .openai
                .as_ref()
                .and_then(|o| o.base_url.clone())
                .or_else(|| base.openai.as_ref().and_then(|o| o.base_url.clone())),
            model: overlay
                .openai
                .as_ref()
                .and_then(|o| o.model.clone())
                .or_else(|| base.openai.as_ref().and_then(|o| o.model.clone())),
        }),
        pipeline: Some(PipelineConfig {
            max_prompt_chars: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.max_prompt_chars)
                .or_else(|| base.pipeline.as_ref().and_then(|p| p.max_prompt_chars)),
            extract_timeout_secs: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.extract_timeout_secs)
                .or_else(|| {
                    base.pipeline
                        .as_ref()
                        .and_then(|p| p.extract_timeout_secs)
                }),
            generate_timeout_secs: overlay
                .pipeline
                .as_ref()
                .and_then(|p| p.generate_timeout_secs)
                .or_else(|| {
                    base.pipeline
                        .as_ref()
                        .and_then(|p| p.generate_timeout_secs)
                }),
        }),
        server: Some(ServerConfig {
            bind_addr: overlay
                .server
                .as_ref()
                .and_then(|s| s.bind_addr.clone())
                .or_else(|| base.server.as_ref().and_then(|s| s.bind_addr.clone())),
            max_upload_mb: overlay
                .server
                .as_ref()
                .and_then(|s| s.max_upload_mb)
                .or_else(|| base.server.as_ref().and_then(|s| s.max_upload_mb)),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_parses() {
        let toml_str = "[openai]\nmodel = \"gpt-4o\"\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        let openai = parsed.openai.unwrap();
        assert_eq!(openai.model.as_deref(), Some("gpt-4o"));
        assert!(openai.api_key.is_none());
        assert!(parsed.pipeline.is_none());
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            pipeline: Some(PipelineConfig {
                max_prompt_chars: Some(1000),
                extract_timeout_secs: Some(30),
                ..Default::default()
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            pipeline: Some(PipelineConfig {
                max_prompt_chars: Some(2000),
                ..Default::default()
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay).pipeline.unwrap();
        assert_eq!(merged.max_prompt_chars, Some(2000));
        assert_eq!(merged.extract_timeout_secs, Some(30));
        assert_eq!(merged.generate_timeout_secs, None);
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            server: Some(ServerConfig {
                bind_addr: Some("127.0.0.1:8080".to_string()),
                max_upload_mb: None,
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(
            merged.server.unwrap().bind_addr.as_deref(),
            Some("127.0.0.1:8080")
        );
    }

    #[test]
    fn missing_file_is_none() {
        let path = std::env::temp_dir().join("docmeta_no_such_config.toml");
        let _ = std::fs::remove_file(&path);
        assert!(load_from_path(&path).is_none());
    }

    #[test]
    fn invalid_file_is_none() {
        let path = std::env::temp_dir().join(format!(
            "docmeta_bad_config_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "[pipeline\nmax_prompt_chars = ").unwrap();
        assert!(load_from_path(&path).is_none());
        let _ = std::fs::remove_file(&path);
    }
}
