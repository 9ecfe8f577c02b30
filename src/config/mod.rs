use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "RosterTui";
const APP_NAME: &str = "rostertui";

pub const CONFIG_ENV: &str = "ROSTERTUI_CONFIG";
pub const DATA_ENV: &str = "ROSTERTUI_DATA";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths);
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub lists_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let override_data = env::var(DATA_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));

        Ok(Self::rooted(config_dir, config_file, data_root, state_dir))
    }

    /// Lays out every derived directory under the given roots.
    pub fn rooted(
        config_dir: PathBuf,
        config_file: PathBuf,
        data_dir: PathBuf,
        state_dir: PathBuf,
    ) -> Self {
        Self {
            lists_dir: data_dir.join("lists"),
            log_dir: state_dir.join("logs"),
            config_dir,
            config_file,
            data_dir,
            state_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.lists_dir,
            &self.log_dir,
            &self.state_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub lists: ListsConfig,
    pub delivery: DeliveryConfig,
    pub ui: UiOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.lists.resolve(paths);
        self.delivery.resolve(paths);
        if self.delivery.workers == 0 {
            tracing::warn!("delivery.workers must be at least 1, using sequential dispatch");
            self.delivery.workers = 1;
        }
        if self.ui.tick_ms == 0 {
            self.ui.tick_ms = UiOptions::default().tick_ms;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListsConfig {
    /// Roster directory; empty means `<data_dir>/lists`.
    pub dir: PathBuf,
    /// Extra picker labels mapped to roster file stems, listed first.
    pub aliases: IndexMap<String, String>,
}

impl Default for ListsConfig {
    fn default() -> Self {
        let mut aliases = IndexMap::new();
        aliases.insert("all".to_string(), "all".to_string());
        Self {
            dir: PathBuf::new(),
            aliases,
        }
    }
}

impl ListsConfig {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.dir.as_os_str().is_empty() {
            self.dir = paths.lists_dir.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub program: String,
    /// Script handed to `program`; empty means `<config_dir>/send_imessage.applescript`.
    pub script: PathBuf,
    pub pause_ms: u64,
    /// Concurrent sends; 1 keeps the visible one-by-one loop.
    pub workers: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            program: "osascript".to_string(),
            script: PathBuf::new(),
            pause_ms: 100,
            workers: 1,
        }
    }
}

impl DeliveryConfig {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.script.as_os_str().is_empty() {
            self.script = paths.config_dir.join("send_imessage.applescript");
        }
    }

    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    /// Sleep between polls that found no input.
    pub tick_ms: u64,
    /// Optional text file drawn above the landing menu.
    pub banner: Option<PathBuf>,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            banner: None,
        }
    }
}

impl UiOptions {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths(root: &Path) -> ConfigPaths {
        ConfigPaths::rooted(
            root.join("config"),
            root.join("config/config.toml"),
            root.join("data"),
            root.join("state"),
        )
    }

    #[test]
    fn first_run_writes_defaults_and_resolves_paths() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(temp.path());
        let loader = ConfigLoader::with_paths(paths.clone());

        let cfg = loader.load_or_init()?;
        assert!(paths.config_file.is_file());
        assert!(paths.lists_dir.is_dir());
        assert_eq!(cfg.lists.dir, paths.lists_dir);
        assert_eq!(
            cfg.delivery.script,
            paths.config_dir.join("send_imessage.applescript")
        );

        let written = fs::read_to_string(&paths.config_file)?;
        assert!(!written.contains("send_imessage"), "{written}");
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults_and_alias_order() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            r#"
[lists.aliases]
pledges = "pledges"
actives = "brothers"

[delivery]
workers = 0
"#,
        )?;

        let cfg = ConfigLoader::with_paths(paths).load()?;
        let labels: Vec<_> = cfg.lists.aliases.keys().cloned().collect();
        assert_eq!(labels, vec!["pledges", "actives"]);
        assert_eq!(cfg.delivery.workers, 1);
        assert_eq!(cfg.delivery.program, "osascript");
        assert_eq!(cfg.ui.tick(), Duration::from_millis(50));
        Ok(())
    }
}
