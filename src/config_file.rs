use anyhow::{anyhow, Context, Result};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_FILE: &str = ".profcsvrc";
const MAX_ALIAS_DEPTH: usize = 10;

/// Configuration file handler for profcsv
#[derive(Debug, Default)]
pub struct ConfigFile {
    pub defaults: Option<String>,
    pub aliases: HashMap<String, String>,
}

impl ConfigFile {
    /// Find project-level .profcsvrc by walking up from `start`
    pub fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let config_path = current.join(PROJECT_FILE);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    pub fn find_project_config() -> Option<PathBuf> {
        Self::find_project_config_from(&env::current_dir().ok()?)
    }

    /// User config file locations in order of preference
    pub fn user_config_paths() -> Vec<PathBuf> {
        let home = env::var_os("HOME").map(PathBuf::from);
        let xdg_config = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| home.as_ref().map(|h| h.join(".config")));

        let mut paths = Vec::new();
        if let Some(xdg_config) = xdg_config {
            paths.push(xdg_config.join("profcsv").join("config.ini"));
        }
        if let Some(home) = home {
            paths.push(home.join(PROJECT_FILE));
        }
        paths
    }

    /// Load configuration with precedence: project > user
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::user_config_paths().into_iter().find(|p| p.is_file()) {
            config = config.merge(Self::load_from_path(&path)?);
        }
        if let Some(path) = Self::find_project_config() {
            config = config.merge(Self::load_from_path(&path)?);
        }

        Ok(config)
    }

    /// Load configuration, from `custom_path` alone when one is given
    pub fn load_with_custom_path(custom_path: Option<&str>) -> Result<Self> {
        match custom_path {
            Some(path) => Self::load_from_path(Path::new(path)),
            None => Self::load(),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        debug!("loaded config file {}", path.display());
        Self::parse_ini_content(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    fn parse_ini_content(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut section = String::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_string();
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| anyhow!("line {}: expected 'key = value'", number + 1))?;
            let (key, value) = (key.trim(), value.trim());

            match section.as_str() {
                "" if key == "defaults" => config.defaults = Some(value.to_string()),
                "aliases" => {
                    config.aliases.insert(key.to_string(), value.to_string());
                }
                // Unknown keys and sections are ignored
                _ => {}
            }
        }

        Ok(config)
    }

    /// Combine two configurations, `overlay` winning on conflicts
    fn merge(mut self, overlay: Self) -> Self {
        self.defaults = overlay.defaults.or(self.defaults);
        self.aliases.extend(overlay.aliases);
        self
    }

    /// Resolve one alias into arguments, expanding nested aliases
    pub fn resolve_alias(
        &self,
        name: &str,
        seen: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        if depth > MAX_ALIAS_DEPTH {
            return Err(anyhow!("Alias chain too deep: {} levels", depth));
        }
        if !seen.insert(name.to_string()) {
            return Err(anyhow!("Circular dependency detected in alias: {}", name));
        }

        let value = self
            .aliases
            .get(name)
            .ok_or_else(|| anyhow!("Unknown alias: {}", name))?;
        let args = shell_words::split(value)
            .with_context(|| format!("Invalid alias '{}': failed to parse arguments", name))?;

        let resolved = self.expand_aliases(args, seen, depth + 1)?;
        seen.remove(name);
        Ok(resolved)
    }

    fn expand_aliases(
        &self,
        args: Vec<String>,
        seen: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<String>> {
        let mut result = Vec::with_capacity(args.len());
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            if arg == "-a" || arg == "--alias" {
                match args.next() {
                    Some(name) => result.extend(self.resolve_alias(&name, seen, depth)?),
                    None => result.push(arg),
                }
            } else {
                result.push(arg);
            }
        }
        Ok(result)
    }

    /// Apply `defaults` after the program name, then expand every alias
    pub fn process_args(&self, args: Vec<String>) -> Result<Vec<String>> {
        let mut args = args.into_iter();
        let mut combined: Vec<String> = args.next().into_iter().collect();

        if let Some(defaults) = &self.defaults {
            let default_args = shell_words::split(defaults)
                .context("Invalid defaults: failed to parse arguments")?;
            combined.extend(default_args);
        }
        combined.extend(args);

        self.expand_aliases(combined, &mut HashSet::new(), 0)
    }
}
