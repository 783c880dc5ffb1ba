//! User settings, saved and loaded from the preferences directory.

use scrawl_core::config::Config;

const DOCUMENTATION: &str = r##"# Scrawl settings. You may edit this file, but be aware that formatting and comments will not
# be preserved. Every key is optional, missing keys take their default.

# Examples:
# [render]
# grid_display = false
# [stroke]
# color = "#1e6fd9"
# width = 2.0

"##;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

pub struct Settings {
    failed_to_load: bool,
    pub config: Config,
}
impl Settings {
    const FILENAME: &'static str = "settings.toml";
    /// Load the user's settings, or defaults if unavailable for some reason.
    #[must_use]
    pub fn load() -> Self {
        let mut dir = preferences_dir();
        match dir.as_mut() {
            None => Self::no_path(),
            Some(dir) => {
                dir.push(Self::FILENAME);
                Self::load_or_default(dir)
            }
        }
    }
    #[must_use]
    pub fn no_path() -> Self {
        log::warn!("Settings weren't available, defaulting.");
        Self {
            failed_to_load: true,
            config: Config::default(),
        }
    }
    #[must_use]
    pub fn load_from(path: &std::path::Path) -> Self {
        Self::load_or_default(path)
    }
    fn load_or_default(path: &std::path::Path) -> Self {
        let config = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|string| Ok(Config::from_toml_str(&string)?));

        match config {
            Ok(config) => Self {
                failed_to_load: false,
                config,
            },
            Err(err) => {
                log::warn!("could not load {}: {err}", path.display());
                Self::no_path()
            }
        }
    }
    /// Return true if loading user's settings failed.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    pub fn save(&self) -> anyhow::Result<std::path::PathBuf> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let string = DOCUMENTATION.to_owned() + &self.config.to_toml_string()?;
        std::fs::write(&preferences, string)?;
        Ok(preferences)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn documentation_is_valid_toml() {
        // The header must not change what the file parses to.
        let string = DOCUMENTATION.to_owned() + &Config::default().to_toml_string().unwrap();
        assert!(string.contains(r##"color = "#1e6fd9""##));
        assert_eq!(Config::from_toml_str(&string).unwrap(), Config::default());
    }
    #[test]
    fn missing_file_defaults() {
        let settings = Settings::load_from(std::path::Path::new("/nonexistent/scrawl.toml"));
        assert!(settings.did_fail_to_load());
        assert_eq!(settings.config, Config::default());
    }
}
