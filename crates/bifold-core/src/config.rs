use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The optional project config file name.
pub const CONFIG_FILE: &str = "bifold.json";

/// Project configuration for the build driver.
///
/// Loaded from `bifold.json` at the project root when present; every field
/// has a default, so an absent file means a default build (`src/` in,
/// `dist/cjs` + `dist/esm` out).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Directory scanned for `.ts`/`.tsx` sources.
    pub src_dir: PathBuf,

    /// Base output directory; the two passes write to `<outDir>/cjs` and
    /// `<outDir>/esm`.
    pub out_dir: PathBuf,

    /// Output file extension for the ESM pass (without the dot).
    pub esm_out_extension: String,

    /// Glob patterns excluded from source discovery.
    pub ignore: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("src"),
            out_dir: PathBuf::from("dist"),
            esm_out_extension: "mjs".to_string(),
            ignore: vec![
                "**/node_modules/**".to_string(),
                "**/*.test.ts".to_string(),
                "**/*.test.tsx".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load the config from an explicit file path.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `bifold.json` from the project root, falling back to defaults
    /// when the file does not exist. A present-but-malformed file is an
    /// error, never a silent fallback.
    pub fn load_or_default(cwd: &Path) -> Result<Self, Error> {
        let path = cwd.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Set the source directory.
    #[must_use]
    pub fn with_src_dir(mut self, src_dir: impl Into<PathBuf>) -> Self {
        self.src_dir = src_dir.into();
        self
    }

    /// Set the base output directory.
    #[must_use]
    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = out_dir.into();
        self
    }

    /// Output directory for the CommonJS pass.
    #[must_use]
    pub fn cjs_out_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.out_dir).join("cjs")
    }

    /// Output directory for the ESM pass.
    #[must_use]
    pub fn esm_out_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.out_dir).join("esm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.src_dir, PathBuf::from("src"));
        assert_eq!(config.out_dir, PathBuf::from("dist"));
        assert_eq!(config.esm_out_extension, "mjs");
        assert!(config.ignore.iter().any(|p| p.contains("node_modules")));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(config.src_dir, PathBuf::from("src"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"srcDir": "lib", "esmOutExtension": "js"}"#,
        )
        .unwrap();

        let config = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(config.src_dir, PathBuf::from("lib"));
        assert_eq!(config.esm_out_extension, "js");
        assert_eq!(config.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();

        let err = Config::load_or_default(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_out_dirs() {
        let config = Config::default();
        let cwd = Path::new("/project");
        assert_eq!(config.cjs_out_dir(cwd), PathBuf::from("/project/dist/cjs"));
        assert_eq!(config.esm_out_dir(cwd), PathBuf::from("/project/dist/esm"));
    }
}
