//! `bifold build` command implementation.
//!
//! Runs the two build passes over the project's sources: a per-file
//! CommonJS compilation into `dist/cjs`, then the bundled ESM pass into
//! `dist/esm` with the file-path-extensions plugin rewriting relative
//! imports to carry explicit `.mjs` extensions.

use bifold_core::engine::{BuildOptions, Engine, FileExtensionsPlugin, Format, Platform};
use bifold_core::{Config, Error};
use miette::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Build command action.
#[derive(Debug, Clone)]
pub struct BuildAction {
    /// Working directory (the project root).
    pub cwd: PathBuf,
}

/// JSON output for the build command.
#[derive(Serialize)]
struct BuildResultJson {
    ok: bool,
    cwd: String,
    sources: usize,
    cjs_files: usize,
    esm_files: usize,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BuildErrorJson>,
}

#[derive(Serialize)]
struct BuildErrorJson {
    message: String,
}

/// Run the build command.
pub fn run(action: BuildAction, json: bool) -> Result<()> {
    let start = Instant::now();
    let result = run_passes(&action, json);
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(counts) => {
            if json {
                let json_result = BuildResultJson {
                    ok: true,
                    cwd: action.cwd.display().to_string(),
                    sources: counts.sources,
                    cjs_files: counts.cjs_files,
                    esm_files: counts.esm_files,
                    duration_ms,
                    error: None,
                };
                println!("{}", serde_json::to_string(&json_result).unwrap());
            } else {
                println!(
                    "  {} sources -> {} cjs + {} esm files ({}ms)",
                    counts.sources, counts.cjs_files, counts.esm_files, duration_ms
                );
            }
            Ok(())
        }
        Err(e) => {
            if json {
                let json_result = BuildResultJson {
                    ok: false,
                    cwd: action.cwd.display().to_string(),
                    sources: 0,
                    cjs_files: 0,
                    esm_files: 0,
                    duration_ms,
                    error: Some(BuildErrorJson {
                        message: e.to_string(),
                    }),
                };
                println!("{}", serde_json::to_string(&json_result).unwrap());
            } else {
                eprintln!("error: {e}");
            }
            std::process::exit(1);
        }
    }
}

struct PassCounts {
    sources: usize,
    cjs_files: usize,
    esm_files: usize,
}

/// The two sequential passes. Either failure aborts the whole build.
///
/// Progress lines go to stdout in human mode only; `--json` keeps stdout
/// reserved for the result object.
fn run_passes(action: &BuildAction, json: bool) -> Result<PassCounts, Error> {
    let cwd = &action.cwd;
    let config = Config::load_or_default(cwd)?;
    let files = discover_sources(cwd, &config)?;
    tracing::debug!(sources = files.len(), "discovered source files");

    progress(json, "Generating CommonJS build for node");
    let cjs = Engine::new().build(&BuildOptions {
        cwd: cwd.clone(),
        entry_points: files.clone(),
        bundle: false,
        platform: Platform::Node,
        format: Format::Cjs,
        outdir: config.cjs_out_dir(cwd),
        ..Default::default()
    })?;

    progress(json, "Generating ESM build");
    let esm = Engine::new()
        .plugin(Box::new(FileExtensionsPlugin::default()))
        .build(&BuildOptions {
            cwd: cwd.clone(),
            entry_points: files.clone(),
            bundle: true,
            platform: Platform::Node,
            format: Format::Esm,
            outdir: config.esm_out_dir(cwd),
            out_extension: Some(config.esm_out_extension.clone()),
            ..Default::default()
        })?;

    Ok(PassCounts {
        sources: files.len(),
        cjs_files: cjs.file_count(),
        esm_files: esm.file_count(),
    })
}

fn progress(json: bool, line: &str) {
    if json {
        tracing::info!("{line}");
    } else {
        println!("{line}");
    }
}

/// Enumerate `.ts`/`.tsx` sources under the configured source root,
/// excluding ignored patterns and anything already in the output tree.
fn discover_sources(cwd: &Path, config: &Config) -> Result<Vec<PathBuf>, Error> {
    let src = cwd.join(&config.src_dir);
    let out_dir = cwd.join(&config.out_dir);

    let ignore = config
        .ignore
        .iter()
        .map(|pattern| {
            glob::Pattern::new(pattern).map_err(|source| Error::Pattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut files = Vec::new();
    for suffix in ["**/*.ts", "**/*.tsx"] {
        let pattern = src.join(suffix).display().to_string();
        let paths = glob::glob(&pattern).map_err(|source| Error::Pattern {
            pattern: pattern.clone(),
            source,
        })?;

        for entry in paths {
            let path = entry.map_err(|err| Error::Io(err.into_error()))?;
            if !path.is_file() || path.starts_with(&out_dir) {
                continue;
            }
            if ignore.iter().any(|pattern| pattern.matches_path(&path)) {
                continue;
            }
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_discover_filters_tests_and_node_modules() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("lib")).unwrap();
        std::fs::create_dir_all(src.join("node_modules/pkg")).unwrap();
        std::fs::write(src.join("index.ts"), "").unwrap();
        std::fs::write(src.join("lib/util.tsx"), "").unwrap();
        std::fs::write(src.join("lib/util.test.ts"), "").unwrap();
        std::fs::write(src.join("node_modules/pkg/index.ts"), "").unwrap();
        std::fs::write(src.join("readme.md"), "").unwrap();

        let files = discover_sources(dir.path(), &Config::default()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(&src).unwrap().display().to_string())
            .collect();

        assert_eq!(names, vec!["index.ts", "lib/util.tsx"]);
    }

    #[test]
    fn test_discover_empty_tree() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        let files = discover_sources(dir.path(), &Config::default()).unwrap();
        assert!(files.is_empty());
    }
}
