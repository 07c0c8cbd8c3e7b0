//! Filesystem-backed specifier resolution.
//!
//! Two jobs: probing whether the host runtime could already resolve a raw
//! specifier (installed packages, absolute paths), and default resolution
//! of relative specifiers with extension and index-file fallbacks.

use std::path::{Path, PathBuf};

/// Extensions probed when a relative specifier carries none.
pub(crate) const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Probe whether the host runtime would resolve `specifier` as-is.
///
/// Bare specifiers are checked against `node_modules` directories walking
/// up from `resolve_dir`; absolute paths against the filesystem. Relative
/// specifiers never probe-resolve: the runtime anchors those at the
/// requiring module, which during a build is never the importing source
/// file. The probe is existence-level: it does not evaluate package entry
/// points, only whether an installed package owns the name.
pub(crate) fn resolve_host_package(specifier: &str, resolve_dir: &Path) -> Option<PathBuf> {
    if specifier.starts_with('.') {
        return None;
    }

    if Path::new(specifier).is_absolute() {
        let path = Path::new(specifier);
        return path.is_file().then(|| dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
    }

    let (pkg_name, _subpath) = parse_bare_specifier(specifier);

    let mut current = Some(resolve_dir);
    while let Some(dir) = current {
        let candidate = dir.join("node_modules").join(&pkg_name);
        if candidate.is_dir() && candidate.join("package.json").is_file() {
            return Some(candidate);
        }
        current = dir.parent();
    }

    None
}

/// Parse a bare specifier into package name and subpath.
fn parse_bare_specifier(specifier: &str) -> (String, Option<String>) {
    if specifier.starts_with('@') {
        // Scoped package: @scope/pkg or @scope/pkg/subpath
        let parts: Vec<&str> = specifier.splitn(3, '/').collect();
        if parts.len() >= 2 {
            let pkg = format!("{}/{}", parts[0], parts[1]);
            (pkg, parts.get(2).map(|s| (*s).to_string()))
        } else {
            (specifier.to_string(), None)
        }
    } else {
        let parts: Vec<&str> = specifier.splitn(2, '/').collect();
        (parts[0].to_string(), parts.get(1).map(|s| (*s).to_string()))
    }
}

/// Resolve a relative specifier to an existing file.
///
/// Probes the exact path, then appended extensions, then directory index
/// files. Returns a canonicalized path so the same module resolved through
/// different importers maps to one output file.
pub(crate) fn resolve_relative(specifier: &str, resolve_dir: &Path) -> Option<PathBuf> {
    let target = resolve_dir.join(specifier);

    if target.is_file() {
        return canonical(&target);
    }

    for ext in RESOLVE_EXTENSIONS {
        let with_ext = PathBuf::from(format!("{}.{ext}", target.display()));
        if with_ext.is_file() {
            return canonical(&with_ext);
        }
    }

    if target.is_dir() {
        for ext in RESOLVE_EXTENSIONS {
            let index = target.join(format!("index.{ext}"));
            if index.is_file() {
                return canonical(&index);
            }
        }
    }

    None
}

fn canonical(path: &Path) -> Option<PathBuf> {
    Some(dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()))
}
