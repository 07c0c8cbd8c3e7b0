//! Output emission for the two build passes.

use super::plugin::{BuildContext, OnResolveArgs, PluginError, FILE_NAMESPACE};
use super::{resolve, scan, BuildOptions, BuildSummary, OutputFile};
use crate::error::Error;
use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Compile pass: one output per entry, module text untouched.
pub(crate) fn run_compile_pass(options: &BuildOptions) -> Result<BuildSummary, Error> {
    let entries = absolute_entries(options)?;
    let outbase = common_base(&entries, &options.cwd);
    let ext = options.output_extension();

    let mut summary = BuildSummary::default();
    for entry in &entries {
        let Some(out_path) = output_path(entry, &outbase, &options.outdir, ext) else {
            continue;
        };
        let source = read_module(entry)?;
        write_output(&out_path, &source)?;
        summary.outputs.push(OutputFile {
            bytes: source.len(),
            path: out_path,
        });
    }

    Ok(summary)
}

/// Bundle pass: follow the import graph from the entries, running every
/// specifier through the resolve hooks and splicing rewritten externals
/// into the emitted modules.
pub(crate) fn run_bundle_pass(
    options: &BuildOptions,
    ctx: &BuildContext,
) -> Result<BuildSummary, Error> {
    let entries = absolute_entries(options)?;
    let outbase = common_base(&entries, &options.cwd);
    let ext = options.output_extension();

    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    for entry in entries {
        let args = OnResolveArgs::entry(entry.display().to_string(), &options.cwd);
        if let Some(result) = ctx.resolve(&args)? {
            if result.external {
                tracing::debug!(entry = %entry.display(), "entry marked external; skipping");
                continue;
            }
        }
        queue.push_back(entry);
    }

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut summary = BuildSummary::default();

    while let Some(module) = queue.pop_front() {
        if !seen.insert(module.clone()) {
            continue;
        }
        let Some(module_out) = output_path(&module, &outbase, &options.outdir, ext) else {
            tracing::warn!(module = %module.display(), "module outside the output base; skipping");
            continue;
        };

        let source = read_module(&module)?;
        let module_str = module.display().to_string();
        let module_dir = module.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut pending: Vec<PathBuf> = Vec::new();
        let mut hook_error: Option<PluginError> = None;

        let rewritten = scan::rewrite_specifiers(&source, |specifier, kind| {
            if hook_error.is_some() {
                return None;
            }

            let args = OnResolveArgs {
                path: specifier.to_string(),
                importer: Some(module_str.clone()),
                resolve_dir: module_dir.clone(),
                kind,
                namespace: FILE_NAMESPACE.to_string(),
            };

            match ctx.resolve(&args) {
                Err(err) => {
                    hook_error = Some(err);
                    None
                }
                Ok(Some(result)) if result.external => {
                    (result.path != specifier).then_some(result.path)
                }
                Ok(Some(result)) => {
                    // Hook pointed at a module id; follow it when it names
                    // a file under the output base.
                    follow(
                        &PathBuf::from(&result.path),
                        &module_out,
                        &outbase,
                        &options.outdir,
                        ext,
                        &mut pending,
                    )
                }
                Ok(None) => {
                    if !specifier.starts_with("./") && !specifier.starts_with("../") {
                        // Bare or absolute specifiers are implicitly external.
                        return None;
                    }
                    match resolve::resolve_relative(specifier, &module_dir) {
                        Some(dep) if is_script_source(&dep) => follow(
                            &dep,
                            &module_out,
                            &outbase,
                            &options.outdir,
                            ext,
                            &mut pending,
                        ),
                        _ => None,
                    }
                }
            }
        });

        if let Some(err) = hook_error {
            return Err(err.into());
        }
        queue.extend(pending);

        write_output(&module_out, &rewritten)?;
        summary.outputs.push(OutputFile {
            bytes: rewritten.len(),
            path: module_out,
        });
    }

    Ok(summary)
}

/// Queue a resolved dependency for emission and return the specifier that
/// points at its emitted file, or `None` when it cannot be mapped into the
/// output tree.
fn follow(
    dep: &Path,
    module_out: &Path,
    outbase: &Path,
    outdir: &Path,
    ext: &str,
    pending: &mut Vec<PathBuf>,
) -> Option<String> {
    if !dep.is_file() {
        return None;
    }
    let dep_out = output_path(dep, outbase, outdir, ext)?;
    pending.push(dep.to_path_buf());
    Some(relative_specifier(module_out, &dep_out))
}

fn read_module(path: &Path) -> Result<String, Error> {
    std::fs::read_to_string(path)
        .map_err(|err| Error::build(format!("Cannot read module: {err}"), path))
}

fn write_output(path: &Path, contents: &str) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|err| Error::build(format!("Cannot create output directory: {err}"), parent))?;
    }
    std::fs::write(path, contents)
        .map_err(|err| Error::build(format!("Cannot write output: {err}"), path))
}

/// Resolve entry points against the working directory and canonicalize
/// them so graph deduplication and output mapping agree on one spelling.
fn absolute_entries(options: &BuildOptions) -> Result<Vec<PathBuf>, Error> {
    options
        .entry_points
        .iter()
        .map(|entry| {
            let path = if entry.is_absolute() {
                entry.clone()
            } else {
                options.cwd.join(entry)
            };
            dunce::canonicalize(&path)
                .map_err(|err| Error::build(format!("Cannot find entry point: {err}"), &path))
        })
        .collect()
}

/// Lowest common ancestor directory of the entry points; output paths are
/// computed relative to it.
fn common_base(entries: &[PathBuf], cwd: &Path) -> PathBuf {
    let Some(first) = entries.first() else {
        return cwd.to_path_buf();
    };
    let mut base = first.parent().unwrap_or(cwd).to_path_buf();
    for entry in &entries[1..] {
        while !entry.starts_with(&base) {
            let Some(parent) = base.parent() else {
                return PathBuf::new();
            };
            base = parent.to_path_buf();
        }
    }
    base
}

/// Map a source file into the output tree, swapping its extension.
fn output_path(source: &Path, outbase: &Path, outdir: &Path, ext: &str) -> Option<PathBuf> {
    let relative = source.strip_prefix(outbase).ok()?;
    Some(outdir.join(relative).with_extension(ext))
}

/// Specifier for `to` as imported from the module emitted at `from`.
fn relative_specifier(from: &Path, to: &Path) -> String {
    let from_dir = from.parent().unwrap_or(Path::new(""));
    let rel = relative_path(from_dir, to);
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    if joined.starts_with("../") {
        joined
    } else {
        format!("./{joined}")
    }
}

fn relative_path(from_dir: &Path, to: &Path) -> PathBuf {
    let from_components: Vec<_> = from_dir.components().collect();
    let to_components: Vec<_> = to.components().collect();

    let mut shared = 0;
    while shared < from_components.len()
        && shared < to_components.len()
        && from_components[shared] == to_components[shared]
    {
        shared += 1;
    }

    let mut result = PathBuf::new();
    for _ in shared..from_components.len() {
        result.push("..");
    }
    for component in &to_components[shared..] {
        result.push(component);
    }
    result
}

fn is_script_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| resolve::RESOLVE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_base_single_entry() {
        let entries = vec![PathBuf::from("/p/src/index.ts")];
        assert_eq!(common_base(&entries, Path::new("/p")), PathBuf::from("/p/src"));
    }

    #[test]
    fn test_common_base_nested_entries() {
        let entries = vec![
            PathBuf::from("/p/src/index.ts"),
            PathBuf::from("/p/src/lib/util.ts"),
        ];
        assert_eq!(common_base(&entries, Path::new("/p")), PathBuf::from("/p/src"));
    }

    #[test]
    fn test_common_base_no_entries_is_cwd() {
        assert_eq!(common_base(&[], Path::new("/p")), PathBuf::from("/p"));
    }

    #[test]
    fn test_output_path_swaps_extension() {
        let out = output_path(
            Path::new("/p/src/lib/util.ts"),
            Path::new("/p/src"),
            Path::new("/p/dist/esm"),
            "mjs",
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/p/dist/esm/lib/util.mjs"));
    }

    #[test]
    fn test_output_path_outside_base() {
        assert!(output_path(
            Path::new("/elsewhere/util.ts"),
            Path::new("/p/src"),
            Path::new("/p/dist"),
            "js",
        )
        .is_none());
    }

    #[test]
    fn test_relative_specifier_sibling() {
        let spec = relative_specifier(
            Path::new("/p/dist/index.mjs"),
            Path::new("/p/dist/util.mjs"),
        );
        assert_eq!(spec, "./util.mjs");
    }

    #[test]
    fn test_relative_specifier_down() {
        let spec = relative_specifier(
            Path::new("/p/dist/index.mjs"),
            Path::new("/p/dist/lib/util.mjs"),
        );
        assert_eq!(spec, "./lib/util.mjs");
    }

    #[test]
    fn test_relative_specifier_up() {
        let spec = relative_specifier(
            Path::new("/p/dist/lib/util.mjs"),
            Path::new("/p/dist/index.mjs"),
        );
        assert_eq!(spec, "../index.mjs");
    }

    #[test]
    fn test_is_script_source() {
        assert!(is_script_source(Path::new("/p/a.ts")));
        assert!(is_script_source(Path::new("/p/a.tsx")));
        assert!(!is_script_source(Path::new("/p/a.css")));
        assert!(!is_script_source(Path::new("/p/a.json")));
    }
}
