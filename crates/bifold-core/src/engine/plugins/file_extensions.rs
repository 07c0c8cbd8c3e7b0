//! Explicit file extensions for relative imports.
//!
//! Node requires fully-specified module paths in ESM output: `./util` must
//! become `./util.mjs` on disk or the runtime refuses to load it. This
//! plugin hooks module resolution and rewrites every relative import that
//! lacks a recognized extension so emitted files carry the platform-correct
//! one (`.mjs` for ESM, `.cjs` for CommonJS), marking the result external
//! so the engine keeps it as a reference instead of following it.
//!
//! ## What is left alone
//!
//! - non-import-statement requests (entry points, `require()`, `import()`)
//! - specifiers that already carry a script/style extension
//! - Node builtins when the platform is `node`
//! - specifiers the host runtime already resolves (installed packages)
//!
//! ## Usage
//!
//! ```ignore
//! use bifold_core::engine::{Engine, FileExtensionsPlugin};
//!
//! let engine = Engine::new().plugin(Box::new(FileExtensionsPlugin::default()));
//! ```

use crate::builtins;
use crate::engine::plugin::{
    BuildContext, HookResult, OnResolveArgs, OnResolveResult, Plugin, PluginError, ResolveFilter,
    ResolveKind,
};
use crate::engine::{resolve, BuildOptions, Format, Platform};
use regex_lite::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

const PLUGIN_NAME: &str = "file-path-extensions";
const HOOK: &str = "on_resolve";

/// Extensions that mark a specifier as already fully specified.
/// Matched exactly: `./mod.JS` is not `./mod.js`.
const SCRIPT_EXTENSIONS: &[&str] = &[
    "js", "cjs", "mjs", // plain JavaScript
    "ts", "cts", "mts", // TypeScript
    "jsx", "cjsx", "mjsx", // JSX
    "tsx", "ctsx", "mtsx", // TSX
    "css",
];

/// A configuration value computed from the build options.
///
/// Computed values come back as loose JSON so a misconfigured callback
/// surfaces as a fatal error instead of silently coercing.
pub type ComputeFn = Arc<dyn Fn(&BuildOptions) -> Value + Send + Sync>;

/// Whether the build output is ESM: a literal, or computed per-build.
#[derive(Clone)]
pub enum EsmSetting {
    Value(bool),
    Compute(ComputeFn),
}

/// An output extension: a literal, or computed per-build.
#[derive(Clone)]
pub enum ExtensionSetting {
    Value(String),
    Compute(ComputeFn),
}

/// Options for [`FileExtensionsPlugin`]. Configured once at construction,
/// read-only afterwards.
#[derive(Clone, Default)]
pub struct FileExtensionsOptions {
    /// Pattern over candidate paths; `None` matches everything.
    pub filter: Option<Regex>,
    /// Force ESM or CJS extensions. Unset means infer from the build
    /// options (`define.TSUP_FORMAT` or the output format).
    pub esm: Option<EsmSetting>,
    /// Extension appended for CommonJS output (default `cjs`).
    pub cjs_extension: Option<ExtensionSetting>,
    /// Extension appended for ESM output (default `mjs`).
    pub esm_extension: Option<ExtensionSetting>,
    /// Namespace attached to results and used to filter requests.
    pub namespace: Option<String>,
}

/// The extension-rewriting resolve plugin.
pub struct FileExtensionsPlugin {
    options: Arc<FileExtensionsOptions>,
}

impl FileExtensionsPlugin {
    /// Create the plugin with explicit options.
    #[must_use]
    pub fn new(options: FileExtensionsOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }

    fn options_mut(&mut self) -> &mut FileExtensionsOptions {
        Arc::make_mut(&mut self.options)
    }

    /// Restrict the plugin to paths matching `filter`.
    #[must_use]
    pub fn filter(mut self, filter: Regex) -> Self {
        self.options_mut().filter = Some(filter);
        self
    }

    /// Force ESM (`true`) or CommonJS (`false`) extensions.
    #[must_use]
    pub fn esm(mut self, esm: bool) -> Self {
        self.options_mut().esm = Some(EsmSetting::Value(esm));
        self
    }

    /// Compute the ESM flag from the build options.
    #[must_use]
    pub fn esm_from(mut self, f: impl Fn(&BuildOptions) -> Value + Send + Sync + 'static) -> Self {
        self.options_mut().esm = Some(EsmSetting::Compute(Arc::new(f)));
        self
    }

    /// Set the CommonJS extension (without the dot).
    #[must_use]
    pub fn cjs_extension(mut self, ext: impl Into<String>) -> Self {
        self.options_mut().cjs_extension = Some(ExtensionSetting::Value(ext.into()));
        self
    }

    /// Compute the CommonJS extension from the build options.
    #[must_use]
    pub fn cjs_extension_from(
        mut self,
        f: impl Fn(&BuildOptions) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.options_mut().cjs_extension = Some(ExtensionSetting::Compute(Arc::new(f)));
        self
    }

    /// Set the ESM extension (without the dot).
    #[must_use]
    pub fn esm_extension(mut self, ext: impl Into<String>) -> Self {
        self.options_mut().esm_extension = Some(ExtensionSetting::Value(ext.into()));
        self
    }

    /// Compute the ESM extension from the build options.
    #[must_use]
    pub fn esm_extension_from(
        mut self,
        f: impl Fn(&BuildOptions) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.options_mut().esm_extension = Some(ExtensionSetting::Compute(Arc::new(f)));
        self
    }

    /// Set the namespace attached to resolved results.
    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.options_mut().namespace = Some(namespace.into());
        self
    }
}

impl Default for FileExtensionsPlugin {
    fn default() -> Self {
        Self::new(FileExtensionsOptions::default())
    }
}

impl Plugin for FileExtensionsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn setup(&self, build: &mut BuildContext) {
        let options = Arc::clone(&self.options);
        let build_options = Arc::clone(&build.initial_options);

        build.on_resolve(
            ResolveFilter {
                filter: options.filter.clone(),
                namespace: options.namespace.clone(),
            },
            Box::new(move |args| handle_resolve(args, &build_options, &options)),
        );
    }
}

/// The resolution decision procedure. Every branch either settles the
/// request or declines so the engine's default resolution runs.
fn handle_resolve(
    args: &OnResolveArgs,
    build: &BuildOptions,
    options: &FileExtensionsOptions,
) -> HookResult<Option<OnResolveResult>> {
    if args.kind != ResolveKind::ImportStatement {
        return Ok(None);
    }

    let is_esm = resolved_is_esm(options, build)?;
    let esm_extension = resolved_extension(options.esm_extension.as_ref(), "mjs", "esmExtension", build)?;
    let cjs_extension = resolved_extension(options.cjs_extension.as_ref(), "cjs", "cjsExtension", build)?;

    // Entry points are left untouched.
    let Some(importer) = args.importer.as_deref() else {
        return Ok(None);
    };

    if has_script_extension(&args.path) {
        return Ok(None);
    }

    if build.platform == Platform::Node && builtins::is_builtin(&args.path) {
        return Ok(None);
    }

    let mut path = args.path.clone();
    tracing::debug!(importer, path = %path, "rewriting unspecified import");

    // Installed packages that happen to match no known extension still
    // resolve through the runtime; leave them untouched.
    if resolve::resolve_host_package(&path, &args.resolve_dir).is_some() {
        return Ok(Some(
            OnResolveResult::external(path).with_namespace(options.namespace.clone()),
        ));
    }

    // A directory import refers to the `index.*` file inside it under the
    // runtime's resolution rules. Concatenate with `/` rather than a path
    // join, which would strip a leading `./`.
    if args.resolve_dir.join(&path).is_dir() {
        path = format!("{path}/index");
    }

    let ext = if is_esm { esm_extension } else { cjs_extension };
    path = format!("{path}.{ext}");

    Ok(Some(
        OnResolveResult::external(path).with_namespace(options.namespace.clone()),
    ))
}

/// Effective ESM flag: explicit setting wins, then a computed value, then
/// inference from the build options.
fn resolved_is_esm(options: &FileExtensionsOptions, build: &BuildOptions) -> HookResult<bool> {
    match &options.esm {
        None => Ok(build.define.get("TSUP_FORMAT").map(String::as_str) == Some("\"esm\"")
            || build.format == Format::Esm),
        Some(EsmSetting::Value(esm)) => Ok(*esm),
        Some(EsmSetting::Compute(f)) => {
            let value = f(build);
            value.as_bool().ok_or_else(|| {
                PluginError::new(
                    PLUGIN_NAME,
                    HOOK,
                    format!("esm must be a boolean, received {} ({value})", json_type(&value)),
                )
            })
        }
    }
}

fn resolved_extension(
    setting: Option<&ExtensionSetting>,
    default: &str,
    key: &str,
    build: &BuildOptions,
) -> HookResult<String> {
    match setting {
        None => Ok(default.to_string()),
        Some(ExtensionSetting::Value(ext)) => Ok(ext.clone()),
        Some(ExtensionSetting::Compute(f)) => {
            let value = f(build);
            value.as_str().map(ToString::to_string).ok_or_else(|| {
                PluginError::new(
                    PLUGIN_NAME,
                    HOOK,
                    format!("{key} must be a string, received {} ({value})", json_type(&value)),
                )
            })
        }
    }
}

/// Check whether a specifier already ends in a recognized extension.
fn has_script_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
