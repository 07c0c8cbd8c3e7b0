//! Plugin system for the build engine.
//!
//! Plugins hook into module resolution: during `setup` a plugin registers
//! resolve hooks with the [`BuildContext`], and the engine consults them for
//! every import specifier it encounters. The first hook whose filter matches
//! and which returns a result wins; a hook returning `Ok(None)` declines and
//! defers to the next hook or the engine's default resolution.
//!
//! ## Example
//!
//! ```ignore
//! use bifold_core::engine::{BuildContext, OnResolveResult, Plugin, ResolveFilter};
//!
//! struct ExternalizeHttp;
//!
//! impl Plugin for ExternalizeHttp {
//!     fn name(&self) -> &str { "externalize-http" }
//!
//!     fn setup(&self, build: &mut BuildContext) {
//!         build.on_resolve(ResolveFilter::default(), Box::new(|args| {
//!             if args.path.starts_with("http://") {
//!                 return Ok(Some(OnResolveResult::external(&args.path)));
//!             }
//!             Ok(None)
//!         }));
//!     }
//! }
//! ```

use super::BuildOptions;
use crate::error::Error;
use regex_lite::Regex;
use std::path::PathBuf;
use std::sync::Arc;

/// Result type for plugin hooks.
pub type HookResult<T> = Result<T, PluginError>;

/// Error from a plugin hook.
#[derive(Debug)]
pub struct PluginError {
    /// Plugin name that caused the error.
    pub plugin: String,
    /// Hook that failed.
    pub hook: &'static str,
    /// Error message.
    pub message: String,
}

impl PluginError {
    pub fn new(plugin: impl Into<String>, hook: &'static str, message: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            hook,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.plugin, self.hook, self.message)
    }
}

impl std::error::Error for PluginError {}

impl From<PluginError> for Error {
    fn from(err: PluginError) -> Self {
        Error::Plugin {
            plugin: err.plugin,
            hook: err.hook,
            message: err.message,
        }
    }
}

/// How an import specifier entered the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveKind {
    /// A top-level entry point (no importer).
    EntryPoint,
    /// A static `import`/`export ... from` statement.
    ImportStatement,
    /// A CommonJS `require()` call.
    RequireCall,
    /// A dynamic `import()` expression.
    DynamicImport,
}

impl ResolveKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EntryPoint => "entry-point",
            Self::ImportStatement => "import-statement",
            Self::RequireCall => "require-call",
            Self::DynamicImport => "dynamic-import",
        }
    }
}

/// The default namespace for on-disk modules.
pub const FILE_NAMESPACE: &str = "file";

/// Resolution request handed to resolve hooks. Immutable, built per-call by
/// the engine.
#[derive(Debug, Clone)]
pub struct OnResolveArgs {
    /// The specifier exactly as written in the importing module.
    pub path: String,
    /// Path of the importing module; `None` for entry points.
    pub importer: Option<String>,
    /// Directory resolution is anchored at (the importer's directory, or
    /// the working directory for entry points).
    pub resolve_dir: PathBuf,
    /// How the specifier entered the build.
    pub kind: ResolveKind,
    /// Namespace of the importing module.
    pub namespace: String,
}

impl OnResolveArgs {
    /// Build args for an entry-point request.
    #[must_use]
    pub fn entry(path: impl Into<String>, resolve_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            importer: None,
            resolve_dir: resolve_dir.into(),
            kind: ResolveKind::EntryPoint,
            namespace: FILE_NAMESPACE.to_string(),
        }
    }
}

/// Result of a resolve hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnResolveResult {
    /// Final path to substitute for the specifier.
    pub path: String,
    /// Whether the import is external (left as a reference in output, never
    /// followed by the engine).
    pub external: bool,
    /// Namespace for the resolved module.
    pub namespace: Option<String>,
}

impl OnResolveResult {
    /// Create an external resolution result.
    #[must_use]
    pub fn external(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            external: true,
            namespace: None,
        }
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }
}

/// Filter restricting which requests reach a resolve hook.
#[derive(Debug, Clone, Default)]
pub struct ResolveFilter {
    /// Pattern over the requested path; `None` matches everything.
    pub filter: Option<Regex>,
    /// Restrict to requests from this namespace; `None` matches all
    /// namespaces.
    pub namespace: Option<String>,
}

impl ResolveFilter {
    fn matches(&self, args: &OnResolveArgs) -> bool {
        if let Some(re) = &self.filter {
            if !re.is_match(&args.path) {
                return false;
            }
        }
        if let Some(ns) = &self.namespace {
            if ns != &args.namespace {
                return false;
            }
        }
        true
    }
}

/// A resolve hook callback.
pub type ResolveHook = Box<dyn Fn(&OnResolveArgs) -> HookResult<Option<OnResolveResult>> + Send + Sync>;

/// The plugin trait: a name for diagnostics and a `setup` entry point that
/// registers hooks against the build.
pub trait Plugin: Send + Sync {
    /// Plugin name for debugging and error messages.
    fn name(&self) -> &str;

    /// Register hooks for this build.
    fn setup(&self, build: &mut BuildContext);
}

struct RegisteredHook {
    plugin: String,
    filter: ResolveFilter,
    hook: ResolveHook,
}

/// Per-build plugin state: the build-wide options and the registered hooks.
pub struct BuildContext {
    /// Options the current build was configured with.
    pub initial_options: Arc<BuildOptions>,
    current_plugin: String,
    resolve_hooks: Vec<RegisteredHook>,
}

impl BuildContext {
    pub(crate) fn new(initial_options: Arc<BuildOptions>) -> Self {
        Self {
            initial_options,
            current_plugin: String::new(),
            resolve_hooks: Vec::new(),
        }
    }

    pub(crate) fn install(&mut self, plugin: &dyn Plugin) {
        self.current_plugin = plugin.name().to_string();
        plugin.setup(self);
    }

    /// Register a resolve hook. Hooks run in registration order; the first
    /// matching hook that returns a result settles the request.
    pub fn on_resolve(&mut self, filter: ResolveFilter, hook: ResolveHook) {
        self.resolve_hooks.push(RegisteredHook {
            plugin: self.current_plugin.clone(),
            filter,
            hook,
        });
    }

    /// Run the registered hooks for one request.
    ///
    /// Returns the first hook's result, `Ok(None)` when every hook declines,
    /// or the first hook error (hook errors abort the build).
    pub(crate) fn resolve(&self, args: &OnResolveArgs) -> HookResult<Option<OnResolveResult>> {
        for registered in &self.resolve_hooks {
            if !registered.filter.matches(args) {
                continue;
            }
            if let Some(result) = (registered.hook)(args)? {
                tracing::trace!(
                    plugin = %registered.plugin,
                    path = %args.path,
                    resolved = %result.path,
                    "resolve hook matched"
                );
                return Ok(Some(result));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> BuildContext {
        BuildContext::new(Arc::new(BuildOptions::default()))
    }

    fn import_args(path: &str) -> OnResolveArgs {
        OnResolveArgs {
            path: path.to_string(),
            importer: Some("/project/src/index.ts".to_string()),
            resolve_dir: PathBuf::from("/project/src"),
            kind: ResolveKind::ImportStatement,
            namespace: FILE_NAMESPACE.to_string(),
        }
    }

    #[test]
    fn test_first_matching_hook_wins() {
        let mut ctx = ctx();
        ctx.on_resolve(
            ResolveFilter::default(),
            Box::new(|_| Ok(Some(OnResolveResult::external("first")))),
        );
        ctx.on_resolve(
            ResolveFilter::default(),
            Box::new(|_| Ok(Some(OnResolveResult::external("second")))),
        );

        let result = ctx.resolve(&import_args("./x")).unwrap().unwrap();
        assert_eq!(result.path, "first");
    }

    #[test]
    fn test_decline_falls_through() {
        let mut ctx = ctx();
        ctx.on_resolve(ResolveFilter::default(), Box::new(|_| Ok(None)));
        ctx.on_resolve(
            ResolveFilter::default(),
            Box::new(|_| Ok(Some(OnResolveResult::external("fallback")))),
        );

        let result = ctx.resolve(&import_args("./x")).unwrap().unwrap();
        assert_eq!(result.path, "fallback");
    }

    #[test]
    fn test_regex_filter_gates_hook() {
        let mut ctx = ctx();
        ctx.on_resolve(
            ResolveFilter {
                filter: Some(Regex::new(r"\.css$").unwrap()),
                namespace: None,
            },
            Box::new(|_| Ok(Some(OnResolveResult::external("styled")))),
        );

        assert!(ctx.resolve(&import_args("./app.ts")).unwrap().is_none());
        assert!(ctx.resolve(&import_args("./app.css")).unwrap().is_some());
    }

    #[test]
    fn test_namespace_filter_gates_hook() {
        let mut ctx = ctx();
        ctx.on_resolve(
            ResolveFilter {
                filter: None,
                namespace: Some("virtual".to_string()),
            },
            Box::new(|_| Ok(Some(OnResolveResult::external("virtual-hit")))),
        );

        // Requests arrive in the file namespace, so the hook never runs.
        assert!(ctx.resolve(&import_args("./x")).unwrap().is_none());
    }

    #[test]
    fn test_hook_error_propagates() {
        let mut ctx = ctx();
        ctx.on_resolve(
            ResolveFilter::default(),
            Box::new(|_| Err(PluginError::new("broken", "on_resolve", "boom"))),
        );

        let err = ctx.resolve(&import_args("./x")).unwrap_err();
        assert_eq!(err.plugin, "broken");
        assert_eq!(err.hook, "on_resolve");
    }

    #[test]
    fn test_resolve_kind_strings() {
        assert_eq!(ResolveKind::ImportStatement.as_str(), "import-statement");
        assert_eq!(ResolveKind::EntryPoint.as_str(), "entry-point");
    }
}
