//! Dual-format build engine.
//!
//! Hosts the plugin resolve pipeline and emits output trees in two modes:
//!
//! 1. **Compile** (`bundle: false`) - each entry point is emitted to the
//!    output directory one-to-one; imports are not resolved or followed.
//! 2. **Bundle** (`bundle: true`) - the import graph is followed from the
//!    entry points; every specifier runs through the registered resolve
//!    hooks, externals keep their (possibly rewritten) specifier in the
//!    output, and every reachable module is emitted one-to-one with its
//!    specifiers re-pointed at the emitted files.
//!
//! The engine is lexical: module text passes through untouched apart from
//! specifier splicing. Transpilation and format lowering are not its job.

mod emit;
mod plugin;
mod plugins;
mod resolve;
mod scan;

pub use plugin::{
    BuildContext, HookResult, OnResolveArgs, OnResolveResult, Plugin, PluginError, ResolveFilter,
    ResolveHook, ResolveKind, FILE_NAMESPACE,
};
pub use plugins::{EsmSetting, ExtensionSetting, FileExtensionsOptions, FileExtensionsPlugin};

use crate::error::Error;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Esm,
    Cjs,
}

impl Format {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Esm => "esm",
            Self::Cjs => "cjs",
        }
    }
}

/// Target platform, steering builtin-module handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Node,
    Browser,
    Neutral,
}

/// Build-wide options for one engine pass.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Working directory; entry points resolve against it.
    pub cwd: PathBuf,
    /// Source files feeding the pass.
    pub entry_points: Vec<PathBuf>,
    /// Follow the import graph (`true`) or compile entries only (`false`).
    pub bundle: bool,
    pub platform: Platform,
    pub format: Format,
    /// Directory outputs are written under.
    pub outdir: PathBuf,
    /// Output file extension (without the dot); defaults to `js`.
    pub out_extension: Option<String>,
    /// Build-wide defines, visible to plugins.
    pub define: HashMap<String, String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            cwd: PathBuf::from("."),
            entry_points: Vec::new(),
            bundle: false,
            platform: Platform::default(),
            format: Format::default(),
            outdir: PathBuf::from("dist"),
            out_extension: None,
            define: HashMap::new(),
        }
    }
}

impl BuildOptions {
    /// The effective output extension (without the dot).
    #[must_use]
    pub fn output_extension(&self) -> &str {
        self.out_extension.as_deref().unwrap_or("js")
    }
}

/// One emitted output file.
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Result of a build pass.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub outputs: Vec<OutputFile>,
}

impl BuildSummary {
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.outputs.len()
    }
}

/// The build engine: a plugin list applied over build passes.
pub struct Engine {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Engine {
    /// Create an engine with no plugins.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Add a plugin.
    #[must_use]
    pub fn plugin(mut self, plugin: Box<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Add multiple plugins at once.
    #[must_use]
    pub fn plugins(mut self, plugins: Vec<Box<dyn Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Run one build pass.
    pub fn build(&self, options: &BuildOptions) -> Result<BuildSummary, Error> {
        let options = Arc::new(options.clone());
        let mut ctx = BuildContext::new(Arc::clone(&options));
        for plugin in &self.plugins {
            ctx.install(plugin.as_ref());
        }

        tracing::debug!(
            format = options.format.as_str(),
            bundle = options.bundle,
            entries = options.entry_points.len(),
            "starting build pass"
        );

        if options.bundle {
            emit::run_bundle_pass(&options, &ctx)
        } else {
            emit::run_compile_pass(&options)
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
