//! Node.js builtin-module registry.
//!
//! Imports of runtime-provided modules must never have an extension
//! appended, so the resolve pipeline needs a fast membership check. The
//! registry is initialized lazily on first lookup and lives for the whole
//! process; initialization is idempotent, so concurrent first lookups are
//! harmless.

use std::collections::HashSet;
use std::sync::OnceLock;

/// Builtin module names, stored without the `node:` prefix.
const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

fn registry() -> &'static HashSet<&'static str> {
    static REGISTRY: OnceLock<HashSet<&'static str>> = OnceLock::new();
    REGISTRY.get_or_init(|| NODE_BUILTINS.iter().copied().collect())
}

/// Check whether a specifier names a Node.js builtin module.
///
/// Relative specifiers are never builtins. A `node:` prefix always marks a
/// builtin (the runtime owns that scheme outright); bare names are checked
/// against the registry.
#[must_use]
pub fn is_builtin(specifier: &str) -> bool {
    if specifier.starts_with('.') {
        return false;
    }

    specifier.starts_with("node:") || registry().contains(specifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_builtin() {
        assert!(is_builtin("fs"));
        assert!(is_builtin("path"));
        assert!(is_builtin("fs/promises"));
    }

    #[test]
    fn test_node_prefix() {
        assert!(is_builtin("node:fs"));
        // The prefix alone is authoritative; no registry lookup happens.
        assert!(is_builtin("node:does-not-exist"));
    }

    #[test]
    fn test_relative_never_builtin() {
        assert!(!is_builtin("./fs"));
        assert!(!is_builtin("../path"));
    }

    #[test]
    fn test_package_not_builtin() {
        assert!(!is_builtin("lodash"));
        assert!(!is_builtin("@scope/fs"));
    }
}
