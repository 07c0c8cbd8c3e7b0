//! Lexical import scanning and specifier splicing.
//!
//! Walks module source line by line, finds static imports, re-exports,
//! side-effect imports, dynamic `import()` expressions and `require()`
//! calls, and hands each specifier to a callback. A `Some` return replaces
//! the specifier in place (quotes preserved); `None` leaves it untouched.
//!
//! This is a lexical pass, not a parser: a specifier inside a multi-line
//! template literal or block comment can be matched. For build output
//! rewriting that trade-off is acceptable and keeps the engine free of any
//! AST machinery.

use super::plugin::ResolveKind;

/// Rewrite every import specifier in `code` through `resolve`.
pub(crate) fn rewrite_specifiers<F>(code: &str, mut resolve: F) -> String
where
    F: FnMut(&str, ResolveKind) -> Option<String>,
{
    let mut result = String::with_capacity(code.len());

    for line in code.lines() {
        let trimmed = line.trim();

        let rewritten = if is_import_line(trimmed) || is_export_from_line(trimmed) {
            rewrite_statement_line(line, &mut resolve)
        } else {
            let mut out = line.to_string();
            if out.contains("import(") {
                out = rewrite_call_sites(&out, "import", ResolveKind::DynamicImport, &mut resolve);
            }
            if out.contains("require(") {
                out = rewrite_call_sites(&out, "require", ResolveKind::RequireCall, &mut resolve);
            }
            out
        };

        result.push_str(&rewritten);
        result.push('\n');
    }

    if !code.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Rewrite a static import/export line.
fn rewrite_statement_line<F>(line: &str, resolve: &mut F) -> String
where
    F: FnMut(&str, ResolveKind) -> Option<String>,
{
    if let Some((before, specifier, after, quote)) = extract_from_specifier(line) {
        match resolve(&specifier, ResolveKind::ImportStatement) {
            Some(rewritten) => format!("{before}{quote}{rewritten}{quote}{after}"),
            None => line.to_string(),
        }
    } else if let Some((before, specifier, after, quote)) = extract_side_effect_import(line) {
        match resolve(&specifier, ResolveKind::ImportStatement) {
            Some(rewritten) => format!("{before}{quote}{rewritten}{quote}{after}"),
            None => line.to_string(),
        }
    } else {
        line.to_string()
    }
}

/// Rewrite `import(...)` or `require(...)` call sites in a line.
fn rewrite_call_sites<F>(line: &str, callee: &str, kind: ResolveKind, resolve: &mut F) -> String
where
    F: FnMut(&str, ResolveKind) -> Option<String>,
{
    let needle = format!("{callee}(");
    let mut result = String::with_capacity(line.len());
    let mut remaining = line;

    while let Some(idx) = remaining.find(&needle) {
        // Word boundary: `myrequire(` is not a call site.
        let bounded = remaining[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_' && c != '$');

        let site_end = idx + needle.len();
        result.push_str(&remaining[..site_end]);
        remaining = &remaining[site_end..];

        if !bounded {
            continue;
        }

        if let Some((specifier, quote, rest)) = extract_string_from_start(remaining) {
            let ws_len = remaining.len() - remaining.trim_start().len();
            result.push_str(&remaining[..ws_len]);
            let rewritten = resolve(&specifier, kind).unwrap_or(specifier);
            result.push(quote);
            result.push_str(&rewritten);
            result.push(quote);
            remaining = rest;
        }
    }

    result.push_str(remaining);
    result
}

/// Check if a line is a static import statement.
fn is_import_line(trimmed: &str) -> bool {
    trimmed.starts_with("import ")
        && (trimmed.contains(" from ") || trimmed.contains('\'') || trimmed.contains('"'))
}

/// Check if a line is an `export ... from` re-export.
fn is_export_from_line(trimmed: &str) -> bool {
    trimmed.starts_with("export ") && trimmed.contains(" from ")
}

/// Extract the `from 'specifier'` portion of an import/export line.
///
/// Returns (`before_quote`, specifier, `after_quote`, `quote_char`).
fn extract_from_specifier(line: &str) -> Option<(String, String, String, char)> {
    let from_idx = line.find(" from ")?;
    let after_from = &line[from_idx + 6..];
    let after_from_trimmed = after_from.trim_start();
    let quote = after_from_trimmed.chars().next()?;

    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &after_from_trimmed[1..];
    let end_idx = inner.find(quote)?;
    let specifier = inner[..end_idx].to_string();

    let before = format!("{} from ", &line[..from_idx]);
    let after_specifier = &inner[end_idx + 1..];

    Some((before, specifier, after_specifier.to_string(), quote))
}

/// Extract specifier from a side-effect import: `import 'xxx'`.
fn extract_side_effect_import(line: &str) -> Option<(String, String, String, char)> {
    let trimmed = line.trim();
    let after_import = trimmed.strip_prefix("import ")?.trim_start();
    let quote = after_import.chars().next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &after_import[1..];
    let end_idx = inner.find(quote)?;
    let specifier = inner[..end_idx].to_string();
    let after = inner[end_idx + 1..].to_string();

    let leading_ws: String = line.chars().take_while(|c| c.is_whitespace()).collect();
    let before = format!("{leading_ws}import ");

    Some((before, specifier, after, quote))
}

/// Extract a string literal from the start of a string slice.
///
/// Returns (specifier, `quote_char`, `rest_of_string`).
fn extract_string_from_start(s: &str) -> Option<(String, char, &str)> {
    let trimmed = s.trim_start();
    let quote = trimmed.chars().next()?;

    if quote != '\'' && quote != '"' {
        return None;
    }

    let inner = &trimmed[1..];
    let end_idx = inner.find(quote)?;
    let specifier = inner[..end_idx].to_string();
    let rest = &inner[end_idx + 1..];

    Some((specifier, quote, rest))
}
