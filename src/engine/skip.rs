//! Low-signal skip rules (§4.7): bindings not worth sending to a visitor,
//! either because the binding is structurally empty of context (an
//! empty-bodied `catch` parameter), because its enclosing scope barely
//! has any code to reason about, or because the declaration itself is one
//! of a handful of trivial single-statement forms that carry no signal
//! regardless of surrounding code.

use std::sync::LazyLock;

use regex::{escape, Regex};

use super::scope::{Arena, Binding};

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").unwrap_or_else(|e| unreachable!("static regex: {e}")));

/// A scope's non-whitespace, comment-stripped context below this many
/// characters gives a visitor nothing to reason from.
const MIN_CONTEXT_CHARS: usize = 10;

/// How far around a declaration's own span to look when checking for a
/// trivial single-statement form.
const TRIVIAL_FORM_WINDOW: usize = 80;

/// Whether `binding` should be excluded from every group/batch before any
/// visitor ever sees it.
///
/// An empty-bodied `catch` parameter is always skipped (flagged by the
/// analyzer as [`Binding::low_signal`](super::scope::Binding::low_signal)
/// regardless of its name), since there is no surrounding code to give a
/// visitor anything to reason about. Beyond that, a binding is skipped
/// when its owning scope's stripped source is under [`MIN_CONTEXT_CHARS`]
/// non-whitespace characters, or when the declaration itself matches one
/// of a handful of trivial single-statement forms (`x=""`, `x={}`,
/// `[x]`, `x=[]`, `function n(){}`, `function n(p){}`, `class n {}`).
#[must_use]
pub fn should_skip(binding: &Binding, source: &str, arena: &Arena) -> bool {
    if binding.low_signal {
        return true;
    }
    if context_too_short(binding, source, arena) {
        return true;
    }
    is_trivial_form(binding, source)
}

fn context_too_short(binding: &Binding, source: &str, arena: &Arena) -> bool {
    let span = &arena.scope(binding.owner_scope).span;
    let start = (span.start as usize).min(source.len());
    let end = (span.end as usize).min(source.len());
    if start >= end {
        return true;
    }
    let stripped = COMMENT_RE.replace_all(&source[start..end], "");
    stripped.chars().filter(|c| !c.is_whitespace()).count() < MIN_CONTEXT_CHARS
}

fn is_trivial_form(binding: &Binding, source: &str) -> bool {
    let start = (binding.decl_span.start as usize).saturating_sub(TRIVIAL_FORM_WINDOW).min(source.len());
    let end = (binding.decl_span.end as usize + TRIVIAL_FORM_WINDOW).min(source.len());
    if start >= end {
        return false;
    }
    let window = &source[start..end];
    let name = escape(&binding.name);

    trivial_patterns(&name).iter().any(|pattern| {
        Regex::new(pattern)
            .map(|re| re.is_match(window))
            .unwrap_or(false)
    })
}

fn trivial_patterns(name: &str) -> Vec<String> {
    vec![
        format!("\\b{name}\\s*=\\s*\"\""),
        format!("\\b{name}\\s*=\\s*\\{{\\}}"),
        format!("\\[\\s*{name}\\s*\\]"),
        format!("\\b{name}\\s*=\\s*\\[\\]"),
        format!("function\\s+{name}\\s*\\(\\s*\\)\\s*\\{{\\}}"),
        format!("function\\s+{name}\\s*\\(\\s*[A-Za-z_$][A-Za-z0-9_$]*\\s*\\)\\s*\\{{\\}}"),
        format!("class\\s+{name}\\s*\\{{\\s*\\}}"),
    ]
}
