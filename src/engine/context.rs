//! Context extractor (§4.5): renders the source surrounding a batch's
//! targets into the prompt a [`Visitor`](crate::engine::visitor::Visitor)
//! sees — walking from each target's own declaration up to a scope with
//! enough lines to be useful, falling back to a centered window when that
//! scope overflows the byte budget, and appending per-target labelled
//! snippets plus a global-reference banner for program-level targets —
//! truncated to a byte budget on grapheme boundaries so a multi-byte
//! character is never split, with existing comments stripped throughout
//! so the visitor focuses on identifiers rather than prose left in the
//! minified source.

use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use super::grouper::Group;
use super::scope::{Arena, Binding, BindingId, BindingKind, Scope, ScopeId, ScopeKind};
use super::splitter::Batch;

/// One identifier this batch asks the visitor to rename.
#[derive(Debug, Clone)]
pub struct RenameTarget {
    /// The binding's id in the [`Arena`].
    pub binding: BindingId,
    /// Its current (minified) name.
    pub name: String,
}

/// Everything a [`Visitor`](crate::engine::visitor::Visitor) call needs:
/// the surrounding code and the specific names it should propose
/// replacements for.
#[derive(Debug, Clone)]
pub struct BatchContext {
    /// Rendered context: the chosen enclosing scope, per-target snippets,
    /// and (for program-level targets) a global-reference banner —
    /// comment-stripped and truncated to the configured context window.
    pub shared_code: String,
    /// Free identifiers referenced in `shared_code` that are not declared
    /// locally — globals, outer-closure variables, imports.
    pub global_references: Vec<String>,
    /// The bindings this batch wants named.
    pub targets: Vec<RenameTarget>,
    /// Line-count-based signal for how much surrounding code the visitor
    /// actually has to reason from (§9's Open Question: line count, not a
    /// richer heuristic).
    pub information_score: f32,
}

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/|//[^\n]*").unwrap_or_else(|e| unreachable!("static regex: {e}")));

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_$][A-Za-z0-9_$]*").unwrap_or_else(|e| unreachable!("static regex: {e}")));

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do", "else",
    "export", "extends", "false", "finally", "for", "function", "if", "import", "in", "instanceof", "new",
    "null", "return", "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
    "with", "yield", "let", "static", "async", "await", "of", "undefined", "arguments",
];

/// Maximum number of distinct global references listed per batch, to keep
/// the prompt bounded even for scopes that touch many externals.
const MAX_GLOBAL_REFERENCES: usize = 16;

/// Minimum per-target snippet window (§4.5 step 7), floor for when a
/// batch has many targets and `context_window_bytes / |batch|` would
/// otherwise be too small to show anything useful.
const MIN_TARGET_SNIPPET_BYTES: usize = 120;

/// Builds the [`BatchContext`] for `batch` out of the full source text.
#[must_use]
pub fn extract(source: &str, arena: &Arena, batch: &Batch, context_window_bytes: usize, min_information_score: f32) -> BatchContext {
    let targets = dedup_group_targets(arena, &batch.group);
    let primary = targets.first();

    let mut p = primary.map_or(batch.group.scope, |t| context_path(arena, arena.binding(t.binding)));
    p = walk_up_anonymous(arena, p);
    p = expand_to_information_floor(source, arena, p, min_information_score);

    // Step 6: a multi-target batch whose upward walk bottomed out at the
    // program root shrinks to the minimal scope common to every target.
    if targets.len() > 1 && arena.scope(p).parent.is_none() {
        let paths: Vec<ScopeId> = targets.iter().map(|t| context_path(arena, arena.binding(t.binding))).collect();
        p = minimal_common_ancestor(arena, &paths);
    }

    let rendered = render_scope(source, arena.scope(p));
    let mut shared_code = if rendered.len() > context_window_bytes {
        // Step 5: the chosen scope overflows the budget; center on the
        // primary target's own position instead of the scope's start.
        let focus_byte = primary.map_or(arena.scope(p).span.start, |t| arena.binding(t.binding).decl_span.start);
        centered_window(source, arena.scope(p), focus_byte, context_window_bytes)
    } else {
        rendered
    };

    // Step 8: a single-target batch still short on lines after all of the
    // above expands further up the parent chain and gets a focus hint.
    if let [only] = targets.as_slice() {
        if (shared_code.lines().count() as f32) < min_information_score {
            let mut wider = p;
            while let Some(parent) = arena.scope(wider).parent {
                wider = parent;
                let candidate = render_scope(source, arena.scope(wider));
                if candidate.len() <= context_window_bytes {
                    shared_code = candidate;
                }
                if shared_code.lines().count() as f32 >= min_information_score || arena.scope(wider).parent.is_none() {
                    break;
                }
            }
            shared_code.push_str(&format!("\n// Focus identifier: {}\n", only.name));
        }
    }

    // The shared base (steps 1-6, plus step 8's extra expansion) is
    // capped at the full byte budget; the per-target snippets and global
    // references appended below manage their own, smaller budgets rather
    // than sharing this one, so they are not re-truncated against it.
    let mut shared_code = truncate_graphemes(&shared_code, context_window_bytes);

    // Step 7: per-target labelled snippets, each decorated per step 9.
    let per_target_window = (context_window_bytes / targets.len().max(1)).max(MIN_TARGET_SNIPPET_BYTES);
    for target in &targets {
        let binding = arena.binding(target.binding);
        let snippet = target_snippet(source, binding, per_target_window);
        shared_code.push_str(&format!("\n// target: {}\n{snippet}\n", target.name));
    }

    append_global_references(source, arena, &targets, arena.scope(p).span.clone(), context_window_bytes, &mut shared_code);

    let local_names = bound_names_within(arena, p);
    let mut global_references: Vec<String> = IDENT_RE
        .find_iter(&shared_code)
        .map(|m| m.as_str())
        .filter(|ident| !local_names.contains(ident) && !RESERVED_WORDS.contains(ident))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(MAX_GLOBAL_REFERENCES)
        .map(str::to_string)
        .collect();
    global_references.sort_unstable();

    let information_score = shared_code.lines().count() as f32;

    BatchContext {
        shared_code,
        global_references,
        targets,
        information_score,
    }
}

/// Step 1: the nearest scope (inclusive) that binds the target's name.
/// For most binding kinds this is simply the binding's own owner scope
/// (which by construction already binds the name); a function/class
/// *declaration*'s own body scope lives one level deeper than its
/// owner scope, so those two kinds look up their matching child scope.
fn context_path(arena: &Arena, binding: &Binding) -> ScopeId {
    match binding.kind {
        BindingKind::FunctionDecl => declared_body_scope(arena, binding, ScopeKind::Function).unwrap_or(binding.owner_scope),
        BindingKind::ClassDecl => declared_body_scope(arena, binding, ScopeKind::Class).unwrap_or(binding.owner_scope),
        _ => binding.owner_scope,
    }
}

/// The nearest `want_kind` scope parented directly by `binding.owner_scope`
/// whose span contains the declaration — the function/class body that a
/// top-level declaration's name itself isn't bound inside of.
fn declared_body_scope(arena: &Arena, binding: &Binding, want_kind: ScopeKind) -> Option<ScopeId> {
    arena
        .scopes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.parent == Some(binding.owner_scope) && s.kind == want_kind)
        .filter(|(_, s)| s.span.start <= binding.decl_span.start && s.span.end >= binding.decl_span.end)
        .min_by_key(|(_, s)| s.span_len())
        .map(|(id, _)| id)
}

/// Step 2: walks up through consecutive anonymous function scopes
/// (no [`Scope::label`]) until landing on a named one, a non-function
/// scope, or the program root.
fn walk_up_anonymous(arena: &Arena, mut p: ScopeId) -> ScopeId {
    loop {
        let scope = arena.scope(p);
        let anonymous = scope.kind == ScopeKind::Function && scope.label.is_none();
        if !anonymous {
            return p;
        }
        match scope.parent {
            Some(parent) => p = parent,
            None => return p,
        }
    }
}

/// Steps 3-4: walks up the parent chain until `p`'s rendered line count
/// clears `min_information_score`, or the program root is reached.
fn expand_to_information_floor(source: &str, arena: &Arena, mut p: ScopeId, min_information_score: f32) -> ScopeId {
    loop {
        let lines = render_scope(source, arena.scope(p)).lines().count() as f32;
        if lines >= min_information_score {
            return p;
        }
        match arena.scope(p).parent {
            Some(parent) => p = parent,
            None => return p,
        }
    }
}

/// Step 6: the nearest scope that is an ancestor (inclusive) of every
/// scope in `paths`.
fn minimal_common_ancestor(arena: &Arena, paths: &[ScopeId]) -> ScopeId {
    let Some((&first, rest)) = paths.split_first() else {
        return 0;
    };
    let mut candidates: Vec<ScopeId> = arena.ancestors(first).collect();
    for &other in rest {
        let ancestors: std::collections::HashSet<ScopeId> = arena.ancestors(other).collect();
        candidates.retain(|id| ancestors.contains(id));
    }
    candidates.into_iter().next().unwrap_or(first)
}

/// Every name bound anywhere in `root`'s scope subtree — `root` itself
/// plus every descendant, since `shared_code` renders that whole subtree
/// and a name declared two functions down is still "local", not a global
/// reference.
fn bound_names_within(arena: &Arena, root: ScopeId) -> BTreeSet<&str> {
    arena
        .scopes
        .iter()
        .enumerate()
        .filter(|&(id, _)| arena.ancestors(id).any(|a| a == root))
        .flat_map(|(_, s)| s.bindings.keys().map(String::as_str))
        .collect()
}

fn render_scope(source: &str, scope: &Scope) -> String {
    let raw = slice_safely(source, scope.span.start as usize, scope.span.end as usize);
    COMMENT_RE.replace_all(raw, "").into_owned()
}

/// Step 5's fallback: approximates centering on `focus_byte` by its
/// proportional offset within `scope`'s span (scope spans are all the
/// arena tracks; there is no statement-list boundary to center on
/// exactly), then alternately grows the window outward line by line
/// until the next line on either side would exceed `budget`.
fn centered_window(source: &str, scope: &Scope, focus_byte: u32, budget: usize) -> String {
    let stripped = render_scope(source, scope);
    let lines: Vec<&str> = stripped.lines().collect();
    if lines.is_empty() {
        return truncate_graphemes(&stripped, budget);
    }

    let scope_len = (scope.span.end - scope.span.start).max(1) as f64;
    let frac = (focus_byte.saturating_sub(scope.span.start) as f64 / scope_len).clamp(0.0, 1.0);
    let center = ((lines.len() as f64 - 1.0) * frac).round() as usize;

    let mut lo = center;
    let mut hi = center;
    let mut total = lines[center].len();
    let mut out_lines = vec![lines[center]];
    loop {
        let mut grew = false;
        if hi + 1 < lines.len() && total + lines[hi + 1].len() <= budget {
            hi += 1;
            total += lines[hi].len();
            out_lines.push(lines[hi]);
            grew = true;
        }
        if lo > 0 && total + lines[lo - 1].len() <= budget {
            lo -= 1;
            total += lines[lo].len();
            out_lines.insert(0, lines[lo]);
            grew = true;
        }
        if !grew {
            break;
        }
    }
    out_lines.join("\n")
}

/// Step 7's per-target excerpt, decorated per step 9. The decoration is
/// rendering-time only: it lives in this returned `String`, never touches
/// the tree `binding` came from.
fn target_snippet(source: &str, binding: &Binding, window: usize) -> String {
    let half = window / 2;
    let start = (binding.decl_span.start as usize).saturating_sub(half);
    let end = (binding.decl_span.end as usize + half).min(source.len());
    let raw = slice_safely(source, start, end);
    let stripped = COMMENT_RE.replace_all(raw, "").into_owned();
    let truncated = truncate_graphemes(&stripped, window);
    decorate_target(&truncated, &binding.name)
}

/// Appends a trailing `/* Rename this NAME */` after the first
/// occurrence of `name` in `snippet`.
fn decorate_target(snippet: &str, name: &str) -> String {
    let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(name))) else {
        return format!("...{snippet}...");
    };
    match re.find(snippet) {
        Some(m) => format!(
            "...{}{} /* Rename this {name} */{}...",
            &snippet[..m.start()],
            &snippet[m.start()..m.end()],
            &snippet[m.end()..]
        ),
        None => format!("...{snippet}..."),
    }
}

/// Appends a `// === Global References ===` banner listing other lines in
/// the file that mention a program-level target, subject to whatever
/// budget is left once `shared_code` already has.
fn append_global_references(
    source: &str,
    arena: &Arena,
    targets: &[RenameTarget],
    exclude: Range<u32>,
    context_window_bytes: usize,
    shared_code: &mut String,
) {
    for target in targets {
        let binding = arena.binding(target.binding);
        if arena.scope(binding.owner_scope).kind != ScopeKind::Program {
            continue;
        }
        let remaining = context_window_bytes.saturating_sub(shared_code.len());
        if remaining == 0 {
            break;
        }
        let refs = global_reference_lines(source, &binding.name, &exclude, remaining);
        if refs.is_empty() {
            continue;
        }
        shared_code.push_str("\n// === Global References ===\n");
        shared_code.push_str(&refs);
    }
}

fn global_reference_lines(source: &str, name: &str, exclude: &Range<u32>, budget: usize) -> String {
    let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(name))) else {
        return String::new();
    };
    let mut out = String::new();
    let mut offset = 0usize;
    for line in source.lines() {
        let line_start = offset as u32;
        let line_end = line_start + line.len() as u32;
        offset += line.len() + 1;

        if line_start >= exclude.start && line_end <= exclude.end {
            continue;
        }
        if !re.is_match(line) {
            continue;
        }
        let trimmed = line.trim();
        if out.len() + trimmed.len() + 1 > budget {
            break;
        }
        out.push_str(trimmed);
        out.push('\n');
    }
    out
}

fn dedup_group_targets(arena: &Arena, group: &Group) -> Vec<RenameTarget> {
    group
        .bindings
        .iter()
        .map(|&id| RenameTarget {
            binding: id,
            name: arena.binding(id).name.clone(),
        })
        .collect()
}

fn slice_safely(source: &str, start: usize, end: usize) -> &str {
    let end = end.min(source.len());
    let start = start.min(end);
    // Byte offsets come from the swc parser's own spans, so they already
    // fall on UTF-8 boundaries; this guards only against the clamp above
    // landing mid-character when a scope span touches EOF.
    let mut start = start;
    while start < end && !source.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = end;
    while end > start && !source.is_char_boundary(end) {
        end -= 1;
    }
    &source[start..end]
}

fn truncate_graphemes(input: &str, max_bytes: usize) -> String {
    if input.len() <= max_bytes {
        return input.to_string();
    }
    let mut out = String::with_capacity(max_bytes);
    for grapheme in input.graphemes(true) {
        if out.len() + grapheme.len() > max_bytes {
            break;
        }
        out.push_str(grapheme);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scope::BindingKind;
    use crate::engine::splitter::Batch as SplitBatch;

    fn sample() -> (String, Arena, usize) {
        let source = "function foo(a,b){ // add them\n  return a+b+Math.max(a,b);\n}".to_string();
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..source.len() as u32, None);
        let func_start = source.find("function").unwrap_or(0) as u32;
        let func = arena.push_scope(ScopeKind::Function, func_start..source.len() as u32, Some(program));
        arena.push_binding("a".into(), BindingKind::Param, func, 13..14);
        arena.push_binding("b".into(), BindingKind::Param, func, 15..16);
        (source, arena, func)
    }

    #[test]
    fn strips_comments_from_shared_code() {
        let (source, arena, func) = sample();
        let batch = SplitBatch {
            id: 0,
            group: Group { scope: func, bindings: vec![0, 1] },
        };
        let ctx = extract(&source, &arena, &batch, 10_000, 0.0);
        assert!(!ctx.shared_code.contains("add them"));
    }

    #[test]
    fn collects_global_references_excluding_locals_and_keywords() {
        let (source, arena, func) = sample();
        let batch = SplitBatch {
            id: 0,
            group: Group { scope: func, bindings: vec![0, 1] },
        };
        let ctx = extract(&source, &arena, &batch, 10_000, 0.0);
        assert!(ctx.global_references.contains(&"Math".to_string()));
        assert!(!ctx.global_references.contains(&"a".to_string()));
        assert!(!ctx.global_references.contains(&"return".to_string()));
    }

    #[test]
    fn truncation_never_splits_a_multibyte_character() {
        let input = "a".repeat(5) + "é" + &"b".repeat(5);
        let truncated = truncate_graphemes(&input, 6);
        assert!(truncated.is_char_boundary(truncated.len()));
    }

    #[test]
    fn per_target_snippet_decorates_the_targets_own_occurrence() {
        let (source, arena, func) = sample();
        let batch = SplitBatch {
            id: 0,
            group: Group { scope: func, bindings: vec![0, 1] },
        };
        let ctx = extract(&source, &arena, &batch, 10_000, 0.0);
        assert!(ctx.shared_code.contains("Rename this a"));
        assert!(ctx.shared_code.contains("Rename this b"));
    }

    #[test]
    fn single_target_below_information_floor_gets_a_focus_hint() {
        let source = "function wrap(){ function tiny(x){return x;} return tiny; }".to_string();
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..source.len() as u32, None);
        let outer = arena.push_scope(ScopeKind::Function, 0..source.len() as u32, Some(program));
        let tiny_start = source.find("function tiny").unwrap_or(0) as u32;
        let tiny = arena.push_scope(ScopeKind::Function, tiny_start..(source.find("; }").unwrap_or(0) as u32), Some(outer));
        let x = arena.push_binding("x".into(), BindingKind::Param, tiny, 36..37);

        let batch = SplitBatch {
            id: 0,
            group: Group { scope: tiny, bindings: vec![x] },
        };
        let ctx = extract(&source, &arena, &batch, 10_000, 16.0);
        assert!(ctx.shared_code.contains("Focus identifier: x"));
    }

    #[test]
    fn anonymous_function_expression_walks_up_to_the_named_assignment() {
        let source = "const handler = function(){ return 1; };".to_string();
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..source.len() as u32, None);
        let anon_start = source.find("function").unwrap_or(0) as u32;
        let anon = arena.push_scope(ScopeKind::Function, anon_start..source.len() as u32, Some(program));
        let n = arena.push_binding("n".into(), BindingKind::Var, anon, anon_start..anon_start + 1);

        let batch = SplitBatch {
            id: 0,
            group: Group { scope: anon, bindings: vec![n] },
        };
        let ctx = extract(&source, &arena, &batch, 10_000, 0.0);
        assert!(ctx.shared_code.contains("const handler"));
    }
}
