//! Batch renamer (§4.6): normalizes a visitor's proposed name, rejects or
//! disambiguates collisions, and records the accepted name in the rename
//! set.
//!
//! Collision detection is grounded on the ruff `Renamer`'s
//! `ShadowedKind`-style classification: before accepting a name, ask
//! whether it is already visible anywhere in the binding's lexical chain,
//! and refuse (or suffix) rather than silently introduce shadowing.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::scope::Arena;

static VALID_IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap_or_else(|e| unreachable!("static regex: {e}")));

const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do", "else",
    "export", "extends", "false", "finally", "for", "function", "if", "import", "in", "instanceof", "new",
    "null", "return", "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while",
    "with", "yield", "let", "static", "enum", "await", "implements", "package", "protected", "interface",
    "private", "public",
];

/// Built-in Web/Node globals a rename must never collide with, since a
/// batch's context rarely includes a binding for them to shadow.
const BUILTIN_GLOBALS: &[&str] = &[
    "window", "document", "global", "globalThis", "process", "require", "module", "exports", "console",
    "Array", "Object", "Function", "String", "Number", "Boolean", "Symbol", "BigInt", "Math", "JSON",
    "Promise", "Map", "Set", "WeakMap", "WeakSet", "Error", "TypeError", "RangeError", "SyntaxError",
    "ReferenceError", "RegExp", "Date", "Proxy", "Reflect", "ArrayBuffer", "DataView", "Buffer",
    "undefined", "NaN", "Infinity", "setTimeout", "setInterval", "clearTimeout", "clearInterval",
    "setImmediate", "fetch", "parseInt", "parseFloat", "isNaN", "isFinite", "encodeURIComponent",
    "decodeURIComponent", "arguments", "self", "navigator", "location", "__dirname", "__filename",
];

/// Strips whitespace and validates that `candidate` is a syntactically
/// legal, non-reserved JavaScript identifier.
///
/// Returns `None` for anything a visitor proposed that can't be used as-is
/// (empty string, leading digit, embedded punctuation, reserved word) —
/// the caller falls back to keeping the original name rather than
/// producing invalid output.
#[must_use]
pub fn normalize(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() || !VALID_IDENT_RE.is_match(trimmed) {
        return None;
    }
    if RESERVED_WORDS.contains(&trimmed) {
        return None;
    }
    Some(trimmed.to_string())
}

/// Resolves a proposed name against everything already visible to
/// `scope` (the binding's own lexical chain), every name this run has
/// already assigned (`already_assigned`, to prevent two renames in the
/// same run from colliding with each other before either is applied to
/// the tree), and the built-in Web/Node globals a renamed identifier must
/// never shadow.
///
/// Both collision policies disambiguate by suffixing rather than
/// rejecting outright: repeatedly bump a trailing digit run (`d` becomes
/// `d+1`), or append `1` if the candidate has none, until a free name is
/// found. `unique_names=true` only tightens what counts as a collision —
/// it also checks every binding name in the whole tree, not just the
/// ones visible from `scope` — not whether a suffix is tried at all.
#[must_use]
pub fn resolve_collision(
    arena: &Arena,
    scope: super::scope::ScopeId,
    proposed: &str,
    already_assigned: &HashSet<String>,
    unique_names: bool,
) -> Option<String> {
    let collides = |name: &str| {
        BUILTIN_GLOBALS.contains(&name)
            || already_assigned.contains(name)
            || arena.has_binding_visible(scope, name)
            || (unique_names && arena.bindings.iter().any(|b| b.name == name))
    };

    let mut candidate = proposed.to_string();
    for _ in 0..10_000u32 {
        if !collides(&candidate) {
            return Some(candidate);
        }
        candidate = bump_suffix(&candidate);
    }
    None
}

/// Bumps a trailing run of ASCII digits by one (`item5` -> `item6`), or
/// appends `1` if `name` doesn't end in a digit (`item` -> `item1`).
fn bump_suffix(name: &str) -> String {
    let digit_start = name.rfind(|c: char| !c.is_ascii_digit()).map_or(0, |i| i + 1);
    let (base, digits) = name.split_at(digit_start);
    if digits.is_empty() {
        format!("{name}1")
    } else {
        let bumped: u64 = digits.parse::<u64>().unwrap_or(0).saturating_add(1);
        format!("{base}{bumped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scope::{BindingKind, ScopeKind};
    use test_case::test_case;

    #[test_case("" => None; "empty string")]
    #[test_case("   " => None; "all whitespace")]
    #[test_case("class" => None; "reserved word")]
    #[test_case("2cool" => None; "leading digit")]
    #[test_case("  total  " => Some("total".to_string()); "trims surrounding whitespace")]
    #[test_case("_private" => Some("_private".to_string()); "leading underscore")]
    #[test_case("$jquery" => Some("$jquery".to_string()); "leading dollar sign")]
    fn normalize_cases(candidate: &str) -> Option<String> {
        normalize(candidate)
    }

    #[test]
    fn resolve_collision_passes_through_when_free() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        let assigned = HashSet::new();
        assert_eq!(
            resolve_collision(&arena, program, "total", &assigned, false),
            Some("total".to_string())
        );
    }

    #[test]
    fn resolve_collision_suffixes_deterministically_by_default() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        arena.push_binding("total".into(), BindingKind::Var, program, 0..1);
        let assigned = HashSet::new();
        assert_eq!(
            resolve_collision(&arena, program, "total", &assigned, false),
            Some("total1".to_string())
        );
    }

    #[test]
    fn resolve_collision_still_suffixes_when_unique_names_required() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        arena.push_binding("total".into(), BindingKind::Var, program, 0..1);
        let assigned = HashSet::new();
        assert_eq!(
            resolve_collision(&arena, program, "total", &assigned, true),
            Some("total1".to_string())
        );
    }

    #[test]
    fn resolve_collision_bumps_trailing_digits_instead_of_appending() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        arena.push_binding("item5".into(), BindingKind::Var, program, 0..1);
        let assigned = HashSet::new();
        assert_eq!(
            resolve_collision(&arena, program, "item5", &assigned, false),
            Some("item6".to_string())
        );
    }

    #[test]
    fn resolve_collision_rejects_builtin_globals() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        let assigned = HashSet::new();
        assert_eq!(
            resolve_collision(&arena, program, "console", &assigned, false),
            Some("console1".to_string())
        );
    }

    #[test]
    fn resolve_collision_unique_names_checks_the_whole_tree_not_just_visible_scope() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..100, None);
        let sibling = arena.push_scope(ScopeKind::Function, 50..90, Some(program));
        arena.push_binding("total".into(), BindingKind::Var, sibling, 55..56);
        let unrelated = arena.push_scope(ScopeKind::Function, 0..20, Some(program));
        let assigned = HashSet::new();

        // `total` isn't visible from `unrelated` (sibling function), so the
        // lax policy accepts it as-is...
        assert_eq!(
            resolve_collision(&arena, unrelated, "total", &assigned, false),
            Some("total".to_string())
        );
        // ...but the strict policy still treats it as taken anywhere in the tree.
        assert_eq!(
            resolve_collision(&arena, unrelated, "total", &assigned, true),
            Some("total1".to_string())
        );
    }

    #[test]
    fn resolve_collision_considers_names_already_assigned_this_run() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        let mut assigned = HashSet::new();
        assigned.insert("total".to_string());
        assert_eq!(
            resolve_collision(&arena, program, "total", &assigned, false),
            Some("total1".to_string())
        );
    }
}
