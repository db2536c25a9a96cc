//! Small-scope merger (§4.3): folds scopes too small to give a visitor
//! useful context into a neighboring group, rather than sending the
//! visitor a batch of one or two bindings with no surrounding code to
//! reason about.

use std::collections::HashSet;

use super::grouper::Group;
use super::scope::{Arena, ScopeId, ScopeKind};
use super::skip;

/// A candidate group's first declaration must be within this many bytes
/// of the accumulator's last declaration to be eligible for folding.
pub const MERGE_PROXIMITY_BYTES: u32 = 5000;

/// Walks `groups` (already sorted smallest-scope-first by [`super::grouper::group`])
/// and folds each into a pending accumulator, one group at a time, per
/// §4.3's policy parameterized by `small_scope_merge_limit` (`0` disables
/// merging entirely — every group is then emitted unchanged):
///
/// - A group with more bindings than `small_scope_merge_limit`, or
///   containing any binding [`skip::should_skip`] would exclude anyway,
///   flushes the accumulator and is itself emitted standalone.
/// - Otherwise the group is folded into the accumulator unless doing so
///   would (a) collide a name already in the accumulator, (b) exceed
///   `max_batch_size`, (c) cross a function/class merge boundary, or (d)
///   reach more than [`MERGE_PROXIMITY_BYTES`] from the accumulator's
///   last declaration — any of which flushes the accumulator first and
///   starts a new one with this group.
///
/// The result is re-sorted smallest-scope-first, matching the grouper's
/// own ordering contract.
#[must_use]
pub fn merge_small_scopes(
    source: &str,
    arena: &Arena,
    groups: Vec<Group>,
    small_scope_merge_limit: i64,
    max_batch_size: usize,
) -> Vec<Group> {
    let limit = small_scope_merge_limit.max(0) as usize;

    let mut output: Vec<Group> = Vec::with_capacity(groups.len());
    let mut acc: Option<Group> = None;

    for group in groups {
        let is_skip_worthy = group.bindings.is_empty()
            || group.bindings.len() > limit
            || group.bindings.iter().any(|&id| skip::should_skip(arena.binding(id), source, arena));

        if is_skip_worthy {
            if let Some(a) = acc.take() {
                output.push(a);
            }
            output.push(group);
            continue;
        }

        match &mut acc {
            Some(a) if !fold_rejected(arena, a, &group, max_batch_size) => {
                a.bindings.extend(group.bindings);
            }
            Some(_) => {
                output.push(acc.take().unwrap_or_else(|| unreachable!("just matched Some")));
                acc = Some(group);
            }
            None => acc = Some(group),
        }
    }
    if let Some(a) = acc {
        output.push(a);
    }

    output.sort_by_key(|g| (g.span_len(arena), arena.scope(g.scope).span.start));
    output
}

/// Whether folding `candidate` into `acc` must be rejected per §4.3's four
/// conditions.
fn fold_rejected(arena: &Arena, acc: &Group, candidate: &Group, max_batch_size: usize) -> bool {
    if acc.bindings.len() + candidate.bindings.len() > max_batch_size {
        return true;
    }

    let acc_names: HashSet<&str> = acc.bindings.iter().map(|&id| arena.binding(id).name.as_str()).collect();
    if candidate.bindings.iter().any(|&id| acc_names.contains(arena.binding(id).name.as_str())) {
        return true;
    }

    if merge_boundary(arena, acc.scope) != merge_boundary(arena, candidate.scope) {
        return true;
    }

    let Some(&acc_last) = acc.bindings.last() else { return false };
    let Some(&candidate_first) = candidate.bindings.first() else { return false };
    let acc_pos = arena.binding(acc_last).decl_span.start;
    let candidate_pos = arena.binding(candidate_first).decl_span.start;
    acc_pos.abs_diff(candidate_pos) > MERGE_PROXIMITY_BYTES
}

/// The nearest enclosing program/function/class scope of `scope`,
/// inclusive of `scope` itself. Two groups only fold together when this
/// identity matches, which is what keeps a merge from ever crossing a
/// function or class boundary.
fn merge_boundary(arena: &Arena, scope: ScopeId) -> ScopeId {
    arena
        .ancestors(scope)
        .find(|&id| matches!(arena.scope(id).kind, ScopeKind::Program | ScopeKind::Function | ScopeKind::Class))
        .unwrap_or(scope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scope::BindingKind;

    /// Filler source long enough to cover any span these tests construct,
    /// with no whitespace/comments/trivial forms to trip up [`skip::should_skip`].
    fn padding(len: usize) -> String {
        "a".repeat(len)
    }

    fn arena_with_two_tiny_adjacent_scopes() -> (Arena, usize, usize) {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10_000, None);
        let a = arena.push_scope(ScopeKind::Block, 100..150, Some(program));
        let b = arena.push_scope(ScopeKind::Block, 200..260, Some(program));
        arena.push_binding("a".into(), BindingKind::Let, a, 105..106);
        arena.push_binding("b".into(), BindingKind::Let, b, 205..206);
        (arena, a, b)
    }

    #[test]
    fn tiny_sibling_scopes_merge_when_within_a_function_boundary() {
        let (arena, _a, _b) = arena_with_two_tiny_adjacent_scopes();
        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 2, 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bindings.len(), 2);
    }

    #[test]
    fn large_groups_exceeding_the_limit_are_never_merged() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..20_000, None);
        let big_one = arena.push_scope(ScopeKind::Function, 0..6000, Some(program));
        let big_two = arena.push_scope(ScopeKind::Function, 7000..13_000, Some(program));
        arena.push_binding("x".into(), BindingKind::Param, big_one, 10..11);
        arena.push_binding("y".into(), BindingKind::Param, big_one, 12..13);
        arena.push_binding("z".into(), BindingKind::Param, big_one, 14..15);
        arena.push_binding("w".into(), BindingKind::Param, big_two, 7010..7011);

        // big_one has 3 bindings, over the default limit of 2, so it is
        // never a merge candidate regardless of proximity.
        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 2, 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn tiny_sibling_function_scopes_never_merge_across_the_boundary() {
        // Two small functions sitting right next to each other in
        // byte-space: close enough to merge on proximity alone, but each
        // is its own merge boundary, so they must stay separate groups.
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..200, None);
        let one = arena.push_scope(ScopeKind::Function, 0..40, Some(program));
        let two = arena.push_scope(ScopeKind::Function, 41..80, Some(program));
        arena.push_binding("a".into(), BindingKind::Const, one, 10..11);
        arena.push_binding("b".into(), BindingKind::Const, two, 50..51);

        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 2, 10);
        assert_eq!(merged.len(), 2, "sibling functions must not merge across their boundary");
    }

    #[test]
    fn zero_limit_disables_merging_entirely() {
        let (arena, _a, _b) = arena_with_two_tiny_adjacent_scopes();
        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 0, 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn colliding_names_are_not_folded_together() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10_000, None);
        let a = arena.push_scope(ScopeKind::Block, 100..150, Some(program));
        let b = arena.push_scope(ScopeKind::Block, 200..260, Some(program));
        arena.push_binding("total".into(), BindingKind::Let, a, 105..106);
        arena.push_binding("total".into(), BindingKind::Let, b, 205..206);

        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 2, 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn folding_never_exceeds_max_batch_size() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10_000, None);
        let a = arena.push_scope(ScopeKind::Block, 100..150, Some(program));
        let b = arena.push_scope(ScopeKind::Block, 200..260, Some(program));
        arena.push_binding("a".into(), BindingKind::Let, a, 105..106);
        arena.push_binding("b".into(), BindingKind::Let, b, 205..206);

        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 2, 1);
        assert_eq!(merged.len(), 2, "max_batch_size of 1 leaves no room to fold a second binding in");
    }

    #[test]
    fn single_group_is_unchanged() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..10, None);
        arena.push_binding("x".into(), BindingKind::Var, program, 0..1);
        let groups = super::super::grouper::group(&arena);
        let merged = merge_small_scopes(&padding(20_000), &arena, groups, 2, 10);
        assert_eq!(merged.len(), 1);
    }
}
