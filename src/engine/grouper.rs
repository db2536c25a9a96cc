//! Grouper (§4.2): clusters bindings that share a grouping scope so a
//! single visitor call sees every name introduced by one lexical region
//! together.
//!
//! Pure function over the [`Arena`] built by the analyzer; no I/O, boundary
//! cases tested directly (mirrors `agent/scaling.rs`'s
//! `compute_scaling_profile` style of small, exhaustively tested pure
//! functions operating on plain data).

use super::scope::{Arena, BindingId, ScopeId};

/// Every binding declared in one grouping scope, in declaration order.
#[derive(Debug, Clone)]
pub struct Group {
    /// The scope all bindings in this group share.
    pub scope: ScopeId,
    /// Bindings belonging to this scope, in the order the analyzer found
    /// them.
    pub bindings: Vec<BindingId>,
}

impl Group {
    /// Byte length of the underlying scope's span, used to order groups
    /// smallest-scope-first and as the merger's size signal.
    #[must_use]
    pub fn span_len(&self, arena: &Arena) -> u32 {
        arena.scope(self.scope).span_len()
    }
}

/// Groups every binding in `arena` by its owning scope, smallest scope
/// first (ties broken by span start) so narrow, easy-to-rename scopes are
/// dispatched before broad ones.
#[must_use]
pub fn group(arena: &Arena) -> Vec<Group> {
    let mut by_scope: Vec<Option<Group>> = vec![None; arena.scopes.len()];
    for binding in &arena.bindings {
        let entry = by_scope[binding.owner_scope].get_or_insert_with(|| Group {
            scope: binding.owner_scope,
            bindings: Vec::new(),
        });
        entry.bindings.push(binding.id);
    }

    let mut groups: Vec<Group> = by_scope.into_iter().flatten().collect();
    groups.sort_by_key(|g| (g.span_len(arena), arena.scope(g.scope).span.start));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scope::{BindingKind, ScopeKind};

    #[test]
    fn groups_are_ordered_smallest_scope_first() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..1000, None);
        let func = arena.push_scope(ScopeKind::Function, 100..200, Some(program));
        arena.push_binding("outer".into(), BindingKind::Var, program, 10..15);
        arena.push_binding("inner".into(), BindingKind::Param, func, 110..115);

        let groups = group(&arena);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].scope, func);
        assert_eq!(groups[1].scope, program);
    }

    #[test]
    fn scope_with_no_bindings_produces_no_group() {
        let mut arena = Arena::default();
        let program = arena.push_scope(ScopeKind::Program, 0..100, None);
        arena.push_scope(ScopeKind::Function, 10..20, Some(program));
        arena.push_binding("x".into(), BindingKind::Var, program, 0..5);

        let groups = group(&arena);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].scope, program);
    }

    #[test]
    fn empty_arena_produces_no_groups() {
        let arena = Arena::default();
        assert!(group(&arena).is_empty());
    }
}
