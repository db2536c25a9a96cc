//! Scope and binding data model (§3).
//!
//! The scope analyzer (`analyzer.rs`) builds one [`Arena`] per source tree.
//! Byte spans are taken from the original parse and stay valid for the
//! lifetime of a single run, since the engine mutates the AST in place
//! rather than reparsing between batches.

use std::ops::Range;

use indexmap::IndexMap;

/// Index into [`Arena::scopes`].
pub type ScopeId = usize;
/// Index into [`Arena::bindings`].
pub type BindingId = usize;

/// The kind of lexical region a [`Scope`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The module or script top level.
    Program,
    /// A function or method body (params and top-level body share one
    /// scope, matching JS semantics).
    Function,
    /// A `{ ... }` block, loop head, or catch body.
    Block,
    /// A class body (method/field keys are not bindings; nested method
    /// bodies get their own `Function` scope).
    Class,
}

/// A lexical region: program, function, block, or class body.
#[derive(Debug, Clone)]
pub struct Scope {
    /// What kind of region this is.
    pub kind: ScopeKind,
    /// Byte span of the region in the original source.
    pub span: Range<u32>,
    /// Enclosing scope, or `None` for the program scope.
    pub parent: Option<ScopeId>,
    /// Names bound directly in this scope, insertion-ordered.
    pub bindings: IndexMap<String, BindingId>,
    /// For a `Function`/`Class` scope, the name it is known by (a
    /// declaration's name, or a function/class expression's own optional
    /// self-reference) — `None` for an anonymous function expression or
    /// arrow. Used by the context extractor's anonymous-function walk-up
    /// (§4.5); meaningless for `Program`/`Block` scopes.
    pub label: Option<String>,
}

impl Scope {
    /// Length in bytes of this scope's span, used for the merger's
    /// small-scope proximity check and as an ordering tiebreaker.
    #[must_use]
    pub fn span_len(&self) -> u32 {
        self.span.end.saturating_sub(self.span.start)
    }
}

/// What syntactic construct introduced a [`Binding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// `var` declaration (function-scoped).
    Var,
    /// `let` declaration (block-scoped).
    Let,
    /// `const` declaration (block-scoped).
    Const,
    /// A function or arrow parameter.
    Param,
    /// The name of a `function foo() {}` declaration.
    FunctionDecl,
    /// The optional self-reference name of a function expression.
    FunctionExpr,
    /// The name of a `class Foo {}` declaration.
    ClassDecl,
    /// The optional self-reference name of a class expression.
    ClassExpr,
    /// A `catch (e)` parameter.
    CatchParam,
}

/// A declaration of a name in some lexical [`Scope`].
#[derive(Debug, Clone)]
pub struct Binding {
    /// This binding's id.
    pub id: BindingId,
    /// The minified (pre-rename) name.
    pub name: String,
    /// What introduced the binding.
    pub kind: BindingKind,
    /// Scope the binding lives in. For function/class *declarations* this
    /// is already the enclosing scope (§4.1's promotion rule folded in at
    /// construction time), so this field doubles as the grouping key —
    /// there is no separate "grouping scope".
    pub owner_scope: ScopeId,
    /// Byte span of the declaration (the identifier token itself).
    pub decl_span: Range<u32>,
    /// Set by the analyzer when the binding is structurally low-signal on
    /// its own terms (currently: a `catch` parameter whose body has zero
    /// statements). Checked by the skip rules in `skip.rs` ahead of the
    /// name-based heuristics.
    pub low_signal: bool,
}

impl Binding {
    /// Identity key per §3: `(scope-span, declaration-span)`.
    #[must_use]
    pub fn identity(&self, arena: &Arena) -> (Range<u32>, Range<u32>) {
        (arena.scope(self.owner_scope).span.clone(), self.decl_span.clone())
    }

    /// Visited-set key per §3/§6.3: `scope-span :: name :: declaration-start`.
    #[must_use]
    pub fn visited_key(&self, arena: &Arena) -> String {
        let scope_span = &arena.scope(self.owner_scope).span;
        format!(
            "{}-{}::{}::{}",
            scope_span.start, scope_span.end, self.name, self.decl_span.start
        )
    }
}

/// Arena of scopes and bindings built by the scope analyzer (§4.1).
#[derive(Debug, Default)]
pub struct Arena {
    /// All scopes, indexed by [`ScopeId`]. Index 0 is always the program
    /// scope once [`Arena::push_scope`] has been called for it.
    pub scopes: Vec<Scope>,
    /// All bindings, indexed by [`BindingId`], in discovery order.
    pub bindings: Vec<Binding>,
}

impl Arena {
    /// Returns the scope with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range; all `ScopeId`s handed out by this
    /// arena are valid for its lifetime.
    #[must_use]
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id]
    }

    /// Mutable access to the scope with the given id.
    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id]
    }

    /// Returns the binding with the given id.
    #[must_use]
    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id]
    }

    /// Registers a new scope and returns its id.
    pub fn push_scope(&mut self, kind: ScopeKind, span: Range<u32>, parent: Option<ScopeId>) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            kind,
            span,
            parent,
            bindings: IndexMap::new(),
            label: None,
        });
        id
    }

    /// Registers a new binding in `owner_scope` and returns its id.
    pub fn push_binding(
        &mut self,
        name: String,
        kind: BindingKind,
        owner_scope: ScopeId,
        decl_span: Range<u32>,
    ) -> BindingId {
        let id = self.bindings.len();
        self.bindings.push(Binding {
            id,
            name: name.clone(),
            kind,
            owner_scope,
            decl_span,
            low_signal: false,
        });
        self.scopes[owner_scope].bindings.insert(name, id);
        id
    }

    /// Marks an already-registered binding as structurally low-signal
    /// (see [`Binding::low_signal`]).
    pub fn mark_low_signal(&mut self, id: BindingId) {
        self.bindings[id].low_signal = true;
    }

    /// `scope.hasBinding(name)` (§6.1): true if `name` is bound in `scope`
    /// or any ancestor scope. See DESIGN.md's Open Question resolution for
    /// why the full chain is checked rather than just the immediate scope.
    #[must_use]
    pub fn has_binding_visible(&self, scope: ScopeId, name: &str) -> bool {
        self.get_binding_visible(scope, name).is_some()
    }

    /// `scope.getBinding(name)` (§6.1): the nearest binding of `name`
    /// visible from `scope`, searching outward through ancestors.
    #[must_use]
    pub fn get_binding_visible(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
        let mut cur = Some(scope);
        while let Some(s) = cur {
            if let Some(&id) = self.scopes[s].bindings.get(name) {
                return Some(id);
            }
            cur = self.scopes[s].parent;
        }
        None
    }

    /// All ancestor scope ids of `scope`, starting with `scope` itself and
    /// ending at the program scope.
    pub fn ancestors(&self, scope: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(scope), move |&s| self.scopes[s].parent)
    }
}
