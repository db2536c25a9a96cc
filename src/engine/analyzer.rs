//! Scope analyzer (§4.1): walks a parsed source tree and builds the
//! [`Arena`] of scopes and bindings.
//!
//! Grounded on the jellyfuzz minifier's `VarRenamer` scope-stack walk,
//! generalized from a flat `Vec<HashMap<String, String>>` to a persistent,
//! span-addressed arena, and on hashql's `Namespaces::enter`/`exit`
//! discipline for the push/visit/pop pattern used below.

use swc_common::Span;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use super::scope::{Arena, BindingKind, ScopeId, ScopeKind};

/// Builds a scope [`Arena`] for a parsed program.
#[must_use]
pub fn analyze(program: &Program) -> Arena {
    let mut analyzer = ScopeAnalyzer::default();
    match program {
        Program::Module(m) => m.visit_with(&mut analyzer),
        Program::Script(s) => s.visit_with(&mut analyzer),
    }
    analyzer.arena
}

#[derive(Default)]
struct ScopeAnalyzer {
    arena: Arena,
    stack: Vec<ScopeId>,
    current_var_kind: Option<VarDeclKind>,
    /// Set just before visiting a named function declaration's body, and
    /// consumed by the `Function` scope it pushes, to label that scope
    /// (§4.5's anonymous-function walk-up needs to tell `function foo(){}`
    /// apart from an anonymous expression or arrow).
    pending_fn_label: Option<String>,
    /// Same idea as `pending_fn_label`, for named class declarations.
    pending_class_label: Option<String>,
}

impl ScopeAnalyzer {
    fn current(&self) -> ScopeId {
        *self.stack.last().unwrap_or(&0)
    }

    /// Target scope for a `var` binding: the nearest enclosing function or
    /// program scope (hoisting).
    fn hoist_target(&self) -> ScopeId {
        for &id in self.stack.iter().rev() {
            let kind = self.arena.scope(id).kind;
            if matches!(kind, ScopeKind::Function | ScopeKind::Program) {
                return id;
            }
        }
        self.current()
    }

    fn push_scope(&mut self, kind: ScopeKind, span: Span) -> ScopeId {
        let parent = self.stack.last().copied();
        let id = self.arena.push_scope(kind, span.lo.0..span.hi.0, parent);
        self.stack.push(id);
        id
    }

    fn pop_scope(&mut self) {
        self.stack.pop();
    }

    fn bind_pat(&mut self, pat: &Pat, kind: BindingKind, target: ScopeId) {
        for (name, span) in collect_pat_bindings(pat) {
            self.arena.push_binding(name, kind, target, span.lo.0..span.hi.0);
        }
    }
}

/// Recursively collects the `(name, span)` pairs of every identifier leaf
/// bound by a destructuring pattern.
fn collect_pat_bindings(pat: &Pat) -> Vec<(String, Span)> {
    let mut out = Vec::new();
    collect_pat_bindings_into(pat, &mut out);
    out
}

fn collect_pat_bindings_into(pat: &Pat, out: &mut Vec<(String, Span)>) {
    match pat {
        Pat::Ident(BindingIdent { id, .. }) => out.push((id.sym.to_string(), id.span)),
        Pat::Array(arr) => {
            for elem in arr.elems.iter().flatten() {
                collect_pat_bindings_into(elem, out);
            }
        }
        Pat::Object(obj) => {
            for prop in &obj.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_pat_bindings_into(&kv.value, out),
                    ObjectPatProp::Assign(a) => out.push((a.key.sym.to_string(), a.key.span)),
                    ObjectPatProp::Rest(r) => collect_pat_bindings_into(&r.arg, out),
                }
            }
        }
        Pat::Assign(a) => collect_pat_bindings_into(&a.left, out),
        Pat::Rest(r) => collect_pat_bindings_into(&r.arg, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

impl Visit for ScopeAnalyzer {
    fn visit_module(&mut self, n: &Module) {
        self.push_scope(ScopeKind::Program, n.span);
        for item in &n.body {
            self.visit_module_item_top(item);
        }
        self.pop_scope();
    }

    fn visit_script(&mut self, n: &Script) {
        self.push_scope(ScopeKind::Program, n.span);
        for stmt in &n.body {
            stmt.visit_with(self);
        }
        self.pop_scope();
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        let prev = self.current_var_kind.replace(n.kind);
        n.visit_children_with(self);
        self.current_var_kind = prev;
    }

    fn visit_var_declarator(&mut self, n: &VarDeclarator) {
        let kind = match self.current_var_kind {
            Some(VarDeclKind::Var) => BindingKind::Var,
            Some(VarDeclKind::Const) => BindingKind::Const,
            _ => BindingKind::Let,
        };
        let target = if kind == BindingKind::Var {
            self.hoist_target()
        } else {
            self.current()
        };
        self.bind_pat(&n.name, kind, target);
        n.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        let enclosing = self.current();
        self.arena.push_binding(
            n.ident.sym.to_string(),
            BindingKind::FunctionDecl,
            enclosing,
            n.ident.span.lo.0..n.ident.span.hi.0,
        );
        self.pending_fn_label = Some(n.ident.sym.to_string());
        n.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        let span = n.function.span;
        self.push_scope(ScopeKind::Function, span);
        let scope = self.current();
        if let Some(ident) = &n.ident {
            self.arena.push_binding(
                ident.sym.to_string(),
                BindingKind::FunctionExpr,
                scope,
                ident.span.lo.0..ident.span.hi.0,
            );
            self.arena.scope_mut(scope).label = Some(ident.sym.to_string());
        }
        for param in &n.function.params {
            self.bind_pat(&param.pat, BindingKind::Param, scope);
        }
        if let Some(body) = &n.function.body {
            for stmt in &body.stmts {
                stmt.visit_with(self);
            }
        }
        self.pop_scope();
    }

    fn visit_function(&mut self, n: &Function) {
        self.push_scope(ScopeKind::Function, n.span);
        let scope = self.current();
        if let Some(label) = self.pending_fn_label.take() {
            self.arena.scope_mut(scope).label = Some(label);
        }
        for param in &n.params {
            self.bind_pat(&param.pat, BindingKind::Param, scope);
        }
        if let Some(body) = &n.body {
            for stmt in &body.stmts {
                stmt.visit_with(self);
            }
        }
        self.pop_scope();
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.push_scope(ScopeKind::Function, n.span);
        let scope = self.current();
        for pat in &n.params {
            self.bind_pat(pat, BindingKind::Param, scope);
        }
        match n.body.as_ref() {
            BlockStmtOrExpr::BlockStmt(block) => {
                for stmt in &block.stmts {
                    stmt.visit_with(self);
                }
            }
            BlockStmtOrExpr::Expr(expr) => expr.visit_with(self),
        }
        self.pop_scope();
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        let enclosing = self.current();
        self.arena.push_binding(
            n.ident.sym.to_string(),
            BindingKind::ClassDecl,
            enclosing,
            n.ident.span.lo.0..n.ident.span.hi.0,
        );
        self.pending_class_label = Some(n.ident.sym.to_string());
        n.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        self.push_scope(ScopeKind::Class, n.class.span);
        let scope = self.current();
        if let Some(ident) = &n.ident {
            self.arena.push_binding(
                ident.sym.to_string(),
                BindingKind::ClassExpr,
                scope,
                ident.span.lo.0..ident.span.hi.0,
            );
            self.arena.scope_mut(scope).label = Some(ident.sym.to_string());
        }
        n.class.body.visit_with(self);
        self.pop_scope();
    }

    fn visit_class(&mut self, n: &Class) {
        // visit_class_decl delegates here via `n.class.visit_with(self)`;
        // visit_class_expr pushes its own scope and visits the body
        // directly instead, to avoid pushing this scope twice.
        self.push_scope(ScopeKind::Class, n.span);
        let scope = self.current();
        if let Some(label) = self.pending_class_label.take() {
            self.arena.scope_mut(scope).label = Some(label);
        }
        n.body.visit_with(self);
        self.pop_scope();
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.push_scope(ScopeKind::Block, n.span);
        n.visit_children_with(self);
        self.pop_scope();
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        self.push_scope(ScopeKind::Block, n.span);
        let scope = self.current();
        let empty_body = n.body.stmts.is_empty();
        if let Some(pat) = &n.param {
            for (name, span) in collect_pat_bindings(pat) {
                let id = self.arena.push_binding(name, BindingKind::CatchParam, scope, span.lo.0..span.hi.0);
                if empty_body {
                    self.arena.mark_low_signal(id);
                }
            }
        }
        for stmt in &n.body.stmts {
            stmt.visit_with(self);
        }
        self.pop_scope();
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        self.push_scope(ScopeKind::Block, n.span);
        let scope = self.current();
        if let Some(VarDeclOrExpr::VarDecl(decl)) = &n.init {
            let kind = match decl.kind {
                VarDeclKind::Var => BindingKind::Var,
                VarDeclKind::Const => BindingKind::Const,
                VarDeclKind::Let => BindingKind::Let,
            };
            for decl in &decl.decls {
                self.bind_pat(&decl.name, kind, scope);
                if let Some(init) = &decl.init {
                    init.visit_with(self);
                }
            }
        } else if let Some(VarDeclOrExpr::Expr(e)) = &n.init {
            e.visit_with(self);
        }
        if let Some(test) = &n.test {
            test.visit_with(self);
        }
        if let Some(update) = &n.update {
            update.visit_with(self);
        }
        n.body.visit_with(self);
        self.pop_scope();
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        self.push_scope(ScopeKind::Block, n.span);
        let scope = self.current();
        bind_for_head(self, &n.left, scope);
        n.right.visit_with(self);
        n.body.visit_with(self);
        self.pop_scope();
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        self.push_scope(ScopeKind::Block, n.span);
        let scope = self.current();
        bind_for_head(self, &n.left, scope);
        n.right.visit_with(self);
        n.body.visit_with(self);
        self.pop_scope();
    }
}

fn bind_for_head(analyzer: &mut ScopeAnalyzer, head: &ForHead, scope: ScopeId) {
    if let ForHead::VarDecl(decl) = head {
        let kind = match decl.kind {
            VarDeclKind::Var => BindingKind::Var,
            VarDeclKind::Const => BindingKind::Const,
            VarDeclKind::Let => BindingKind::Let,
        };
        for d in &decl.decls {
            analyzer.bind_pat(&d.name, kind, scope);
        }
    }
}

impl ScopeAnalyzer {
    /// Unwraps `export`/`export default` to reach the underlying
    /// declaration so exported functions, classes, and variables are still
    /// treated as bindings. Import specifiers are never bindings
    /// (renaming imports is a non-goal).
    fn visit_module_item_top(&mut self, item: &ModuleItem) {
        match item {
            ModuleItem::Stmt(stmt) => stmt.visit_with(self),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => export.decl.visit_with(self),
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => match &export.decl {
                DefaultDecl::Fn(f) => f.visit_with(self),
                DefaultDecl::Class(c) => c.visit_with(self),
                DefaultDecl::TsInterfaceDecl(_) => {}
            },
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultExpr(export)) => export.expr.visit_with(self),
            ModuleItem::ModuleDecl(_) => {}
        }
    }
}
