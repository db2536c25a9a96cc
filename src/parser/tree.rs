//! [`SourceTree`]: parses JavaScript into a mutable AST, prints it back out,
//! and applies bindings renames in place.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use swc_common::comments::SingleThreadedComments;
use swc_common::errors::{ColorConfig, Handler};
use swc_common::{FileName, SourceMap};
use swc_ecma_ast::*;
use swc_ecma_codegen::text_writer::JsWriter;
use swc_ecma_codegen::{Config as CodegenConfig, Emitter};
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax};
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::error::{EngineError, Result};

/// A single rename to apply during a [`SourceTree::apply_renames`] pass.
#[derive(Debug, Clone)]
pub struct PlannedRename {
    /// Byte span of the declaration site, as recorded by the scope
    /// analyzer in the [`Arena`](crate::engine::scope::Arena) this tree was
    /// analyzed into.
    pub decl_span: Range<u32>,
    /// Name currently at that declaration (pre-rename).
    pub old_name: String,
    /// Name to rename it to.
    pub new_name: String,
}

/// A parsed JavaScript source, kept mutable across the lifetime of a
/// renaming run so that scope byte-spans computed once by the analyzer
/// stay valid (no reparse between batches).
pub struct SourceTree {
    program: Program,
    source_map: Arc<SourceMap>,
}

impl SourceTree {
    /// Parses `source` (an ES2020+ module or script) into a mutable tree.
    ///
    /// `path` is used only for diagnostics.
    pub fn parse(path: &str, source: &str) -> Result<Self> {
        let source_map: Arc<SourceMap> = Arc::default();
        let handler = Handler::with_tty_emitter(ColorConfig::Never, true, false, Some(source_map.clone()));
        let file = source_map.new_source_file(Arc::new(FileName::Custom(path.to_string())), source.to_string());

        let comments = SingleThreadedComments::default();
        let lexer = Lexer::new(
            Syntax::Es(Default::default()),
            Default::default(),
            StringInput::from(&*file),
            Some(&comments),
        );
        let mut parser = Parser::new_from(lexer);

        let program = parser.parse_program().map_err(|err| {
            err.into_diagnostic(&handler).emit();
            EngineError::Parse {
                path: path.to_string(),
                message: "failed to parse source as JavaScript".to_string(),
            }
        })?;

        for err in parser.take_errors() {
            err.into_diagnostic(&handler).emit();
        }

        Ok(Self { program, source_map })
    }

    /// The parsed program, for the scope analyzer to walk.
    #[must_use]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Renders the current (possibly partially renamed) tree back to
    /// source text.
    pub fn print(&self) -> Result<String> {
        let mut buf = Vec::new();
        {
            let writer = JsWriter::new(self.source_map.clone(), "\n", &mut buf, None);
            let mut emitter = Emitter {
                cfg: CodegenConfig::default(),
                cm: self.source_map.clone(),
                comments: None,
                wr: writer,
            };
            emitter.emit_program(&self.program).map_err(|e| EngineError::Parse {
                path: "<output>".to_string(),
                message: format!("failed to print renamed source: {e}"),
            })?;
        }
        String::from_utf8(buf).map_err(|e| EngineError::Parse {
            path: "<output>".to_string(),
            message: format!("printer produced invalid UTF-8: {e}"),
        })
    }

    /// Applies a batch of renames to the tree in a single traversal,
    /// renaming each declaration and every reference to it that is still
    /// visible (not shadowed by a closer redeclaration of the same name).
    ///
    /// Returns the number of declarations actually found and renamed;
    /// entries in `renames` whose `decl_span` no longer matches a live
    /// declaration are silently skipped (defensive against a stale batch).
    pub fn apply_renames(&mut self, renames: &[PlannedRename]) -> usize {
        let mut visitor = RenameVisitor::new(renames);
        self.program.visit_mut_with(&mut visitor);
        visitor.applied
    }
}

/// What a name currently resolves to within one lexical scope frame during
/// the rename-application walk.
enum RenameSlot {
    /// Bound here, being renamed to this new name.
    Renamed(String),
    /// Bound here, not part of this batch: blocks outer resolution.
    Shadowed,
}

struct RenameVisitor<'a> {
    pending: &'a [PlannedRename],
    scopes: Vec<HashMap<String, RenameSlot>>,
    current_var_kind: Option<VarDeclKind>,
    applied: usize,
}

impl<'a> RenameVisitor<'a> {
    fn new(pending: &'a [PlannedRename]) -> Self {
        Self {
            pending,
            scopes: vec![HashMap::new()],
            current_var_kind: None,
            applied: 0,
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn resolve(&self, name: &str) -> Option<&str> {
        for frame in self.scopes.iter().rev() {
            match frame.get(name) {
                Some(RenameSlot::Renamed(new_name)) => return Some(new_name.as_str()),
                Some(RenameSlot::Shadowed) => return None,
                None => continue,
            }
        }
        None
    }

    fn find_pending(&self, name: &str, span_lo: u32) -> Option<&PlannedRename> {
        self.pending
            .iter()
            .find(|r| r.old_name == name && r.decl_span.start == span_lo)
    }

    /// Binds one identifier declaration site: renames it if it matches a
    /// pending rename, otherwise records it as a shadowing boundary.
    fn bind_ident(&mut self, ident: &mut Ident) {
        let old_name = ident.sym.to_string();
        if let Some(rename) = self.find_pending(&old_name, ident.span.lo.0) {
            let new_name = rename.new_name.clone();
            ident.sym = new_name.clone().into();
            self.applied += 1;
            self.scopes
                .last_mut()
                .unwrap_or_else(|| unreachable!("scope stack is never empty"))
                .insert(old_name, RenameSlot::Renamed(new_name));
        } else {
            self.scopes
                .last_mut()
                .unwrap_or_else(|| unreachable!("scope stack is never empty"))
                .insert(old_name, RenameSlot::Shadowed);
        }
    }

    fn bind_pat(&mut self, pat: &mut Pat) {
        match pat {
            Pat::Ident(b) => self.bind_ident(&mut b.id),
            Pat::Array(arr) => {
                for elem in arr.elems.iter_mut().flatten() {
                    self.bind_pat(elem);
                }
            }
            Pat::Object(obj) => {
                for prop in &mut obj.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => self.bind_pat(&mut kv.value),
                        ObjectPatProp::Assign(a) => {
                            self.bind_ident(&mut a.key);
                            if let Some(value) = &mut a.value {
                                value.visit_mut_with(self);
                            }
                        }
                        ObjectPatProp::Rest(r) => self.bind_pat(&mut r.arg),
                    }
                }
            }
            Pat::Assign(a) => {
                self.bind_pat(&mut a.left);
                a.right.visit_mut_with(self);
            }
            Pat::Rest(r) => self.bind_pat(&mut r.arg),
            Pat::Expr(_) | Pat::Invalid(_) => {}
        }
    }
}

impl VisitMut for RenameVisitor<'_> {
    fn visit_mut_var_decl(&mut self, n: &mut VarDecl) {
        let prev = self.current_var_kind.replace(n.kind);
        n.visit_mut_children_with(self);
        self.current_var_kind = prev;
    }

    fn visit_mut_var_declarator(&mut self, n: &mut VarDeclarator) {
        self.bind_pat(&mut n.name);
        if let Some(init) = &mut n.init {
            init.visit_mut_with(self);
        }
    }

    fn visit_mut_fn_decl(&mut self, n: &mut FnDecl) {
        self.bind_ident(&mut n.ident);
        n.function.visit_mut_with(self);
    }

    fn visit_mut_fn_expr(&mut self, n: &mut FnExpr) {
        self.push_scope();
        if let Some(ident) = &mut n.ident {
            self.bind_ident(ident);
        }
        for param in &mut n.function.params {
            self.bind_pat(&mut param.pat);
        }
        if let Some(body) = &mut n.function.body {
            for stmt in &mut body.stmts {
                stmt.visit_mut_with(self);
            }
        }
        self.pop_scope();
    }

    fn visit_mut_function(&mut self, n: &mut Function) {
        self.push_scope();
        for param in &mut n.params {
            self.bind_pat(&mut param.pat);
        }
        if let Some(body) = &mut n.body {
            for stmt in &mut body.stmts {
                stmt.visit_mut_with(self);
            }
        }
        self.pop_scope();
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ArrowExpr) {
        self.push_scope();
        for pat in &mut n.params {
            self.bind_pat(pat);
        }
        match n.body.as_mut() {
            BlockStmtOrExpr::BlockStmt(block) => {
                for stmt in &mut block.stmts {
                    stmt.visit_mut_with(self);
                }
            }
            BlockStmtOrExpr::Expr(expr) => expr.visit_mut_with(self),
        }
        self.pop_scope();
    }

    fn visit_mut_class_decl(&mut self, n: &mut ClassDecl) {
        self.bind_ident(&mut n.ident);
        n.class.visit_mut_with(self);
    }

    fn visit_mut_class_expr(&mut self, n: &mut ClassExpr) {
        self.push_scope();
        if let Some(ident) = &mut n.ident {
            self.bind_ident(ident);
        }
        n.class.body.visit_mut_with(self);
        self.pop_scope();
    }

    fn visit_mut_class(&mut self, n: &mut Class) {
        self.push_scope();
        n.body.visit_mut_with(self);
        self.pop_scope();
    }

    fn visit_mut_block_stmt(&mut self, n: &mut BlockStmt) {
        self.push_scope();
        n.visit_mut_children_with(self);
        self.pop_scope();
    }

    fn visit_mut_catch_clause(&mut self, n: &mut CatchClause) {
        self.push_scope();
        if let Some(pat) = &mut n.param {
            self.bind_pat(pat);
        }
        for stmt in &mut n.body.stmts {
            stmt.visit_mut_with(self);
        }
        self.pop_scope();
    }

    fn visit_mut_for_stmt(&mut self, n: &mut ForStmt) {
        self.push_scope();
        if let Some(VarDeclOrExpr::VarDecl(decl)) = &mut n.init {
            for d in &mut decl.decls {
                self.bind_pat(&mut d.name);
                if let Some(init) = &mut d.init {
                    init.visit_mut_with(self);
                }
            }
        } else if let Some(VarDeclOrExpr::Expr(e)) = &mut n.init {
            e.visit_mut_with(self);
        }
        if let Some(test) = &mut n.test {
            test.visit_mut_with(self);
        }
        if let Some(update) = &mut n.update {
            update.visit_mut_with(self);
        }
        n.body.visit_mut_with(self);
        self.pop_scope();
    }

    fn visit_mut_for_in_stmt(&mut self, n: &mut ForInStmt) {
        self.push_scope();
        bind_for_head_mut(self, &mut n.left);
        n.right.visit_mut_with(self);
        n.body.visit_mut_with(self);
        self.pop_scope();
    }

    fn visit_mut_for_of_stmt(&mut self, n: &mut ForOfStmt) {
        self.push_scope();
        bind_for_head_mut(self, &mut n.left);
        n.right.visit_mut_with(self);
        n.body.visit_mut_with(self);
        self.pop_scope();
    }

    fn visit_mut_expr(&mut self, n: &mut Expr) {
        if let Expr::Ident(ident) = n {
            if let Some(new_name) = self.resolve(&ident.sym) {
                ident.sym = new_name.to_string().into();
            }
        }
        n.visit_mut_children_with(self);
    }
}

fn bind_for_head_mut(visitor: &mut RenameVisitor<'_>, head: &mut ForHead) {
    if let ForHead::VarDecl(decl) = head {
        for d in &mut decl.decls {
            visitor.bind_pat(&mut d.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_script() {
        let tree = SourceTree::parse("test.js", "function f(a){return a+1}").unwrap_or_else(|e| {
            panic!("expected parse to succeed: {e}");
        });
        assert!(matches!(tree.program(), Program::Script(_)));
    }

    #[test]
    fn rejects_invalid_syntax() {
        let result = SourceTree::parse("test.js", "function ( { {{{");
        assert!(result.is_err());
    }

    #[test]
    fn print_round_trips_identifiers() {
        let tree = SourceTree::parse("test.js", "var a = 1;").unwrap_or_else(|e| panic!("parse failed: {e}"));
        let out = tree.print().unwrap_or_else(|e| panic!("print failed: {e}"));
        assert!(out.contains('a'));
    }
}
