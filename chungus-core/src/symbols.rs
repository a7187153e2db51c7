//! Scoped symbol table shared by both semantic passes.
//!
//! Scopes live in an arena and are never freed during a run; the active
//! scopes form a stack on top of it. Declaration collection creates scopes
//! with [`SymbolTable::enter_new`]; type checking walks the same tree in
//! the same order and re-enters them with [`SymbolTable::reenter_next`], so
//! both passes see identical scope contents.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::trace;

use crate::semantic::Fault;
use crate::span::Span;
use crate::types::Type;

pub type ScopeId = usize;

/// The outermost scope; always active.
pub const GLOBAL_SCOPE: ScopeId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
}

impl SymbolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Parameter => "parameter",
        }
    }
}

/// Parameter and return types of a function.
///
/// A parameter type stays `None` until the first call that passes a value
/// of known type. `returns` is `any` until the body has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSig {
    pub params: Vec<Option<Type>>,
    pub returns: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// `None` while only declared; set by type checking.
    pub ty: Option<Type>,
    /// Depth of the scope stack when the symbol was declared, global = 0.
    pub level: usize,
    pub span: Span,
    pub signature: Option<FunctionSig>,
}

impl Symbol {
    pub fn variable(name: impl Into<String>, span: Span) -> Self {
        Symbol {
            name: name.into(),
            kind: SymbolKind::Variable,
            ty: None,
            level: 0,
            span,
            signature: None,
        }
    }

    /// Parameters are dynamically typed inside the body.
    pub fn parameter(name: impl Into<String>, span: Span) -> Self {
        Symbol {
            kind: SymbolKind::Parameter,
            ty: Some(Type::Any),
            ..Symbol::variable(name, span)
        }
    }

    pub fn function(name: impl Into<String>, arity: usize, span: Span) -> Self {
        Symbol {
            kind: SymbolKind::Function,
            signature: Some(FunctionSig {
                params: vec![None; arity],
                returns: Type::Any,
            }),
            ..Symbol::variable(name, span)
        }
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: HashMap<String, Symbol>,
}

#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    active: Vec<ScopeId>,
    /// Next scope to hand out from `reenter_next`.
    replay: ScopeId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::default()],
            active: vec![GLOBAL_SCOPE],
            replay: GLOBAL_SCOPE + 1,
        }
    }

    /// Current scope level; the global scope is level 0.
    pub fn level(&self) -> usize {
        self.active.len() - 1
    }

    pub fn current(&self) -> ScopeId {
        self.active.last().copied().unwrap_or(GLOBAL_SCOPE)
    }

    /// Number of scopes created so far, including the global one.
    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// Only the global scope is active.
    pub fn is_balanced(&self) -> bool {
        self.active.len() == 1
    }

    /// Create a child of the current scope and make it active.
    pub fn enter_new(&mut self) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent: Some(self.current()),
            symbols: HashMap::new(),
        });
        self.active.push(id);
        trace!(scope = id, level = self.level(), "enter new scope");
        id
    }

    /// Start handing out recorded scopes from the beginning again.
    pub fn rewind(&mut self) {
        self.replay = GLOBAL_SCOPE + 1;
    }

    /// Re-enter the next scope in creation order. It must have been created
    /// under the scope that is current now.
    pub fn reenter_next(&mut self) -> Result<ScopeId, Fault> {
        let id = self.replay;
        let scope = self.scopes.get(id).ok_or(Fault::MissingScope(id))?;
        if scope.parent != Some(self.current()) {
            return Err(Fault::MissingScope(id));
        }
        self.replay += 1;
        self.active.push(id);
        trace!(scope = id, level = self.level(), "re-enter scope");
        Ok(id)
    }

    pub fn exit(&mut self) -> Result<ScopeId, Fault> {
        if self.active.len() <= 1 {
            return Err(Fault::ScopeUnderflow);
        }
        let id = self.active.pop().ok_or(Fault::ScopeUnderflow)?;
        trace!(scope = id, level = self.level(), "exit scope");
        Ok(id)
    }

    /// Declare in the current scope. On a clash the existing symbol is left
    /// untouched and returned.
    pub fn declare(&mut self, mut symbol: Symbol) -> Result<&Symbol, &Symbol> {
        symbol.level = self.level();
        let current = self.current();
        let scope = &mut self.scopes[current];
        match scope.symbols.entry(symbol.name.clone()) {
            Entry::Occupied(entry) => Err(&*entry.into_mut()),
            Entry::Vacant(entry) => Ok(&*entry.insert(symbol)),
        }
    }

    /// Resolve innermost to outermost through the active scopes.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.active
            .iter()
            .rev()
            .find_map(|id| self.scopes[*id].symbols.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let id = self
            .active
            .iter()
            .rev()
            .copied()
            .find(|id| self.scopes[*id].symbols.contains_key(name))?;
        self.scopes[id].symbols.get_mut(name)
    }

    /// Resolve in the current scope only.
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes[self.current()].symbols.get(name)
    }
}
