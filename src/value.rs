use std::fmt;

/// Unique identifier for an interned symbol.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// Index into the cell arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub u32);

/// Index into the built-in registry (`builtins::BUILTINS`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuiltinId(pub u32);

/// The fundamental value. Copy semantics — pair data lives in the arena,
/// symbol names in the interner, built-in definitions in a static table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Nil,
    Int(i64),
    Symbol(SymbolId),
    Builtin(BuiltinId),
    Pair(CellId),
}

impl Value {
    pub fn is_nil(self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_pair(self) -> bool {
        matches!(self, Value::Pair(_))
    }

    pub fn is_symbol(self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_int(self) -> bool {
        matches!(self, Value::Int(_))
    }

    pub fn is_builtin(self) -> bool {
        matches!(self, Value::Builtin(_))
    }

    pub fn as_pair(self) -> Option<CellId> {
        match self {
            Value::Pair(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_symbol(self) -> Option<SymbolId> {
        match self {
            Value::Symbol(id) => Some(id),
            _ => None,
        }
    }

    /// Returns true if this value is an atom: nil, a symbol, or an integer.
    /// Pairs are not atoms, and neither are built-in function references
    /// (the atom predicate never recognized built-in cells).
    pub fn is_atom(self) -> bool {
        matches!(self, Value::Nil | Value::Symbol(_) | Value::Int(_))
    }
}

/// Shallow atom equivalence, the `eq?` relation.
///
/// Nil equals only nil; symbols compare by interned id, integers by value.
/// Pairs are never equivalent even when structurally equal, and built-in
/// references are never equivalent — not even to themselves.
pub fn equivalent(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        _ => false,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Symbol(id) => write!(f, "Sym({})", id.0),
            Value::Builtin(id) => write!(f, "Builtin({})", id.0),
            Value::Pair(id) => write!(f, "Pair({})", id.0),
        }
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

impl fmt::Debug for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellId({})", self.0)
    }
}

impl fmt::Debug for BuiltinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuiltinId({})", self.0)
    }
}
