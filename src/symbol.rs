use std::collections::HashMap;

use crate::error::{LispError, LispResult};
use crate::value::SymbolId;

/// Interned symbol table. Each unique symbol name maps to a unique
/// SymbolId, so `(eq? 'foo 'foo)` holds by id comparison alone.
///
/// The table carries a fixed byte budget standing in for the original flat
/// pool of NUL-terminated names: each interned name costs `len + 1` bytes,
/// and exceeding the budget is an explicit failure rather than a silent
/// overrun of whatever sat next to the pool.
pub struct SymbolTable {
    name_to_id: HashMap<String, SymbolId>,
    id_to_name: Vec<String>,
    bytes_used: usize,
    byte_capacity: usize,
}

/// Default symbol pool size in bytes.
pub const DEFAULT_ATOM_CAPACITY: usize = 4096;

/// Well-known symbol IDs, pre-interned at startup.
/// These must match the order of interning in SymbolTable::new().
pub mod sym {
    use crate::value::SymbolId;

    pub const NIL: SymbolId = SymbolId(0);
    pub const T: SymbolId = SymbolId(1);
    pub const QUOTE_SUGAR: SymbolId = SymbolId(2);
    pub const LAMBDA: SymbolId = SymbolId(3);
    pub const QUOTE: SymbolId = SymbolId(4);
    pub const ATOMP: SymbolId = SymbolId(5);
    pub const EQP: SymbolId = SymbolId(6);
    pub const CAR: SymbolId = SymbolId(7);
    pub const CDR: SymbolId = SymbolId(8);
    pub const CONS: SymbolId = SymbolId(9);
    pub const READ: SymbolId = SymbolId(10);
    pub const EVAL: SymbolId = SymbolId(11);
    pub const PRNT: SymbolId = SymbolId(12);
    pub const DEF: SymbolId = SymbolId(13);
    pub const ZIP: SymbolId = SymbolId(14);
    pub const COND: SymbolId = SymbolId(15);
}

impl SymbolTable {
    /// Create a new symbol table with all well-known symbols pre-interned.
    /// The order MUST match the constants in the `sym` module above.
    /// Fails if the byte budget cannot hold even the startup names.
    pub fn new(byte_capacity: usize) -> LispResult<Self> {
        let names = [
            "nil", "#t", "'", "->",
            "quote", "atom?", "eq?", "car", "cdr", "cons",
            "read", "eval", "prnt", "def", "zip", "cond",
        ];

        let mut table = SymbolTable {
            name_to_id: HashMap::new(),
            id_to_name: Vec::new(),
            bytes_used: 0,
            byte_capacity,
        };

        for name in names {
            table.intern(name)?;
        }

        Ok(table)
    }

    /// Intern a symbol name. Returns the existing ID if already interned;
    /// a new name that would exceed the byte budget is a hard error.
    pub fn intern(&mut self, name: &str) -> LispResult<SymbolId> {
        if let Some(&id) = self.name_to_id.get(name) {
            return Ok(id);
        }
        let cost = name.len() + 1;
        if self.bytes_used + cost > self.byte_capacity {
            return Err(LispError::SymbolsExhausted);
        }
        self.bytes_used += cost;
        let id = SymbolId(self.id_to_name.len() as u32);
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.push(name.to_string());
        Ok(id)
    }

    /// Look up a symbol name by its ID.
    pub fn name(&self, id: SymbolId) -> &str {
        &self.id_to_name[id.0 as usize]
    }

    /// Look up a symbol ID by name, without interning.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.name_to_id.get(name).copied()
    }

    /// Total number of interned symbols.
    pub fn count(&self) -> usize {
        self.id_to_name.len()
    }

    /// Bytes of the pool budget spent so far.
    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }
}
