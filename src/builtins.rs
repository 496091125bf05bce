use std::io::{self, BufRead, Write};

use log::warn;

use crate::arena::Arena;
use crate::error::{LispError, LispResult};
use crate::printer;
use crate::reader::Reader;
use crate::symbol::{sym, SymbolTable};
use crate::value::{equivalent, Value};

/// Maximum bytes of one line accepted by the read primitive.
pub const READ_LINE_MAX: usize = 255;

/// How a built-in's argument forms are treated before its body runs.
/// Every built-in enters as a special form with the raw forms; the policy
/// is the pluggable evaluation strategy chosen at registration.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgPolicy {
    /// No arguments allowed; arity fault otherwise.
    Zero,
    /// Exactly one argument form, evaluated.
    One,
    /// Exactly two argument forms, evaluated left to right.
    Two,
    /// Every argument form evaluated in place (the list cells are
    /// mutated to hold the values), whole list passed on.
    Variadic,
    /// Raw argument forms passed through untouched.
    Unevaluated,
    /// Clause dispatch for cond; evaluation is driven by the evaluator.
    Conditional,
}

impl ArgPolicy {
    /// Required argument count for the fixed-arity policies.
    pub fn required(self) -> Option<usize> {
        match self {
            ArgPolicy::Zero => Some(0),
            ArgPolicy::One => Some(1),
            ArgPolicy::Two => Some(2),
            _ => None,
        }
    }
}

/// The closed set of primitive bodies.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PrimOp {
    QuoteSugar,
    Quote,
    AtomP,
    EqP,
    Car,
    Cdr,
    Cons,
    Read,
    Eval,
    Prnt,
    Def,
    Zip,
    Cond,
}

/// One registry entry: literal name, its pre-interned symbol, the argument
/// policy, and the body.
pub struct BuiltinDef {
    pub name: &'static str,
    pub name_sym: crate::value::SymbolId,
    pub policy: ArgPolicy,
    pub op: PrimOp,
}

/// The fixed built-in registry, installed into the global environment at
/// startup in this order. `'` receives the raw forms whole (its sugar
/// reads as a dotted cons), `quote` takes the head of its form list.
pub const BUILTINS: &[BuiltinDef] = &[
    BuiltinDef { name: "'", name_sym: sym::QUOTE_SUGAR, policy: ArgPolicy::Unevaluated, op: PrimOp::QuoteSugar },
    BuiltinDef { name: "quote", name_sym: sym::QUOTE, policy: ArgPolicy::Unevaluated, op: PrimOp::Quote },
    BuiltinDef { name: "atom?", name_sym: sym::ATOMP, policy: ArgPolicy::One, op: PrimOp::AtomP },
    BuiltinDef { name: "eq?", name_sym: sym::EQP, policy: ArgPolicy::Two, op: PrimOp::EqP },
    BuiltinDef { name: "car", name_sym: sym::CAR, policy: ArgPolicy::One, op: PrimOp::Car },
    BuiltinDef { name: "cdr", name_sym: sym::CDR, policy: ArgPolicy::One, op: PrimOp::Cdr },
    BuiltinDef { name: "cons", name_sym: sym::CONS, policy: ArgPolicy::Two, op: PrimOp::Cons },
    BuiltinDef { name: "read", name_sym: sym::READ, policy: ArgPolicy::Zero, op: PrimOp::Read },
    BuiltinDef { name: "eval", name_sym: sym::EVAL, policy: ArgPolicy::One, op: PrimOp::Eval },
    BuiltinDef { name: "prnt", name_sym: sym::PRNT, policy: ArgPolicy::One, op: PrimOp::Prnt },
    BuiltinDef { name: "def", name_sym: sym::DEF, policy: ArgPolicy::Two, op: PrimOp::Def },
    BuiltinDef { name: "zip", name_sym: sym::ZIP, policy: ArgPolicy::Two, op: PrimOp::Zip },
    BuiltinDef { name: "cond", name_sym: sym::COND, policy: ArgPolicy::Conditional, op: PrimOp::Cond },
];

/// (atom? x) — nil, symbols and integers are atoms; pairs and built-in
/// references are not.
pub fn prim_atom_p(a: Value) -> Value {
    if a.is_atom() {
        Value::Symbol(sym::T)
    } else {
        Value::Nil
    }
}

/// (eq? a b) — shallow atom equivalence.
pub fn prim_eq_p(a: Value, b: Value) -> Value {
    if equivalent(a, b) {
        Value::Symbol(sym::T)
    } else {
        Value::Nil
    }
}

/// (car x) — head of a pair; nil for nil. Any other atom is a reported
/// fault yielding nil.
pub fn prim_car(a: Value, arena: &Arena, symbols: &SymbolTable) -> Value {
    match a {
        Value::Nil => Value::Nil,
        Value::Pair(id) => arena.car(id),
        _ => {
            warn!("car: {} is not a pair", printer::print_val(a, arena, symbols));
            Value::Nil
        }
    }
}

/// (cdr x) — tail of a pair; nil for nil. Any other atom is a reported
/// fault yielding nil.
pub fn prim_cdr(a: Value, arena: &Arena, symbols: &SymbolTable) -> Value {
    match a {
        Value::Nil => Value::Nil,
        Value::Pair(id) => arena.cdr(id),
        _ => {
            warn!("cdr: {} is not a pair", printer::print_val(a, arena, symbols));
            Value::Nil
        }
    }
}

/// (cons a b) — allocate a fresh pair.
pub fn prim_cons(a: Value, b: Value, arena: &mut Arena) -> LispResult<Value> {
    let id = arena.alloc(a, b)?;
    Ok(Value::Pair(id))
}

/// (zip a b) — pairwise list of (a-elem . b-elem), stopping at the
/// shorter input.
pub fn prim_zip(a: Value, b: Value, arena: &mut Arena) -> LispResult<Value> {
    let mut items = Vec::new();
    let mut left = a;
    let mut right = b;
    while let (Value::Pair(lid), Value::Pair(rid)) = (left, right) {
        let car = arena.car(lid);
        let cdr = arena.car(rid);
        let pair = arena.alloc(car, cdr)?;
        items.push(Value::Pair(pair));
        left = arena.cdr(lid);
        right = arena.cdr(rid);
    }
    arena.list(&items)
}

/// (prnt x) — write the printed form to stdout, no newline. Returns nil.
pub fn prim_prnt(a: Value, arena: &Arena, symbols: &SymbolTable) -> LispResult<Value> {
    let text = printer::print_val(a, arena, symbols);
    let mut out = io::stdout();
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| LispError::IoError(e.to_string()))?;
    Ok(Value::Nil)
}

/// (read) — announce, read one line from stdin (bounded), parse one
/// expression from it. End of input yields nil.
pub fn prim_read(arena: &mut Arena, symbols: &mut SymbolTable) -> LispResult<Value> {
    println!("READ");

    let mut line = String::new();
    let n = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| LispError::IoError(e.to_string()))?;
    if n == 0 {
        return Ok(Value::Nil);
    }

    // The original read into a fixed 256-byte buffer; keep the bound.
    if line.len() > READ_LINE_MAX {
        let mut end = READ_LINE_MAX;
        while !line.is_char_boundary(end) {
            end -= 1;
        }
        line.truncate(end);
    }

    let mut reader = Reader::new(&line, arena, symbols);
    Ok(reader.read()?.unwrap_or(Value::Nil))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::DEFAULT_CELL_CAPACITY;
    use crate::reader;
    use crate::symbol::DEFAULT_ATOM_CAPACITY;

    fn setup() -> (Arena, SymbolTable) {
        (
            Arena::new(DEFAULT_CELL_CAPACITY),
            SymbolTable::new(DEFAULT_ATOM_CAPACITY).unwrap(),
        )
    }

    #[test]
    fn registry_names_match_their_symbols() {
        let (_arena, symbols) = setup();
        for def in BUILTINS {
            assert_eq!(symbols.name(def.name_sym), def.name);
        }
    }

    #[test]
    fn atom_predicate() {
        let (mut arena, _symbols) = setup();
        let pair = arena.alloc(Value::Nil, Value::Nil).unwrap();
        assert_eq!(prim_atom_p(Value::Int(3)), Value::Symbol(sym::T));
        assert_eq!(prim_atom_p(Value::Nil), Value::Symbol(sym::T));
        assert_eq!(prim_atom_p(Value::Pair(pair)), Value::Nil);
    }

    #[test]
    fn car_and_cdr_are_nil_safe() {
        let (mut arena, symbols) = setup();
        let pair = arena.alloc(Value::Int(1), Value::Int(2)).unwrap();
        assert_eq!(prim_car(Value::Pair(pair), &arena, &symbols), Value::Int(1));
        assert_eq!(prim_cdr(Value::Pair(pair), &arena, &symbols), Value::Int(2));
        assert_eq!(prim_car(Value::Nil, &arena, &symbols), Value::Nil);
        // Fault path: reported, yields nil.
        assert_eq!(prim_car(Value::Int(9), &arena, &symbols), Value::Nil);
    }

    #[test]
    fn zip_stops_at_the_shorter_list() {
        let (mut arena, mut symbols) = setup();
        let a = reader::read_str("(1 2 3)", &mut arena, &mut symbols).unwrap();
        let b = reader::read_str("(4 5)", &mut arena, &mut symbols).unwrap();
        let zipped = prim_zip(a, b, &mut arena).unwrap();
        let items = arena.list_to_vec(zipped).unwrap();
        assert_eq!(items.len(), 2);
        let first = items[0].as_pair().unwrap();
        assert_eq!(arena.car(first), Value::Int(1));
        assert_eq!(arena.cdr(first), Value::Int(4));
    }

    #[test]
    fn zip_of_atoms_is_nil() {
        let (mut arena, _symbols) = setup();
        assert_eq!(
            prim_zip(Value::Int(1), Value::Int(2), &mut arena).unwrap(),
            Value::Nil
        );
    }
}
