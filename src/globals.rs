use crate::arena::Arena;
use crate::builtins::BUILTINS;
use crate::error::LispResult;
use crate::symbol::{sym, SymbolTable};
use crate::value::{equivalent, BuiltinId, CellId, Value};

/// An environment is an arena cell whose car is the binding list — an
/// alist of (name . value) pairs. The global environment cell lives for
/// the whole process; closure application builds a fresh cell per call
/// whose binding list front-extends the caller's.
///
/// Build the global environment. Installs, in order: the self-bound
/// constants (nil, the truth atom, the quote-sugar symbol bound to nil,
/// the lambda marker), then every entry of the built-in registry under
/// its literal name. Later bindings shadow earlier ones, so the final
/// binding for `'` is the built-in, not nil.
pub fn build_globals(arena: &mut Arena, _symbols: &SymbolTable) -> LispResult<CellId> {
    let mut bindings = Value::Nil;

    // Helper: prepend (name . val) to the binding list.
    macro_rules! def_global {
        ($sym:expr, $val:expr) => {
            let binding = arena.alloc(Value::Symbol($sym), $val)?;
            let node = arena.alloc(Value::Pair(binding), bindings)?;
            bindings = Value::Pair(node);
        };
    }

    def_global!(sym::NIL, Value::Nil);
    def_global!(sym::T, Value::Symbol(sym::T));
    def_global!(sym::QUOTE_SUGAR, Value::Nil);
    def_global!(sym::LAMBDA, Value::Symbol(sym::LAMBDA));

    for (i, def) in BUILTINS.iter().enumerate() {
        def_global!(def.name_sym, Value::Builtin(BuiltinId(i as u32)));
    }

    arena.alloc(bindings, Value::Nil)
}

/// Look up a binding in a binding list. Returns the (name . value) cell
/// if found. Comparison is atom equivalence, so symbol identity.
pub fn env_lookup(name: Value, bindings: Value, arena: &Arena) -> Option<CellId> {
    let mut current = bindings;
    while let Value::Pair(id) = current {
        if let Value::Pair(bid) = arena.car(id) {
            if equivalent(name, arena.car(bid)) {
                return Some(bid);
            }
        }
        current = arena.cdr(id);
    }
    None
}

/// Prepend a (name . value) binding to an environment's binding list and
/// return the name. Always prepends: redefinition shadows the old binding
/// rather than mutating it. Called on a local frame, the binding lives
/// only until the enclosing call returns.
pub fn define(env: CellId, name: Value, val: Value, arena: &mut Arena) -> LispResult<Value> {
    let binding = arena.alloc(name, val)?;
    let node = arena.alloc(Value::Pair(binding), arena.car(env))?;
    arena.set_car(env, Value::Pair(node));
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::DEFAULT_CELL_CAPACITY;
    use crate::symbol::DEFAULT_ATOM_CAPACITY;

    fn setup() -> (Arena, SymbolTable, CellId) {
        let mut arena = Arena::new(DEFAULT_CELL_CAPACITY);
        let symbols = SymbolTable::new(DEFAULT_ATOM_CAPACITY).unwrap();
        let globe = build_globals(&mut arena, &symbols).unwrap();
        (arena, symbols, globe)
    }

    #[test]
    fn startup_constants_resolve() {
        let (arena, _symbols, globe) = setup();
        let bindings = arena.car(globe);

        let nil_cell = env_lookup(Value::Symbol(sym::NIL), bindings, &arena).unwrap();
        assert_eq!(arena.cdr(nil_cell), Value::Nil);

        let t_cell = env_lookup(Value::Symbol(sym::T), bindings, &arena).unwrap();
        assert_eq!(arena.cdr(t_cell), Value::Symbol(sym::T));

        let lambda_cell = env_lookup(Value::Symbol(sym::LAMBDA), bindings, &arena).unwrap();
        assert_eq!(arena.cdr(lambda_cell), Value::Symbol(sym::LAMBDA));
    }

    #[test]
    fn builtin_binding_shadows_the_nil_quote_sugar() {
        let (arena, _symbols, globe) = setup();
        let bindings = arena.car(globe);
        let cell = env_lookup(Value::Symbol(sym::QUOTE_SUGAR), bindings, &arena).unwrap();
        assert!(arena.cdr(cell).is_builtin());
    }

    #[test]
    fn every_builtin_is_bound_under_its_name() {
        let (arena, _symbols, globe) = setup();
        let bindings = arena.car(globe);
        for def in BUILTINS {
            let cell = env_lookup(Value::Symbol(def.name_sym), bindings, &arena)
                .unwrap_or_else(|| panic!("{} not bound", def.name));
            assert!(arena.cdr(cell).is_builtin(), "{} not a builtin", def.name);
        }
    }

    #[test]
    fn define_prepends_and_shadows() {
        let (mut arena, _symbols, globe) = setup();
        let name = Value::Symbol(sym::CAR); // any symbol will do
        define(globe, name, Value::Int(1), &mut arena).unwrap();
        define(globe, name, Value::Int(2), &mut arena).unwrap();
        let cell = env_lookup(name, arena.car(globe), &arena).unwrap();
        assert_eq!(arena.cdr(cell), Value::Int(2));
    }
}
