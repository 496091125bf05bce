use crate::arena::Arena;
use crate::builtins;
use crate::symbol::SymbolTable;
use crate::value::Value;

/// Nesting depth at which printing gives up with "...".
const MAX_DEPTH: usize = 1000;

/// Print a value to a string. Pure read-only traversal, no allocation in
/// the arena.
pub fn print_val(val: Value, arena: &Arena, symbols: &SymbolTable) -> String {
    let mut out = String::new();
    print_inner(val, arena, symbols, &mut out, 0);
    out
}

fn print_inner(val: Value, arena: &Arena, symbols: &SymbolTable, out: &mut String, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str("...");
        return;
    }

    match val {
        Value::Nil => out.push_str("nil"),
        Value::Int(n) => out.push_str(&n.to_string()),
        Value::Symbol(id) => out.push_str(symbols.name(id)),
        Value::Builtin(id) => {
            out.push_str("<builtin ");
            out.push_str(builtins::BUILTINS[id.0 as usize].name);
            out.push('>');
        }
        Value::Pair(id) => {
            out.push('(');
            print_inner(arena.car(id), arena, symbols, out, depth + 1);

            let mut current = arena.cdr(id);
            loop {
                match current {
                    Value::Nil => break,
                    Value::Pair(pid) => {
                        out.push(' ');
                        print_inner(arena.car(pid), arena, symbols, out, depth + 1);
                        current = arena.cdr(pid);
                    }
                    _ => {
                        out.push_str(" . ");
                        print_inner(current, arena, symbols, out, depth + 1);
                        break;
                    }
                }
            }
            out.push(')');
        }
    }
}
