use log::{log_enabled, trace, warn, Level};

use crate::arena::Arena;
use crate::builtins::{self, ArgPolicy, PrimOp, BUILTINS};
use crate::error::{LispError, LispResult};
use crate::globals;
use crate::printer;
use crate::reader;
use crate::symbol::{sym, SymbolTable};
use crate::value::{equivalent, BuiltinId, CellId, Value};

/// The interpreter context: the cell arena, the symbol pool, and the
/// global environment cell, threaded explicitly through every call.
pub struct Machine {
    pub arena: Arena,
    pub symbols: SymbolTable,
    /// The global environment: a cell whose car is the binding list.
    pub globe: CellId,
}

impl Machine {
    pub fn new(cell_capacity: usize, atom_capacity: usize) -> LispResult<Self> {
        let mut arena = Arena::new(cell_capacity);
        let symbols = SymbolTable::new(atom_capacity)?;
        let globe = globals::build_globals(&mut arena, &symbols)?;
        Ok(Machine {
            arena,
            symbols,
            globe,
        })
    }

    /// Print a value using this machine's arena and symbol table.
    pub fn print(&self, val: Value) -> String {
        printer::print_val(val, &self.arena, &self.symbols)
    }

    /// Read one expression from a string and evaluate it globally.
    pub fn eval_str(&mut self, input: &str) -> LispResult<Value> {
        let form = reader::read_str(input, &mut self.arena, &mut self.symbols)?;
        self.eval_global(form)
    }

    /// Evaluate a form in the global environment.
    pub fn eval_global(&mut self, form: Value) -> LispResult<Value> {
        self.eval(self.globe, form)
    }

    /// The core recursive evaluator.
    ///
    /// Nil and integers are self-evaluating; symbols resolve through the
    /// environment; pairs are calls. Recursion is host-stack recursion, so
    /// pathologically deep nesting is bounded by the host stack, not by
    /// anything the interpreter checks.
    pub fn eval(&mut self, env: CellId, form: Value) -> LispResult<Value> {
        if log_enabled!(Level::Trace) {
            trace!("eval {}", self.print(form));
        }

        match form {
            Value::Nil => Ok(Value::Nil),
            Value::Int(_) => Ok(form),
            // A builtin reference never matches a binding name, so it
            // faults as unbound just like a missing symbol.
            Value::Symbol(_) | Value::Builtin(_) => Ok(self.lookup_variable(env, form)),
            Value::Pair(id) => self.eval_call(env, id),
        }
    }

    /// Resolve an atom through the environment. A missing binding is a
    /// reported, recoverable fault yielding nil.
    fn lookup_variable(&self, env: CellId, name: Value) -> Value {
        match globals::env_lookup(name, self.arena.car(env), &self.arena) {
            Some(cell) => self.arena.cdr(cell),
            None => {
                warn!("unbound symbol: {}", self.print(name));
                Value::Nil
            }
        }
    }

    /// Evaluate a call form `(op args...)`.
    ///
    /// An atom head resolves through the environment (integers resolve to
    /// themselves); a non-atom head — an inline lambda literal or a raw
    /// builtin reference — is used as the operator without evaluation.
    fn eval_call(&mut self, env: CellId, id: CellId) -> LispResult<Value> {
        let head = self.arena.car(id);
        let args = self.arena.cdr(id);

        let op = if head.is_atom() {
            if head.is_int() {
                head
            } else {
                self.lookup_variable(env, head)
            }
        } else {
            head
        };

        match op {
            Value::Builtin(bid) => self.apply_builtin(env, bid, args),
            Value::Pair(pid)
                if equivalent(self.arena.car(pid), Value::Symbol(sym::LAMBDA)) =>
            {
                self.apply_closure(env, pid, args)
            }
            _ => {
                warn!(
                    "illegal operator: {} resolved to {}",
                    self.print(head),
                    self.print(op)
                );
                Ok(Value::Nil)
            }
        }
    }

    /// Dispatch a built-in through its registered argument policy.
    fn apply_builtin(&mut self, env: CellId, bid: BuiltinId, args: Value) -> LispResult<Value> {
        let def = &BUILTINS[bid.0 as usize];

        if let Some(required) = def.policy.required() {
            let supplied = self.arg_count(args);
            if supplied != required {
                warn!(
                    "{}: needs {} argument(s), got {}",
                    def.name, required, supplied
                );
                return Ok(Value::Nil);
            }
        }

        match def.policy {
            ArgPolicy::Zero => self.call_op0(def.op),
            ArgPolicy::One => {
                let form = self.arena.car_val(args);
                let a = self.eval(env, form)?;
                self.call_op1(env, def.op, a)
            }
            ArgPolicy::Two => {
                let first = self.arena.car_val(args);
                let second = self.arena.car_val(self.arena.cdr_val(args));
                let a = self.eval(env, first)?;
                let b = self.eval(env, second)?;
                self.call_op2(env, def.op, a, b)
            }
            // No startup built-in registers as Variadic; the policy is the
            // same in-place forcing closure application uses, and with no
            // underlying body it yields the evaluated list itself.
            ArgPolicy::Variadic => self.eval_args_in_place(env, args),
            ArgPolicy::Unevaluated => match def.op {
                // The sugar form is (' . x): hand back the whole cdr.
                PrimOp::QuoteSugar => Ok(args),
                // (quote x): hand back the head of the form list.
                PrimOp::Quote => Ok(self.arena.car_val(args)),
                _ => Err(LispError::Internal(format!(
                    "{}: unevaluated policy with no quote body",
                    def.name
                ))),
            },
            ArgPolicy::Conditional => self.eval_cond(env, args),
        }
    }

    fn call_op0(&mut self, op: PrimOp) -> LispResult<Value> {
        match op {
            PrimOp::Read => builtins::prim_read(&mut self.arena, &mut self.symbols),
            _ => Err(LispError::Internal("zero-arity dispatch mismatch".into())),
        }
    }

    fn call_op1(&mut self, env: CellId, op: PrimOp, a: Value) -> LispResult<Value> {
        match op {
            PrimOp::AtomP => Ok(builtins::prim_atom_p(a)),
            PrimOp::Car => Ok(builtins::prim_car(a, &self.arena, &self.symbols)),
            PrimOp::Cdr => Ok(builtins::prim_cdr(a, &self.arena, &self.symbols)),
            PrimOp::Eval => self.eval(env, a),
            PrimOp::Prnt => builtins::prim_prnt(a, &self.arena, &self.symbols),
            _ => Err(LispError::Internal("one-arity dispatch mismatch".into())),
        }
    }

    fn call_op2(&mut self, env: CellId, op: PrimOp, a: Value, b: Value) -> LispResult<Value> {
        match op {
            PrimOp::EqP => Ok(builtins::prim_eq_p(a, b)),
            PrimOp::Cons => builtins::prim_cons(a, b, &mut self.arena),
            PrimOp::Def => globals::define(env, a, b, &mut self.arena),
            PrimOp::Zip => builtins::prim_zip(a, b, &mut self.arena),
            _ => Err(LispError::Internal("two-arity dispatch mismatch".into())),
        }
    }

    /// Apply a closure `(-> (params) body)`.
    ///
    /// Arguments are forced in place, parameter names are zipped with the
    /// values stopping at the shorter list (length mismatches truncate
    /// silently, they are not an error), and the frame is destructively
    /// appended in front of the caller's binding list. The caller's own
    /// cells are never touched — only the fresh frame is linked.
    fn apply_closure(&mut self, env: CellId, closure: CellId, args: Value) -> LispResult<Value> {
        let lambda = self.arena.cdr(closure);
        let params = self.arena.car_val(lambda);
        let body = self.arena.car_val(self.arena.cdr_val(lambda));

        let vals = self.eval_args_in_place(env, args)?;

        let frame = builtins::prim_zip(params, vals, &mut self.arena)?;
        let merged = self.arena.nconc(frame, self.arena.car(env));
        let local = self.arena.alloc(merged, Value::Nil)?;
        self.eval(local, body)
    }

    /// Force every argument form left to right, storing each value back
    /// into its list cell. Returns the (mutated) list. Nil forms are left
    /// alone — nil evaluates to itself anyway.
    fn eval_args_in_place(&mut self, env: CellId, args: Value) -> LispResult<Value> {
        let mut current = args;
        while let Value::Pair(id) = current {
            let form = self.arena.car(id);
            if !form.is_nil() {
                let val = self.eval(env, form)?;
                self.arena.set_car(id, val);
            }
            current = self.arena.cdr(id);
        }
        Ok(args)
    }

    /// The cond special form: find the first clause whose test evaluates
    /// non-nil and evaluate only that clause's consequent. Clauses that
    /// are not pairs, or whose test form is literally nil, are skipped
    /// without evaluating anything.
    fn eval_cond(&mut self, env: CellId, clauses: Value) -> LispResult<Value> {
        let mut current = clauses;
        while let Value::Pair(id) = current {
            if let Value::Pair(clause) = self.arena.car(id) {
                let test = self.arena.car(clause);
                if !test.is_nil() {
                    let flag = self.eval(env, test)?;
                    if !flag.is_nil() {
                        let consequent = self.arena.car_val(self.arena.cdr(clause));
                        return self.eval(env, consequent);
                    }
                }
            }
            current = self.arena.cdr(id);
        }
        Ok(Value::Nil)
    }

    /// Count argument forms: the number of pair links in the list.
    fn arg_count(&self, args: Value) -> usize {
        let mut count = 0;
        let mut current = args;
        while let Value::Pair(id) = current {
            count += 1;
            current = self.arena.cdr(id);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::DEFAULT_CELL_CAPACITY;
    use crate::symbol::DEFAULT_ATOM_CAPACITY;

    fn machine() -> Machine {
        Machine::new(DEFAULT_CELL_CAPACITY, DEFAULT_ATOM_CAPACITY).unwrap()
    }

    fn show(m: &mut Machine, src: &str) -> String {
        let val = m.eval_str(src).unwrap();
        m.print(val)
    }

    #[test]
    fn self_evaluating_atoms() {
        let mut m = machine();
        assert_eq!(show(&mut m, "42"), "42");
        assert_eq!(show(&mut m, "nil"), "nil");
        assert_eq!(show(&mut m, "#t"), "#t");
    }

    #[test]
    fn quote_forms() {
        let mut m = machine();
        assert_eq!(show(&mut m, "'foo"), "foo");
        assert_eq!(show(&mut m, "'(1 2 3)"), "(1 2 3)");
        assert_eq!(show(&mut m, "(quote foo)"), "foo");
        assert_eq!(show(&mut m, "(quote (a b))"), "(a b)");
    }

    #[test]
    fn cons_car_cdr_roundtrip() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(cons 1 2)"), "(1 . 2)");
        assert_eq!(show(&mut m, "(car (cons 1 2))"), "1");
        assert_eq!(show(&mut m, "(cdr (cons 1 2))"), "2");
        assert_eq!(show(&mut m, "(car (cons '(a) 'b))"), "(a)");
    }

    #[test]
    fn eq_on_atoms_only() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(eq? 'a 'a)"), "#t");
        assert_eq!(show(&mut m, "(eq? 'a 'b)"), "nil");
        assert_eq!(show(&mut m, "(eq? 3 3)"), "#t");
        assert_eq!(show(&mut m, "(eq? 3 'a)"), "nil");
        assert_eq!(show(&mut m, "(eq? nil nil)"), "#t");
        // Structurally equal pairs are still not equivalent.
        assert_eq!(show(&mut m, "(eq? '(1) '(1))"), "nil");
        // Builtin references are never equivalent, even to themselves.
        assert_eq!(show(&mut m, "(eq? car car)"), "nil");
    }

    #[test]
    fn atom_predicate_follows_the_tags() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(atom? 'x)"), "#t");
        assert_eq!(show(&mut m, "(atom? 5)"), "#t");
        assert_eq!(show(&mut m, "(atom? nil)"), "#t");
        assert_eq!(show(&mut m, "(atom? '(1 2))"), "nil");
        // Builtin references fail the atom test.
        assert_eq!(show(&mut m, "(atom? car)"), "nil");
    }

    #[test]
    fn define_and_resolve() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(def 'x 7)"), "x");
        assert_eq!(show(&mut m, "x"), "7");
        // Redefinition shadows.
        show(&mut m, "(def 'x 8)");
        assert_eq!(show(&mut m, "x"), "8");
    }

    #[test]
    fn closures_over_list_accessors() {
        let mut m = machine();
        show(&mut m, "(def 'second '(-> (x) (car (cdr x))))");
        show(&mut m, "(def 'third '(-> (x) (car (cdr (cdr x)))))");
        assert_eq!(show(&mut m, "(second (cdr '(4 5 6 7 8)))"), "6");
        assert_eq!(show(&mut m, "(third (cdr '(4 5 6 7 8)))"), "7");
    }

    #[test]
    fn inline_lambda_literal() {
        let mut m = machine();
        assert_eq!(show(&mut m, "((-> (x) x) 5)"), "5");
        assert_eq!(show(&mut m, "((-> (a b) (cons b a)) 1 2)"), "(2 . 1)");
    }

    #[test]
    fn closure_argument_truncation_both_ways() {
        let mut m = machine();
        // Extra arguments are dropped.
        assert_eq!(show(&mut m, "((-> (x) x) 1 2 3)"), "1");
        // Missing arguments leave the parameter unbound; referencing it
        // faults to nil rather than crashing.
        assert_eq!(show(&mut m, "((-> (x y) y) 1)"), "nil");
    }

    #[test]
    fn free_variables_resolve_at_call_time() {
        let mut m = machine();
        show(&mut m, "(def 'getx '(-> () x))");
        assert_eq!(show(&mut m, "(getx)"), "nil");
        show(&mut m, "(def 'x 7)");
        assert_eq!(show(&mut m, "(getx)"), "7");
    }

    #[test]
    fn cond_picks_the_first_truthy_clause() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(cond (nil 1) (#t 2))"), "2");
        assert_eq!(show(&mut m, "(cond (#t 1) (#t 2))"), "1");
        assert_eq!(show(&mut m, "(cond (nil 1) (nil 2))"), "nil");
        assert_eq!(show(&mut m, "(cond)"), "nil");
    }

    #[test]
    fn cond_never_touches_the_losing_clause() {
        let mut m = machine();
        show(&mut m, "(cond (nil (def 'lost 1)) (#t (def 'won 2)))");
        assert_eq!(show(&mut m, "won"), "2");
        // The first clause's consequent never ran.
        assert_eq!(show(&mut m, "lost"), "nil");
    }

    #[test]
    fn zip_builtin_pairs_lists() {
        let mut m = machine();
        assert_eq!(
            show(&mut m, "(zip '(a b c) '(1 2 3))"),
            "((a . 1) (b . 2) (c . 3))"
        );
        assert_eq!(show(&mut m, "(zip '(a b) '(1))"), "((a . 1))");
    }

    #[test]
    fn eval_builtin_evaluates_its_value() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(eval ''foo)"), "foo");
        show(&mut m, "(def 'form '(cons 1 2))");
        assert_eq!(show(&mut m, "(eval form)"), "(1 . 2)");
    }

    #[test]
    fn arity_faults_yield_nil_and_leave_the_machine_usable() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(car)"), "nil");
        assert_eq!(show(&mut m, "(car '(1) '(2))"), "nil");
        assert_eq!(show(&mut m, "(eq? 1)"), "nil");
        assert_eq!(show(&mut m, "(read 1)"), "nil");
        // The arena is intact and unrelated evaluation still works.
        assert_eq!(show(&mut m, "(cons 1 2)"), "(1 . 2)");
    }

    #[test]
    fn unbound_symbol_faults_to_nil() {
        let mut m = machine();
        assert_eq!(show(&mut m, "mystery"), "nil");
        assert_eq!(show(&mut m, "(cons mystery 1)"), "(nil . 1)");
    }

    #[test]
    fn illegal_operators_fault_to_nil() {
        let mut m = machine();
        assert_eq!(show(&mut m, "(1 2 3)"), "nil");
        assert_eq!(show(&mut m, "('(a b) 1)"), "nil");
        assert_eq!(show(&mut m, "(mystery 1)"), "nil");
    }

    #[test]
    fn builtin_value_as_a_form_faults_as_unbound() {
        let mut m = machine();
        let val = m.eval_global(Value::Builtin(BuiltinId(0))).unwrap();
        assert_eq!(val, Value::Nil);
    }

    #[test]
    fn arena_exhaustion_is_distinguishable_from_nil() {
        let mut m = Machine::new(48, DEFAULT_ATOM_CAPACITY).unwrap();
        let mut saw_exhaustion = false;
        for _ in 0..16 {
            match m.eval_str("(cons 1 2)") {
                Ok(_) => {}
                Err(LispError::CellsExhausted) => {
                    saw_exhaustion = true;
                    break;
                }
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert!(saw_exhaustion);
    }
}
