use crate::error::{LispError, LispResult};
use crate::value::{CellId, Value};

/// A single cons cell.
pub struct Cell {
    pub car: Value,
    pub cdr: Value,
}

/// The cons cell arena. All pairs are allocated here; a CellId is an index
/// into `cells`.
///
/// Capacity is fixed at construction and there is no free operation: the
/// arena is strictly allocate-only for the life of the machine. Allocation
/// proceeds in index order, which matches popping a free list that was
/// pre-linked front to back and never refilled.
pub struct Arena {
    cells: Vec<Cell>,
    capacity: usize,
}

/// Default cell count, sized for a small fixed-memory host.
pub const DEFAULT_CELL_CAPACITY: usize = 2048;

impl Arena {
    pub fn new(capacity: usize) -> Self {
        Arena {
            cells: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Allocate a new cons cell.
    /// Returns Err(CellsExhausted) once the capacity is spent — exhaustion
    /// is a hard, distinguishable failure, never a nil that masquerades as
    /// an empty list.
    pub fn alloc(&mut self, car: Value, cdr: Value) -> LispResult<CellId> {
        if self.cells.len() >= self.capacity {
            return Err(LispError::CellsExhausted);
        }
        let id = CellId(self.cells.len() as u32);
        self.cells.push(Cell { car, cdr });
        Ok(id)
    }

    /// Get the car of a pair.
    #[inline]
    pub fn car(&self, id: CellId) -> Value {
        self.cells[id.0 as usize].car
    }

    /// Get the cdr of a pair.
    #[inline]
    pub fn cdr(&self, id: CellId) -> Value {
        self.cells[id.0 as usize].cdr
    }

    /// Overwrite the car slot. Used by in-place argument evaluation.
    #[inline]
    pub fn set_car(&mut self, id: CellId, val: Value) {
        self.cells[id.0 as usize].car = val;
    }

    /// Overwrite the cdr slot. Used by the destructive frame append.
    #[inline]
    pub fn set_cdr(&mut self, id: CellId, val: Value) {
        self.cells[id.0 as usize].cdr = val;
    }

    /// Total car of a value: car of a pair, nil for nil and for any other
    /// atom. The evaluator destructures forms with this so malformed input
    /// degrades to nil instead of undefined behavior.
    pub fn car_val(&self, val: Value) -> Value {
        match val {
            Value::Pair(id) => self.car(id),
            _ => Value::Nil,
        }
    }

    /// Total cdr of a value, same convention as `car_val`.
    pub fn cdr_val(&self, val: Value) -> Value {
        match val {
            Value::Pair(id) => self.cdr(id),
            _ => Value::Nil,
        }
    }

    /// Build a proper list from a slice of values.
    pub fn list(&mut self, values: &[Value]) -> LispResult<Value> {
        let mut result = Value::Nil;
        for &val in values.iter().rev() {
            let pair = self.alloc(val, result)?;
            result = Value::Pair(pair);
        }
        Ok(result)
    }

    /// Collect a proper list into a Vec. Returns None if not a proper list.
    pub fn list_to_vec(&self, val: Value) -> Option<Vec<Value>> {
        let mut result = Vec::new();
        let mut current = val;
        loop {
            match current {
                Value::Nil => return Some(result),
                Value::Pair(id) => {
                    result.push(self.car(id));
                    current = self.cdr(id);
                }
                _ => return None,
            }
        }
    }

    /// Destructively append `tail` to the last cdr of proper list `front`.
    /// Returns `tail` when `front` is nil, otherwise `front`. `front` must
    /// be freshly built — the shared structure behind `tail` is untouched.
    pub fn nconc(&mut self, front: Value, tail: Value) -> Value {
        let mut last = match front {
            Value::Pair(id) => id,
            _ => return tail,
        };
        while let Value::Pair(next) = self.cdr(last) {
            last = next;
        }
        self.set_cdr(last, tail);
        front
    }

    /// Number of cells allocated so far.
    pub fn used(&self) -> usize {
        self.cells.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
