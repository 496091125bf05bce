use crate::arena::Arena;
use crate::error::{LispError, LispResult};
use crate::symbol::{sym, SymbolTable};
use crate::value::Value;

/// Parses S-expression text into arena-allocated values.
///
/// Whitespace is any byte `<= b' '`. An atom token is a maximal run of
/// bytes excluding whitespace, `(`, `)`, and `.` — note that `'` is an
/// ordinary token byte except at expression start.
pub struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    arena: &'a mut Arena,
    symbols: &'a mut SymbolTable,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str, arena: &'a mut Arena, symbols: &'a mut SymbolTable) -> Self {
        Reader {
            input: input.as_bytes(),
            pos: 0,
            arena,
            symbols,
        }
    }

    /// Read one expression. Returns None when only whitespace remains.
    pub fn read(&mut self) -> LispResult<Option<Value>> {
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return Ok(None);
        }
        let val = self.read_expr()?;
        Ok(Some(val))
    }

    /// Return current byte position in the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos] <= b' ' {
            self.pos += 1;
        }
    }

    fn read_expr(&mut self) -> LispResult<Value> {
        self.skip_whitespace();

        let ch = self
            .peek()
            .ok_or_else(|| LispError::ReadError("unexpected EOF".into()))?;

        match ch {
            b'\'' => self.read_quote(),
            b'(' => {
                self.advance();
                self.read_list()
            }
            b')' => Err(LispError::ReadError("unexpected ')'".into())),
            b'.' => Err(LispError::ReadError("unexpected '.'".into())),
            _ => self.read_word(),
        }
    }

    /// Quote sugar: 'x becomes (quote-sugar-symbol . x). The cdr is the
    /// quoted form itself, so the quote built-in can hand it back whole.
    fn read_quote(&mut self) -> LispResult<Value> {
        self.advance(); // consume '\''
        let expr = self.read_expr()?;
        let pair = self.arena.alloc(Value::Symbol(sym::QUOTE_SUGAR), expr)?;
        Ok(Value::Pair(pair))
    }

    /// Read the remainder of a list after '(' — elements until ')', or a
    /// dotted tail. Any '.' in element position starts the tail; whatever
    /// sits between the tail expression and the ')' is discarded.
    fn read_list(&mut self) -> LispResult<Value> {
        let mut elements = Vec::new();
        let mut dot_tail = None;

        loop {
            self.skip_whitespace();

            match self.peek() {
                None => return Err(LispError::ReadError("unterminated list".into())),
                Some(b')') => {
                    self.advance();
                    break;
                }
                Some(b'.') => {
                    self.advance(); // consume '.'
                    dot_tail = Some(self.read_expr()?);
                    // Drop trailing garbage up to the closing paren.
                    while let Some(ch) = self.peek() {
                        if ch == b')' {
                            break;
                        }
                        self.advance();
                    }
                    if self.peek() != Some(b')') {
                        return Err(LispError::ReadError("expected ')' after dot tail".into()));
                    }
                    self.advance();
                    break;
                }
                Some(_) => elements.push(self.read_expr()?),
            }
        }

        let mut result = dot_tail.unwrap_or(Value::Nil);
        for val in elements.into_iter().rev() {
            let pair = self.arena.alloc(val, result)?;
            result = Value::Pair(pair);
        }
        Ok(result)
    }

    /// Read an atom token: a number when the whole token parses as one,
    /// otherwise an interned symbol. `nil` and `#t` are plain symbols that
    /// resolve through the environment like any other name.
    fn read_word(&mut self) -> LispResult<Value> {
        let start = self.pos;
        while self.pos < self.input.len() && !is_delimiter(self.input[self.pos]) {
            self.pos += 1;
        }

        let word = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| LispError::ReadError("invalid UTF-8 in token".into()))?;

        if let Some(n) = parse_int(word) {
            return Ok(Value::Int(n));
        }

        let id = self.symbols.intern(word)?;
        Ok(Value::Symbol(id))
    }
}

fn is_delimiter(ch: u8) -> bool {
    ch <= b' ' || ch == b'(' || ch == b')' || ch == b'.'
}

/// Integer classification: the token must start with an ASCII digit and
/// parse in full under base-prefixed rules — `0x`/`0X` hex, leading-zero
/// octal, decimal otherwise. Anything else (including a leading sign)
/// falls back to being a symbol.
fn parse_int(word: &str) -> Option<i64> {
    let bytes = word.as_bytes();
    if bytes.is_empty() || !bytes[0].is_ascii_digit() {
        return None;
    }
    if let Some(hex) = word.strip_prefix("0x").or_else(|| word.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if word.len() > 1 && bytes[0] == b'0' {
        return i64::from_str_radix(&word[1..], 8).ok();
    }
    word.parse::<i64>().ok()
}

/// Read a single expression from a string. Blank input is a read error;
/// use `Reader::read` directly when blank input should yield None.
pub fn read_str(input: &str, arena: &mut Arena, symbols: &mut SymbolTable) -> LispResult<Value> {
    let mut reader = Reader::new(input, arena, symbols);
    reader
        .read()?
        .ok_or_else(|| LispError::ReadError("empty input".into()))
}

/// Read one expression starting at byte offset `pos`.
/// Returns `Ok(Some((value, new_pos)))`, or `Ok(None)` if only whitespace
/// remains.
pub fn read_one_at(
    input: &str,
    pos: usize,
    arena: &mut Arena,
    symbols: &mut SymbolTable,
) -> LispResult<Option<(Value, usize)>> {
    let mut reader = Reader::new(&input[pos..], arena, symbols);
    match reader.read()? {
        Some(val) => Ok(Some((val, pos + reader.position()))),
        None => Ok(None),
    }
}
