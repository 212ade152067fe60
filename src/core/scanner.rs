// This module implements the cursor every decoding stage reads through. A Scanner wraps the
// mangled input as a byte slice together with a position that only the scanner itself moves.
// It offers non-consuming lookahead that yields a zero sentinel at the end of input,
// single-byte and literal conditional matches, mandatory matches that fail with
// MatchFailed, fixed-length text reads, a read-while helper, clamped
// backtracking and greedy decimal integer scanning. Integer scanning never consumes the final
// byte of the input, which keeps a trailing opcode available to the grammar.

//! Bounds-checked cursor over a mangled name.

use super::error::{DemangleError, DemangleResult};

/// Byte cursor over mangled input.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Next byte without consuming it, or `0` at end of input.
    pub fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    /// Byte `skip` positions ahead of the cursor, or `0` past the end.
    pub fn peek_at(&self, skip: usize) -> u8 {
        self.bytes.get(self.pos + skip).copied().unwrap_or(0)
    }

    pub fn read(&mut self) -> DemangleResult<u8> {
        match self.bytes.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(self.ended_prematurely()),
        }
    }

    pub fn conditional(&mut self, b: u8) -> bool {
        if self.peek_matches(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn conditional_str(&mut self, literal: &str) -> bool {
        if literal.is_empty() {
            return false;
        }
        if self.bytes[self.pos..].starts_with(literal.as_bytes()) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    pub fn expect(&mut self, b: u8) -> DemangleResult<()> {
        if self.conditional(b) {
            Ok(())
        } else {
            Err(self.match_failed(format!("'{}'", b as char)))
        }
    }

    pub fn expect_str(&mut self, literal: &str) -> DemangleResult<()> {
        if self.conditional_str(literal) {
            Ok(())
        } else {
            Err(self.match_failed(format!("{literal:?}")))
        }
    }

    /// Consume one byte satisfying `pred` and return it.
    pub fn expect_where(&mut self, pred: impl Fn(u8) -> bool, what: &str) -> DemangleResult<u8> {
        match self.bytes.get(self.pos) {
            Some(&b) if pred(b) => {
                self.pos += 1;
                Ok(b)
            }
            _ => Err(self.match_failed(what.to_string())),
        }
    }

    /// Consume exactly `count` bytes as text.
    pub fn read_str(&mut self, count: usize) -> DemangleResult<&'a str> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.ended_prematurely())?;
        let s = self
            .text
            .get(self.pos..end)
            .ok_or_else(|| self.unexpected())?;
        self.pos = end;
        Ok(s)
    }

    pub fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
        // Predicates only ever select ASCII bytes, so the slice stays on char boundaries.
        self.text.get(start..self.pos).unwrap_or("")
    }

    /// Move the cursor back; zero counts as one and the cursor stops at the start.
    pub fn backtrack(&mut self, count: usize) {
        let count = count.max(1).min(self.pos);
        self.pos -= count;
    }

    /// Greedy decimal integer. `None` when no digit was consumed.
    ///
    /// The last byte of the input is never consumed as a digit.
    pub fn conditional_int(&mut self) -> DemangleResult<Option<u64>> {
        let start = self.pos;
        let mut value: u64 = 0;
        let mut i = self.pos;
        while i + 1 < self.bytes.len() && self.bytes[i].is_ascii_digit() {
            let digit = u64::from(self.bytes[i] - b'0');
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or(DemangleError::IntegerOverflow { pos: i })?;
            i += 1;
        }
        if i == start {
            return Ok(None);
        }
        self.pos = i;
        Ok(Some(value))
    }

    /// Like [`Scanner::conditional_int`] but a missing integer is an error.
    pub fn read_int(&mut self) -> DemangleResult<u64> {
        self.conditional_int()?
            .ok_or(DemangleError::ExpectedInt { pos: self.pos })
    }

    /// Consume and return everything after the cursor.
    pub fn remainder(&mut self) -> &'a str {
        let rest = self.text.get(self.pos..).unwrap_or("");
        self.pos = self.bytes.len();
        rest
    }

    pub fn unexpected(&self) -> DemangleError {
        DemangleError::Unexpected { pos: self.pos }
    }

    pub fn match_failed(&self, expected: String) -> DemangleError {
        DemangleError::MatchFailed {
            pos: self.pos,
            expected,
        }
    }

    pub fn search_failed(&self, target: &str) -> DemangleError {
        DemangleError::SearchFailed {
            pos: self.pos,
            target: target.to_string(),
        }
    }

    fn ended_prematurely(&self) -> DemangleError {
        DemangleError::EndedPrematurely { pos: self.pos }
    }

    fn peek_matches(&self, b: u8) -> bool {
        self.bytes.get(self.pos) == Some(&b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_returns_sentinel_at_end() {
        let mut s = Scanner::new("ab");
        assert_eq!(s.peek(), b'a');
        assert_eq!(s.peek_at(1), b'b');
        assert_eq!(s.peek_at(2), 0);
        s.read().unwrap();
        s.read().unwrap();
        assert_eq!(s.peek(), 0);
        assert!(matches!(s.read(), Err(DemangleError::EndedPrematurely { pos: 2 })));
    }

    #[test]
    fn test_conditional_and_expect() {
        let mut s = Scanner::new("_T0x");
        assert!(!s.conditional_str("_Tt"));
        assert!(s.conditional_str("_T"));
        assert!(s.conditional(b'0'));
        assert!(s.expect(b'y').is_err());
        assert_eq!(s.position(), 3);
        s.expect(b'x').unwrap();
        assert!(s.is_at_end());
    }

    #[test]
    fn test_conditional_int_keeps_last_byte() {
        let mut s = Scanner::new("123");
        assert_eq!(s.conditional_int().unwrap(), Some(12));
        assert_eq!(s.remainder(), "3");

        let mut s = Scanner::new("4main");
        assert_eq!(s.conditional_int().unwrap(), Some(4));
        assert_eq!(s.read_str(4).unwrap(), "main");

        let mut s = Scanner::new("abc");
        assert_eq!(s.conditional_int().unwrap(), None);
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn test_conditional_int_overflow() {
        let mut s = Scanner::new("99999999999999999999999x");
        assert!(matches!(
            s.conditional_int(),
            Err(DemangleError::IntegerOverflow { .. })
        ));
    }

    #[test]
    fn test_backtrack_clamps() {
        let mut s = Scanner::new("abc");
        s.read().unwrap();
        s.backtrack(5);
        assert_eq!(s.position(), 0);
        s.backtrack(0);
        assert_eq!(s.position(), 0);
        s.read().unwrap();
        s.read().unwrap();
        s.backtrack(0);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn test_read_str_bounds() {
        let mut s = Scanner::new("ab");
        assert!(matches!(
            s.read_str(3),
            Err(DemangleError::EndedPrematurely { .. })
        ));
    }
}
