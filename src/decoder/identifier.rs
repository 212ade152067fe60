//! Identifier text: literal segments, word-table compression, Punycode and operator names.

use std::rc::Rc;

use super::punycode::decode_punycode;
use super::{Demangler, MAX_NUM_WORDS};
use crate::core::DemangleResult;
use crate::symbol::{Kind, Symbol};

const OPERATOR_CHAR_TABLE: &[u8; 26] = b"& @/= >    <*!|+?%-~   ^ .";

fn is_word_start(c: u8) -> bool {
    !c.is_ascii_digit() && c != b'_' && c != 0
}

fn is_word_end(c: u8, prev: u8) -> bool {
    c == b'_' || c == 0 || (!prev.is_ascii_uppercase() && c.is_ascii_uppercase())
}

impl Demangler<'_> {
    /// Decode an identifier and record it as a substitution.
    pub(super) fn demangle_identifier(&mut self) -> DemangleResult<Rc<Symbol>> {
        let mut has_word_subs = false;
        let mut is_punycoded = false;
        let first = self
            .scanner
            .expect_where(|c| c.is_ascii_digit(), "an identifier length")?;
        if first == b'0' {
            if self.scanner.conditional(b'0') {
                is_punycoded = true;
            } else {
                has_word_subs = true;
            }
        } else {
            self.scanner.backtrack(1);
        }

        let mut identifier = String::new();
        loop {
            while has_word_subs && self.scanner.peek().is_ascii_alphabetic() {
                let c = self.scanner.read()?;
                let word_index = if c.is_ascii_lowercase() {
                    usize::from(c - b'a')
                } else {
                    has_word_subs = false;
                    usize::from(c - b'A')
                };
                let word = self.require(self.words.get(word_index))?;
                identifier.push_str(word);
            }
            if self.scanner.conditional(b'0') {
                break;
            }
            let num_chars = self.scanner.read_int()?;
            self.ensure(num_chars > 0)?;
            if is_punycoded {
                self.scanner.conditional(b'_');
            }
            let count = usize::try_from(num_chars).map_err(|_| self.scanner.unexpected())?;
            let text = self.scanner.read_str(count)?;
            if is_punycoded {
                let decoded = self.require(decode_punycode(text))?;
                identifier.push_str(&decoded);
            } else {
                identifier.push_str(text);
                self.record_words(text);
            }
            if !has_word_subs {
                break;
            }
        }

        self.ensure(!identifier.is_empty())?;
        let node = Rc::new(Symbol::with_text(Kind::Identifier, identifier));
        self.substitutions.push(node.clone());
        Ok(node)
    }

    /// Split a literal segment into words and remember the first 26 of at least two bytes.
    fn record_words(&mut self, text: &str) {
        let bytes = text.as_bytes();
        let mut word_start: Option<usize> = None;
        for idx in 0..=bytes.len() {
            let c = bytes.get(idx).copied().unwrap_or(0);
            if let Some(start) = word_start {
                if is_word_end(c, bytes[idx - 1]) {
                    if idx - start >= 2 && self.words.len() < MAX_NUM_WORDS {
                        if let Some(word) = text.get(start..idx) {
                            self.words.push(word.to_string());
                        }
                    }
                    word_start = None;
                }
            }
            if word_start.is_none() && is_word_start(c) {
                word_start = Some(idx);
            }
        }
    }

    /// `o` opcode: the preceding identifier spelled with the operator letter code.
    pub(super) fn demangle_operator_identifier(&mut self) -> DemangleResult<Symbol> {
        let ident = self.pop_required(Kind::Identifier)?;
        let mut name = String::new();
        for c in ident.text().unwrap_or_default().chars() {
            if !c.is_ascii() {
                name.push(c);
                continue;
            }
            self.ensure(c.is_ascii_lowercase())?;
            let op = OPERATOR_CHAR_TABLE[(c as u8 - b'a') as usize];
            self.ensure(op != b' ')?;
            name.push(op as char);
        }
        let kind = match self.scanner.read()? {
            b'i' => Kind::InfixOperator,
            b'p' => Kind::PrefixOperator,
            b'P' => Kind::PostfixOperator,
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.search_failed("operator fixity"));
            }
        };
        Ok(Symbol::with_text(kind, name))
    }

    /// `L` opcode: private, local and related-entity declaration names.
    pub(super) fn demangle_local_identifier(&mut self) -> DemangleResult<Symbol> {
        if self.scanner.conditional(b'L') {
            let discriminator = self.pop_required(Kind::Identifier)?;
            let name = self.pop_required_if(Kind::is_decl_name)?;
            return Ok(Symbol::with_children(
                Kind::PrivateDeclName,
                vec![discriminator, name],
            ));
        }
        if self.scanner.conditional(b'l') {
            let discriminator = self.pop_required(Kind::Identifier)?;
            return Ok(Symbol::with_child(Kind::PrivateDeclName, discriminator));
        }
        let c = self.scanner.peek();
        if matches!(c, b'a'..=b'j' | b'A'..=b'J') {
            self.scanner.read()?;
            let name = self.pop_any();
            let name = self.require(name)?;
            let mut related = Symbol::with_text(Kind::RelatedEntityDeclName, (c as char).to_string());
            related.push(name);
            return Ok(related);
        }
        let discriminator = self.demangle_index_as_node()?;
        let name = self.pop_required_if(Kind::is_decl_name)?;
        Ok(Symbol::with_children(
            Kind::LocalDeclName,
            vec![discriminator, name],
        ))
    }
}
