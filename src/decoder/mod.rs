// This module implements the grammar engine that turns a mangled name into a symbol tree.
// Decoding is postfix: opcodes are read left to right, leaf opcodes push fresh nodes onto an
// operand stack and composite opcodes pop previously pushed nodes, validate their kinds and
// push the assembled node. Alongside the stack the Demangler keeps the substitution table
// that back-references index into, the word table used by compressed identifiers and the
// flag for the legacy `_T0` function-type mangling. Once the input is exhausted, function
// attributes are popped off the top and the rest of the stack is folded into a Global root.
// The opcode families live in sibling modules: identifiers and operators, types, generics,
// entities and witnesses, and thunks and specializations.

//! Stack-based decoder for mangled Swift symbol names.

mod entities;
mod generics;
mod identifier;
pub mod punycode;
mod specialization;
mod types;

pub(crate) use generics::generic_parameter_name;

use std::rc::Rc;

use log::{debug, trace};

use crate::core::{DemangleError, DemangleResult, Scanner};
use crate::symbol::{Kind, Symbol, STDLIB_NAME};

/// Upper bound on repeat counts in substitution opcodes.
pub const MAX_REPEAT_COUNT: u64 = 2048;
/// Capacity of the word table.
pub const MAX_NUM_WORDS: usize = 26;
/// Deepest tree the decoder accepts. Printing recurses once per level.
pub const MAX_NODE_DEPTH: usize = 1024;

/// Decode a mangled symbol name into its symbol tree.
pub fn decode(mangled: &str) -> DemangleResult<Symbol> {
    let result = Demangler::new(mangled).demangle_symbol();
    if let Err(e) = &result {
        debug!("failed to decode {mangled:?}: {e}");
    }
    result
}

/// Per-call decoding state.
pub(crate) struct Demangler<'a> {
    scanner: Scanner<'a>,
    stack: Vec<Rc<Symbol>>,
    substitutions: Vec<Rc<Symbol>>,
    words: Vec<String>,
    old_function_type_mangling: bool,
}

impl<'a> Demangler<'a> {
    pub(crate) fn new(mangled: &'a str) -> Self {
        Self {
            scanner: Scanner::new(mangled),
            stack: Vec::new(),
            substitutions: Vec::new(),
            words: Vec::new(),
            old_function_type_mangling: false,
        }
    }

    pub(crate) fn demangle_symbol(mut self) -> DemangleResult<Symbol> {
        if self.scanner.conditional_str("_Tt") {
            trace!("decoding Objective-C bridged name");
            return self.demangle_objc_type_name();
        }
        self.read_mangling_prefix()?;
        self.parse_and_push_names()?;
        self.pop_top_level()
    }

    fn read_mangling_prefix(&mut self) -> DemangleResult<()> {
        const PREFIXES: [&str; 5] = ["_T0", "$S", "_$S", "$s", "_$s"];
        for prefix in PREFIXES {
            if self.scanner.conditional_str(prefix) {
                self.old_function_type_mangling = prefix == "_T0";
                trace!("mangling prefix {prefix:?}");
                return Ok(());
            }
        }
        Err(self.scanner.unexpected())
    }

    fn parse_and_push_names(&mut self) -> DemangleResult<()> {
        while !self.scanner.is_at_end() {
            let node = self.demangle_operator()?;
            self.check_depth(&node)?;
            self.push(node);
        }
        trace!("operand stack holds {} nodes", self.stack.len());
        Ok(())
    }

    /// Fold the operand stack into a `Global` root.
    ///
    /// Function attributes come off the top first; attributes following a partial-apply
    /// forwarder, and the remaining stack, nest inside that forwarder.
    fn pop_top_level(&mut self) -> DemangleResult<Symbol> {
        let mut levels = vec![Symbol::new(Kind::Global)];
        while let Some(attr) = self.pop_if(Kind::is_function_attr) {
            let attr = Rc::unwrap_or_clone(attr);
            if matches!(
                attr.kind(),
                Kind::PartialApplyForwarder | Kind::PartialApplyObjCForwarder
            ) {
                levels.push(attr);
            } else if let Some(level) = levels.last_mut() {
                level.push(Rc::new(attr));
            }
        }

        let rest = std::mem::take(&mut self.stack);
        if let Some(level) = levels.last_mut() {
            for node in rest {
                if node.kind() == Kind::Type {
                    level.push(self.require(node.first_child().cloned())?);
                } else {
                    level.push(node);
                }
            }
        }

        let mut root = self.require(levels.pop())?;
        while let Some(mut parent) = levels.pop() {
            parent.push(Rc::new(root));
            root = parent;
        }
        self.ensure(!root.is_empty())?;
        self.check_depth(&root)?;
        Ok(root)
    }

    fn demangle_operator(&mut self) -> DemangleResult<Rc<Symbol>> {
        let c = self.scanner.read()?;
        let node = match c {
            0x01..=0x0C => return self.demangle_symbolic_reference(),
            b'A' => return self.demangle_multi_substitutions(),
            b'B' => self.demangle_builtin_type()?,
            b'C' => return self.demangle_any_generic_type(Kind::Class),
            b'D' => {
                let ty = self.pop_required(Kind::Type)?;
                Symbol::with_child(Kind::TypeMangling, ty)
            }
            b'E' => self.demangle_extension_context()?,
            b'F' => self.demangle_plain_function()?,
            b'G' => return self.demangle_bound_generic_type(),
            b'I' => self.demangle_impl_function_type()?,
            b'K' => Symbol::new(Kind::ThrowsAnnotation),
            b'L' => self.demangle_local_identifier()?,
            b'M' => self.demangle_metatype()?,
            b'N' => {
                let ty = self.pop_required(Kind::Type)?;
                Symbol::with_child(Kind::TypeMetadata, ty)
            }
            b'O' => return self.demangle_any_generic_type(Kind::Enum),
            b'P' => return self.demangle_any_generic_type(Kind::Protocol),
            b'Q' => return self.demangle_archetype(),
            b'R' => self.demangle_generic_requirement()?,
            b'S' => return self.demangle_standard_substitution(),
            b'T' => self.demangle_thunk_or_specialization()?,
            b'V' => return self.demangle_any_generic_type(Kind::Structure),
            b'W' => self.demangle_witness()?,
            b'X' => return self.demangle_special_type(),
            b'Z' => {
                let entity = self.pop_required_if(Kind::is_entity)?;
                Symbol::with_child(Kind::Static, entity)
            }
            b'a' => return self.demangle_any_generic_type(Kind::TypeAlias),
            b'c' => self.pop_function_type(Kind::FunctionType)?,
            b'd' => Symbol::new(Kind::VariadicMarker),
            b'f' => self.demangle_function_entity()?,
            b'g' => self.demangle_retroactive_conformance()?,
            b'h' => {
                let child = self.pop_type_child()?;
                Symbol::typed(Kind::Shared, vec![child])
            }
            b'i' => self.demangle_subscript()?,
            b'l' => self.demangle_generic_signature(false)?,
            b'm' => {
                let ty = self.pop_required(Kind::Type)?;
                Symbol::typed(Kind::Metatype, vec![ty])
            }
            b'n' => {
                let child = self.pop_type_child()?;
                Symbol::typed(Kind::Owned, vec![child])
            }
            b'o' => self.demangle_operator_identifier()?,
            b'p' => {
                let list = self.demangle_protocol_list()?;
                Symbol::with_child(Kind::Type, Rc::new(list))
            }
            b'q' => {
                let param = self.demangle_generic_param_index()?;
                Symbol::with_child(Kind::Type, Rc::new(param))
            }
            b'r' => self.demangle_generic_signature(true)?,
            b's' => Symbol::with_text(Kind::Module, STDLIB_NAME),
            b't' => self.pop_tuple()?,
            b'u' => self.demangle_generic_type()?,
            b'v' => self.demangle_variable()?,
            b'w' => self.demangle_value_witness()?,
            b'x' => {
                let param = generics::dependent_generic_param_type(0, 0);
                Symbol::with_child(Kind::Type, Rc::new(param))
            }
            b'y' => Symbol::new(Kind::EmptyList),
            b'z' => {
                let child = self.pop_type_child()?;
                Symbol::typed(Kind::InOut, vec![child])
            }
            b'_' => Symbol::new(Kind::FirstElementMarker),
            b'.' => {
                self.scanner.backtrack(1);
                Symbol::with_text(Kind::Suffix, self.scanner.remainder())
            }
            b'0'..=b'9' => {
                self.scanner.backtrack(1);
                return self.demangle_identifier();
            }
            other => {
                self.scanner.backtrack(1);
                return Err(self
                    .scanner
                    .match_failed(format!("an opcode, found byte 0x{other:02x}")));
            }
        };
        Ok(Rc::new(node))
    }

    /// Control bytes introduce a reference to context data stored outside the symbol.
    ///
    /// Without a resolver the reference stays unresolved; its index is the raw 32-bit
    /// offset that follows the control byte.
    fn demangle_symbolic_reference(&mut self) -> DemangleResult<Rc<Symbol>> {
        let mut bytes = [0u8; 4];
        for slot in &mut bytes {
            *slot = self.scanner.read()?;
        }
        let offset = u32::from_le_bytes(bytes);
        let node = Rc::new(Symbol::with_index(
            Kind::UnresolvedSymbolicReference,
            u64::from(offset),
        ));
        self.substitutions.push(node.clone());
        Ok(node)
    }

    // =========================================================================
    // Stack helpers
    // =========================================================================

    fn push(&mut self, node: Rc<Symbol>) {
        self.stack.push(node);
    }

    fn check_depth(&self, node: &Symbol) -> DemangleResult<()> {
        if node.depth() > MAX_NODE_DEPTH {
            debug!("symbol tree nests {} levels deep", node.depth());
            return Err(self.scanner.unexpected());
        }
        Ok(())
    }

    fn pop_any(&mut self) -> Option<Rc<Symbol>> {
        self.stack.pop()
    }

    fn pop_kind(&mut self, kind: Kind) -> Option<Rc<Symbol>> {
        self.pop_if(|k| k == kind)
    }

    fn pop_if(&mut self, pred: impl Fn(Kind) -> bool) -> Option<Rc<Symbol>> {
        match self.stack.last() {
            Some(top) if pred(top.kind()) => self.stack.pop(),
            _ => None,
        }
    }

    fn pop_required(&mut self, kind: Kind) -> DemangleResult<Rc<Symbol>> {
        let node = self.pop_kind(kind);
        self.require(node)
    }

    fn pop_required_if(&mut self, pred: impl Fn(Kind) -> bool) -> DemangleResult<Rc<Symbol>> {
        let node = self.pop_if(pred);
        self.require(node)
    }

    /// Pop a `Type` node and return its single child.
    fn pop_type_child(&mut self) -> DemangleResult<Rc<Symbol>> {
        let ty = self.pop_required(Kind::Type)?;
        self.require(ty.first_child().cloned())
    }

    fn pop_type_any_generic(&mut self) -> DemangleResult<Rc<Symbol>> {
        let child = self.pop_type_child()?;
        self.ensure(child.kind().is_any_generic())?;
        Ok(child)
    }

    fn pop_module(&mut self) -> Option<Rc<Symbol>> {
        if let Some(ident) = self.pop_kind(Kind::Identifier) {
            return Some(Rc::new(ident.renamed(Kind::Module, Vec::new())));
        }
        self.pop_kind(Kind::Module)
    }

    fn pop_context(&mut self) -> DemangleResult<Rc<Symbol>> {
        if let Some(module) = self.pop_module() {
            return Ok(module);
        }
        if let Some(ty) = self.pop_kind(Kind::Type) {
            let child = self.require(ty.first_child().cloned())?;
            self.ensure(child.kind().is_context())?;
            return Ok(child);
        }
        self.pop_required_if(Kind::is_context)
    }

    fn require<T>(&self, value: Option<T>) -> DemangleResult<T> {
        value.ok_or_else(|| self.scanner.unexpected())
    }

    fn ensure(&self, condition: bool) -> DemangleResult<()> {
        if condition {
            Ok(())
        } else {
            Err(self.scanner.unexpected())
        }
    }

    // =========================================================================
    // Indices and substitutions
    // =========================================================================

    fn demangle_natural(&mut self) -> DemangleResult<Option<u64>> {
        self.scanner.conditional_int()
    }

    /// `_` is zero, `{n}_` is `n + 1`.
    fn demangle_index(&mut self) -> DemangleResult<u64> {
        if self.scanner.conditional(b'_') {
            return Ok(0);
        }
        let value = self.scanner.read_int()?;
        self.scanner.expect(b'_')?;
        value
            .checked_add(1)
            .ok_or(DemangleError::IntegerOverflow {
                pos: self.scanner.position(),
            })
    }

    fn demangle_index_as_node(&mut self) -> DemangleResult<Rc<Symbol>> {
        let index = self.demangle_index()?;
        Ok(Rc::new(Symbol::with_index(Kind::Number, index)))
    }

    fn substitution(&self, index: u64) -> DemangleResult<Rc<Symbol>> {
        let node = usize::try_from(index)
            .ok()
            .and_then(|i| self.substitutions.get(i))
            .cloned();
        self.require(node)
    }

    fn push_multi_substitutions(
        &mut self,
        repeat_count: Option<u64>,
        index: u64,
    ) -> DemangleResult<Rc<Symbol>> {
        let node = self.substitution(index)?;
        let repeat_count = repeat_count.unwrap_or(0);
        self.ensure(repeat_count <= MAX_REPEAT_COUNT)?;
        for _ in 1..repeat_count {
            self.push(node.clone());
        }
        Ok(node)
    }

    /// `A` opcode: one or more back-references into the substitution table.
    fn demangle_multi_substitutions(&mut self) -> DemangleResult<Rc<Symbol>> {
        let mut repeat_count: Option<u64> = None;
        loop {
            let c = self.scanner.read()?;
            match c {
                b'a'..=b'z' => {
                    let node =
                        self.push_multi_substitutions(repeat_count, u64::from(c - b'a'))?;
                    self.push(node);
                    repeat_count = None;
                }
                b'A'..=b'Z' => {
                    return self.push_multi_substitutions(repeat_count, u64::from(c - b'A'));
                }
                b'_' => {
                    let index = match repeat_count {
                        None => 26,
                        Some(n) => n.checked_add(27).ok_or_else(|| self.scanner.unexpected())?,
                    };
                    return self.substitution(index);
                }
                b'0'..=b'9' => {
                    self.scanner.backtrack(1);
                    repeat_count = self.demangle_natural()?;
                    self.ensure(repeat_count.is_some())?;
                }
                _ => return Err(self.scanner.unexpected()),
            }
        }
    }

    // =========================================================================
    // Lists and tuples
    // =========================================================================

    fn pop_type_list(&mut self) -> DemangleResult<Symbol> {
        let mut children = Vec::new();
        if self.pop_kind(Kind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(Kind::FirstElementMarker).is_some();
                children.push(self.pop_required(Kind::Type)?);
                if first {
                    break;
                }
            }
            children.reverse();
        }
        Ok(Symbol::with_children(Kind::TypeList, children))
    }

    /// `t` opcode: tuple elements pushed front to back, the first one flagged.
    fn pop_tuple(&mut self) -> DemangleResult<Symbol> {
        let mut elements = Vec::new();
        if self.pop_kind(Kind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(Kind::FirstElementMarker).is_some();
                let mut element = Symbol::new(Kind::TupleElement);
                if let Some(variadic) = self.pop_kind(Kind::VariadicMarker) {
                    element.push(variadic);
                }
                if let Some(ident) = self.pop_kind(Kind::Identifier) {
                    let name = ident.text().unwrap_or_default();
                    element.push(Rc::new(Symbol::with_text(Kind::TupleElementName, name)));
                }
                element.push(self.pop_required(Kind::Type)?);
                elements.push(Rc::new(element));
                if first {
                    break;
                }
            }
            elements.reverse();
        }
        Ok(Symbol::typed(Kind::Tuple, elements))
    }

    // =========================================================================
    // Objective-C bridged names
    // =========================================================================

    /// `_TtC<module><name>` classes and `_TtP<module><name>_` protocols.
    fn demangle_objc_type_name(mut self) -> DemangleResult<Symbol> {
        let is_protocol = if self.scanner.conditional(b'C') {
            false
        } else if self.scanner.conditional(b'P') {
            true
        } else {
            return Err(self.scanner.match_failed("'C' or 'P'".to_string()));
        };

        let module = if self.scanner.conditional(b's') {
            Rc::new(Symbol::with_text(Kind::Module, STDLIB_NAME))
        } else {
            let ident = self.demangle_identifier()?;
            Rc::new(ident.renamed(Kind::Module, Vec::new()))
        };
        let name = self.demangle_identifier()?;

        let ty = if is_protocol {
            self.scanner.expect(b'_')?;
            let proto = Symbol::typed(Kind::Protocol, vec![module, name]);
            let list = Symbol::with_child(Kind::TypeList, Rc::new(proto));
            let protocols = Symbol::with_child(Kind::ProtocolList, Rc::new(list));
            Symbol::with_child(Kind::Type, Rc::new(protocols))
        } else {
            Symbol::typed(Kind::Class, vec![module, name])
        };
        self.ensure(self.scanner.is_at_end())?;

        let mangling = Symbol::with_child(Kind::TypeMangling, Rc::new(ty));
        Ok(Symbol::with_child(Kind::Global, Rc::new(mangling)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(node: &Symbol) -> Vec<Kind> {
        node.children().iter().map(|c| c.kind()).collect()
    }

    #[test]
    fn test_rejects_unknown_prefix() {
        assert!(matches!(decode("main"), Err(DemangleError::Unexpected { pos: 0 })));
        assert!(decode("").is_err());
        assert!(decode("_T1x").is_err());
    }

    #[test]
    fn test_plain_function_shape() {
        let global = decode("$s4main3fooyyF").unwrap();
        assert_eq!(global.kind(), Kind::Global);
        let func = global.first_child().unwrap();
        assert_eq!(func.kind(), Kind::Function);
        assert_eq!(
            kinds(func),
            vec![Kind::Module, Kind::Identifier, Kind::Type]
        );
        assert!(func.child(1).unwrap().is_identifier("foo"));
    }

    #[test]
    fn test_all_prefix_spellings_accepted() {
        for prefix in ["$s", "$S", "_$s", "_$S"] {
            let name = format!("{prefix}4main3fooyyF");
            assert!(decode(&name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_substitution_reuse_is_shared() {
        // `AA` refers back to the first recorded substitution, the module identifier.
        let mut d = Demangler::new("$s4main1xAAV");
        d.read_mangling_prefix().unwrap();
        d.parse_and_push_names().unwrap();
        let ty = d.stack.last().unwrap();
        let structure = ty.first_child().unwrap();
        assert_eq!(structure.kind(), Kind::Structure);
        assert!(Rc::ptr_eq(structure.child(1).unwrap(), &d.substitutions[0]));
    }

    #[test]
    fn test_multi_substitution_out_of_range() {
        assert!(matches!(
            decode("$s4mainAFV"),
            Err(DemangleError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_multi_substitution_repeat_cap_checked_before_push() {
        let mut d = Demangler::new("$s4main3fooA9999aAD");
        d.read_mangling_prefix().unwrap();
        let mut result = Ok(());
        while !d.scanner.is_at_end() {
            match d.demangle_operator() {
                Ok(node) => d.push(node),
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        assert!(matches!(result, Err(DemangleError::Unexpected { .. })));
        assert_eq!(d.stack.len(), 2);
    }

    #[test]
    fn test_multi_substitution_rejects_stray_byte() {
        assert!(decode("$s4mainA$").is_err());
    }

    #[test]
    fn test_objc_class_and_protocol() {
        let class = decode("_TtC3Foo3Bar").unwrap();
        let ty = class.first_child().unwrap().first_child().unwrap();
        assert_eq!(ty.first_child().unwrap().kind(), Kind::Class);

        let proto = decode("_TtP3Foo3Bar_").unwrap();
        let ty = proto.first_child().unwrap().first_child().unwrap();
        assert_eq!(ty.first_child().unwrap().kind(), Kind::ProtocolList);

        assert!(decode("_TtC3Foo3Barx").is_err());
        assert!(decode("_TtP3Foo3Bar").is_err());
    }

    #[test]
    fn test_suffix_keeps_dot() {
        let global = decode("$s4main3fooyyF.cold").unwrap();
        let suffix = global.child(1).unwrap();
        assert_eq!(suffix.kind(), Kind::Suffix);
        assert_eq!(suffix.text(), Some(".cold"));
    }

    #[test]
    fn test_partial_apply_nests_rest_of_stack() {
        let global = decode("$s4main3fooyyFTA").unwrap();
        let forwarder = global.first_child().unwrap();
        assert_eq!(forwarder.kind(), Kind::PartialApplyForwarder);
        assert_eq!(forwarder.first_child().unwrap().kind(), Kind::Function);
    }

    #[test]
    fn test_nesting_limit() {
        let shallow = format!("$sSi{}D", "Sg".repeat(300));
        let global = decode(&shallow).unwrap();
        assert!(global.depth() <= MAX_NODE_DEPTH);

        let deep = format!("$sSi{}D", "Sg".repeat(1000));
        assert!(matches!(decode(&deep), Err(DemangleError::Unexpected { .. })));
    }

    #[test]
    fn test_nested_forwarders_hit_nesting_limit() {
        let mangled = format!("$s4main3fooyyF{}", "TA".repeat(MAX_NODE_DEPTH + 1));
        assert!(decode(&mangled).is_err());
    }
}

