//! Entity opcodes: functions, constructors and closures, variables, subscripts and their
//! accessors, extensions, and the witness-table family.

use std::rc::Rc;

use super::Demangler;
use crate::core::DemangleResult;
use crate::symbol::{Directness, Kind, Symbol, ValueWitnessKind};

/// Extra operands a `f` entity carries after its context.
enum FunctionEntityArgs {
    None,
    TypeAndMaybePrivateName,
    TypeAndIndex,
    Index,
}

impl Demangler<'_> {
    /// `E` opcode: an extension of a nominal type declared in another module.
    pub(super) fn demangle_extension_context(&mut self) -> DemangleResult<Symbol> {
        let signature = self.pop_kind(Kind::DependentGenericSignature);
        let module = self.pop_module();
        let module = self.require(module)?;
        let extended = self.pop_type_any_generic()?;
        let mut extension = Symbol::with_children(Kind::Extension, vec![module, extended]);
        if let Some(signature) = signature {
            extension.push(signature);
        }
        Ok(extension)
    }

    /// `F` opcode: a named function.
    pub(super) fn demangle_plain_function(&mut self) -> DemangleResult<Symbol> {
        let signature = self.pop_kind(Kind::DependentGenericSignature);
        let ty = Rc::new(self.pop_function_type(Kind::FunctionType)?);
        let (labels, mut ty) = self.pop_function_param_labels(ty)?;
        if let Some(signature) = signature {
            ty = Rc::new(Symbol::typed(Kind::DependentGenericType, vec![signature, ty]));
        }
        let name = self.pop_required_if(Kind::is_decl_name)?;
        let context = self.pop_context()?;

        let mut function = Symbol::with_children(Kind::Function, vec![context, name]);
        if let Some(labels) = labels {
            function.push(Rc::new(labels));
        }
        function.push(ty);
        Ok(function)
    }

    /// `f` opcode: initializers, destructors, closures and other function-like entities.
    pub(super) fn demangle_function_entity(&mut self) -> DemangleResult<Symbol> {
        use FunctionEntityArgs as Args;
        let (kind, args) = match self.scanner.read()? {
            b'D' => (Kind::Deallocator, Args::None),
            b'd' => (Kind::Destructor, Args::None),
            b'E' => (Kind::IVarDestroyer, Args::None),
            b'e' => (Kind::IVarInitializer, Args::None),
            b'i' => (Kind::Initializer, Args::None),
            b'C' => (Kind::Allocator, Args::TypeAndMaybePrivateName),
            b'c' => (Kind::Constructor, Args::TypeAndMaybePrivateName),
            b'U' => (Kind::ExplicitClosure, Args::TypeAndIndex),
            b'u' => (Kind::ImplicitClosure, Args::TypeAndIndex),
            b'A' => (Kind::DefaultArgumentInitializer, Args::Index),
            b'p' => return self.demangle_entity(Kind::GenericTypeParamDecl),
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a function entity letter".to_string()));
            }
        };

        let mut operands = Vec::new();
        match args {
            Args::None => {}
            Args::Index => operands.push(self.demangle_index_as_node()?),
            Args::TypeAndIndex => {
                operands.push(self.demangle_index_as_node()?);
                operands.push(self.pop_required(Kind::Type)?);
            }
            Args::TypeAndMaybePrivateName => {
                let private_name = self.pop_kind(Kind::PrivateDeclName);
                let ty = self.pop_required(Kind::Type)?;
                let (labels, ty) = self.pop_function_param_labels(ty)?;
                operands.extend(labels.map(Rc::new));
                operands.push(ty);
                operands.extend(private_name);
            }
        }

        let context = self.pop_context()?;
        let mut entity = Symbol::with_child(kind, context);
        entity.extend_children(operands);
        Ok(entity)
    }

    /// `context name type`, the common shape of variables and generic parameter decls.
    fn demangle_entity(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let ty = self.pop_required(Kind::Type)?;
        let name = self.pop_required_if(Kind::is_decl_name)?;
        let context = self.pop_context()?;
        Ok(Symbol::with_children(kind, vec![context, name, ty]))
    }

    /// `v` opcode: a variable followed by an accessor letter.
    pub(super) fn demangle_variable(&mut self) -> DemangleResult<Symbol> {
        let variable = self.demangle_entity(Kind::Variable)?;
        self.demangle_accessor(variable)
    }

    /// `i` opcode: a subscript followed by an accessor letter.
    pub(super) fn demangle_subscript(&mut self) -> DemangleResult<Symbol> {
        let private_name = self.pop_kind(Kind::PrivateDeclName);
        let ty = self.pop_required(Kind::Type)?;
        let (labels, ty) = self.pop_function_param_labels(ty)?;
        let context = self.pop_context()?;

        let mut subscript = Symbol::with_child(Kind::Subscript, context);
        if let Some(labels) = labels {
            subscript.push(Rc::new(labels));
        }
        subscript.push(ty);
        if let Some(private_name) = private_name {
            subscript.push(private_name);
        }
        self.demangle_accessor(subscript)
    }

    fn demangle_accessor(&mut self, storage: Symbol) -> DemangleResult<Symbol> {
        let kind = match self.scanner.read()? {
            b'm' => Kind::MaterializeForSet,
            b's' => Kind::Setter,
            b'g' => Kind::Getter,
            b'G' => Kind::GlobalGetter,
            b'w' => Kind::WillSet,
            b'W' => Kind::DidSet,
            b'r' => Kind::ReadAccessor,
            b'M' => Kind::ModifyAccessor,
            b'a' => match self.scanner.read()? {
                b'O' => Kind::OwningMutableAddressor,
                b'o' => Kind::NativeOwningMutableAddressor,
                b'p' => Kind::NativePinningMutableAddressor,
                b'u' => Kind::UnsafeMutableAddressor,
                _ => return Err(self.scanner.match_failed("an addressor letter".to_string())),
            },
            b'l' => match self.scanner.read()? {
                b'O' => Kind::OwningAddressor,
                b'o' => Kind::NativeOwningAddressor,
                b'p' => Kind::NativePinningAddressor,
                b'u' => Kind::UnsafeAddressor,
                _ => return Err(self.scanner.match_failed("an addressor letter".to_string())),
            },
            b'p' => return Ok(storage),
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("an accessor letter".to_string()));
            }
        };
        Ok(Symbol::with_child(kind, Rc::new(storage)))
    }

    /// `w` opcode: a value-witness function, named by a two-letter code.
    pub(super) fn demangle_value_witness(&mut self) -> DemangleResult<Symbol> {
        let code = self.scanner.read_str(2)?;
        let witness = ValueWitnessKind::from_code(code);
        let witness = self.require(witness)?;
        let ty = self.pop_required(Kind::Type)?;
        let mut node = Symbol::with_index(Kind::ValueWitness, witness.index());
        node.push(ty);
        Ok(node)
    }

    /// `W` opcode: witness tables, field offsets and outlined value operations.
    pub(super) fn demangle_witness(&mut self) -> DemangleResult<Symbol> {
        let c = self.scanner.read()?;
        let conformance_kind = match c {
            b'P' => Some(Kind::ProtocolWitnessTable),
            b'p' => Some(Kind::ProtocolWitnessTablePattern),
            b'G' => Some(Kind::GenericProtocolWitnessTable),
            b'I' => Some(Kind::GenericProtocolWitnessTableInstantiationFunction),
            b'r' => Some(Kind::ResilientProtocolWitnessTable),
            b'a' => Some(Kind::ProtocolWitnessTableAccessor),
            _ => None,
        };
        if let Some(kind) = conformance_kind {
            let conformance = self.pop_protocol_conformance()?;
            return Ok(Symbol::with_child(kind, Rc::new(conformance)));
        }

        let node = match c {
            b'C' => {
                let entity = self.pop_required_if(Kind::is_entity)?;
                Symbol::with_child(Kind::EnumCase, entity)
            }
            b'V' => {
                let ty = self.pop_required(Kind::Type)?;
                Symbol::with_child(Kind::ValueWitnessTable, ty)
            }
            b'v' => {
                let directness = match self.scanner.read()? {
                    b'd' => Directness::Direct,
                    b'i' => Directness::Indirect,
                    _ => return Err(self.scanner.match_failed("'d' or 'i'".to_string())),
                };
                let entity = self.pop_required_if(Kind::is_entity)?;
                Symbol::with_children(
                    Kind::FieldOffset,
                    vec![
                        Rc::new(Symbol::with_index(Kind::Directness, directness as u64)),
                        entity,
                    ],
                )
            }
            b'l' | b'L' => {
                let conformance = self.pop_protocol_conformance()?;
                let ty = self.pop_required(Kind::Type)?;
                let kind = if c == b'l' {
                    Kind::LazyProtocolWitnessTableAccessor
                } else {
                    Kind::LazyProtocolWitnessTableCacheVariable
                };
                Symbol::with_children(kind, vec![ty, Rc::new(conformance)])
            }
            b't' => {
                let name = self.pop_required_if(Kind::is_decl_name)?;
                let conformance = self.pop_protocol_conformance()?;
                Symbol::with_children(
                    Kind::AssociatedTypeMetadataAccessor,
                    vec![Rc::new(conformance), name],
                )
            }
            b'T' => {
                let proto = self.pop_required(Kind::Type)?;
                let path = self.pop_assoc_type_path()?;
                let conformance = self.pop_protocol_conformance()?;
                Symbol::with_children(
                    Kind::AssociatedTypeWitnessTableAccessor,
                    vec![Rc::new(conformance), Rc::new(path), proto],
                )
            }
            b'O' => self.demangle_outlined_operation()?,
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a witness letter".to_string()));
            }
        };
        Ok(node)
    }

    fn demangle_outlined_operation(&mut self) -> DemangleResult<Symbol> {
        let signature = self.pop_kind(Kind::DependentGenericSignature);
        let ty = self.pop_required(Kind::Type)?;
        let kind = match self.scanner.read()? {
            b'y' => Kind::OutlinedCopy,
            b'e' => Kind::OutlinedConsume,
            b'r' => Kind::OutlinedRetain,
            b's' => Kind::OutlinedRelease,
            b'b' => Kind::OutlinedInitializeWithTake,
            b'c' => Kind::OutlinedInitializeWithCopy,
            b'd' => Kind::OutlinedAssignWithTake,
            b'f' => Kind::OutlinedAssignWithCopy,
            b'h' => Kind::OutlinedDestroy,
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("an outlined operation letter".to_string()));
            }
        };
        let mut node = Symbol::with_child(kind, ty);
        if let Some(signature) = signature {
            node.push(signature);
        }
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn kinds(node: &Symbol) -> Vec<Kind> {
        node.children().iter().map(|c| c.kind()).collect()
    }

    #[test]
    fn test_function_with_labels() {
        // main.foo(a: Int, b: Int) -> ()
        let global = decode("$s4main3foo1a1bySi_SitF").unwrap();
        let function = global.first_child().unwrap();
        assert_eq!(
            kinds(function),
            vec![Kind::Module, Kind::Identifier, Kind::LabelList, Kind::Type]
        );
        let labels = function.child(2).unwrap();
        assert!(labels.child(0).unwrap().is_identifier("a"));
        assert!(labels.child(1).unwrap().is_identifier("b"));
    }

    #[test]
    fn test_unlabelled_params_give_empty_label_list() {
        let global = decode("$s4main3fooyySi_SitF").unwrap();
        let function = global.first_child().unwrap();
        let labels = function.child(2).unwrap();
        assert_eq!(labels.kind(), Kind::LabelList);
        assert!(labels.is_empty());
    }

    #[test]
    fn test_old_mangling_moves_tuple_names_into_labels() {
        let global = decode("_T04main3fooySi1a_Si1btF").unwrap();
        let function = global.first_child().unwrap();
        let labels = function.child(2).unwrap();
        assert!(labels.child(0).unwrap().is_identifier("a"));
        let ty = function.child(3).unwrap();
        let tuple = ty
            .first_child()
            .unwrap()
            .child(0)
            .unwrap()
            .first_child()
            .unwrap()
            .first_child()
            .unwrap();
        assert_eq!(tuple.kind(), Kind::Tuple);
        for element in tuple.children() {
            assert!(element
                .children()
                .iter()
                .all(|c| c.kind() != Kind::TupleElementName));
        }
    }

    #[test]
    fn test_variable_getter() {
        let global = decode("$s4main5countSivg").unwrap();
        let getter = global.first_child().unwrap();
        assert_eq!(getter.kind(), Kind::Getter);
        let variable = getter.first_child().unwrap();
        assert_eq!(
            kinds(variable),
            vec![Kind::Module, Kind::Identifier, Kind::Type]
        );
    }

    #[test]
    fn test_pseudo_accessor_returns_storage() {
        let global = decode("$s4main5countSivp").unwrap();
        assert_eq!(global.first_child().unwrap().kind(), Kind::Variable);
    }

    #[test]
    fn test_constructor_shape() {
        let global = decode("$s4main3FooV1xACSi_tcfC").unwrap();
        let allocator = global.first_child().unwrap();
        assert_eq!(allocator.kind(), Kind::Allocator);
        assert_eq!(
            kinds(allocator),
            vec![Kind::Structure, Kind::LabelList, Kind::Type]
        );
    }

    #[test]
    fn test_closure_carries_index() {
        let global = decode("$s4main3fooyyFyycfU_").unwrap();
        let closure = global.first_child().unwrap();
        assert_eq!(closure.kind(), Kind::ExplicitClosure);
        assert_eq!(
            kinds(closure),
            vec![Kind::Function, Kind::Number, Kind::Type]
        );
        assert_eq!(closure.child(1).unwrap().index(), Some(0));
    }

    #[test]
    fn test_protocol_witness_table() {
        let global = decode("$s4main3FooVAA1PAAWP").unwrap();
        let table = global.first_child().unwrap();
        assert_eq!(table.kind(), Kind::ProtocolWitnessTable);
        let conformance = table.first_child().unwrap();
        assert_eq!(
            kinds(conformance),
            vec![Kind::Type, Kind::Type, Kind::Module]
        );
    }

    #[test]
    fn test_field_offset_directness() {
        let global = decode("$s4main3FooV1xSivpWvd").unwrap();
        let offset = global.first_child().unwrap();
        assert_eq!(offset.kind(), Kind::FieldOffset);
        assert_eq!(offset.child(0).unwrap().index(), Some(0));
    }

    #[test]
    fn test_value_witness_code() {
        let global = decode("$s4main3FooVwxx").unwrap();
        let witness = global.first_child().unwrap();
        assert_eq!(witness.kind(), Kind::ValueWitness);
        assert_eq!(witness.index(), Some(ValueWitnessKind::Destroy.index()));
        assert!(decode("$s4main3FooVwzz").is_err());
    }
}
