//! Type opcodes: builtin and nominal types, bound generics, function types, metatypes,
//! protocol lists and the `S`/`X` escape families.

use std::rc::Rc;

use super::{Demangler, MAX_REPEAT_COUNT};
use crate::core::DemangleResult;
use crate::symbol::{Kind, Symbol, C_MODULE, OBJC_MODULE};

/// Largest bit width or element count accepted for builtin types.
const MAX_BUILTIN_TYPE_SIZE: u64 = 4096;

fn standard_type(c: u8) -> Option<(Kind, &'static str)> {
    let entry = match c {
        b'a' => (Kind::Structure, "Array"),
        b'A' => (Kind::Structure, "AutoreleasingUnsafeMutablePointer"),
        b'b' => (Kind::Structure, "Bool"),
        b'c' => (Kind::Structure, "UnicodeScalar"),
        b'D' => (Kind::Structure, "Dictionary"),
        b'd' => (Kind::Structure, "Double"),
        b'f' => (Kind::Structure, "Float"),
        b'h' => (Kind::Structure, "Set"),
        b'I' => (Kind::Structure, "DefaultIndices"),
        b'i' => (Kind::Structure, "Int"),
        b'J' => (Kind::Structure, "Character"),
        b'N' => (Kind::Structure, "ClosedRange"),
        b'n' => (Kind::Structure, "Range"),
        b'O' => (Kind::Structure, "ObjectIdentifier"),
        b'p' => (Kind::Structure, "UnsafeMutablePointer"),
        b'P' => (Kind::Structure, "UnsafePointer"),
        b'R' => (Kind::Structure, "UnsafeBufferPointer"),
        b'r' => (Kind::Structure, "UnsafeMutableBufferPointer"),
        b'S' => (Kind::Structure, "String"),
        b's' => (Kind::Structure, "Substring"),
        b'u' => (Kind::Structure, "UInt"),
        b'v' => (Kind::Structure, "UnsafeMutableRawPointer"),
        b'V' => (Kind::Structure, "UnsafeRawPointer"),
        b'W' => (Kind::Structure, "UnsafeRawBufferPointer"),
        b'w' => (Kind::Structure, "UnsafeMutableRawBufferPointer"),

        b'q' => (Kind::Enum, "Optional"),

        b'B' => (Kind::Protocol, "BinaryFloatingPoint"),
        b'E' => (Kind::Protocol, "Encodable"),
        b'e' => (Kind::Protocol, "Decodable"),
        b'F' => (Kind::Protocol, "FloatingPoint"),
        b'G' => (Kind::Protocol, "RandomNumberGenerator"),
        b'H' => (Kind::Protocol, "Hashable"),
        b'j' => (Kind::Protocol, "Numeric"),
        b'K' => (Kind::Protocol, "BidirectionalCollection"),
        b'k' => (Kind::Protocol, "RandomAccessCollection"),
        b'L' => (Kind::Protocol, "Comparable"),
        b'l' => (Kind::Protocol, "Collection"),
        b'M' => (Kind::Protocol, "MutableCollection"),
        b'm' => (Kind::Protocol, "RangeReplaceableCollection"),
        b'Q' => (Kind::Protocol, "Equatable"),
        b'T' => (Kind::Protocol, "Sequence"),
        b't' => (Kind::Protocol, "IteratorProtocol"),
        b'U' => (Kind::Protocol, "UnsignedInteger"),
        b'X' => (Kind::Protocol, "RangeExpression"),
        b'x' => (Kind::Protocol, "Strideable"),
        b'Y' => (Kind::Protocol, "RawRepresentable"),
        b'y' => (Kind::Protocol, "StringProtocol"),
        b'Z' => (Kind::Protocol, "SignedInteger"),
        b'z' => (Kind::Protocol, "BinaryInteger"),
        _ => return None,
    };
    Some(entry)
}

/// Clone `node` with the child at `index` replaced.
fn replace_child(node: &Symbol, index: usize, child: Rc<Symbol>) -> Rc<Symbol> {
    let mut copy = node.clone();
    copy.set_child(index, child);
    Rc::new(copy)
}

impl Demangler<'_> {
    /// `S` opcode: well-known modules and standard library types.
    pub(super) fn demangle_standard_substitution(&mut self) -> DemangleResult<Rc<Symbol>> {
        match self.scanner.read()? {
            b'o' => return Ok(Rc::new(Symbol::with_text(Kind::Module, OBJC_MODULE))),
            b'C' => return Ok(Rc::new(Symbol::with_text(Kind::Module, C_MODULE))),
            b'g' => {
                let wrapped = self.pop_required(Kind::Type)?;
                let optional = Symbol::typed(
                    Kind::BoundGenericEnum,
                    vec![
                        Rc::new(Symbol::stdlib_type(Kind::Enum, "Optional")),
                        Rc::new(Symbol::with_child(Kind::TypeList, wrapped)),
                    ],
                );
                let node = Rc::new(optional);
                self.substitutions.push(node.clone());
                return Ok(node);
            }
            _ => self.scanner.backtrack(1),
        }

        let repeat_count = self.demangle_natural()?.unwrap_or(0);
        self.ensure(repeat_count <= MAX_REPEAT_COUNT)?;
        let c = self.scanner.read()?;
        let (kind, name) = match standard_type(c) {
            Some(entry) => entry,
            None => {
                self.scanner.backtrack(1);
                return Err(self
                    .scanner
                    .match_failed("a standard substitution letter".to_string()));
            }
        };
        let node = Rc::new(Symbol::stdlib_type(kind, name));
        for _ in 1..repeat_count {
            self.push(node.clone());
        }
        Ok(node)
    }

    /// `B` opcode: `Builtin.*` types.
    pub(super) fn demangle_builtin_type(&mut self) -> DemangleResult<Symbol> {
        let name = match self.scanner.read()? {
            b'b' => "Builtin.BridgeObject".to_string(),
            b'B' => "Builtin.UnsafeValueBuffer".to_string(),
            b'f' => format!("Builtin.Float{}", self.demangle_builtin_size()?),
            b'i' => format!("Builtin.Int{}", self.demangle_builtin_size()?),
            b'v' => {
                let elements = self.demangle_builtin_size()?;
                let element = self.pop_type_child()?;
                let element_name = match (element.kind(), element.text()) {
                    (Kind::BuiltinTypeName, Some(text)) => text.strip_prefix("Builtin."),
                    _ => None,
                };
                let element_name = self.require(element_name)?;
                format!("Builtin.Vec{elements}x{element_name}")
            }
            b'O' => "Builtin.UnknownObject".to_string(),
            b'o' => "Builtin.NativeObject".to_string(),
            b'p' => "Builtin.RawPointer".to_string(),
            b't' => "Builtin.SILToken".to_string(),
            b'w' => "Builtin.Word".to_string(),
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a builtin type letter".to_string()));
            }
        };
        Ok(Symbol::with_child(
            Kind::Type,
            Rc::new(Symbol::with_text(Kind::BuiltinTypeName, name)),
        ))
    }

    fn demangle_builtin_size(&mut self) -> DemangleResult<u64> {
        let size = self.demangle_index()?.checked_sub(1);
        let size = self.require(size)?;
        self.ensure(size > 0 && size <= MAX_BUILTIN_TYPE_SIZE)?;
        Ok(size)
    }

    /// `C`, `O`, `P`, `V`, `a` and `XY`: a nominal type named inside a context.
    pub(super) fn demangle_any_generic_type(&mut self, kind: Kind) -> DemangleResult<Rc<Symbol>> {
        let name = self.pop_required_if(Kind::is_decl_name)?;
        let context = self.pop_context()?;
        let node = Rc::new(Symbol::typed(kind, vec![context, name]));
        self.substitutions.push(node.clone());
        Ok(node)
    }

    /// `G` opcode: a nominal type with one generic argument list per generic level.
    pub(super) fn demangle_bound_generic_type(&mut self) -> DemangleResult<Rc<Symbol>> {
        let mut retroactive = Vec::new();
        while let Some(conformance) = self.pop_kind(Kind::RetroactiveConformance) {
            retroactive.push(conformance);
        }
        retroactive.reverse();

        let mut type_lists = Vec::new();
        loop {
            let mut types = Vec::new();
            while let Some(ty) = self.pop_kind(Kind::Type) {
                types.push(ty);
            }
            types.reverse();
            type_lists.push(Symbol::with_children(Kind::TypeList, types));
            if self.pop_kind(Kind::EmptyList).is_some() {
                break;
            }
            self.pop_required(Kind::FirstElementMarker)?;
        }

        let nominal = self.pop_type_any_generic()?;
        let bound = self.demangle_bound_generic_args(&nominal, &type_lists, 0)?;
        let bound = if retroactive.is_empty() {
            bound
        } else {
            let mut bound = Rc::unwrap_or_clone(bound);
            bound.push(Rc::new(Symbol::with_children(Kind::TypeList, retroactive)));
            Rc::new(bound)
        };
        let node = Rc::new(Symbol::with_child(Kind::Type, bound));
        self.substitutions.push(node.clone());
        Ok(node)
    }

    /// Apply `lists[index..]` to `nominal` and its enclosing generic contexts, innermost first.
    fn demangle_bound_generic_args(
        &self,
        nominal: &Rc<Symbol>,
        lists: &[Symbol],
        index: usize,
    ) -> DemangleResult<Rc<Symbol>> {
        if matches!(
            nominal.kind(),
            Kind::SymbolicReference | Kind::UnresolvedSymbolicReference
        ) {
            let remaining: Vec<Rc<Symbol>> = lists
                .iter()
                .skip(index)
                .rev()
                .flat_map(|list| list.children().iter().cloned())
                .collect();
            return Ok(Rc::new(Symbol::with_children(
                Kind::BoundGenericOtherNominalType,
                vec![
                    Rc::new(Symbol::with_child(Kind::Type, nominal.clone())),
                    Rc::new(Symbol::with_children(Kind::TypeList, remaining)),
                ],
            )));
        }

        let context = self.require(nominal.first_child().cloned())?;
        let consumes_args = !matches!(
            nominal.kind(),
            Kind::Variable | Kind::ExplicitClosure | Kind::Subscript
        );
        let args = self.require(lists.get(index))?;
        let next = if consumes_args { index + 1 } else { index };

        let node = if next < lists.len() {
            let bound_parent = if context.kind() == Kind::Extension {
                let module = self.require(context.child(0).cloned())?;
                let extended = self.require(context.child(1))?;
                let mut extension = Symbol::with_children(
                    Kind::Extension,
                    vec![module, self.demangle_bound_generic_args(extended, lists, next)?],
                );
                if let Some(signature) = context.child(2) {
                    extension.push(signature.clone());
                }
                Rc::new(extension)
            } else {
                self.demangle_bound_generic_args(&context, lists, next)?
            };
            let mut children = vec![bound_parent];
            children.extend(nominal.children().iter().skip(1).cloned());
            Rc::new(Symbol::with_children(nominal.kind(), children))
        } else {
            nominal.clone()
        };

        if !consumes_args || args.is_empty() {
            return Ok(node);
        }

        let args = Rc::new(args.clone());
        let kind = match node.kind() {
            Kind::Class => Kind::BoundGenericClass,
            Kind::Structure => Kind::BoundGenericStructure,
            Kind::Enum => Kind::BoundGenericEnum,
            Kind::Protocol => Kind::BoundGenericProtocol,
            Kind::OtherNominalType => Kind::BoundGenericOtherNominalType,
            Kind::TypeAlias => Kind::BoundGenericTypeAlias,
            Kind::Function | Kind::Constructor => {
                return Ok(Rc::new(Symbol::with_children(
                    Kind::BoundGenericFunction,
                    vec![node, args],
                )));
            }
            _ => return Err(self.scanner.match_failed("a generic nominal type".to_string())),
        };
        Ok(Rc::new(Symbol::with_children(
            kind,
            vec![Rc::new(Symbol::with_child(Kind::Type, node)), args],
        )))
    }

    /// Pop the parameter and result types of a function type of the given kind.
    pub(super) fn pop_function_type(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let mut function = Symbol::new(kind);
        if let Some(throws) = self.pop_kind(Kind::ThrowsAnnotation) {
            function.push(throws);
        }
        function.push(Rc::new(self.pop_function_params(Kind::ArgumentTuple)?));
        function.push(Rc::new(self.pop_function_params(Kind::ReturnType)?));
        Ok(Symbol::with_child(Kind::Type, Rc::new(function)))
    }

    fn pop_function_params(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let params = if self.pop_kind(Kind::EmptyList).is_some() {
            Rc::new(Symbol::typed(Kind::Tuple, Vec::new()))
        } else {
            self.pop_required(Kind::Type)?
        };
        if kind != Kind::ArgumentTuple {
            return Ok(Symbol::with_child(kind, params));
        }
        let inner = self.require(params.first_child())?;
        let count = if inner.kind() == Kind::Tuple {
            inner.len() as u64
        } else {
            1
        };
        let mut node = Symbol::with_index(kind, count);
        node.push(params);
        Ok(node)
    }

    /// Argument labels of a function-like entity.
    ///
    /// Returns the label list, if any, and the function type. Under the `_T0` mangling the
    /// labels are tuple element names, so they are moved out of the type and the rebuilt
    /// type is returned.
    pub(super) fn pop_function_param_labels(
        &mut self,
        ty: Rc<Symbol>,
    ) -> DemangleResult<(Option<Symbol>, Rc<Symbol>)> {
        if !self.old_function_type_mangling && self.pop_kind(Kind::EmptyList).is_some() {
            return Ok((Some(Symbol::new(Kind::LabelList)), ty));
        }
        if ty.kind() != Kind::Type {
            return Ok((None, ty));
        }

        let top = self.require(ty.first_child().cloned())?;
        let is_generic = top.kind() == Kind::DependentGenericType;
        let function = if is_generic {
            self.require(top.child(1).and_then(|t| t.first_child()).cloned())?
        } else {
            top.clone()
        };
        if !matches!(
            function.kind(),
            Kind::FunctionType | Kind::NoEscapeFunctionType
        ) {
            return Ok((None, ty));
        }

        let params_slot = match function.first_child() {
            Some(first) if first.kind() == Kind::ThrowsAnnotation => 1,
            _ => 0,
        };
        let params = self.require(function.child(params_slot).cloned())?;
        self.ensure(params.kind() == Kind::ArgumentTuple)?;
        let count = params.index().unwrap_or(0);
        if count == 0 {
            return Ok((None, ty));
        }

        let params_type = self.require(params.first_child().cloned())?;
        let tuple = match params_type.first_child() {
            Some(tuple) if tuple.kind() == Kind::Tuple => tuple.clone(),
            _ => return Ok((Some(Symbol::new(Kind::LabelList)), ty)),
        };
        let count = usize::try_from(count).map_err(|_| self.scanner.unexpected())?;

        let mut labels = Vec::with_capacity(count);
        let mut ty = ty;
        if self.old_function_type_mangling {
            let mut stripped = (*tuple).clone();
            for i in 0..count {
                let element = self.require(stripped.child(i).cloned())?;
                let position = element
                    .children()
                    .iter()
                    .position(|c| c.kind() == Kind::TupleElementName);
                match position {
                    Some(position) => {
                        let mut element = (*element).clone();
                        let name = self.require(element.remove_child(position))?;
                        let text = name.text().unwrap_or_default();
                        labels.push(Rc::new(Symbol::with_text(Kind::Identifier, text)));
                        stripped.set_child(i, Rc::new(element));
                    }
                    None => labels.push(Rc::new(Symbol::new(Kind::FirstElementMarker))),
                }
            }
            let params_type = replace_child(&params_type, 0, Rc::new(stripped));
            let params = replace_child(&params, 0, params_type);
            let function = replace_child(&function, params_slot, params);
            let top = if is_generic {
                let inner = self.require(top.child(1))?;
                replace_child(&top, 1, replace_child(inner, 0, function))
            } else {
                function
            };
            ty = replace_child(&ty, 0, top);
        } else {
            for _ in 0..count {
                let label = self.pop_any();
                labels.push(self.require(label)?);
            }
        }

        for label in &labels {
            self.ensure(matches!(
                label.kind(),
                Kind::Identifier | Kind::FirstElementMarker
            ))?;
        }
        if labels.iter().all(|l| l.kind() == Kind::FirstElementMarker) {
            return Ok((Some(Symbol::new(Kind::LabelList)), ty));
        }
        if !self.old_function_type_mangling {
            labels.reverse();
        }
        Ok((Some(Symbol::with_children(Kind::LabelList, labels)), ty))
    }

    /// `I` opcode: a lowered SIL function type with explicit conventions.
    pub(super) fn demangle_impl_function_type(&mut self) -> DemangleResult<Symbol> {
        let mut children: Vec<Symbol> = Vec::new();
        let mut signature = self.pop_kind(Kind::DependentGenericSignature);
        if signature.is_some() && self.scanner.conditional(b'P') {
            signature = signature
                .map(|sig| Rc::new(sig.renamed(Kind::DependentPseudogenericSignature, Vec::new())));
        }
        if self.scanner.conditional(b'e') {
            children.push(Symbol::new(Kind::ImplEscaping));
        }

        let callee = match self.scanner.read()? {
            b'y' => "@callee_unowned",
            b'g' => "@callee_guaranteed",
            b'x' => "@callee_owned",
            b't' => "@convention(thin)",
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a callee convention".to_string()));
            }
        };
        children.push(Symbol::with_text(Kind::ImplConvention, callee));

        let attribute = match self.scanner.peek() {
            b'B' => Some("@convention(block)"),
            b'C' => Some("@convention(c)"),
            b'M' => Some("@convention(method)"),
            b'O' => Some("@convention(objc_method)"),
            b'K' => Some("@convention(closure)"),
            b'W' => Some("@convention(witness_method)"),
            _ => None,
        };
        if let Some(attribute) = attribute {
            self.scanner.read()?;
            children.push(Symbol::with_text(Kind::ImplFunctionAttribute, attribute));
        }
        if let Some(signature) = signature {
            children.push(Rc::unwrap_or_clone(signature));
        }

        let mut num_types = 0;
        while let Some(convention) = self.demangle_impl_param_convention() {
            self.scanner.read()?;
            children.push(Symbol::with_child(
                Kind::ImplParameter,
                Rc::new(Symbol::with_text(Kind::ImplConvention, convention)),
            ));
            num_types += 1;
        }
        while let Some(convention) = self.demangle_impl_result_convention() {
            self.scanner.read()?;
            children.push(Symbol::with_child(
                Kind::ImplResult,
                Rc::new(Symbol::with_text(Kind::ImplConvention, convention)),
            ));
            num_types += 1;
        }
        if self.scanner.conditional(b'z') {
            let convention = self.demangle_impl_result_convention();
            let convention = self.require(convention)?;
            self.scanner.read()?;
            children.push(Symbol::with_child(
                Kind::ImplErrorResult,
                Rc::new(Symbol::with_text(Kind::ImplConvention, convention)),
            ));
            num_types += 1;
        }
        self.scanner.expect(b'_')?;

        for i in 0..num_types {
            let slot = children.len() - 1 - i;
            let ty = self.pop_required(Kind::Type)?;
            children[slot].push(ty);
        }
        let children = children.into_iter().map(Rc::new).collect();
        Ok(Symbol::typed(Kind::ImplFunctionType, children))
    }

    /// Peek at a parameter convention letter without consuming it.
    fn demangle_impl_param_convention(&self) -> Option<&'static str> {
        let convention = match self.scanner.peek() {
            b'i' => "@in",
            b'c' => "@in_constant",
            b'l' => "@inout",
            b'b' => "@inout_aliasable",
            b'n' => "@in_guaranteed",
            b'x' => "@owned",
            b'g' => "@guaranteed",
            b'e' => "@deallocating",
            b'y' => "@unowned",
            _ => return None,
        };
        Some(convention)
    }

    /// Peek at a result convention letter without consuming it.
    fn demangle_impl_result_convention(&self) -> Option<&'static str> {
        let convention = match self.scanner.peek() {
            b'r' => "@out",
            b'o' => "@owned",
            b'd' => "@unowned",
            b'u' => "@unowned_inner_pointer",
            b'a' => "@autoreleased",
            _ => return None,
        };
        Some(convention)
    }

    /// `M` opcode: metadata records and descriptors.
    pub(super) fn demangle_metatype(&mut self) -> DemangleResult<Symbol> {
        let c = self.scanner.read()?;
        let kind = match c {
            b'c' => {
                let conformance = self.pop_protocol_conformance()?;
                return Ok(Symbol::with_child(
                    Kind::ProtocolConformanceDescriptor,
                    Rc::new(conformance),
                ));
            }
            b'f' => Kind::FullTypeMetadata,
            b'P' => Kind::GenericTypeMetadataPattern,
            b'a' => Kind::TypeMetadataAccessFunction,
            b'I' => Kind::TypeMetadataInstantiationCache,
            b'i' => Kind::TypeMetadataInstantiationFunction,
            b'r' => Kind::TypeMetadataCompletionFunction,
            b'l' => Kind::TypeMetadataSingletonInitializationCache,
            b'L' => Kind::TypeMetadataLazyCache,
            b'm' => Kind::Metaclass,
            b'n' => Kind::NominalTypeDescriptor,
            b'o' => Kind::ClassMetadataBaseOffset,
            b'u' => Kind::MethodLookupFunction,
            b'B' => Kind::ReflectionMetadataBuiltinDescriptor,
            b'F' => Kind::ReflectionMetadataFieldDescriptor,
            b'p' => {
                let proto = self.pop_protocol()?;
                return Ok(Symbol::with_child(Kind::ProtocolDescriptor, proto));
            }
            b'A' => {
                let conformance = self.pop_protocol_conformance()?;
                return Ok(Symbol::with_child(
                    Kind::ReflectionMetadataAssocTypeDescriptor,
                    Rc::new(conformance),
                ));
            }
            b'C' => {
                let ty = self.pop_type_any_generic()?;
                return Ok(Symbol::with_child(
                    Kind::ReflectionMetadataSuperclassDescriptor,
                    ty,
                ));
            }
            b'V' => {
                let entity = self.pop_required_if(Kind::is_entity)?;
                return Ok(Symbol::with_child(Kind::PropertyDescriptor, entity));
            }
            b'X' => return self.demangle_private_context_descriptor(),
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a metadata letter".to_string()));
            }
        };
        let ty = self.pop_required(Kind::Type)?;
        Ok(Symbol::with_child(kind, ty))
    }

    fn demangle_private_context_descriptor(&mut self) -> DemangleResult<Symbol> {
        match self.scanner.read()? {
            b'E' => {
                let context = self.pop_context()?;
                Ok(Symbol::with_child(Kind::ExtensionDescriptor, context))
            }
            b'M' => {
                let module = self.pop_module();
                let module = self.require(module)?;
                Ok(Symbol::with_child(Kind::ModuleDescriptor, module))
            }
            b'Y' => {
                let discriminator = self.pop_any();
                let discriminator = self.require(discriminator)?;
                let context = self.pop_context()?;
                Ok(Symbol::with_children(
                    Kind::AnonymousDescriptor,
                    vec![context, discriminator],
                ))
            }
            b'X' => {
                let context = self.pop_context()?;
                Ok(Symbol::with_child(Kind::AnonymousDescriptor, context))
            }
            b'A' => {
                let path = self.pop_assoc_type_path()?;
                let base = self.pop_required(Kind::Type)?;
                Ok(Symbol::with_children(
                    Kind::AssociatedTypeGenericParamRef,
                    vec![base, Rc::new(path)],
                ))
            }
            _ => {
                self.scanner.backtrack(1);
                Err(self
                    .scanner
                    .match_failed("a context descriptor letter".to_string()))
            }
        }
    }

    fn demangle_metatype_representation(&mut self) -> DemangleResult<Rc<Symbol>> {
        let text = match self.scanner.read()? {
            b't' => "@thin",
            b'T' => "@thick",
            b'o' => "@objc_metatype",
            _ => {
                self.scanner.backtrack(1);
                return Err(self
                    .scanner
                    .match_failed("a metatype representation".to_string()));
            }
        };
        Ok(Rc::new(Symbol::with_text(Kind::MetatypeRepresentation, text)))
    }

    /// `X` opcode: function type flavours, reference storage, metatypes, existentials and
    /// SIL boxes.
    pub(super) fn demangle_special_type(&mut self) -> DemangleResult<Rc<Symbol>> {
        let c = self.scanner.read()?;
        let node = match c {
            b'E' => self.pop_function_type(Kind::NoEscapeFunctionType)?,
            b'A' => self.pop_function_type(Kind::EscapingAutoClosureType)?,
            b'f' => self.pop_function_type(Kind::ThinFunctionType)?,
            b'K' => self.pop_function_type(Kind::AutoClosureType)?,
            b'U' => self.pop_function_type(Kind::UncurriedFunctionType)?,
            b'B' => self.pop_function_type(Kind::ObjCBlock)?,
            b'C' => self.pop_function_type(Kind::CFunctionPointer)?,
            b'o' | b'u' | b'w' | b'b' | b'D' => {
                let kind = match c {
                    b'o' => Kind::Unowned,
                    b'u' => Kind::Unmanaged,
                    b'w' => Kind::Weak,
                    b'b' => Kind::SilBoxType,
                    _ => Kind::DynamicSelf,
                };
                let ty = self.pop_required(Kind::Type)?;
                Symbol::typed(kind, vec![ty])
            }
            b'M' | b'm' => {
                let representation = self.demangle_metatype_representation()?;
                let ty = self.pop_required(Kind::Type)?;
                let kind = if c == b'M' {
                    Kind::Metatype
                } else {
                    Kind::ExistentialMetatype
                };
                Symbol::typed(kind, vec![representation, ty])
            }
            b'p' => {
                let ty = self.pop_required(Kind::Type)?;
                Symbol::typed(Kind::ExistentialMetatype, vec![ty])
            }
            b'c' => {
                let superclass = self.pop_required(Kind::Type)?;
                let protocols = self.demangle_protocol_list()?;
                Symbol::typed(
                    Kind::ProtocolListWithClass,
                    vec![Rc::new(protocols), superclass],
                )
            }
            b'l' => {
                let protocols = self.demangle_protocol_list()?;
                Symbol::typed(Kind::ProtocolListWithAnyObject, vec![Rc::new(protocols)])
            }
            b'X' | b'x' => self.demangle_sil_box_type(c == b'X')?,
            b'Y' => return self.demangle_any_generic_type(Kind::OtherNominalType),
            b'Z' => {
                let types = self.pop_type_list()?;
                let name = self.pop_required(Kind::Identifier)?;
                let parent = self.pop_context()?;
                Symbol::with_children(Kind::AnonymousContext, vec![name, parent, Rc::new(types)])
            }
            b'e' => Symbol::typed(Kind::ErrorType, Vec::new()),
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a special type letter".to_string()));
            }
        };
        Ok(Rc::new(node))
    }

    fn demangle_sil_box_type(&mut self, has_signature: bool) -> DemangleResult<Symbol> {
        let generics = if has_signature {
            let signature = self.pop_required(Kind::DependentGenericSignature)?;
            let args = self.pop_type_list()?;
            Some((signature, args))
        } else {
            None
        };

        let field_types = self.pop_type_list()?;
        let mut layout = Symbol::new(Kind::SilBoxLayout);
        for field in field_types.children() {
            let inner = self.require(field.first_child())?;
            let node = if inner.kind() == Kind::InOut {
                let pointee = self.require(inner.first_child().cloned())?;
                Symbol::with_child(
                    Kind::SilBoxMutableField,
                    Rc::new(Symbol::with_child(Kind::Type, pointee)),
                )
            } else {
                Symbol::with_child(Kind::SilBoxImmutableField, field.clone())
            };
            layout.push(Rc::new(node));
        }

        let mut children = vec![Rc::new(layout)];
        if let Some((signature, args)) = generics {
            children.push(signature);
            children.push(Rc::new(args));
        }
        Ok(Symbol::typed(Kind::SilBoxTypeWithLayout, children))
    }

    /// Protocols pushed front to back, the first one flagged, or an empty list.
    pub(super) fn demangle_protocol_list(&mut self) -> DemangleResult<Symbol> {
        let mut protocols = Vec::new();
        if self.pop_kind(Kind::EmptyList).is_none() {
            loop {
                let first = self.pop_kind(Kind::FirstElementMarker).is_some();
                protocols.push(self.pop_protocol()?);
                if first {
                    break;
                }
            }
            protocols.reverse();
        }
        Ok(Symbol::with_child(
            Kind::ProtocolList,
            Rc::new(Symbol::with_children(Kind::TypeList, protocols)),
        ))
    }

    /// A protocol type already on the stack, or one named by a declaration name and context.
    pub(super) fn pop_protocol(&mut self) -> DemangleResult<Rc<Symbol>> {
        if let Some(ty) = self.pop_kind(Kind::Type) {
            let is_protocol = ty
                .first_child()
                .is_some_and(|c| c.kind() == Kind::Protocol);
            self.ensure(is_protocol)?;
            return Ok(ty);
        }
        let name = self.pop_required_if(Kind::is_decl_name)?;
        let context = self.pop_context()?;
        Ok(Rc::new(Symbol::typed(Kind::Protocol, vec![context, name])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run the opcodes of `text` (without prefix) and return the final stack.
    fn run(text: &str) -> Vec<Rc<Symbol>> {
        let mut d = Demangler::new(text);
        while !d.scanner.is_at_end() {
            let node = d.demangle_operator().unwrap();
            d.push(node);
        }
        d.stack
    }

    fn single(text: &str) -> Rc<Symbol> {
        let mut stack = run(text);
        assert_eq!(stack.len(), 1, "stack for {text}: {stack:?}");
        stack.pop().unwrap()
    }

    #[test]
    fn test_standard_substitution_int() {
        let ty = single("Si");
        let nominal = ty.first_child().unwrap();
        assert_eq!(nominal.kind(), Kind::Structure);
        assert!(nominal.child(1).unwrap().is_identifier("Int"));
    }

    #[test]
    fn test_standard_substitution_repeat_pushes_copies() {
        let stack = run("S3i");
        assert_eq!(stack.len(), 3);
        assert!(Rc::ptr_eq(&stack[0], &stack[2]));
    }

    #[test]
    fn test_standard_substitution_unknown_letter() {
        let mut d = Demangler::new("S!");
        assert!(d.demangle_operator().is_err());
    }

    #[test]
    fn test_optional_shorthand_is_recorded() {
        let mut d = Demangler::new("SiSg");
        for _ in 0..2 {
            let node = d.demangle_operator().unwrap();
            d.push(node);
        }
        let optional = d.stack.last().unwrap();
        assert_eq!(optional.first_child().unwrap().kind(), Kind::BoundGenericEnum);
        assert_eq!(d.substitutions.len(), 1);
    }

    #[test]
    fn test_builtin_sizes() {
        let ty = single("Bi32_");
        assert_eq!(ty.first_child().unwrap().text(), Some("Builtin.Int32"));

        let vec = single("Bf32_Bv4_");
        assert_eq!(vec.first_child().unwrap().text(), Some("Builtin.Vec4xFloat32"));

        let mut d = Demangler::new("Bi_");
        assert!(d.demangle_operator().is_err());
        let mut d = Demangler::new("Bi4097_");
        assert!(d.demangle_operator().is_err());
    }

    #[test]
    fn test_nested_bound_generic() {
        // Outer<Int>.Inner<String>
        let ty = single("4main5OuterV5InnerVySi_SSGD");
        assert_eq!(ty.kind(), Kind::TypeMangling);
        let bound = ty.first_child().unwrap().first_child().unwrap();
        assert_eq!(bound.kind(), Kind::BoundGenericStructure);
        let inner = bound.child(0).unwrap().first_child().unwrap();
        assert_eq!(inner.kind(), Kind::Structure);
        let outer = inner.child(0).unwrap();
        assert_eq!(outer.kind(), Kind::BoundGenericStructure);
        let args = bound.child(1).unwrap();
        assert_eq!(args.len(), 1);
    }

    #[test]
    fn test_bound_generic_requires_separator() {
        let mut d = Demangler::new("4main3BoxVSiSiG");
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
        assert!(result.is_err());
    }

    #[test]
    fn test_function_type_counts_params() {
        let ty = single("SiSi_SStc");
        let function = ty.first_child().unwrap();
        assert_eq!(function.kind(), Kind::FunctionType);
        let args = function.child(0).unwrap();
        assert_eq!(args.kind(), Kind::ArgumentTuple);
        assert_eq!(args.index(), Some(2));
    }

    #[test]
    fn test_impl_function_type_assigns_types_in_order() {
        let ty = single("SiSSIegyd_");
        let function = ty.first_child().unwrap();
        assert_eq!(function.kind(), Kind::ImplFunctionType);
        let kinds: Vec<Kind> = function.children().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::ImplEscaping,
                Kind::ImplConvention,
                Kind::ImplParameter,
                Kind::ImplResult
            ]
        );
        let param = function.child(2).unwrap();
        assert!(param.child(1).unwrap().first_child().unwrap().child(1).unwrap().is_identifier("Int"));
    }

    #[test]
    fn test_metatype_with_representation() {
        let ty = single("SiXMt");
        let meta = ty.first_child().unwrap();
        assert_eq!(meta.kind(), Kind::Metatype);
        assert_eq!(meta.child(0).unwrap().text(), Some("@thin"));
    }

    #[test]
    fn test_protocol_list_and_composition() {
        let ty = single("SQ_SHp");
        let list = ty.first_child().unwrap();
        assert_eq!(list.kind(), Kind::ProtocolList);
        assert_eq!(list.first_child().unwrap().len(), 2);

        let any = single("yp");
        assert!(any.first_child().unwrap().first_child().unwrap().is_empty());
    }

    #[test]
    fn test_sil_box_fields() {
        let ty = single("Si_SSzXx");
        let layout = ty.first_child().unwrap().first_child().unwrap();
        let kinds: Vec<Kind> = layout.children().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![Kind::SilBoxImmutableField, Kind::SilBoxMutableField]
        );
    }
}
