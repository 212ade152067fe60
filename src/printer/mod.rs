// This module renders a decoded symbol tree as readable text. The Printer walks the tree
// once, dispatching on each node's kind and appending to a single output buffer. Entity
// rules may defer their context: when an entity name cannot carry its context as a
// `Context.` prefix (closures, default arguments, local names), the context is handed back
// to the caller and printed as an ` in ...` postfix instead. Every rule is gated by
// RenderOptions so the same tree can be printed fully qualified or shortened. The rules for
// entities, types and specializations live in the submodules.

//! Options-driven rendering of symbol trees.

mod entity;
pub mod options;
mod specialization;
mod types;

use std::rc::Rc;

pub use options::RenderOptions;

use crate::decoder::MAX_NODE_DEPTH;
use crate::symbol::{Directness, Kind, Symbol, ValueWitnessKind};

/// Render `symbol` as text.
pub fn render(symbol: &Symbol, options: RenderOptions) -> String {
    let mut printer = Printer::new(options);
    printer.print_name(symbol, false);
    printer.finish()
}

/// Output buffer plus the state shared by the rendering rules.
pub struct Printer {
    target: String,
    options: RenderOptions,
    specialization_prefix_printed: bool,
    depth: usize,
}

impl Printer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            target: String::new(),
            options,
            specialization_prefix_printed: false,
            depth: 0,
        }
    }

    pub fn finish(self) -> String {
        self.target
    }

    fn has(&self, option: RenderOptions) -> bool {
        self.options.contains(option)
    }

    fn push(&mut self, text: &str) {
        self.target.push_str(text);
    }

    fn print_child(&mut self, node: &Symbol, index: usize) {
        if let Some(child) = node.child(index) {
            self.print_name(child, false);
        }
    }

    /// `prefix` then the first child.
    fn print_first_child(&mut self, node: &Symbol, prefix: &str) {
        self.push(prefix);
        self.print_child(node, 0);
    }

    /// `prefix`, the child at `index` and `suffix`, or nothing if the child is missing.
    fn print_child_with(&mut self, node: &Symbol, index: usize, prefix: &str, suffix: &str) {
        if let Some(child) = node.child(index) {
            self.push(prefix);
            self.print_name(child, false);
            self.push(suffix);
        }
    }

    fn print_sequence(&mut self, nodes: &[Rc<Symbol>], separator: &str) {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.print_name(node, false);
        }
    }

    fn print_children(&mut self, node: &Symbol, separator: &str) {
        self.print_sequence(node.children(), separator);
    }

    fn print_text(&mut self, node: &Symbol) {
        self.push(node.text().unwrap_or_default());
    }

    /// Print a node, returning the context an entity could not print in prefix form.
    ///
    /// Subtrees nested deeper than [`MAX_NODE_DEPTH`] print as `<<too complex>>`.
    pub fn print_name<'t>(&mut self, node: &'t Symbol, as_prefix_context: bool) -> Option<&'t Symbol> {
        if self.depth >= MAX_NODE_DEPTH {
            self.push("<<too complex>>");
            return None;
        }
        self.depth += 1;
        let postfix = self.print_node(node, as_prefix_context);
        self.depth -= 1;
        postfix
    }

    fn print_node<'t>(&mut self, node: &'t Symbol, as_prefix_context: bool) -> Option<&'t Symbol> {
        use Kind as K;
        match node.kind() {
            K::Global => self.print_children(node, ""),
            K::Type | K::TypeMangling | K::DeclContext => self.print_child(node, 0),
            K::Suffix => {
                if self.has(RenderOptions::DISPLAY_UNMANGLED_SUFFIX) {
                    self.push(" with unmangled suffix ");
                    self.quoted_string(node.text().unwrap_or_default());
                }
            }
            K::Module => {
                if self.has(RenderOptions::DISPLAY_MODULE_NAMES) {
                    self.print_text(node);
                }
            }
            K::Identifier
            | K::BuiltinTypeName
            | K::MetatypeRepresentation
            | K::DependentGenericParamType
            | K::DependentAssociatedTypeRef
            | K::ImplConvention
            | K::ImplFunctionAttribute => self.print_text(node),
            K::Index | K::Number | K::SpecializationPassId => {
                self.push(&node.index().unwrap_or(0).to_string());
            }
            K::InfixOperator | K::PrefixOperator | K::PostfixOperator => {
                self.print_text(node);
                self.push(match node.kind() {
                    K::InfixOperator => " infix",
                    K::PrefixOperator => " prefix",
                    _ => " postfix",
                });
            }
            K::LocalDeclName => {
                self.print_child(node, 1);
                let discriminator = node.child(0).and_then(|c| c.index()).unwrap_or(0);
                self.push(&format!(" #{}", discriminator + 1));
            }
            K::PrivateDeclName => self.print_private_decl_name(node),
            K::RelatedEntityDeclName => {
                self.push("related decl '");
                self.print_text(node);
                self.push("' for ");
                self.print_child(node, 0);
            }

            K::Variable
            | K::Function
            | K::BoundGenericFunction
            | K::Subscript
            | K::GenericTypeParamDecl
            | K::Class
            | K::Structure
            | K::Enum
            | K::Protocol
            | K::TypeAlias
            | K::OtherNominalType
            | K::ExplicitClosure
            | K::ImplicitClosure
            | K::Initializer
            | K::DefaultArgumentInitializer
            | K::Allocator
            | K::Constructor
            | K::Destructor
            | K::Deallocator
            | K::IVarInitializer
            | K::IVarDestroyer => return self.print_entity_kind(node, as_prefix_context),
            K::Getter
            | K::GlobalGetter
            | K::Setter
            | K::MaterializeForSet
            | K::WillSet
            | K::DidSet
            | K::ReadAccessor
            | K::ModifyAccessor
            | K::OwningAddressor
            | K::OwningMutableAddressor
            | K::NativeOwningAddressor
            | K::NativeOwningMutableAddressor
            | K::NativePinningAddressor
            | K::NativePinningMutableAddressor
            | K::UnsafeAddressor
            | K::UnsafeMutableAddressor => return self.print_accessor(node, as_prefix_context),
            K::Extension => self.print_extension(node),
            K::AnonymousContext => self.print_anonymous_context(node),
            K::Static => self.print_first_child(node, "static "),

            K::FunctionType | K::NoEscapeFunctionType | K::UncurriedFunctionType => {
                self.print_function_type(None, node)
            }
            K::AutoClosureType | K::EscapingAutoClosureType => {
                self.push("@autoclosure ");
                self.print_function_type(None, node);
            }
            K::ThinFunctionType => {
                self.push("@convention(thin) ");
                self.print_function_type(None, node);
            }
            K::CFunctionPointer => {
                self.push("@convention(c) ");
                self.print_function_type(None, node);
            }
            K::ObjCBlock => {
                self.push("@convention(block) ");
                self.print_function_type(None, node);
            }
            K::ArgumentTuple => {
                let show_types = self.has(RenderOptions::SHOW_FUNCTION_ARGUMENT_TYPES);
                self.print_function_parameters(None, node, show_types);
            }
            K::ReturnType => {
                self.push(" -> ");
                if node.is_empty() {
                    self.print_text(node);
                } else {
                    self.print_children(node, "");
                }
            }
            K::Tuple => {
                self.push("(");
                self.print_children(node, ", ");
                self.push(")");
            }
            K::TupleElement => self.print_tuple_element(node),
            K::TupleElementName => {
                self.print_text(node);
                self.push(": ");
            }
            K::TypeList => self.print_children(node, ""),
            K::LabelList | K::AssociatedType | K::DependentGenericParamCount => {}

            K::Weak => self.print_first_child(node, "weak "),
            K::Unowned => self.print_first_child(node, "unowned "),
            K::Unmanaged => self.print_first_child(node, "unowned(unsafe) "),
            K::InOut => self.print_first_child(node, "inout "),
            K::Shared => self.print_first_child(node, "__shared "),
            K::Owned => self.print_first_child(node, "__owned "),
            K::SilBoxType => self.print_first_child(node, "@box "),
            K::DynamicSelf => self.push("Self"),
            K::ErrorType => self.push("<ERROR TYPE>"),

            K::BoundGenericClass
            | K::BoundGenericStructure
            | K::BoundGenericEnum
            | K::BoundGenericProtocol
            | K::BoundGenericOtherNominalType
            | K::BoundGenericTypeAlias => self.print_bound_generic(node),
            K::Metatype => self.print_metatype(node),
            K::ExistentialMetatype => self.print_existential_metatype(node),
            K::AssociatedTypeRef => {
                self.print_child(node, 0);
                self.push(".");
                if let Some(name) = node.child(1) {
                    self.print_text(name);
                }
            }
            K::ProtocolList => self.print_protocol_list(node),
            K::ProtocolListWithClass => self.print_protocol_list_with_class(node),
            K::ProtocolListWithAnyObject => self.print_protocol_list_with_any_object(node),
            K::ImplFunctionType => self.print_impl_function_type(node),
            K::ImplEscaping => self.push("@escaping"),
            K::ImplParameter | K::ImplResult => self.print_children(node, " "),
            K::ImplErrorResult => {
                self.push("@error ");
                self.print_children(node, " ");
            }
            K::DependentGenericSignature | K::DependentPseudogenericSignature => {
                self.print_generic_signature(node)
            }
            K::DependentGenericConformanceRequirement => {
                self.print_child(node, 0);
                self.print_child_with(node, 1, ": ", "");
            }
            K::DependentGenericLayoutRequirement => self.print_layout_requirement(node),
            K::DependentGenericSameTypeRequirement => {
                self.print_child(node, 0);
                self.print_child_with(node, 1, " == ", "");
            }
            K::DependentGenericType => {
                self.print_child(node, 0);
                if let Some(ty) = node.child(1) {
                    if ty.need_space_before_type() {
                        self.push(" ");
                    }
                    self.print_name(ty, false);
                }
            }
            K::DependentMemberType => {
                self.print_child(node, 0);
                self.push(".");
                self.print_child(node, 1);
            }
            K::SilBoxTypeWithLayout => self.print_sil_box_with_layout(node),
            K::SilBoxLayout => {
                self.push("{");
                for (i, field) in node.children().iter().enumerate() {
                    self.push(if i > 0 { ", " } else { " " });
                    self.print_name(field, false);
                }
                self.push(" }");
            }
            K::SilBoxImmutableField => self.print_first_child(node, "let "),
            K::SilBoxMutableField => self.print_first_child(node, "var "),
            K::AssocTypePath => self.print_children(node, "."),
            K::SymbolicReference => {
                self.push(&format!("symbolic reference {}", node.index().unwrap_or(0)));
            }
            K::UnresolvedSymbolicReference => {
                self.push(&format!("${}", node.index().unwrap_or(0)));
            }

            K::ThrowsAnnotation => self.push(" throws "),
            K::EmptyList => self.push(" empty-list "),
            K::FirstElementMarker => self.push(" first-element-marker "),
            K::VariadicMarker => self.push(" variadic-marker "),

            K::ObjCAttribute => self.push("@objc "),
            K::NonObjCAttribute => self.push("@nonobjc "),
            K::DynamicAttribute => self.push("dynamic "),
            K::DirectMethodReferenceAttribute => self.push("super "),
            K::VTableAttribute => self.push("override "),
            K::MergedFunction => {
                if !self.has(RenderOptions::SHORTEN_THUNK) {
                    self.push("merged ");
                }
            }
            K::CurryThunk => self.print_first_child(node, "curry thunk of "),
            K::DispatchThunk => self.print_first_child(node, "dispatch thunk of "),
            K::MethodDescriptor => self.print_first_child(node, "method descriptor for "),
            K::MethodLookupFunction => self.print_first_child(node, "method lookup function for "),
            K::CoroutineContinuationPrototype => {
                self.print_first_child(node, "coroutine continuation prototype for ")
            }
            K::PartialApplyForwarder | K::PartialApplyObjCForwarder => {
                self.print_partial_apply(node)
            }
            K::ReabstractionThunk | K::ReabstractionThunkHelper => {
                self.print_reabstraction_thunk(node)
            }
            K::VTableThunk => {
                self.print_child_with(node, 1, "vtable thunk for ", "");
                self.print_child_with(node, 0, " dispatching to ", "");
            }
            K::ProtocolWitness => {
                self.print_child_with(node, 1, "protocol witness for ", "");
                self.print_child_with(node, 0, " in conformance ", "");
            }
            K::KeyPathGetterThunkHelper | K::KeyPathSetterThunkHelper => {
                self.push(if node.kind() == K::KeyPathGetterThunkHelper {
                    "key path getter for "
                } else {
                    "key path setter for "
                });
                self.print_child(node, 0);
                self.push(" : ");
                self.print_sequence(node.children().get(1..).unwrap_or_default(), "");
            }
            K::KeyPathEqualsThunkHelper | K::KeyPathHashThunkHelper => {
                self.print_key_path_index_helper(node)
            }

            K::OutlinedBridgedMethod => {
                self.push("outlined bridged method (");
                self.print_text(node);
                self.push(") of ");
            }
            K::OutlinedVariable => {
                self.push(&format!("outlined variable #{} of ", node.index().unwrap_or(0)));
            }
            K::OutlinedCopy => self.print_outlined(node, "outlined copy of "),
            K::OutlinedConsume => self.print_outlined(node, "outlined consume of "),
            K::OutlinedRetain => self.print_outlined(node, "outlined retain of "),
            K::OutlinedRelease => self.print_outlined(node, "outlined release of "),
            K::OutlinedInitializeWithTake => self.print_outlined(node, "outlined init with take of "),
            K::OutlinedInitializeWithCopy => self.print_outlined(node, "outlined init with copy of "),
            K::OutlinedAssignWithTake => self.print_outlined(node, "outlined assign with take of "),
            K::OutlinedAssignWithCopy => self.print_outlined(node, "outlined assign with copy of "),
            K::OutlinedDestroy => self.print_outlined(node, "outlined destroy of "),

            K::FunctionSignatureSpecialization => {
                self.print_specialization_prefix(node, "function signature specialization", "")
            }
            K::GenericSpecialization => {
                self.print_specialization_prefix(node, "generic specialization", "")
            }
            K::GenericSpecializationNotReAbstracted => self.print_specialization_prefix(
                node,
                "generic not re-abstracted specialization",
                "",
            ),
            K::GenericPartialSpecialization => self.print_specialization_prefix(
                node,
                "generic partial specialization",
                "Signature = ",
            ),
            K::GenericPartialSpecializationNotReAbstracted => self.print_specialization_prefix(
                node,
                "generic not re-abstracted partial specialization",
                "Signature = ",
            ),
            K::SpecializationIsFragile => self.push("preserving fragile attribute"),
            K::GenericSpecializationParam => {
                self.print_child(node, 0);
                for (i, conformance) in node.children().iter().enumerate().skip(1) {
                    self.push(if i == 1 { " with " } else { " and " });
                    self.print_name(conformance, false);
                }
            }
            K::FunctionSignatureSpecializationParam | K::FunctionSignatureSpecializationReturn => {
                self.print_func_sig_param_record(node)
            }
            K::FunctionSignatureSpecializationParamKind => self.print_func_sig_param_kind(node),
            K::FunctionSignatureSpecializationParamPayload => {
                self.print_mangled_payload(node.text().unwrap_or_default())
            }

            K::ProtocolConformance => self.print_protocol_conformance(node),
            K::RetroactiveConformance => {
                if node.len() == 2 {
                    self.push("retroactive @ ");
                    self.print_children(node, "");
                }
            }
            K::ProtocolWitnessTable => self.print_first_child(node, "protocol witness table for "),
            K::ProtocolWitnessTablePattern => {
                self.print_first_child(node, "protocol witness table pattern for ")
            }
            K::GenericProtocolWitnessTable => {
                self.print_first_child(node, "generic protocol witness table for ")
            }
            K::GenericProtocolWitnessTableInstantiationFunction => self.print_first_child(
                node,
                "instantiation function for generic protocol witness table for ",
            ),
            K::ResilientProtocolWitnessTable => {
                self.print_first_child(node, "resilient protocol witness table for ")
            }
            K::ProtocolWitnessTableAccessor => {
                self.print_first_child(node, "protocol witness table accessor for ")
            }
            K::LazyProtocolWitnessTableAccessor => {
                self.print_child_with(node, 0, "lazy protocol witness table accessor for type ", "");
                self.print_child_with(node, 1, " and conformance ", "");
            }
            K::LazyProtocolWitnessTableCacheVariable => {
                self.print_child_with(
                    node,
                    0,
                    "lazy protocol witness table cache variable for type ",
                    "",
                );
                self.print_child_with(node, 1, " and conformance ", "");
            }
            K::AssociatedTypeMetadataAccessor => {
                self.print_child_with(node, 1, "associated type metadata accessor for ", "");
                self.print_child_with(node, 0, " in ", "");
            }
            K::AssociatedTypeWitnessTableAccessor => {
                self.print_child_with(node, 1, "associated type witness table accessor for ", "");
                self.print_child_with(node, 2, " : ", "");
                self.print_child_with(node, 0, " in ", "");
            }
            K::AssociatedConformanceDescriptor | K::DefaultAssociatedConformanceAccessor => {
                self.push(if node.kind() == K::AssociatedConformanceDescriptor {
                    "associated conformance descriptor for "
                } else {
                    "default associated conformance accessor for "
                });
                self.print_child(node, 0);
                self.print_child_with(node, 1, ".", "");
                self.print_child_with(node, 2, ": ", "");
            }
            K::AssociatedTypeDescriptor => {
                self.print_first_child(node, "associated type descriptor for ")
            }
            K::DefaultAssociatedTypeMetadataAccessor => {
                self.print_first_child(node, "default associated type metadata accessor for ")
            }
            K::ProtocolRequirementsBaseDescriptor => {
                self.print_first_child(node, "protocol requirements base descriptor for ")
            }
            K::AssociatedTypeGenericParamRef => {
                self.push("generic parameter reference for associated type ");
                self.print_children(node, "");
            }
            K::ValueWitness => {
                let name = node
                    .index()
                    .and_then(ValueWitnessKind::from_index)
                    .map(ValueWitnessKind::name)
                    .unwrap_or_default();
                self.push(name);
                self.push(if self.has(RenderOptions::SHORTEN_VALUE_WITNESS) {
                    " for "
                } else {
                    " value witness for "
                });
                self.print_child(node, 0);
            }
            K::ValueWitnessTable => self.print_first_child(node, "value witness table for "),
            K::FieldOffset => {
                self.print_child(node, 0);
                self.print_child_with(node, 1, "field offset for ", "");
            }
            K::Directness => {
                if let Some(directness) = node.index().and_then(Directness::from_index) {
                    self.push(directness.name());
                    self.push(" ");
                }
            }
            K::EnumCase => self.print_first_child(node, "enum case for "),

            K::TypeMetadata => self.print_first_child(node, "type metadata for "),
            K::FullTypeMetadata => self.print_first_child(node, "full type metadata for "),
            K::TypeMetadataAccessFunction => {
                self.print_first_child(node, "type metadata accessor for ")
            }
            K::TypeMetadataInstantiationCache => {
                self.print_first_child(node, "type metadata instantiation cache for ")
            }
            K::TypeMetadataInstantiationFunction => {
                self.print_first_child(node, "type metadata instantiation function for ")
            }
            K::TypeMetadataSingletonInitializationCache => {
                self.print_first_child(node, "type metadata singleton initialization cache for ")
            }
            K::TypeMetadataCompletionFunction => {
                self.print_first_child(node, "type metadata completion function for ")
            }
            K::TypeMetadataLazyCache => {
                self.print_first_child(node, "lazy cache variable for type metadata for ")
            }
            K::GenericTypeMetadataPattern => {
                self.print_first_child(node, "generic type metadata pattern for ")
            }
            K::Metaclass => self.print_first_child(node, "metaclass for "),
            K::ClassMetadataBaseOffset => {
                self.print_first_child(node, "class metadata base offset for ")
            }
            K::NominalTypeDescriptor => self.print_first_child(node, "nominal type descriptor for "),
            K::PropertyDescriptor => self.print_first_child(node, "property descriptor for "),
            K::ProtocolDescriptor => self.print_first_child(node, "protocol descriptor for "),
            K::ProtocolConformanceDescriptor => {
                self.print_first_child(node, "protocol conformance descriptor for ")
            }
            K::ModuleDescriptor => self.print_first_child(node, "module descriptor "),
            K::AnonymousDescriptor => self.print_first_child(node, "anonymous descriptor "),
            K::ExtensionDescriptor => self.print_first_child(node, "extension descriptor "),
            K::ReflectionMetadataBuiltinDescriptor => {
                self.print_first_child(node, "reflection metadata builtin descriptor ")
            }
            K::ReflectionMetadataFieldDescriptor => {
                self.print_first_child(node, "reflection metadata field descriptor ")
            }
            K::ReflectionMetadataAssocTypeDescriptor => {
                self.print_first_child(node, "reflection metadata associated type descriptor ")
            }
            K::ReflectionMetadataSuperclassDescriptor => {
                self.print_first_child(node, "reflection metadata superclass descriptor ")
            }
        }
        None
    }

    fn print_private_decl_name(&mut self, node: &Symbol) {
        let show = self.has(RenderOptions::SHOW_PRIVATE_DISCRIMINATORS);
        let discriminator = node
            .child(0)
            .and_then(|c| c.text())
            .unwrap_or_default()
            .to_string();
        if node.len() > 1 {
            if show {
                self.push("(");
            }
            self.print_child(node, 1);
            if show {
                self.push(&format!(" in {discriminator})"));
            }
        } else if show {
            self.push(&format!("(in {discriminator})"));
        }
    }

    fn print_tuple_element(&mut self, node: &Symbol) {
        let find = |kind: Kind| node.children().iter().find(|c| c.kind() == kind);
        if let Some(label) = find(Kind::TupleElementName) {
            self.print_text(label);
            self.push(": ");
        }
        if let Some(ty) = find(Kind::Type) {
            self.print_name(ty, false);
        }
        if find(Kind::VariadicMarker).is_some() {
            self.push("...");
        }
    }

    fn print_outlined(&mut self, node: &Symbol, description: &str) {
        self.print_first_child(node, description);
        if let Some(signature) = node.child(1) {
            self.print_name(signature, false);
        }
    }

    fn print_partial_apply(&mut self, node: &Symbol) {
        self.push("partial apply");
        if !self.has(RenderOptions::SHORTEN_PARTIAL_APPLY) {
            self.push(if node.kind() == Kind::PartialApplyForwarder {
                " forwarder"
            } else {
                " ObjC forwarder"
            });
        }
        if !node.is_empty() {
            self.push(" for ");
            self.print_children(node, "");
        }
    }

    fn print_reabstraction_thunk(&mut self, node: &Symbol) {
        let len = node.len();
        if self.has(RenderOptions::SHORTEN_THUNK) {
            self.push("thunk for ");
            self.print_child(node, len.saturating_sub(2));
            return;
        }
        self.push("reabstraction thunk ");
        if node.kind() == Kind::ReabstractionThunkHelper {
            self.push("helper ");
        }
        let mut first_type = 0;
        if len == 3 {
            self.print_child(node, 0);
            self.push(" ");
            first_type = 1;
        }
        self.print_child_with(node, first_type + 1, "from ", "");
        self.print_child_with(node, first_type, " to ", "");
    }

    fn print_key_path_index_helper(&mut self, node: &Symbol) {
        self.push(if node.kind() == Kind::KeyPathEqualsThunkHelper {
            "key path index equality operator for "
        } else {
            "key path index hash operator for "
        });
        let mut types = node.children();
        if let Some((last, rest)) = types.split_last() {
            if last.kind() == Kind::DependentGenericSignature {
                self.print_name(last, false);
                types = rest;
            }
        }
        self.push("(");
        self.print_sequence(types, ", ");
        self.push(")");
    }

    fn print_protocol_conformance(&mut self, node: &Symbol) {
        if node.len() == 4 {
            self.print_child_with(node, 3, "property behavior storage of ", "");
            self.print_child_with(node, 0, " in ", "");
            self.print_child_with(node, 1, " : ", "");
            return;
        }
        self.print_child(node, 0);
        if self.has(RenderOptions::DISPLAY_PROTOCOL_CONFORMANCES) {
            self.print_child_with(node, 1, " : ", "");
            self.print_child_with(node, 2, " in ", "");
        }
    }

    /// Double-quoted text with control characters escaped.
    fn quoted_string(&mut self, text: &str) {
        self.push("\"");
        self.push_escaped(text);
        self.push("\"");
    }

    fn push_escaped(&mut self, text: &str) {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        for c in text.chars() {
            match c {
                '\\' => self.push("\\\\"),
                '\t' => self.push("\\t"),
                '\n' => self.push("\\n"),
                '\r' => self.push("\\r"),
                '"' => self.push("\\\""),
                '\0' => self.push("\\0"),
                c if (c as u32) < 0x20 || c as u32 == 0x7F => {
                    let byte = c as u8;
                    self.target.push_str("\\x");
                    self.target.push(HEX[usize::from(byte >> 4)] as char);
                    self.target.push(HEX[usize::from(byte & 0xF)] as char);
                }
                c => self.target.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;

    fn render_default(mangled: &str) -> String {
        render(&decode(mangled).unwrap(), RenderOptions::default())
    }

    #[test]
    fn test_quoted_string_escapes() {
        let mut printer = Printer::new(RenderOptions::default());
        printer.quoted_string("a\"b\\\n\u{1}\u{7f}");
        assert_eq!(printer.finish(), "\"a\\\"b\\\\\\n\\x01\\x7F\"");
    }

    #[test]
    fn test_suffix_is_option_gated() {
        assert_eq!(
            render_default("$s4main3fooyyF.cold"),
            "main.foo() -> () with unmangled suffix \".cold\""
        );
        let global = decode("$s4main3fooyyF.cold").unwrap();
        let text = render(
            &global,
            RenderOptions::default() - RenderOptions::DISPLAY_UNMANGLED_SUFFIX,
        );
        assert_eq!(text, "main.foo() -> ()");
    }

    #[test]
    fn test_partial_apply_shortening() {
        assert_eq!(
            render_default("$s4main3fooyyFTA"),
            "partial apply forwarder for main.foo() -> ()"
        );
        let global = decode("$s4main3fooyyFTA").unwrap();
        assert_eq!(
            render(&global, RenderOptions::simplified()),
            "partial apply for foo()"
        );
    }

    #[test]
    fn test_value_witness() {
        assert_eq!(
            render_default("$s4main3FooVwxx"),
            "destroy value witness for main.Foo"
        );
    }

    #[test]
    fn test_field_offset_directness() {
        assert_eq!(
            render_default("$s4main3FooV1xSivpWvd"),
            "direct field offset for main.Foo.x : Swift.Int"
        );
    }

    #[test]
    fn test_protocol_witness_table() {
        assert_eq!(
            render_default("$s4main3FooVAA1PAAWP"),
            "protocol witness table for main.Foo : main.P in main"
        );
    }

    #[test]
    fn test_private_discriminator_toggle() {
        let node = Symbol::with_children(
            Kind::PrivateDeclName,
            vec![
                Rc::new(Symbol::with_text(Kind::Identifier, "_ABC")),
                Rc::new(Symbol::with_text(Kind::Identifier, "foo")),
            ],
        );
        assert_eq!(render(&node, RenderOptions::default()), "(foo in _ABC)");
        assert_eq!(render(&node, RenderOptions::simplified()), "foo");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let global = decode("$s4main3foo1a1bySi_SitF").unwrap();
        let first = render(&global, RenderOptions::default());
        let second = render(&global, RenderOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_deep_tree_is_cut_off() {
        let mut node = Symbol::stdlib_type(Kind::Structure, "Int");
        for _ in 0..2000 {
            node = Symbol::with_child(Kind::Type, Rc::new(node));
        }
        let text = render(&node, RenderOptions::default());
        assert_eq!(text, "<<too complex>>");
    }

    #[test]
    fn test_tree_below_depth_limit_renders() {
        let mut node = Symbol::stdlib_type(Kind::Structure, "Int");
        for _ in 0..MAX_NODE_DEPTH - 10 {
            node = Symbol::with_child(Kind::Type, Rc::new(node));
        }
        assert_eq!(render(&node, RenderOptions::default()), "Swift.Int");
    }
}
