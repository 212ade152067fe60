//! The closed set of symbol tree node kinds and their classification predicates.

/// Tag of a [`Symbol`](super::Symbol) node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Allocator,
    AnonymousContext,
    AnonymousDescriptor,
    ArgumentTuple,
    AssociatedConformanceDescriptor,
    AssociatedType,
    AssociatedTypeDescriptor,
    AssociatedTypeGenericParamRef,
    AssociatedTypeMetadataAccessor,
    AssociatedTypeRef,
    AssociatedTypeWitnessTableAccessor,
    AssocTypePath,
    AutoClosureType,
    BoundGenericClass,
    BoundGenericEnum,
    BoundGenericFunction,
    BoundGenericOtherNominalType,
    BoundGenericProtocol,
    BoundGenericStructure,
    BoundGenericTypeAlias,
    BuiltinTypeName,
    CFunctionPointer,
    Class,
    ClassMetadataBaseOffset,
    Constructor,
    CoroutineContinuationPrototype,
    CurryThunk,
    Deallocator,
    DeclContext,
    DefaultArgumentInitializer,
    DefaultAssociatedConformanceAccessor,
    DefaultAssociatedTypeMetadataAccessor,
    DependentAssociatedTypeRef,
    DependentGenericConformanceRequirement,
    DependentGenericLayoutRequirement,
    DependentGenericParamCount,
    DependentGenericParamType,
    DependentGenericSameTypeRequirement,
    DependentGenericSignature,
    DependentGenericType,
    DependentMemberType,
    DependentPseudogenericSignature,
    Destructor,
    DidSet,
    DirectMethodReferenceAttribute,
    Directness,
    DispatchThunk,
    DynamicAttribute,
    DynamicSelf,
    EmptyList,
    Enum,
    EnumCase,
    ErrorType,
    EscapingAutoClosureType,
    ExistentialMetatype,
    ExplicitClosure,
    Extension,
    ExtensionDescriptor,
    FieldOffset,
    FirstElementMarker,
    FullTypeMetadata,
    Function,
    FunctionSignatureSpecialization,
    FunctionSignatureSpecializationParam,
    FunctionSignatureSpecializationParamKind,
    FunctionSignatureSpecializationParamPayload,
    FunctionSignatureSpecializationReturn,
    FunctionType,
    GenericPartialSpecialization,
    GenericPartialSpecializationNotReAbstracted,
    GenericProtocolWitnessTable,
    GenericProtocolWitnessTableInstantiationFunction,
    GenericSpecialization,
    GenericSpecializationNotReAbstracted,
    GenericSpecializationParam,
    GenericTypeMetadataPattern,
    GenericTypeParamDecl,
    Getter,
    Global,
    GlobalGetter,
    Identifier,
    ImplConvention,
    ImplErrorResult,
    ImplEscaping,
    ImplFunctionAttribute,
    ImplFunctionType,
    ImplicitClosure,
    ImplParameter,
    ImplResult,
    Index,
    InfixOperator,
    Initializer,
    InOut,
    IVarDestroyer,
    IVarInitializer,
    KeyPathEqualsThunkHelper,
    KeyPathGetterThunkHelper,
    KeyPathHashThunkHelper,
    KeyPathSetterThunkHelper,
    LabelList,
    LazyProtocolWitnessTableAccessor,
    LazyProtocolWitnessTableCacheVariable,
    LocalDeclName,
    MaterializeForSet,
    MergedFunction,
    Metaclass,
    Metatype,
    MetatypeRepresentation,
    MethodDescriptor,
    MethodLookupFunction,
    ModifyAccessor,
    Module,
    ModuleDescriptor,
    NativeOwningAddressor,
    NativeOwningMutableAddressor,
    NativePinningAddressor,
    NativePinningMutableAddressor,
    NoEscapeFunctionType,
    NominalTypeDescriptor,
    NonObjCAttribute,
    Number,
    ObjCAttribute,
    ObjCBlock,
    OtherNominalType,
    OutlinedAssignWithCopy,
    OutlinedAssignWithTake,
    OutlinedBridgedMethod,
    OutlinedConsume,
    OutlinedCopy,
    OutlinedDestroy,
    OutlinedInitializeWithCopy,
    OutlinedInitializeWithTake,
    OutlinedRelease,
    OutlinedRetain,
    OutlinedVariable,
    Owned,
    OwningAddressor,
    OwningMutableAddressor,
    PartialApplyForwarder,
    PartialApplyObjCForwarder,
    PostfixOperator,
    PrefixOperator,
    PrivateDeclName,
    PropertyDescriptor,
    Protocol,
    ProtocolConformance,
    ProtocolConformanceDescriptor,
    ProtocolDescriptor,
    ProtocolList,
    ProtocolListWithAnyObject,
    ProtocolListWithClass,
    ProtocolRequirementsBaseDescriptor,
    ProtocolWitness,
    ProtocolWitnessTable,
    ProtocolWitnessTableAccessor,
    ProtocolWitnessTablePattern,
    ReabstractionThunk,
    ReabstractionThunkHelper,
    ReadAccessor,
    ReflectionMetadataAssocTypeDescriptor,
    ReflectionMetadataBuiltinDescriptor,
    ReflectionMetadataFieldDescriptor,
    ReflectionMetadataSuperclassDescriptor,
    RelatedEntityDeclName,
    ResilientProtocolWitnessTable,
    RetroactiveConformance,
    ReturnType,
    Setter,
    Shared,
    SilBoxImmutableField,
    SilBoxLayout,
    SilBoxMutableField,
    SilBoxType,
    SilBoxTypeWithLayout,
    SpecializationIsFragile,
    SpecializationPassId,
    Static,
    Structure,
    Subscript,
    Suffix,
    SymbolicReference,
    ThinFunctionType,
    ThrowsAnnotation,
    Tuple,
    TupleElement,
    TupleElementName,
    Type,
    TypeAlias,
    TypeList,
    TypeMangling,
    TypeMetadata,
    TypeMetadataAccessFunction,
    TypeMetadataCompletionFunction,
    TypeMetadataInstantiationCache,
    TypeMetadataInstantiationFunction,
    TypeMetadataLazyCache,
    TypeMetadataSingletonInitializationCache,
    UncurriedFunctionType,
    Unmanaged,
    Unowned,
    UnresolvedSymbolicReference,
    UnsafeAddressor,
    UnsafeMutableAddressor,
    ValueWitness,
    ValueWitnessTable,
    Variable,
    VariadicMarker,
    VTableAttribute,
    VTableThunk,
    Weak,
    WillSet,
}

impl Kind {
    /// Kinds that can stand as the name of a declaration.
    pub fn is_decl_name(self) -> bool {
        matches!(
            self,
            Kind::Identifier
                | Kind::LocalDeclName
                | Kind::PrivateDeclName
                | Kind::RelatedEntityDeclName
                | Kind::PrefixOperator
                | Kind::PostfixOperator
                | Kind::InfixOperator
                | Kind::UnresolvedSymbolicReference
                | Kind::SymbolicReference
        )
    }

    /// Kinds that can be the enclosing context of another entity.
    pub fn is_context(self) -> bool {
        matches!(
            self,
            Kind::Allocator
                | Kind::Class
                | Kind::AnonymousContext
                | Kind::Constructor
                | Kind::CurryThunk
                | Kind::Deallocator
                | Kind::DefaultArgumentInitializer
                | Kind::Destructor
                | Kind::DidSet
                | Kind::DispatchThunk
                | Kind::Enum
                | Kind::ExplicitClosure
                | Kind::Extension
                | Kind::Function
                | Kind::Getter
                | Kind::GlobalGetter
                | Kind::IVarInitializer
                | Kind::IVarDestroyer
                | Kind::ImplicitClosure
                | Kind::Initializer
                | Kind::MaterializeForSet
                | Kind::Module
                | Kind::NativeOwningAddressor
                | Kind::NativeOwningMutableAddressor
                | Kind::NativePinningAddressor
                | Kind::NativePinningMutableAddressor
                | Kind::OtherNominalType
                | Kind::OwningAddressor
                | Kind::OwningMutableAddressor
                | Kind::Protocol
                | Kind::Setter
                | Kind::Static
                | Kind::Structure
                | Kind::Subscript
                | Kind::SymbolicReference
                | Kind::TypeAlias
                | Kind::UnresolvedSymbolicReference
                | Kind::UnsafeAddressor
                | Kind::UnsafeMutableAddressor
                | Kind::Variable
                | Kind::WillSet
        )
    }

    /// Nominal type declarations that may carry generic arguments.
    pub fn is_any_generic(self) -> bool {
        matches!(
            self,
            Kind::Structure
                | Kind::Class
                | Kind::Enum
                | Kind::Protocol
                | Kind::OtherNominalType
                | Kind::TypeAlias
                | Kind::SymbolicReference
                | Kind::UnresolvedSymbolicReference
        )
    }

    pub fn is_entity(self) -> bool {
        self == Kind::Type || self.is_context()
    }

    pub fn is_requirement(self) -> bool {
        matches!(
            self,
            Kind::DependentGenericSameTypeRequirement
                | Kind::DependentGenericLayoutRequirement
                | Kind::DependentGenericConformanceRequirement
        )
    }

    /// Attributes that decorate a whole top-level function symbol.
    pub fn is_function_attr(self) -> bool {
        matches!(
            self,
            Kind::FunctionSignatureSpecialization
                | Kind::GenericPartialSpecialization
                | Kind::GenericSpecializationNotReAbstracted
                | Kind::GenericSpecialization
                | Kind::GenericPartialSpecializationNotReAbstracted
                | Kind::ObjCAttribute
                | Kind::NonObjCAttribute
                | Kind::DynamicAttribute
                | Kind::DirectMethodReferenceAttribute
                | Kind::VTableAttribute
                | Kind::PartialApplyForwarder
                | Kind::PartialApplyObjCForwarder
                | Kind::OutlinedVariable
                | Kind::OutlinedBridgedMethod
                | Kind::MergedFunction
        )
    }

    pub fn is_existential_type(self) -> bool {
        matches!(
            self,
            Kind::ExistentialMetatype
                | Kind::ProtocolList
                | Kind::ProtocolListWithClass
                | Kind::ProtocolListWithAnyObject
        )
    }

    /// Types that print without surrounding parentheses in postfix positions.
    pub fn is_simple_type(self) -> bool {
        matches!(
            self,
            Kind::AssociatedType
                | Kind::AssociatedTypeRef
                | Kind::BoundGenericClass
                | Kind::BoundGenericEnum
                | Kind::BoundGenericStructure
                | Kind::BoundGenericOtherNominalType
                | Kind::BuiltinTypeName
                | Kind::Class
                | Kind::DependentGenericType
                | Kind::DependentMemberType
                | Kind::DependentGenericParamType
                | Kind::DynamicSelf
                | Kind::Enum
                | Kind::ErrorType
                | Kind::ExistentialMetatype
                | Kind::Metatype
                | Kind::MetatypeRepresentation
                | Kind::Module
                | Kind::Tuple
                | Kind::Protocol
                | Kind::ReturnType
                | Kind::SilBoxType
                | Kind::SilBoxTypeWithLayout
                | Kind::Structure
                | Kind::OtherNominalType
                | Kind::TupleElementName
                | Kind::Type
                | Kind::TypeAlias
                | Kind::TypeList
                | Kind::LabelList
                | Kind::SymbolicReference
                | Kind::UnresolvedSymbolicReference
        )
    }

    /// Specialization wrappers that share the "specialized " prefix.
    pub fn is_specialization(self) -> bool {
        matches!(
            self,
            Kind::GenericSpecialization
                | Kind::GenericSpecializationNotReAbstracted
                | Kind::GenericPartialSpecialization
                | Kind::GenericPartialSpecializationNotReAbstracted
                | Kind::FunctionSignatureSpecialization
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_includes_type_and_contexts() {
        assert!(Kind::Type.is_entity());
        assert!(Kind::Module.is_entity());
        assert!(Kind::WillSet.is_entity());
        assert!(!Kind::Identifier.is_entity());
    }

    #[test]
    fn test_symbolic_references_classify_as_names_and_generics() {
        for kind in [Kind::SymbolicReference, Kind::UnresolvedSymbolicReference] {
            assert!(kind.is_decl_name());
            assert!(kind.is_any_generic());
            assert!(kind.is_context());
        }
    }

    #[test]
    fn test_function_attrs_are_not_contexts() {
        assert!(Kind::PartialApplyForwarder.is_function_attr());
        assert!(!Kind::PartialApplyForwarder.is_context());
        assert!(!Kind::FunctionSignatureSpecializationReturn.is_function_attr());
    }
}
