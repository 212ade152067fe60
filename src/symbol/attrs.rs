//! Small attribute enums stored as node indices: function-signature parameter kinds,
//! value-witness kinds and field-offset directness.

/// What a function-signature specialization did to one parameter.
///
/// The first eight values are exclusive; the rest are flags that combine with each
/// other and with [`FuncSigParamKind::ExistentialToGeneric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncSigParamKind {
    ConstantPropFunction = 0,
    ConstantPropGlobal = 1,
    ConstantPropInteger = 2,
    ConstantPropFloat = 3,
    ConstantPropString = 4,
    ClosureProp = 5,
    BoxToValue = 6,
    BoxToStack = 7,

    Dead = 64,
    OwnedToGuaranteed = 128,
    Sroa = 256,
    GuaranteedToOwned = 512,
    ExistentialToGeneric = 1024,
}

impl FuncSigParamKind {
    pub const EXCLUSIVE: [FuncSigParamKind; 8] = [
        FuncSigParamKind::ConstantPropFunction,
        FuncSigParamKind::ConstantPropGlobal,
        FuncSigParamKind::ConstantPropInteger,
        FuncSigParamKind::ConstantPropFloat,
        FuncSigParamKind::ConstantPropString,
        FuncSigParamKind::ClosureProp,
        FuncSigParamKind::BoxToValue,
        FuncSigParamKind::BoxToStack,
    ];

    pub fn value(self) -> u64 {
        self as u64
    }

    /// Exact match against a single kind value; combined flags yield `None`.
    pub fn from_value(value: u64) -> Option<Self> {
        let kind = match value {
            0 => FuncSigParamKind::ConstantPropFunction,
            1 => FuncSigParamKind::ConstantPropGlobal,
            2 => FuncSigParamKind::ConstantPropInteger,
            3 => FuncSigParamKind::ConstantPropFloat,
            4 => FuncSigParamKind::ConstantPropString,
            5 => FuncSigParamKind::ClosureProp,
            6 => FuncSigParamKind::BoxToValue,
            7 => FuncSigParamKind::BoxToStack,
            64 => FuncSigParamKind::Dead,
            128 => FuncSigParamKind::OwnedToGuaranteed,
            256 => FuncSigParamKind::Sroa,
            512 => FuncSigParamKind::GuaranteedToOwned,
            1024 => FuncSigParamKind::ExistentialToGeneric,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether the decoder pops a payload identifier for this kind.
    pub fn takes_payload(self) -> bool {
        matches!(
            self,
            FuncSigParamKind::ConstantPropFunction
                | FuncSigParamKind::ConstantPropGlobal
                | FuncSigParamKind::ConstantPropString
                | FuncSigParamKind::ClosureProp
        )
    }

    pub fn description(self) -> &'static str {
        match self {
            FuncSigParamKind::ConstantPropFunction => "Constant Propagated Function",
            FuncSigParamKind::ConstantPropGlobal => "Constant Propagated Global",
            FuncSigParamKind::ConstantPropInteger => "Constant Propagated Integer",
            FuncSigParamKind::ConstantPropFloat => "Constant Propagated Float",
            FuncSigParamKind::ConstantPropString => "Constant Propagated String",
            FuncSigParamKind::ClosureProp => "Closure Propagated",
            FuncSigParamKind::BoxToValue => "Value Promoted from Box",
            FuncSigParamKind::BoxToStack => "Stack Promoted from Box",
            FuncSigParamKind::Dead => "Dead",
            FuncSigParamKind::OwnedToGuaranteed => "Owned To Guaranteed",
            FuncSigParamKind::Sroa => "Exploded",
            FuncSigParamKind::GuaranteedToOwned => "Guaranteed To Owned",
            FuncSigParamKind::ExistentialToGeneric => {
                "Existential To Protocol Constrained Generic"
            }
        }
    }
}

/// Value-witness table entries, keyed by their two-letter mangling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueWitnessKind {
    AllocateBuffer,
    AssignWithCopy,
    AssignWithTake,
    DeallocateBuffer,
    Destroy,
    DestroyArray,
    DestroyBuffer,
    InitializeBufferWithCopyOfBuffer,
    InitializeBufferWithCopy,
    InitializeWithCopy,
    InitializeBufferWithTake,
    InitializeWithTake,
    ProjectBuffer,
    InitializeBufferWithTakeOfBuffer,
    InitializeArrayWithCopy,
    InitializeArrayWithTakeFrontToBack,
    InitializeArrayWithTakeBackToFront,
    StoreExtraInhabitant,
    GetExtraInhabitantIndex,
    GetEnumTag,
    DestructiveProjectEnumData,
    DestructiveInjectEnumTag,
    GetEnumTagSinglePayload,
    StoreEnumTagSinglePayload,
}

const VALUE_WITNESSES: [(ValueWitnessKind, &str, &str); 24] = [
    (ValueWitnessKind::AllocateBuffer, "al", "allocateBuffer"),
    (ValueWitnessKind::AssignWithCopy, "ca", "assignWithCopy"),
    (ValueWitnessKind::AssignWithTake, "ta", "assignWithTake"),
    (ValueWitnessKind::DeallocateBuffer, "de", "deallocateBuffer"),
    (ValueWitnessKind::Destroy, "xx", "destroy"),
    (ValueWitnessKind::DestroyArray, "Xx", "destroyArray"),
    (ValueWitnessKind::DestroyBuffer, "XX", "destroyBuffer"),
    (ValueWitnessKind::InitializeBufferWithCopyOfBuffer, "CP", "initializeBufferWithCopyOfBuffer"),
    (ValueWitnessKind::InitializeBufferWithCopy, "Cp", "initializeBufferWithCopy"),
    (ValueWitnessKind::InitializeWithCopy, "cp", "initializeWithCopy"),
    (ValueWitnessKind::InitializeBufferWithTake, "Tk", "initializeBufferWithTake"),
    (ValueWitnessKind::InitializeWithTake, "tk", "initializeWithTake"),
    (ValueWitnessKind::ProjectBuffer, "pr", "projectBuffer"),
    (ValueWitnessKind::InitializeBufferWithTakeOfBuffer, "TK", "initializeBufferWithTakeOfBuffer"),
    (ValueWitnessKind::InitializeArrayWithCopy, "Cc", "initializeArrayWithCopy"),
    (ValueWitnessKind::InitializeArrayWithTakeFrontToBack, "Tt", "initializeArrayWithTakeFrontToBack"),
    (ValueWitnessKind::InitializeArrayWithTakeBackToFront, "tT", "initializeArrayWithTakeBackToFront"),
    (ValueWitnessKind::StoreExtraInhabitant, "xs", "storeExtraInhabitant"),
    (ValueWitnessKind::GetExtraInhabitantIndex, "xg", "getExtraInhabitantIndex"),
    (ValueWitnessKind::GetEnumTag, "ug", "getEnumTag"),
    (ValueWitnessKind::DestructiveProjectEnumData, "up", "destructiveProjectEnumData"),
    (ValueWitnessKind::DestructiveInjectEnumTag, "ui", "destructiveInjectEnumTag"),
    (ValueWitnessKind::GetEnumTagSinglePayload, "et", "getEnumTagSinglePayload"),
    (ValueWitnessKind::StoreEnumTagSinglePayload, "st", "storeEnumTagSinglePayload"),
];

impl ValueWitnessKind {
    pub fn from_code(code: &str) -> Option<Self> {
        VALUE_WITNESSES
            .iter()
            .find(|(_, c, _)| *c == code)
            .map(|(kind, _, _)| *kind)
    }

    pub fn from_index(index: u64) -> Option<Self> {
        VALUE_WITNESSES.get(index as usize).map(|(kind, _, _)| *kind)
    }

    pub fn index(self) -> u64 {
        self as u64
    }

    pub fn name(self) -> &'static str {
        VALUE_WITNESSES[self as usize].2
    }
}

/// Whether a field offset is stored directly or through an indirection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directness {
    Direct = 0,
    Indirect = 1,
}

impl Directness {
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Directness::Direct),
            1 => Some(Directness::Indirect),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Directness::Direct => "direct",
            Directness::Indirect => "indirect",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_witness_codes_are_case_sensitive() {
        assert_eq!(ValueWitnessKind::from_code("xx"), Some(ValueWitnessKind::Destroy));
        assert_eq!(ValueWitnessKind::from_code("Xx"), Some(ValueWitnessKind::DestroyArray));
        assert_eq!(ValueWitnessKind::from_code("XX"), Some(ValueWitnessKind::DestroyBuffer));
        assert_eq!(ValueWitnessKind::from_code("zz"), None);
    }

    #[test]
    fn test_value_witness_index_matches_table_order() {
        for (i, (kind, _, name)) in VALUE_WITNESSES.iter().enumerate() {
            assert_eq!(kind.index(), i as u64);
            assert_eq!(kind.name(), *name);
        }
    }

    #[test]
    fn test_func_sig_combined_flags_have_no_single_kind() {
        let combined = FuncSigParamKind::Dead.value() | FuncSigParamKind::OwnedToGuaranteed.value();
        assert_eq!(FuncSigParamKind::from_value(combined), None);
        assert_eq!(FuncSigParamKind::from_value(5), Some(FuncSigParamKind::ClosureProp));
        assert!(FuncSigParamKind::ClosureProp.takes_payload());
        assert!(!FuncSigParamKind::ConstantPropInteger.takes_payload());
    }
}
