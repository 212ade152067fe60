//! `T` opcodes: thunks, function attributes, descriptors and specializations.

use std::rc::Rc;

use log::trace;

use super::Demangler;
use crate::core::DemangleResult;
use crate::symbol::{FuncSigParamKind, Kind, Symbol};

impl Demangler<'_> {
    pub(super) fn demangle_thunk_or_specialization(&mut self) -> DemangleResult<Symbol> {
        let c = self.scanner.read()?;
        let node = match c {
            b'c' => self.wrap_entity(Kind::CurryThunk)?,
            b'j' => self.wrap_entity(Kind::DispatchThunk)?,
            b'q' => self.wrap_entity(Kind::MethodDescriptor)?,
            b'o' => Symbol::new(Kind::ObjCAttribute),
            b'O' => Symbol::new(Kind::NonObjCAttribute),
            b'D' => Symbol::new(Kind::DynamicAttribute),
            b'd' => Symbol::new(Kind::DirectMethodReferenceAttribute),
            b'a' => Symbol::new(Kind::PartialApplyObjCForwarder),
            b'A' => Symbol::new(Kind::PartialApplyForwarder),
            b'm' => Symbol::new(Kind::MergedFunction),
            b'C' => {
                let ty = self.pop_required(Kind::Type)?;
                Symbol::with_child(Kind::CoroutineContinuationPrototype, ty)
            }
            b'V' => {
                let base = self.pop_required_if(Kind::is_entity)?;
                let derived = self.pop_required_if(Kind::is_entity)?;
                Symbol::with_children(Kind::VTableThunk, vec![derived, base])
            }
            b'W' => {
                let entity = self.pop_required_if(Kind::is_entity)?;
                let conformance = self.pop_protocol_conformance()?;
                Symbol::with_children(Kind::ProtocolWitness, vec![Rc::new(conformance), entity])
            }
            b'R' | b'r' => {
                let kind = if c == b'R' {
                    Kind::ReabstractionThunkHelper
                } else {
                    Kind::ReabstractionThunk
                };
                let signature = self.pop_kind(Kind::DependentGenericSignature);
                let to = self.pop_required(Kind::Type)?;
                let from = self.pop_required(Kind::Type)?;
                let mut thunk = Symbol::new(kind);
                if let Some(signature) = signature {
                    thunk.push(signature);
                }
                thunk.extend_children([from, to]);
                thunk
            }
            b'g' => self.demangle_generic_specialization(Kind::GenericSpecialization)?,
            b'G' => self.demangle_generic_specialization(Kind::GenericSpecializationNotReAbstracted)?,
            b'p' | b'P' => {
                let kind = if c == b'P' {
                    Kind::GenericPartialSpecializationNotReAbstracted
                } else {
                    Kind::GenericPartialSpecialization
                };
                let mut spec = self.demangle_spec_attributes(kind, false)?;
                let ty = self.pop_required(Kind::Type)?;
                spec.push(Rc::new(Symbol::with_child(Kind::GenericSpecializationParam, ty)));
                spec
            }
            b'f' => self.demangle_function_specialization()?,
            b'K' | b'k' => {
                let kind = if c == b'K' {
                    Kind::KeyPathGetterThunkHelper
                } else {
                    Kind::KeyPathSetterThunkHelper
                };
                self.demangle_key_path_accessor(kind)?
            }
            b'H' | b'h' => {
                let kind = if c == b'H' {
                    Kind::KeyPathEqualsThunkHelper
                } else {
                    Kind::KeyPathHashThunkHelper
                };
                self.demangle_key_path_hash_or_equals(kind)?
            }
            b'l' => {
                let name = self.pop_associated_type_name()?;
                Symbol::with_child(Kind::AssociatedTypeDescriptor, Rc::new(name))
            }
            b'L' => {
                let proto = self.pop_protocol()?;
                Symbol::with_child(Kind::ProtocolRequirementsBaseDescriptor, proto)
            }
            b'M' => {
                let name = self.pop_associated_type_name()?;
                Symbol::with_child(Kind::DefaultAssociatedTypeMetadataAccessor, Rc::new(name))
            }
            b'n' | b'N' => {
                let kind = if c == b'n' {
                    Kind::AssociatedConformanceDescriptor
                } else {
                    Kind::DefaultAssociatedConformanceAccessor
                };
                let requirement = self.pop_protocol()?;
                let path = self.pop_assoc_type_path()?;
                let protocol_type = self.pop_required(Kind::Type)?;
                Symbol::with_children(kind, vec![protocol_type, Rc::new(path), requirement])
            }
            b'v' => {
                let index = self.demangle_index()?;
                Symbol::with_index(Kind::OutlinedVariable, index)
            }
            b'e' => {
                let params = self.demangle_bridged_method_params()?;
                self.ensure(!params.is_empty())?;
                Symbol::with_text(Kind::OutlinedBridgedMethod, params)
            }
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a thunk or specialization code".to_string()));
            }
        };
        Ok(node)
    }

    fn wrap_entity(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let entity = self.pop_required_if(Kind::is_entity)?;
        Ok(Symbol::with_child(kind, entity))
    }

    /// `TK`/`Tk`: one or more index types, then the declaration with an optional signature.
    fn demangle_key_path_accessor(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let mut types = vec![self.pop_required(Kind::Type)?];
        while let Some(ty) = self.pop_kind(Kind::Type) {
            types.push(ty);
        }
        let node = self.pop_any();
        let node = self.require(node)?;
        let mut accessor = if node.kind() == Kind::DependentGenericSignature {
            let decl = self.pop_any();
            let decl = self.require(decl)?;
            Symbol::with_children(kind, vec![decl, node])
        } else {
            Symbol::with_child(kind, node)
        };
        accessor.extend_children(types.into_iter().rev());
        Ok(accessor)
    }

    /// `TH`/`Th`: the rest of the stack is the list of index types, optionally topped by a
    /// generic signature.
    fn demangle_key_path_hash_or_equals(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let top = self.pop_any();
        let top = self.require(top)?;
        let mut signature = None;
        let mut types = Vec::new();
        match top.kind() {
            Kind::DependentGenericSignature => signature = Some(top),
            Kind::Type => types.push(top),
            _ => return Err(self.scanner.unexpected()),
        }
        while let Some(node) = self.pop_any() {
            self.ensure(node.kind() == Kind::Type)?;
            types.push(node);
        }
        let mut helper = Symbol::new(kind);
        helper.extend_children(types.into_iter().rev());
        if let Some(signature) = signature {
            helper.push(signature);
        }
        Ok(helper)
    }

    /// `_` alone is no parameters; otherwise a kind letter and `n`/`b` flags up to `_`.
    /// An unknown kind letter yields the empty string.
    fn demangle_bridged_method_params(&mut self) -> DemangleResult<String> {
        if self.scanner.conditional(b'_') {
            return Ok(String::new());
        }
        let kind = self.scanner.read()?;
        if !matches!(kind, b'p' | b'a' | b'm') {
            return Ok(String::new());
        }
        let mut params = String::from(kind as char);
        while !self.scanner.conditional(b'_') {
            let c = self.scanner.read()?;
            self.ensure(matches!(c, b'n' | b'b'))?;
            params.push(c as char);
        }
        Ok(params)
    }

    /// Fragile flag, pass id and, for function signature specializations, an optional
    /// unique id stored as the node index.
    fn demangle_spec_attributes(&mut self, kind: Kind, unique_id: bool) -> DemangleResult<Symbol> {
        let is_fragile = self.scanner.conditional(b'q');
        let pass_id = self
            .scanner
            .expect_where(|c| c.is_ascii_digit(), "a specialization pass id")?;
        let unique = if unique_id { self.demangle_natural()? } else { None };
        let mut spec = match unique {
            Some(id) => Symbol::with_index(kind, id),
            None => Symbol::new(kind),
        };
        if is_fragile {
            spec.push(Rc::new(Symbol::new(Kind::SpecializationIsFragile)));
        }
        spec.push(Rc::new(Symbol::with_index(
            Kind::SpecializationPassId,
            u64::from(pass_id - b'0'),
        )));
        Ok(spec)
    }

    fn demangle_generic_specialization(&mut self, kind: Kind) -> DemangleResult<Symbol> {
        let mut spec = self.demangle_spec_attributes(kind, false)?;
        let list = self.pop_type_list()?;
        for ty in list.children() {
            spec.push(Rc::new(Symbol::with_child(
                Kind::GenericSpecializationParam,
                ty.clone(),
            )));
        }
        Ok(spec)
    }

    /// `Tf`: parameter records up to `_`, then `n` or a return record.
    ///
    /// Records whose kind carries a payload take it from the operand stack in a second
    /// pass, last record first, since the payload names were pushed before the opcode.
    fn demangle_function_specialization(&mut self) -> DemangleResult<Symbol> {
        let mut spec = self.demangle_spec_attributes(Kind::FunctionSignatureSpecialization, true)?;
        let mut param_index = 0u64;
        while !self.scanner.conditional(b'_') {
            let param = self.demangle_func_spec_param(Symbol::with_index(
                Kind::FunctionSignatureSpecializationParam,
                param_index,
            ))?;
            spec.push(Rc::new(param));
            param_index += 1;
        }
        if !self.scanner.conditional(b'n') {
            let ret = self.demangle_func_spec_param(Symbol::new(
                Kind::FunctionSignatureSpecializationReturn,
            ))?;
            spec.push(Rc::new(ret));
        }
        trace!("function signature specialization with {param_index} parameters");

        for idx in (0..spec.len()).rev() {
            let Some(param) = spec.child(idx) else { continue };
            if param.kind() != Kind::FunctionSignatureSpecializationParam {
                continue;
            }
            let Some(kind_node) = param.first_child() else { continue };
            self.ensure(kind_node.kind() == Kind::FunctionSignatureSpecializationParamKind)?;
            let Some(param_kind) = kind_node.index().and_then(FuncSigParamKind::from_value) else {
                continue;
            };
            if !param_kind.takes_payload() {
                continue;
            }
            let mut param = Rc::unwrap_or_clone(param.clone());
            self.attach_func_spec_payload(&mut param, param_kind)?;
            spec.set_child(idx, Rc::new(param));
        }
        Ok(spec)
    }

    /// Captured types (closures only) sit above the payload identifier on the stack.
    fn attach_func_spec_payload(
        &mut self,
        param: &mut Symbol,
        param_kind: FuncSigParamKind,
    ) -> DemangleResult<()> {
        let mut types = Vec::new();
        while let Some(ty) = self.pop_kind(Kind::Type) {
            self.ensure(param_kind == FuncSigParamKind::ClosureProp)?;
            types.push(ty);
        }
        let name = self.pop_required(Kind::Identifier)?;
        let mut text = name.text().unwrap_or_default();
        if param_kind == FuncSigParamKind::ConstantPropString {
            // A leading `_` escapes a string constant starting with a digit or `_`.
            text = text.strip_prefix('_').unwrap_or(text);
        }
        param.push(Rc::new(Symbol::with_text(
            Kind::FunctionSignatureSpecializationParamPayload,
            text,
        )));
        param.extend_children(types.into_iter().rev());
        Ok(())
    }

    fn demangle_func_spec_param(&mut self, mut param: Symbol) -> DemangleResult<Symbol> {
        let kind_node = |value: u64| {
            Rc::new(Symbol::with_index(
                Kind::FunctionSignatureSpecializationParamKind,
                value,
            ))
        };
        let payload = |text: &str| {
            Rc::new(Symbol::with_text(
                Kind::FunctionSignatureSpecializationParamPayload,
                text,
            ))
        };
        match self.scanner.read()? {
            b'n' => {}
            b'c' => param.push(kind_node(FuncSigParamKind::ClosureProp.value())),
            b'p' => match self.scanner.read()? {
                b'f' => param.push(kind_node(FuncSigParamKind::ConstantPropFunction.value())),
                b'g' => param.push(kind_node(FuncSigParamKind::ConstantPropGlobal.value())),
                b'i' => {
                    param.push(kind_node(FuncSigParamKind::ConstantPropInteger.value()));
                    let number = self.demangle_func_spec_number()?;
                    param.push(payload(&number));
                }
                b'd' => {
                    param.push(kind_node(FuncSigParamKind::ConstantPropFloat.value()));
                    let number = self.demangle_func_spec_number()?;
                    param.push(payload(&number));
                }
                b's' => {
                    let encoding = match self.scanner.read()? {
                        b'b' => "u8",
                        b'w' => "u16",
                        b'c' => "objc",
                        _ => {
                            self.scanner.backtrack(1);
                            return Err(self.scanner.match_failed("'b', 'w' or 'c'".to_string()));
                        }
                    };
                    param.push(kind_node(FuncSigParamKind::ConstantPropString.value()));
                    param.push(payload(encoding));
                }
                _ => {
                    self.scanner.backtrack(1);
                    return Err(self.scanner.match_failed("a constant propagation kind".to_string()));
                }
            },
            b'e' => {
                let value = self.demangle_func_spec_flags(
                    FuncSigParamKind::ExistentialToGeneric,
                    b"DGOX",
                );
                param.push(kind_node(value));
            }
            b'd' => {
                let value = self.demangle_func_spec_flags(FuncSigParamKind::Dead, b"GOX");
                param.push(kind_node(value));
            }
            b'g' => {
                let value =
                    self.demangle_func_spec_flags(FuncSigParamKind::OwnedToGuaranteed, b"OX");
                param.push(kind_node(value));
            }
            b'o' => {
                let value = self.demangle_func_spec_flags(FuncSigParamKind::GuaranteedToOwned, b"X");
                param.push(kind_node(value));
            }
            b'x' => param.push(kind_node(FuncSigParamKind::Sroa.value())),
            b'i' => param.push(kind_node(FuncSigParamKind::BoxToValue.value())),
            b's' => param.push(kind_node(FuncSigParamKind::BoxToStack.value())),
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("a parameter specialization code".to_string()));
            }
        }
        Ok(param)
    }

    /// Combine `base` with each optional flag letter, tried in the given order.
    fn demangle_func_spec_flags(&mut self, base: FuncSigParamKind, letters: &[u8]) -> u64 {
        let mut value = base.value();
        for &letter in letters {
            if !self.scanner.conditional(letter) {
                continue;
            }
            let flag = match letter {
                b'D' => FuncSigParamKind::Dead,
                b'G' => FuncSigParamKind::OwnedToGuaranteed,
                b'O' => FuncSigParamKind::GuaranteedToOwned,
                _ => FuncSigParamKind::Sroa,
            };
            value |= flag.value();
        }
        value
    }

    /// Integer or float literal of a constant-propagated parameter, `n` marking a sign.
    fn demangle_func_spec_number(&mut self) -> DemangleResult<String> {
        let mut number = String::new();
        if self.scanner.conditional(b'n') {
            number.push('-');
        }
        let digits = self.scanner.read_while(|c| c.is_ascii_digit());
        self.ensure(!digits.is_empty())?;
        number.push_str(digits);
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use crate::decoder::decode;
    use crate::symbol::{FuncSigParamKind, Kind, Symbol};

    fn kinds(node: &Symbol) -> Vec<Kind> {
        node.children().iter().map(|c| c.kind()).collect()
    }

    #[test]
    fn test_simple_function_attributes() {
        let global = decode("$s4main3fooyyFTo").unwrap();
        assert_eq!(kinds(&global), vec![Kind::ObjCAttribute, Kind::Function]);

        let global = decode("$s4main3fooyyFTm").unwrap();
        assert_eq!(kinds(&global), vec![Kind::MergedFunction, Kind::Function]);
    }

    #[test]
    fn test_dispatch_thunk_wraps_entity() {
        let global = decode("$s4main3fooyyFTj").unwrap();
        let thunk = global.first_child().unwrap();
        assert_eq!(thunk.kind(), Kind::DispatchThunk);
        assert_eq!(thunk.first_child().unwrap().kind(), Kind::Function);
    }

    #[test]
    fn test_generic_specialization_params() {
        let global = decode("$s4main3fooyyFSi_SSTg5").unwrap();
        let spec = global.first_child().unwrap();
        assert_eq!(spec.kind(), Kind::GenericSpecialization);
        assert_eq!(
            kinds(spec),
            vec![
                Kind::SpecializationPassId,
                Kind::GenericSpecializationParam,
                Kind::GenericSpecializationParam,
            ]
        );
        assert_eq!(spec.first_child().unwrap().index(), Some(5));
        assert_eq!(global.child(1).unwrap().kind(), Kind::Function);
    }

    #[test]
    fn test_fragile_partial_specialization() {
        let global = decode("$s4main3fooyyFSiTPq4").unwrap();
        let spec = global.first_child().unwrap();
        assert_eq!(spec.kind(), Kind::GenericPartialSpecializationNotReAbstracted);
        assert_eq!(
            kinds(spec),
            vec![
                Kind::SpecializationIsFragile,
                Kind::SpecializationPassId,
                Kind::GenericSpecializationParam,
            ]
        );
    }

    #[test]
    fn test_function_signature_specialization_without_payloads() {
        let global = decode("$s4main3fooyyFTf4dn_n").unwrap();
        let spec = global.first_child().unwrap();
        assert_eq!(spec.kind(), Kind::FunctionSignatureSpecialization);
        assert_eq!(spec.index(), None);
        assert_eq!(
            kinds(spec),
            vec![
                Kind::SpecializationPassId,
                Kind::FunctionSignatureSpecializationParam,
                Kind::FunctionSignatureSpecializationParam,
            ]
        );
        let dead = spec.child(1).unwrap();
        assert_eq!(dead.index(), Some(0));
        assert_eq!(
            dead.first_child().unwrap().index(),
            Some(FuncSigParamKind::Dead.value())
        );
        assert!(spec.child(2).unwrap().is_empty());
    }

    #[test]
    fn test_combined_flags_and_return_record() {
        let global = decode("$s4main3fooyyFTf4dGX_x").unwrap();
        let spec = global.first_child().unwrap();
        let param = spec.child(1).unwrap();
        let expected = FuncSigParamKind::Dead.value()
            | FuncSigParamKind::OwnedToGuaranteed.value()
            | FuncSigParamKind::Sroa.value();
        assert_eq!(param.first_child().unwrap().index(), Some(expected));
        let ret = spec.child(2).unwrap();
        assert_eq!(ret.kind(), Kind::FunctionSignatureSpecializationReturn);
    }

    #[test]
    fn test_constant_function_payload_is_popped() {
        let global = decode("$s4main3fooyyF3barTf1pf_n").unwrap();
        assert_eq!(global.len(), 2);
        let spec = global.first_child().unwrap();
        let param = spec.child(1).unwrap();
        assert_eq!(
            kinds(param),
            vec![
                Kind::FunctionSignatureSpecializationParamKind,
                Kind::FunctionSignatureSpecializationParamPayload,
            ]
        );
        assert_eq!(param.child(1).unwrap().text(), Some("bar"));
    }

    #[test]
    fn test_closure_payload_keeps_captured_types_in_order() {
        let global = decode("$s4main3fooyyF3barSiSSTf1c_n").unwrap();
        let param = global.first_child().unwrap().child(1).unwrap();
        assert_eq!(
            kinds(param),
            vec![
                Kind::FunctionSignatureSpecializationParamKind,
                Kind::FunctionSignatureSpecializationParamPayload,
                Kind::Type,
                Kind::Type,
            ]
        );
        let first = param.child(2).unwrap().first_child().unwrap();
        assert!(first.child(1).unwrap().is_identifier("Int"));
    }

    #[test]
    fn test_string_payload_drops_escape_and_keeps_encoding() {
        let global = decode("$s4main3fooyyF6_helloTf1psb_n").unwrap();
        let param = global.first_child().unwrap().child(1).unwrap();
        let texts: Vec<_> = param.children()[1..].iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec![Some("u8"), Some("hello")]);
    }

    #[test]
    fn test_captured_types_rejected_for_constant_function() {
        assert!(decode("$s4main3fooyyF3barSiTf1pf_n").is_err());
    }

    #[test]
    fn test_constant_integer_payload_inline() {
        let global = decode("$s4main3fooyyFTf1pin42_n").unwrap();
        let param = global.first_child().unwrap().child(1).unwrap();
        assert_eq!(param.child(1).unwrap().text(), Some("-42"));
        assert!(decode("$s4main3fooyyFTf1pi_n").is_err());
    }

    #[test]
    fn test_reabstraction_thunk_children() {
        let global = decode("$sSiSSTR").unwrap();
        let thunk = global.first_child().unwrap();
        assert_eq!(thunk.kind(), Kind::ReabstractionThunkHelper);
        let from = thunk.child(0).unwrap().first_child().unwrap();
        assert!(from.child(1).unwrap().is_identifier("Int"));
    }

    #[test]
    fn test_vtable_thunk_order() {
        let global = decode("$s4main1AC3fooyyF4main1BC3fooyyFTV").unwrap();
        let thunk = global.first_child().unwrap();
        assert_eq!(thunk.kind(), Kind::VTableThunk);
        let derived = thunk.child(0).unwrap();
        let context = derived.first_child().unwrap();
        assert!(context.child(1).unwrap().is_identifier("A"));
    }

    #[test]
    fn test_outlined_forms() {
        let global = decode("$s4main3fooyyFTv0_").unwrap();
        assert_eq!(global.first_child().unwrap().index(), Some(1));

        let global = decode("$s4main3fooyyFTepnb_").unwrap();
        assert_eq!(global.first_child().unwrap().text(), Some("pnb"));

        assert!(decode("$s4main3fooyyFTe_").is_err());
        assert!(decode("$s4main3fooyyFTepx_").is_err());
    }

    #[test]
    fn test_key_path_hash_takes_whole_stack() {
        let global = decode("$sSiSSTh").unwrap();
        let helper = global.first_child().unwrap();
        assert_eq!(helper.kind(), Kind::KeyPathHashThunkHelper);
        assert_eq!(helper.len(), 2);
        let first = helper.child(0).unwrap().first_child().unwrap();
        assert!(first.child(1).unwrap().is_identifier("Int"));
    }

    #[test]
    fn test_unknown_thunk_code() {
        assert!(decode("$s4main3fooyyFTz").is_err());
    }
}
