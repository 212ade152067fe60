//! Generic parameters, associated types, signatures, requirements and conformances.

use std::rc::Rc;

use super::Demangler;
use crate::core::DemangleResult;
use crate::symbol::{Kind, Symbol};

/// Canonical name of the generic parameter at `depth`/`index`: `A`..`Z`, then `AB`...,
/// with the depth appended when non-zero.
pub(crate) fn generic_parameter_name(depth: u64, index: u64) -> String {
    let mut name = String::new();
    let mut remaining = index;
    loop {
        name.push(char::from(b'A' + (remaining % 26) as u8));
        remaining /= 26;
        if remaining == 0 {
            break;
        }
    }
    if depth != 0 {
        name.push_str(&depth.to_string());
    }
    name
}

pub(crate) fn dependent_generic_param_type(depth: u64, index: u64) -> Symbol {
    let mut param = Symbol::with_text(
        Kind::DependentGenericParamType,
        generic_parameter_name(depth, index),
    );
    param.push(Rc::new(Symbol::with_index(Kind::Index, depth)));
    param.push(Rc::new(Symbol::with_index(Kind::Index, index)));
    param
}

#[derive(Clone, Copy)]
enum ConstraintKind {
    Protocol,
    BaseClass,
    SameType,
    Layout,
}

#[derive(Clone, Copy)]
enum ConstrainedTypeKind {
    Generic,
    Assoc,
    CompoundAssoc,
    Substitution,
}

impl Demangler<'_> {
    /// `q` and the operand of `Q`: `z`, `{index}` or `d{depth}{index}`.
    pub(super) fn demangle_generic_param_index(&mut self) -> DemangleResult<Symbol> {
        if self.scanner.conditional(b'd') {
            let depth = self.demangle_index()?.saturating_add(1);
            let index = self.demangle_index()?;
            return Ok(dependent_generic_param_type(depth, index));
        }
        if self.scanner.conditional(b'z') {
            return Ok(dependent_generic_param_type(0, 0));
        }
        let index = self.demangle_index()?.saturating_add(1);
        Ok(dependent_generic_param_type(0, index))
    }

    /// `Q` opcode: archetypes and dependent member types.
    pub(super) fn demangle_archetype(&mut self) -> DemangleResult<Rc<Symbol>> {
        let node = match self.scanner.read()? {
            b'a' => {
                let ident = self.pop_required(Kind::Identifier)?;
                let archetype = self.pop_type_child()?;
                Symbol::typed(Kind::AssociatedTypeRef, vec![archetype, ident])
            }
            b'y' => {
                let base = self.demangle_generic_param_index()?;
                self.demangle_associated_type_simple(base)?
            }
            b'z' => self.demangle_associated_type_simple(dependent_generic_param_type(0, 0))?,
            b'Y' => {
                let base = self.demangle_generic_param_index()?;
                self.demangle_associated_type_compound(base)?
            }
            b'Z' => {
                self.demangle_associated_type_compound(dependent_generic_param_type(0, 0))?
            }
            _ => {
                self.scanner.backtrack(1);
                return Err(self.scanner.match_failed("an archetype letter".to_string()));
            }
        };
        let node = Rc::new(node);
        self.substitutions.push(node.clone());
        Ok(node)
    }

    fn demangle_associated_type_simple(&mut self, base: Symbol) -> DemangleResult<Symbol> {
        let name = self.pop_associated_type_name()?;
        let base = Rc::new(Symbol::with_child(Kind::Type, Rc::new(base)));
        Ok(Symbol::typed(Kind::DependentMemberType, vec![base, Rc::new(name)]))
    }

    fn demangle_associated_type_compound(&mut self, base: Symbol) -> DemangleResult<Symbol> {
        let mut names = Vec::new();
        loop {
            let first = self.pop_kind(Kind::FirstElementMarker).is_some();
            names.push(self.pop_associated_type_name()?);
            if first {
                break;
            }
        }
        let mut base = base;
        for name in names.into_iter().rev() {
            let base_type = Rc::new(Symbol::with_child(Kind::Type, Rc::new(base)));
            base = Symbol::with_children(Kind::DependentMemberType, vec![base_type, Rc::new(name)]);
        }
        Ok(Symbol::with_child(Kind::Type, Rc::new(base)))
    }

    pub(super) fn pop_associated_type_name(&mut self) -> DemangleResult<Symbol> {
        let proto = self.pop_kind(Kind::Type);
        if let Some(proto) = &proto {
            let is_protocol = proto
                .first_child()
                .is_some_and(|c| c.kind() == Kind::Protocol);
            self.ensure(is_protocol)?;
        }
        let ident = self.pop_required(Kind::Identifier)?;
        Ok(ident.renamed(Kind::DependentAssociatedTypeRef, proto.into_iter().collect()))
    }

    /// Declaration names pushed front to back, the first one flagged.
    pub(super) fn pop_assoc_type_path(&mut self) -> DemangleResult<Symbol> {
        let mut path = Vec::new();
        loop {
            let first = self.pop_kind(Kind::FirstElementMarker).is_some();
            path.push(self.pop_required_if(Kind::is_decl_name)?);
            if first {
                break;
            }
        }
        path.reverse();
        Ok(Symbol::with_children(Kind::AssocTypePath, path))
    }

    /// `type protocol module` with an optional leading signature and an optional
    /// behavior identifier between type and protocol.
    pub(super) fn pop_protocol_conformance(&mut self) -> DemangleResult<Symbol> {
        let signature = self.pop_kind(Kind::DependentGenericSignature);
        let module = self.pop_module();
        let module = self.require(module)?;
        let proto = self.pop_protocol()?;
        let mut ty = self.pop_kind(Kind::Type);
        let mut ident = None;
        if ty.is_none() {
            ident = self.pop_kind(Kind::Identifier);
            ty = self.pop_kind(Kind::Type);
        }
        let mut ty = self.require(ty)?;
        if let Some(signature) = signature {
            ty = Rc::new(Symbol::typed(Kind::DependentGenericType, vec![signature, ty]));
        }
        let mut conformance = Symbol::with_children(Kind::ProtocolConformance, vec![ty, proto, module]);
        if let Some(ident) = ident {
            conformance.push(ident);
        }
        Ok(conformance)
    }

    /// `g` opcode: a conformance declared outside both the type and the protocol module.
    pub(super) fn demangle_retroactive_conformance(&mut self) -> DemangleResult<Symbol> {
        let index = self.demangle_index_as_node()?;
        let conformance = self.pop_protocol_conformance()?;
        Ok(Symbol::with_children(
            Kind::RetroactiveConformance,
            vec![index, Rc::new(conformance)],
        ))
    }

    /// `l` and `r` opcodes: parameter counts per depth followed by the requirements
    /// already on the stack.
    pub(super) fn demangle_generic_signature(&mut self, has_param_counts: bool) -> DemangleResult<Symbol> {
        let mut signature = Symbol::new(Kind::DependentGenericSignature);
        if has_param_counts {
            while !self.scanner.conditional(b'l') {
                let count = if self.scanner.conditional(b'z') {
                    0
                } else {
                    self.demangle_index()?.saturating_add(1)
                };
                signature.push(Rc::new(Symbol::with_index(
                    Kind::DependentGenericParamCount,
                    count,
                )));
            }
        } else {
            signature.push(Rc::new(Symbol::with_index(
                Kind::DependentGenericParamCount,
                1,
            )));
        }
        let requirements_at = signature.len();
        while let Some(requirement) = self.pop_if(Kind::is_requirement) {
            signature.insert(requirements_at, requirement);
        }
        Ok(signature)
    }

    /// `R` opcode: one requirement of a generic signature.
    pub(super) fn demangle_generic_requirement(&mut self) -> DemangleResult<Symbol> {
        use ConstrainedTypeKind as T;
        use ConstraintKind as C;
        let (constraint, type_kind) = match self.scanner.read()? {
            b'c' => (C::BaseClass, T::Assoc),
            b'C' => (C::BaseClass, T::CompoundAssoc),
            b'b' => (C::BaseClass, T::Generic),
            b'B' => (C::BaseClass, T::Substitution),
            b't' => (C::SameType, T::Assoc),
            b'T' => (C::SameType, T::CompoundAssoc),
            b's' => (C::SameType, T::Generic),
            b'S' => (C::SameType, T::Substitution),
            b'm' => (C::Layout, T::Assoc),
            b'M' => (C::Layout, T::CompoundAssoc),
            b'l' => (C::Layout, T::Generic),
            b'L' => (C::Layout, T::Substitution),
            b'p' => (C::Protocol, T::Assoc),
            b'P' => (C::Protocol, T::CompoundAssoc),
            b'Q' => (C::Protocol, T::Substitution),
            _ => {
                self.scanner.backtrack(1);
                (C::Protocol, T::Generic)
            }
        };

        let constrained = match type_kind {
            T::Generic => {
                let param = self.demangle_generic_param_index()?;
                Rc::new(Symbol::with_child(Kind::Type, Rc::new(param)))
            }
            T::Assoc => {
                let base = self.demangle_generic_param_index()?;
                let node = Rc::new(self.demangle_associated_type_simple(base)?);
                self.substitutions.push(node.clone());
                node
            }
            T::CompoundAssoc => {
                let base = self.demangle_generic_param_index()?;
                let node = Rc::new(self.demangle_associated_type_compound(base)?);
                self.substitutions.push(node.clone());
                node
            }
            T::Substitution => self.pop_required(Kind::Type)?,
        };

        let requirement = match constraint {
            C::Protocol => {
                let proto = self.pop_protocol()?;
                Symbol::with_children(
                    Kind::DependentGenericConformanceRequirement,
                    vec![constrained, proto],
                )
            }
            C::BaseClass => {
                let superclass = self.pop_required(Kind::Type)?;
                Symbol::with_children(
                    Kind::DependentGenericConformanceRequirement,
                    vec![constrained, superclass],
                )
            }
            C::SameType => {
                let other = self.pop_required(Kind::Type)?;
                Symbol::with_children(
                    Kind::DependentGenericSameTypeRequirement,
                    vec![constrained, other],
                )
            }
            C::Layout => {
                let c = self.scanner.read()?;
                let (size, alignment) = match c {
                    b'U' | b'R' | b'N' | b'C' | b'D' | b'T' => (None, None),
                    b'E' | b'M' => {
                        let size = self.demangle_index_as_node()?;
                        let alignment = self.demangle_index_as_node()?;
                        (Some(size), Some(alignment))
                    }
                    b'e' | b'm' => (Some(self.demangle_index_as_node()?), None),
                    _ => {
                        self.scanner.backtrack(1);
                        return Err(self.scanner.match_failed("a layout constraint".to_string()));
                    }
                };
                let name = Rc::new(Symbol::with_text(Kind::Identifier, char::from(c).to_string()));
                let mut requirement = Symbol::with_children(
                    Kind::DependentGenericLayoutRequirement,
                    vec![constrained, name],
                );
                requirement.extend_children(size.into_iter().chain(alignment));
                requirement
            }
        };
        Ok(requirement)
    }

    /// `u` opcode: a type under a generic signature.
    pub(super) fn demangle_generic_type(&mut self) -> DemangleResult<Symbol> {
        let signature = self.pop_required(Kind::DependentGenericSignature)?;
        let ty = self.pop_required(Kind::Type)?;
        Ok(Symbol::typed(Kind::DependentGenericType, vec![signature, ty]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> Vec<Rc<Symbol>> {
        let mut d = Demangler::new(text);
        while !d.scanner.is_at_end() {
            let node = d.demangle_operator().unwrap();
            d.push(node);
        }
        d.stack
    }

    #[test]
    fn test_generic_parameter_names() {
        assert_eq!(generic_parameter_name(0, 0), "A");
        assert_eq!(generic_parameter_name(0, 25), "Z");
        assert_eq!(generic_parameter_name(0, 26), "AB");
        assert_eq!(generic_parameter_name(1, 1), "B1");
    }

    #[test]
    fn test_generic_param_index_forms() {
        let mut d = Demangler::new("z");
        assert_eq!(d.demangle_generic_param_index().unwrap().text(), Some("A"));
        let mut d = Demangler::new("_x");
        assert_eq!(d.demangle_generic_param_index().unwrap().text(), Some("B"));
        let mut d = Demangler::new("d_0_x");
        let param = d.demangle_generic_param_index().unwrap();
        assert_eq!(param.text(), Some("B1"));
        assert_eq!(param.child(0).unwrap().index(), Some(1));
        assert_eq!(param.child(1).unwrap().index(), Some(1));
    }

    #[test]
    fn test_signature_keeps_requirement_order() {
        // <A where A: Equatable, A: Hashable>
        let stack = run("SQRzSHRzl");
        assert_eq!(stack.len(), 1);
        let sig = &stack[0];
        assert_eq!(sig.kind(), Kind::DependentGenericSignature);
        let kinds: Vec<Kind> = sig.children().iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                Kind::DependentGenericParamCount,
                Kind::DependentGenericConformanceRequirement,
                Kind::DependentGenericConformanceRequirement,
            ]
        );
        let first_proto = sig.child(1).unwrap().child(1).unwrap();
        assert!(first_proto.first_child().unwrap().child(1).unwrap().is_identifier("Equatable"));
    }

    #[test]
    fn test_signature_param_counts() {
        let stack = run("rz_l");
        let sig = &stack[0];
        let counts: Vec<Option<u64>> = sig.children().iter().map(|c| c.index()).collect();
        assert_eq!(counts, vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_layout_requirement_with_size() {
        let stack = run("RlzE8_3_");
        let requirement = &stack[0];
        assert_eq!(requirement.kind(), Kind::DependentGenericLayoutRequirement);
        assert_eq!(requirement.child(1).unwrap().text(), Some("E"));
        assert_eq!(requirement.child(2).unwrap().index(), Some(9));
        assert_eq!(requirement.child(3).unwrap().index(), Some(4));
    }

    #[test]
    fn test_dependent_member_type() {
        // A.Element
        let stack = run("7ElementQz");
        let ty = &stack[0];
        let member = ty.first_child().unwrap();
        assert_eq!(member.kind(), Kind::DependentMemberType);
        let name = member.child(1).unwrap();
        assert_eq!(name.kind(), Kind::DependentAssociatedTypeRef);
        assert_eq!(name.text(), Some("Element"));
    }

    #[test]
    fn test_compound_member_type_nests_outward() {
        // A.Iterator.Element
        let stack = run("8Iterator_7ElementQZ");
        let outer = stack[0].first_child().unwrap();
        assert_eq!(outer.child(1).unwrap().text(), Some("Element"));
        let inner = outer.child(0).unwrap().first_child().unwrap();
        assert_eq!(inner.kind(), Kind::DependentMemberType);
        assert_eq!(inner.child(1).unwrap().text(), Some("Iterator"));
    }
}
