//! Specialization prefixes and function-signature specialization parameters.

use super::{Printer, RenderOptions};
use crate::decoder::decode;
use crate::symbol::{FuncSigParamKind, Kind, Symbol};

/// Flag kinds in the order they are listed when combined.
const FLAG_ORDER: [FuncSigParamKind; 5] = [
    FuncSigParamKind::ExistentialToGeneric,
    FuncSigParamKind::Dead,
    FuncSigParamKind::OwnedToGuaranteed,
    FuncSigParamKind::GuaranteedToOwned,
    FuncSigParamKind::Sroa,
];

impl Printer {
    /// `description <params> of `, or a single `specialized ` without the option.
    pub(super) fn print_specialization_prefix(
        &mut self,
        node: &Symbol,
        description: &str,
        param_prefix: &str,
    ) {
        if !self.has(RenderOptions::DISPLAY_GENERIC_SPECIALIZATIONS) {
            if !self.specialization_prefix_printed {
                self.push("specialized ");
                self.specialization_prefix_printed = true;
            }
            return;
        }
        self.push(description);
        self.push(" <");
        let mut separator = "";
        for child in node.children() {
            match child.kind() {
                Kind::SpecializationPassId => {}
                Kind::SpecializationIsFragile => {
                    self.push(separator);
                    separator = ", ";
                    self.print_name(child, false);
                }
                _ if !child.is_empty() => {
                    self.push(separator);
                    self.push(param_prefix);
                    separator = ", ";
                    self.print_name(child, false);
                }
                _ => {}
            }
        }
        self.push("> of ");
    }

    pub(super) fn print_func_sig_param_record(&mut self, node: &Symbol) {
        if node.kind() == Kind::FunctionSignatureSpecializationReturn {
            self.push("Return = ");
        } else {
            self.push(&format!("Arg[{}] = ", node.index().unwrap_or(0)));
        }
        let children = node.children();
        let mut i = 0;
        let mut first = true;
        while i < children.len() {
            if !first {
                self.push(" and ");
            }
            first = false;
            i = self.print_func_sig_param(children, i);
        }
    }

    /// Print the parameter description starting at `start`, returning the index after it.
    fn print_func_sig_param(&mut self, children: &[std::rc::Rc<Symbol>], start: usize) -> usize {
        let kind_node = &children[start];
        let kind = kind_node.index().and_then(FuncSigParamKind::from_value);
        let mut i = start + 1;
        let payload_text = |i: usize| children.get(i).and_then(|c| c.text()).unwrap_or_default();
        match kind {
            Some(FuncSigParamKind::ConstantPropFunction | FuncSigParamKind::ConstantPropGlobal) => {
                self.push("[");
                self.print_name(kind_node, false);
                self.push(" : ");
                self.print_mangled_payload(payload_text(i));
                self.push("]");
                i += 1;
            }
            Some(FuncSigParamKind::ConstantPropInteger | FuncSigParamKind::ConstantPropFloat) => {
                self.push("[");
                self.print_name(kind_node, false);
                self.push(" : ");
                self.push(payload_text(i));
                self.push("]");
                i += 1;
            }
            Some(FuncSigParamKind::ConstantPropString) => {
                self.push("[");
                self.print_name(kind_node, false);
                self.push(" : ");
                self.push(payload_text(i));
                self.push("'");
                self.push_escaped(payload_text(i + 1));
                self.push("']");
                i += 2;
            }
            Some(FuncSigParamKind::ClosureProp) => {
                self.push("[");
                self.print_name(kind_node, false);
                self.push(" : ");
                self.print_mangled_payload(payload_text(i));
                self.push(", Argument Types : [");
                i += 1;
                let types_start = i;
                while let Some(ty) = children.get(i).filter(|c| c.kind() == Kind::Type) {
                    if i > types_start {
                        self.push(", ");
                    }
                    self.print_name(ty, false);
                    i += 1;
                }
                self.push("]");
            }
            _ => {
                self.print_name(kind_node, false);
            }
        }
        i
    }

    pub(super) fn print_func_sig_param_kind(&mut self, node: &Symbol) {
        let raw = node.index().unwrap_or(0);
        let mut printed = false;
        for flag in FLAG_ORDER {
            if raw & flag.value() != 0 {
                if printed {
                    self.push(" and ");
                }
                printed = true;
                self.push(flag.description());
            }
        }
        if printed {
            return;
        }
        if let Some(kind) = FuncSigParamKind::from_value(raw) {
            self.push(kind.description());
        }
    }

    /// A payload that names another symbol prints demangled when it decodes.
    pub(super) fn print_mangled_payload(&mut self, text: &str) {
        match decode(text) {
            Ok(symbol) => {
                let rendered = super::render(&symbol, RenderOptions::default());
                self.push(&rendered);
            }
            Err(_) => self.push(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::decoder::decode;
    use crate::printer::{render, RenderOptions};

    fn full(mangled: &str) -> String {
        render(&decode(mangled).unwrap(), RenderOptions::default())
    }

    #[test]
    fn test_dead_argument() {
        assert_eq!(
            full("$s4main3fooyyFTf4dn_n"),
            "function signature specialization <Arg[0] = Dead> of main.foo() -> ()"
        );
    }

    #[test]
    fn test_specialized_prefix_when_hidden() {
        let global = decode("$s4main3fooyyFTf4dn_n").unwrap();
        assert_eq!(render(&global, RenderOptions::simplified()), "specialized foo()");
    }

    #[test]
    fn test_combined_flags_and_return() {
        assert_eq!(
            full("$s4main3fooyyFTf4dGX_x"),
            "function signature specialization <Arg[0] = Dead and Owned To Guaranteed \
             and Exploded, Return = Exploded> of main.foo() -> ()"
        );
    }

    #[test]
    fn test_generic_specialization() {
        assert_eq!(
            full("$s4main3fooyyFSi_SSTg5"),
            "generic specialization <Swift.Int, Swift.String> of main.foo() -> ()"
        );
    }

    #[test]
    fn test_fragile_partial_specialization() {
        assert_eq!(
            full("$s4main3fooyyFSiTPq4"),
            "generic not re-abstracted partial specialization <preserving fragile attribute, \
             Signature = Swift.Int> of main.foo() -> ()"
        );
    }

    #[test]
    fn test_constant_payloads() {
        assert_eq!(
            full("$s4main3fooyyF3barTf1pf_n"),
            "function signature specialization <Arg[0] = [Constant Propagated Function : bar]> \
             of main.foo() -> ()"
        );
        assert_eq!(
            full("$s4main3fooyyFTf1pin42_n"),
            "function signature specialization <Arg[0] = [Constant Propagated Integer : -42]> \
             of main.foo() -> ()"
        );
        assert_eq!(
            full("$s4main3fooyyF6_helloTf1psb_n"),
            "function signature specialization <Arg[0] = [Constant Propagated String : \
             u8'hello']> of main.foo() -> ()"
        );
    }

    #[test]
    fn test_closure_argument_types() {
        assert_eq!(
            full("$s4main3fooyyF3barSiSSTf1c_n"),
            "function signature specialization <Arg[0] = [Closure Propagated : bar, \
             Argument Types : [Swift.Int, Swift.String]> of main.foo() -> ()"
        );
    }
}
