//! Type rendering: bound generics and their sugar, metatypes, protocol compositions,
//! lowered function types, generic signatures and boxes.

use super::{Printer, RenderOptions};
use crate::decoder::generic_parameter_name;
use crate::symbol::{Kind, Symbol};

/// Generic parameters printed per depth before eliding the rest.
const MAX_PRINTED_GENERIC_PARAMS: u64 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sugar {
    None,
    Optional,
    ImplicitlyUnwrappedOptional,
    Array,
    Dictionary,
}

fn find_sugar(node: &Symbol) -> Sugar {
    let Some(nominal) = node.child(0).and_then(|t| t.first_child()) else {
        return Sugar::None;
    };
    let args = node.child(1).map_or(0, |a| a.len());
    let in_stdlib = nominal.child(0).is_some_and(|m| m.is_swift_module());
    let named = |name: &str| nominal.child(1).is_some_and(|n| n.is_identifier(name));
    if !in_stdlib {
        return Sugar::None;
    }
    match node.kind() {
        Kind::BoundGenericEnum if args == 1 && named("Optional") => Sugar::Optional,
        Kind::BoundGenericEnum if args == 1 && named("ImplicitlyUnwrappedOptional") => {
            Sugar::ImplicitlyUnwrappedOptional
        }
        Kind::BoundGenericStructure if args == 1 && named("Array") => Sugar::Array,
        Kind::BoundGenericStructure if args == 2 && named("Dictionary") => Sugar::Dictionary,
        _ => Sugar::None,
    }
}

fn layout_name(letter: &str) -> &'static str {
    match letter {
        "U" => "_UnknownLayout",
        "R" => "_RefCountedObject",
        "N" => "_NativeRefCountedObject",
        "C" => "AnyObject",
        "D" => "_NativeClass",
        "T" | "E" | "e" => "_Trivial",
        "M" | "m" => "_TrivialAtMost",
        _ => "",
    }
}

impl Printer {
    fn print_with_parens(&mut self, ty: &Symbol) {
        let parens = !ty.is_simple_type();
        if parens {
            self.push("(");
        }
        self.print_name(ty, false);
        if parens {
            self.push(")");
        }
    }

    pub(super) fn print_bound_generic(&mut self, node: &Symbol) {
        if node.len() < 2 {
            return;
        }
        if node.len() != 2
            || !self.has(RenderOptions::SYNTHESIZE_SUGAR_ON_TYPES)
            || node.kind() == Kind::BoundGenericClass
        {
            self.print_bound_generic_no_sugar(node);
            return;
        }
        if node.kind() == Kind::BoundGenericProtocol {
            self.print_child(node, 1);
            self.print_child_with(node, 0, " as ", "");
            return;
        }
        let Some(args) = node.child(1) else { return };
        match find_sugar(node) {
            Sugar::None => self.print_bound_generic_no_sugar(node),
            sugar @ (Sugar::Optional | Sugar::ImplicitlyUnwrappedOptional) => {
                if let Some(ty) = args.first_child() {
                    self.print_with_parens(ty);
                }
                self.push(if sugar == Sugar::Optional { "?" } else { "!" });
            }
            Sugar::Array => {
                self.push("[");
                self.print_child(args, 0);
                self.push("]");
            }
            Sugar::Dictionary => {
                self.push("[");
                self.print_child(args, 0);
                self.push(" : ");
                self.print_child(args, 1);
                self.push("]");
            }
        }
    }

    fn print_bound_generic_no_sugar(&mut self, node: &Symbol) {
        self.print_child(node, 0);
        self.push("<");
        if let Some(args) = node.child(1) {
            self.print_children(args, ", ");
        }
        self.push(">");
    }

    pub(super) fn print_metatype(&mut self, node: &Symbol) {
        let mut index = 0;
        if node.len() == 2 {
            self.print_child(node, 0);
            self.push(" ");
            index = 1;
        }
        let Some(ty) = node.child(index).and_then(|t| t.first_child()) else {
            return;
        };
        self.print_with_parens(ty);
        self.push(if ty.kind().is_existential_type() {
            ".Protocol"
        } else {
            ".Type"
        });
    }

    pub(super) fn print_existential_metatype(&mut self, node: &Symbol) {
        let mut index = 0;
        if node.len() == 2 {
            self.print_child(node, 0);
            self.push(" ");
            index = 1;
        }
        self.print_child(node, index);
        self.push(".Type");
    }

    pub(super) fn print_protocol_list(&mut self, node: &Symbol) {
        let Some(types) = node.first_child() else { return };
        if types.is_empty() {
            self.push("Any");
        } else {
            self.print_children(types, " & ");
        }
    }

    pub(super) fn print_protocol_list_with_class(&mut self, node: &Symbol) {
        self.print_child(node, 1);
        self.push(" & ");
        if let Some(types) = node.first_child().and_then(|p| p.first_child()) {
            self.print_children(types, " & ");
        }
    }

    pub(super) fn print_protocol_list_with_any_object(&mut self, node: &Symbol) {
        let Some(types) = node.first_child().and_then(|p| p.first_child()) else {
            return;
        };
        if !types.is_empty() {
            self.print_children(types, " & ");
            self.push(" & ");
        }
        if self.has(RenderOptions::QUALIFY_ENTITIES) {
            self.push("Swift.");
        }
        self.push("AnyObject");
    }

    /// `attrs (params) -> (results)`.
    pub(super) fn print_impl_function_type(&mut self, node: &Symbol) {
        enum Section {
            Attributes,
            Parameters,
            Results,
        }
        let mut section = Section::Attributes;
        for child in node.children() {
            match child.kind() {
                Kind::ImplParameter => {
                    match section {
                        Section::Attributes => self.push("("),
                        Section::Parameters => self.push(", "),
                        Section::Results => {}
                    }
                    section = Section::Parameters;
                    self.print_name(child, false);
                }
                Kind::ImplResult | Kind::ImplErrorResult => {
                    match section {
                        Section::Attributes => self.push("() -> ("),
                        Section::Parameters => self.push(") -> ("),
                        Section::Results => self.push(", "),
                    }
                    section = Section::Results;
                    self.print_name(child, false);
                }
                _ => {
                    self.print_name(child, false);
                    self.push(" ");
                }
            }
        }
        match section {
            Section::Attributes => self.push("() -> ()"),
            Section::Parameters => self.push(") -> ()"),
            Section::Results => self.push(")"),
        }
    }

    pub(super) fn print_generic_signature(&mut self, node: &Symbol) {
        self.push("<");
        let counts: Vec<u64> = node
            .children()
            .iter()
            .take_while(|c| c.kind() == Kind::DependentGenericParamCount)
            .map(|c| c.index().unwrap_or(0))
            .collect();
        for (depth, count) in counts.iter().enumerate() {
            if depth > 0 {
                self.push("><");
            }
            for index in 0..*count {
                if index > 0 {
                    self.push(", ");
                }
                if index >= MAX_PRINTED_GENERIC_PARAMS {
                    self.push("...");
                    break;
                }
                self.push(&generic_parameter_name(depth as u64, index));
            }
        }
        let requirements = &node.children()[counts.len()..];
        if !requirements.is_empty() && self.has(RenderOptions::DISPLAY_WHERE_CLAUSES) {
            self.push(" where ");
            self.print_sequence(requirements, ", ");
        }
        self.push(">");
    }

    pub(super) fn print_layout_requirement(&mut self, node: &Symbol) {
        self.print_child(node, 0);
        self.push(": ");
        let letter = node.child(1).and_then(|l| l.text()).unwrap_or_default();
        self.push(layout_name(letter));
        if node.len() > 2 {
            self.push("(");
            self.print_child(node, 2);
            self.print_child_with(node, 3, ", ", "");
            self.push(")");
        }
    }

    pub(super) fn print_sil_box_with_layout(&mut self, node: &Symbol) {
        let generic_args = if node.len() > 2 {
            self.print_child(node, 1);
            self.push(" ");
            node.child(2)
        } else {
            None
        };
        self.print_child(node, 0);
        if let Some(args) = generic_args {
            self.push(" <");
            self.print_children(args, ", ");
            self.push(">");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::decoder::decode;
    use crate::printer::{render, RenderOptions};
    use crate::symbol::{Kind, Symbol};

    fn full(mangled: &str) -> String {
        render(&decode(mangled).unwrap(), RenderOptions::default())
    }

    #[test]
    fn test_optional_sugar_follows_options() {
        let global = decode("$sSiSgD").unwrap();
        assert_eq!(render(&global, RenderOptions::default()), "Swift.Int?");
        assert_eq!(render(&global, RenderOptions::simplified()), "Int?");
        let plain = RenderOptions::default() - RenderOptions::SYNTHESIZE_SUGAR_ON_TYPES;
        assert_eq!(render(&global, plain), "Swift.Optional<Swift.Int>");
    }

    #[test]
    fn test_implicitly_unwrapped_optional_sugar() {
        let iuo = Symbol::typed(
            Kind::BoundGenericEnum,
            vec![
                Rc::new(Symbol::stdlib_type(Kind::Enum, "ImplicitlyUnwrappedOptional")),
                Rc::new(Symbol::with_child(
                    Kind::TypeList,
                    Rc::new(Symbol::stdlib_type(Kind::Structure, "Int")),
                )),
            ],
        );
        assert_eq!(render(&iuo, RenderOptions::default()), "Swift.Int!");
        assert_eq!(render(&iuo, RenderOptions::simplified()), "Int!");
        let plain = RenderOptions::default() - RenderOptions::SYNTHESIZE_SUGAR_ON_TYPES;
        assert_eq!(
            render(&iuo, plain),
            "Swift.ImplicitlyUnwrappedOptional<Swift.Int>"
        );
    }

    #[test]
    fn test_collection_sugar() {
        assert_eq!(full("$sSaySiGD"), "[Swift.Int]");
        assert_eq!(full("$sSDySSSiGD"), "[Swift.String : Swift.Int]");
    }

    #[test]
    fn test_nested_bound_generic_without_sugar() {
        assert_eq!(
            full("$s4main5OuterV5InnerVySi_SSGD"),
            "main.Outer<Swift.Int>.Inner<Swift.String>"
        );
    }

    #[test]
    fn test_metatypes() {
        assert_eq!(full("$sSiXMtD"), "@thin Swift.Int.Type");
        assert_eq!(full("$sSimD"), "Swift.Int.Type");
    }

    #[test]
    fn test_protocol_compositions() {
        assert_eq!(full("$sSQ_SHpD"), "Swift.Equatable & Swift.Hashable");
        assert_eq!(full("$sypD"), "Any");
    }

    #[test]
    fn test_impl_function_type() {
        assert_eq!(
            full("$sSiSSIegyd_D"),
            "@escaping @callee_guaranteed (@unowned Swift.Int) -> (@unowned Swift.String)"
        );
    }

    #[test]
    fn test_generic_function_signature() {
        assert_eq!(full("$s4main3fooyyxlF"), "main.foo<A>(A) -> ()");
        assert_eq!(
            full("$s4main3fooyyxSQRzlF"),
            "main.foo<A where A: Swift.Equatable>(A) -> ()"
        );
    }

    #[test]
    fn test_where_clause_option() {
        let global = decode("$s4main3fooyyxSQRzlF").unwrap();
        let text = render(
            &global,
            RenderOptions::default() - RenderOptions::DISPLAY_WHERE_CLAUSES,
        );
        assert_eq!(text, "main.foo<A>(A) -> ()");
    }

    #[test]
    fn test_sil_box_layout() {
        assert_eq!(full("$sSi_SSzXxD"), "{ let Swift.Int, var Swift.String }");
    }
}
