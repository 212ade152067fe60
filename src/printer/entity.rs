//! Entity rendering: declarations, accessors, contexts and function signatures.
//!
//! An entity prints as `Context.name` followed by its type. Names that read as several
//! words (closures, default arguments, local declarations) move the context to the end:
//! `closure #1 in main.foo() -> ()`.

use std::rc::Rc;

use super::{Printer, RenderOptions};
use crate::symbol::{Kind, Symbol, LLDB_EXPRESSIONS_MODULE_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypePrinting {
    NoType,
    WithColon,
    FunctionStyle,
}

/// How one entity kind prints its name and type.
#[derive(Debug, Clone, Copy)]
struct EntityStyle {
    type_printing: TypePrinting,
    has_name: bool,
    extra_name: &'static str,
    extra_index: Option<u64>,
    overwrite_name: &'static str,
}

impl EntityStyle {
    fn named(type_printing: TypePrinting) -> Self {
        Self {
            type_printing,
            has_name: true,
            extra_name: "",
            extra_index: None,
            overwrite_name: "",
        }
    }

    fn unnamed(type_printing: TypePrinting, extra_name: &'static str) -> Self {
        Self {
            type_printing,
            has_name: false,
            extra_name,
            extra_index: None,
            overwrite_name: "",
        }
    }

    fn with_index(mut self, index: u64) -> Self {
        self.extra_index = Some(index);
        self
    }

    fn overwriting(mut self, name: &'static str) -> Self {
        self.overwrite_name = name;
        self
    }
}

fn child_index(node: &Symbol, index: usize) -> u64 {
    node.child(index).and_then(|c| c.index()).unwrap_or(0)
}

fn is_class(node: &Symbol) -> bool {
    node.child(0).is_some_and(|c| c.kind() == Kind::Class)
}

impl Printer {
    pub(super) fn print_entity_kind<'t>(
        &mut self,
        node: &'t Symbol,
        as_prefix_context: bool,
    ) -> Option<&'t Symbol> {
        use TypePrinting::*;
        let closure_types = if self.has(RenderOptions::SHOW_FUNCTION_ARGUMENT_TYPES) {
            FunctionStyle
        } else {
            NoType
        };
        let style = match node.kind() {
            Kind::Variable => EntityStyle::named(WithColon),
            Kind::Function | Kind::BoundGenericFunction => EntityStyle::named(FunctionStyle),
            Kind::Subscript => EntityStyle::unnamed(FunctionStyle, "").overwriting("subscript"),
            Kind::ExplicitClosure => {
                EntityStyle::unnamed(closure_types, "closure #").with_index(child_index(node, 1) + 1)
            }
            Kind::ImplicitClosure => EntityStyle::unnamed(closure_types, "implicit closure #")
                .with_index(child_index(node, 1) + 1),
            Kind::Initializer => EntityStyle::unnamed(NoType, "variable initialization expression"),
            Kind::DefaultArgumentInitializer => {
                EntityStyle::unnamed(NoType, "default argument ").with_index(child_index(node, 1))
            }
            Kind::Allocator => EntityStyle::unnamed(
                FunctionStyle,
                if is_class(node) { "__allocating_init" } else { "init" },
            ),
            Kind::Constructor => EntityStyle {
                has_name: node.len() > 2,
                ..EntityStyle::unnamed(FunctionStyle, "init")
            },
            Kind::Destructor => EntityStyle::unnamed(NoType, "deinit"),
            Kind::Deallocator => EntityStyle::unnamed(
                NoType,
                if is_class(node) { "__deallocating_deinit" } else { "deinit" },
            ),
            Kind::IVarInitializer => EntityStyle::unnamed(NoType, "__ivar_initializer"),
            Kind::IVarDestroyer => EntityStyle::unnamed(NoType, "__ivar_destroyer"),
            _ => EntityStyle::named(NoType),
        };
        self.print_entity(node, as_prefix_context, style)
    }

    pub(super) fn print_accessor<'t>(
        &mut self,
        node: &'t Symbol,
        as_prefix_context: bool,
    ) -> Option<&'t Symbol> {
        let extra_name = match node.kind() {
            Kind::OwningAddressor => "owningAddressor",
            Kind::OwningMutableAddressor => "owningMutableAddressor",
            Kind::NativeOwningAddressor => "nativeOwningAddressor",
            Kind::NativeOwningMutableAddressor => "nativeOwningMutableAddressor",
            Kind::NativePinningAddressor => "nativePinningAddressor",
            Kind::NativePinningMutableAddressor => "nativePinningMutableAddressor",
            Kind::UnsafeAddressor => "unsafeAddressor",
            Kind::UnsafeMutableAddressor => "unsafeMutableAddressor",
            Kind::Getter | Kind::GlobalGetter => "getter",
            Kind::Setter => "setter",
            Kind::MaterializeForSet => "materializeForSet",
            Kind::WillSet => "willset",
            Kind::DidSet => "didset",
            Kind::ReadAccessor => "read",
            Kind::ModifyAccessor => "modify",
            _ => "",
        };
        let storage = node.child(0)?;
        self.print_abstract_storage(storage, as_prefix_context, extra_name)
    }

    fn print_abstract_storage<'t>(
        &mut self,
        storage: &'t Symbol,
        as_prefix_context: bool,
        extra_name: &'static str,
    ) -> Option<&'t Symbol> {
        let style = match storage.kind() {
            Kind::Variable => EntityStyle {
                extra_name,
                ..EntityStyle::named(TypePrinting::WithColon)
            },
            Kind::Subscript => {
                EntityStyle::unnamed(TypePrinting::WithColon, extra_name).overwriting("subscript")
            }
            _ => return self.print_name(storage, as_prefix_context),
        };
        self.print_entity(storage, as_prefix_context, style)
    }

    fn should_print_context(&self, context: &Symbol) -> bool {
        if !self.has(RenderOptions::QUALIFY_ENTITIES) {
            return false;
        }
        let debugger_module = context.kind() == Kind::Module
            && context
                .text()
                .is_some_and(|t| t.starts_with(LLDB_EXPRESSIONS_MODULE_PREFIX));
        !debugger_module || self.has(RenderOptions::DISPLAY_DEBUGGER_GENERATED_MODULE)
    }

    fn print_entity<'t>(
        &mut self,
        entity: &'t Symbol,
        as_prefix_context: bool,
        style: EntityStyle,
    ) -> Option<&'t Symbol> {
        let mut style = style;
        let (entity, generic_args) = match entity.kind() {
            Kind::BoundGenericFunction => (&**entity.child(0)?, entity.child(1)),
            _ => (entity, None),
        };

        let multi_word_name = style.extra_name.contains(' ')
            || (style.has_name
                && entity
                    .child(1)
                    .is_some_and(|c| c.kind() == Kind::LocalDeclName));

        if as_prefix_context && (style.type_printing != TypePrinting::NoType || multi_word_name) {
            return Some(entity);
        }

        let mut postfix_context = None;
        if let Some(context) = entity.child(0) {
            if self.should_print_context(context) {
                if multi_word_name {
                    postfix_context = Some(&**context);
                } else {
                    let start = self.target.len();
                    postfix_context = self.print_name(context, true);
                    if self.target.len() != start {
                        self.push(".");
                    }
                }
            }
        }

        if style.has_name || !style.overwrite_name.is_empty() {
            if !style.extra_name.is_empty() && multi_word_name {
                self.push(style.extra_name);
                if let Some(index) = style.extra_index.take() {
                    self.push(&index.to_string());
                }
                self.push(" of ");
                style.extra_name = "";
            }
            let start = self.target.len();
            if !style.overwrite_name.is_empty() {
                self.push(style.overwrite_name);
            } else {
                if let Some(name) = entity.child(1) {
                    if !matches!(
                        name.kind(),
                        Kind::PrivateDeclName | Kind::LabelList | Kind::Type
                    ) {
                        self.print_name(name, false);
                    }
                }
                if let Some(private_name) = find_child(entity, Kind::PrivateDeclName) {
                    self.print_name(private_name, false);
                }
            }
            if self.target.len() != start && !style.extra_name.is_empty() {
                self.push(".");
            }
        }
        if !style.extra_name.is_empty() {
            self.push(style.extra_name);
            if let Some(index) = style.extra_index {
                self.push(&index.to_string());
            }
        }

        if style.type_printing != TypePrinting::NoType {
            if let Some(ty) = find_child(entity, Kind::Type).and_then(|t| t.first_child()) {
                let mut type_printing = style.type_printing;
                if type_printing == TypePrinting::FunctionStyle && !is_function_like(ty) {
                    type_printing = TypePrinting::WithColon;
                }
                if type_printing == TypePrinting::WithColon {
                    if self.has(RenderOptions::DISPLAY_ENTITY_TYPES) {
                        self.push(" : ");
                        self.print_entity_type(entity, ty, generic_args);
                    }
                } else {
                    if multi_word_name || ty.need_space_before_type() {
                        self.push(" ");
                    }
                    self.print_entity_type(entity, ty, generic_args);
                }
            }
        }

        if !as_prefix_context {
            if let Some(context) = postfix_context.take() {
                self.push(match entity.kind() {
                    Kind::DefaultArgumentInitializer | Kind::Initializer => " of ",
                    _ => " in ",
                });
                self.print_name(context, false);
            }
        }
        postfix_context
    }

    fn print_entity_type(
        &mut self,
        entity: &Symbol,
        ty: &Symbol,
        generic_args: Option<&Rc<Symbol>>,
    ) {
        let labels = find_child(entity, Kind::LabelList);
        if labels.is_none() && generic_args.is_none() {
            self.print_name(ty, false);
            return;
        }
        if let Some(args) = generic_args {
            self.push("<");
            self.print_children(args, ", ");
            self.push(">");
        }
        let mut ty = ty;
        if ty.kind() == Kind::DependentGenericType {
            if generic_args.is_none() {
                self.print_child(ty, 0);
            }
            if let Some(dependent) = ty.child(1) {
                if dependent.need_space_before_type() {
                    self.push(" ");
                }
                if let Some(inner) = dependent.first_child() {
                    ty = &**inner;
                }
            }
        }
        self.print_function_type(labels, ty);
    }

    /// Parameters, then ` throws` and the result when argument types are shown.
    pub(super) fn print_function_type(&mut self, labels: Option<&Symbol>, node: &Symbol) {
        if node.len() != 2 && node.len() != 3 {
            return;
        }
        let throws = node
            .child(0)
            .is_some_and(|c| c.kind() == Kind::ThrowsAnnotation);
        let start = usize::from(throws);
        let show_types = self.has(RenderOptions::SHOW_FUNCTION_ARGUMENT_TYPES);
        if let Some(params) = node.child(start) {
            self.print_function_parameters(labels, params, show_types);
        }
        if !show_types {
            return;
        }
        if throws {
            self.push(" throws");
        }
        self.print_child(node, start + 1);
    }

    pub(super) fn print_function_parameters(
        &mut self,
        labels: Option<&Symbol>,
        argument_tuple: &Symbol,
        show_types: bool,
    ) {
        if argument_tuple.kind() != Kind::ArgumentTuple {
            return;
        }
        let Some(params) = argument_tuple
            .first_child()
            .map(|ty| ty.first_child().unwrap_or(ty))
        else {
            return;
        };
        if params.kind() != Kind::Tuple {
            if show_types {
                self.push("(");
                self.print_name(params, false);
                self.push(")");
            } else {
                self.push("(_:)");
            }
            return;
        }

        let labels = labels.filter(|l| !l.is_empty());
        self.push("(");
        for (i, param) in params.children().iter().enumerate() {
            if i > 0 && show_types {
                self.push(", ");
            }
            if let Some(labels) = labels {
                let label = match labels.child(i) {
                    Some(l) if l.kind() == Kind::Identifier => l.text().unwrap_or_default(),
                    _ => "_",
                };
                self.push(label);
                self.push(":");
                if show_types {
                    self.push(" ");
                }
            } else if !show_types {
                match find_child(param, Kind::TupleElementName) {
                    Some(name) => self.push(name.text().unwrap_or_default()),
                    None => self.push("_"),
                }
                self.push(":");
            }
            if show_types {
                self.print_name(param, false);
            }
        }
        self.push(")");
    }

    pub(super) fn print_extension(&mut self, node: &Symbol) {
        if self.has(RenderOptions::QUALIFY_ENTITIES | RenderOptions::DISPLAY_EXTENSION_CONTEXTS) {
            self.push("(extension in ");
            if let Some(module) = node.child(0) {
                self.print_name(module, true);
            }
            self.push("):");
        }
        self.print_child(node, 1);
        self.print_child(node, 2);
    }

    pub(super) fn print_anonymous_context(&mut self, node: &Symbol) {
        if !self.has(RenderOptions::QUALIFY_ENTITIES | RenderOptions::DISPLAY_EXTENSION_CONTEXTS) {
            return;
        }
        self.print_child(node, 1);
        let name = node
            .child(0)
            .and_then(|c| c.text())
            .unwrap_or_default()
            .to_string();
        self.push(&format!(".(unknown context at {name})"));
        if let Some(args) = node.child(2).filter(|a| !a.is_empty()) {
            self.push("<");
            self.print_name(args, false);
            self.push(">");
        }
    }
}

fn find_child(node: &Symbol, kind: Kind) -> Option<&Symbol> {
    node.children()
        .iter()
        .find(|c| c.kind() == kind)
        .map(|c| &**c)
}

/// Function types, looking through generic signatures.
fn is_function_like(ty: &Symbol) -> bool {
    let mut t = ty;
    while t.kind() == Kind::DependentGenericType {
        match t.child(1).and_then(|c| c.first_child()) {
            Some(inner) => t = &**inner,
            None => return false,
        }
    }
    matches!(
        t.kind(),
        Kind::FunctionType
            | Kind::NoEscapeFunctionType
            | Kind::UncurriedFunctionType
            | Kind::CFunctionPointer
            | Kind::ThinFunctionType
    )
}

#[cfg(test)]
mod tests {
    use crate::decoder::decode;
    use crate::printer::{render, RenderOptions};

    fn full(mangled: &str) -> String {
        render(&decode(mangled).unwrap(), RenderOptions::default())
    }

    fn simple(mangled: &str) -> String {
        render(&decode(mangled).unwrap(), RenderOptions::simplified())
    }

    #[test]
    fn test_plain_function() {
        assert_eq!(full("$s4main3fooyyF"), "main.foo() -> ()");
        assert_eq!(simple("$s4main3fooyyF"), "foo()");
    }

    #[test]
    fn test_labelled_parameters() {
        assert_eq!(
            full("$s4main3foo1a1bySi_SitF"),
            "main.foo(a: Swift.Int, b: Swift.Int) -> ()"
        );
        assert_eq!(simple("$s4main3foo1a1bySi_SitF"), "foo(a:b:)");
    }

    #[test]
    fn test_single_unlabelled_parameter() {
        assert_eq!(full("$s4main3fooyySiF"), "main.foo(Swift.Int) -> ()");
        assert_eq!(simple("$s4main3fooyySiF"), "foo(_:)");
    }

    #[test]
    fn test_throwing_function() {
        assert_eq!(full("$s4main3fooyyKF"), "main.foo() throws -> ()");
    }

    #[test]
    fn test_variable_and_accessors() {
        assert_eq!(full("$s4main3FooV1xSivp"), "main.Foo.x : Swift.Int");
        assert_eq!(full("$s4main3FooV1xSivg"), "main.Foo.x.getter : Swift.Int");
        assert_eq!(simple("$s4main3FooV1xSivs"), "Foo.x.setter");
    }

    #[test]
    fn test_closure_uses_postfix_context() {
        assert_eq!(
            full("$s4main3fooyyFyycfU_"),
            "closure #1 () -> () in main.foo() -> ()"
        );
        assert_eq!(simple("$s4main3fooyyFyycfU_"), "closure #1 in foo()");
    }

    #[test]
    fn test_struct_type_metadata() {
        assert_eq!(full("$s4main3FooVN"), "type metadata for main.Foo");
    }
}
