//! Tree-shape tests for the decoder through the public API.

use swift_demangle::decoder::punycode::decode_punycode;
use swift_demangle::{decode, DemangleError, Kind, Symbol};

fn kinds(node: &Symbol) -> Vec<Kind> {
    node.children().iter().map(|c| c.kind()).collect()
}

#[test]
fn test_global_wraps_function() {
    let global = decode("$s4main3fooyyF").unwrap();
    assert_eq!(global.kind(), Kind::Global);
    let func = global.first_child().unwrap();
    assert_eq!(func.kind(), Kind::Function);
    assert_eq!(func.child(0).unwrap().text(), Some("main"));
    assert!(func.child(1).unwrap().is_identifier("foo"));
}

#[test]
fn test_standard_substitution_is_wrapped_nominal() {
    let global = decode("$sSiD").unwrap();
    let mangling = global.first_child().unwrap();
    assert_eq!(mangling.kind(), Kind::TypeMangling);
    let ty = mangling.first_child().unwrap();
    assert_eq!(ty.kind(), Kind::Type);
    let nominal = ty.first_child().unwrap();
    assert!(nominal.kind().is_any_generic());
    assert!(nominal.child(0).unwrap().is_swift_module());
}

#[test]
fn test_standard_substitution_as_parameter() {
    let global = decode("$s4main3fooyySiF").unwrap();
    let func = global.first_child().unwrap();
    let ty = func.children().last().unwrap();
    let function_type = ty.first_child().unwrap();
    assert_eq!(function_type.kind(), Kind::FunctionType);
    let param = function_type
        .child(0)
        .unwrap()
        .first_child()
        .unwrap()
        .first_child()
        .unwrap();
    assert_eq!(param.kind(), Kind::Structure);
    assert!(param.kind().is_any_generic());
}

#[test]
fn test_labels_are_recorded() {
    let global = decode("$s4main3foo1a1bySi_SitF").unwrap();
    let func = global.first_child().unwrap();
    assert_eq!(
        kinds(func),
        vec![Kind::Module, Kind::Identifier, Kind::LabelList, Kind::Type]
    );
    let labels = func.child(2).unwrap();
    assert!(labels.child(0).unwrap().is_identifier("a"));
    assert!(labels.child(1).unwrap().is_identifier("b"));
}

#[test]
fn test_back_reference_out_of_range() {
    assert!(matches!(
        decode("$s4mainAFV"),
        Err(DemangleError::Unexpected { .. })
    ));
}

#[test]
fn test_repeat_count_over_cap_fails() {
    assert!(matches!(
        decode("$sS2049iD"),
        Err(DemangleError::Unexpected { .. })
    ));
}

#[test]
fn test_errors_carry_offsets() {
    let err = decode("main").unwrap_err();
    assert_eq!(err.position(), 0);
}

#[test]
fn test_objc_bridged_class() {
    let global = decode("_TtC3Foo3Bar").unwrap();
    let ty = global.first_child().unwrap().first_child().unwrap();
    assert_eq!(ty.first_child().unwrap().kind(), Kind::Class);
}

#[test]
fn test_punycode_samples() {
    // RFC 3492 sample (A) Arabic (Egyptian), written with letter digits.
    assert_eq!(
        decode_punycode("egbpdajGbuEbxfgehfvwxn").as_deref(),
        Some("\u{644}\u{64a}\u{647}\u{645}\u{627}\u{628}\u{62a}\u{643}\u{644}\u{645}\u{648}\u{634}\u{639}\u{631}\u{628}\u{64a}\u{61f}")
    );
    assert_eq!(decode_punycode("Bcher_kva").as_deref(), Some("Bücher"));
}

#[test]
fn test_tree_dump() {
    let global = decode("$sSiD").unwrap();
    assert_eq!(
        global.tree_string(),
        "Global\n  TypeMangling\n    Type\n      Structure\n        Module \"Swift\"\n        \
         Identifier \"Int\"\n"
    );
}
