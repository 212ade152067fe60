//! Batch driver tests over crash-log shaped text.

use swift_demangle::{demangle_line, demangle_text, RenderOptions};

#[test]
fn test_backtrace_frame() {
    let frame = "0   MyApp    0x0000000100003f20 $s4main3fooyyF + 32";
    assert_eq!(
        demangle_line(frame, RenderOptions::default()),
        "0   MyApp    0x0000000100003f20 main.foo() -> () + 32"
    );
}

#[test]
fn test_non_symbols_are_untouched() {
    let line = "  nothing  to see\there  ";
    assert_eq!(demangle_line(line, RenderOptions::default()), line);
}

#[test]
fn test_debugger_module_prefix() {
    assert_eq!(
        demangle_line("MyApp!$s4main3fooyyF", RenderOptions::simplified()),
        "MyApp!foo()"
    );
}

#[test]
fn test_multiple_symbols_on_one_line() {
    assert_eq!(
        demangle_line("$sSiD calls $s4main3fooyyF", RenderOptions::default()),
        "Swift.Int calls main.foo() -> ()"
    );
}

#[test]
fn test_whole_text() {
    let log = "Thread 0 Crashed:\n0 $s4main3fooyyF\n1 $sSiSgD\n";
    assert_eq!(
        demangle_text(log, RenderOptions::simplified()),
        "Thread 0 Crashed:\n0 foo()\n1 Int?\n"
    );
}

#[test]
fn test_overly_nested_symbol_is_kept() {
    let symbol = format!("$sSi{}D", "Sg".repeat(3000));
    let line = format!("1 {symbol} + 4");
    assert_eq!(demangle_line(&line, RenderOptions::default()), line);
}

#[test]
fn test_nested_optionals_render() {
    let symbol = format!("$sSi{}D", "Sg".repeat(3));
    assert_eq!(
        demangle_line(&symbol, RenderOptions::simplified()),
        "Int???"
    );
}
