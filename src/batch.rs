// This module applies the demangler to free-form text. Crash logs and symbolicated
// backtraces mix mangled names with addresses, offsets and prose, so a line is split on
// single spaces and every token that decodes is replaced by its rendering while everything
// else is left exactly as it was. Lines carrying a `!` (the `module!symbol` form used by
// some debuggers) keep the text up to the first `!` untouched. Failures are never surfaced
// to the caller: an undecodable token is simply kept.

//! Whole-line and whole-text demangling.

use log::debug;

use crate::decoder::decode;
use crate::printer::{render, RenderOptions};

/// Decode and render `mangled`, or return it unchanged when it does not decode.
pub fn decode_and_render(mangled: &str, options: RenderOptions) -> String {
    match decode(mangled) {
        Ok(symbol) => render(&symbol, options),
        Err(e) => {
            debug!("keeping {mangled:?} as is: {e}");
            mangled.to_string()
        }
    }
}

/// Replace every decodable token of `line`, preserving separators and surrounding
/// whitespace.
pub fn demangle_line(line: &str, options: RenderOptions) -> String {
    let (kept, rest) = match line.find('!') {
        Some(bang) => line.split_at(bang + 1),
        None => ("", line),
    };
    let mut out = String::with_capacity(line.len());
    out.push_str(kept);
    for (i, token) in rest.split(' ').enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&demangle_token(token, options));
    }
    out
}

fn demangle_token(token: &str, options: RenderOptions) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return token.to_string();
    }
    match decode(trimmed) {
        Ok(symbol) => {
            let start = token.len() - token.trim_start().len();
            let end = start + trimmed.len();
            format!("{}{}{}", &token[..start], render(&symbol, options), &token[end..])
        }
        Err(_) => token.to_string(),
    }
}

/// [`demangle_line`] over every line of `text`, keeping the line endings.
pub fn demangle_text(text: &str, options: RenderOptions) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, ending) = match line.strip_suffix("\r\n") {
            Some(body) => (body, "\r\n"),
            None => match line.strip_suffix('\n') {
                Some(body) => (body, "\n"),
                None => (line, ""),
            },
        };
        out.push_str(&demangle_line(body, options));
        out.push_str(ending);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_returns_input() {
        assert_eq!(
            decode_and_render("not-a-mangled-name", RenderOptions::default()),
            "not-a-mangled-name"
        );
    }

    #[test]
    fn test_line_replaces_only_symbols() {
        let line = "3  libfoo.dylib  0x1000 $s4main3fooyyF + 12";
        assert_eq!(
            demangle_line(line, RenderOptions::default()),
            "3  libfoo.dylib  0x1000 main.foo() -> () + 12"
        );
    }

    #[test]
    fn test_bang_prefix_is_kept() {
        let line = "$s4main3fooyyF!$s4main3fooyyF";
        assert_eq!(
            demangle_line(line, RenderOptions::simplified()),
            "$s4main3fooyyF!foo()"
        );
    }

    #[test]
    fn test_tab_around_token_is_preserved() {
        assert_eq!(
            demangle_line("at \t$s4main3fooyyF\t", RenderOptions::simplified()),
            "at \tfoo()\t"
        );
    }

    #[test]
    fn test_text_keeps_line_endings() {
        let text = "$s4main3fooyyF\r\nplain\n$s4main3fooyyF";
        assert_eq!(
            demangle_text(text, RenderOptions::simplified()),
            "foo()\r\nplain\nfoo()"
        );
    }
}
