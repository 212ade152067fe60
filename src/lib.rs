//! swift-demangle - decoding and pretty-printing of mangled Swift symbol names.
//!
//! Mangled names show up in linker maps, crash logs and profiler output. This crate
//! turns them back into readable signatures:
//!
//! ```
//! use swift_demangle::{decode_and_render, RenderOptions};
//!
//! let text = decode_and_render("$s4main3fooyyF", RenderOptions::default());
//! assert_eq!(text, "main.foo() -> ()");
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Error taxonomy and the byte scanner over the mangled input
//! - [`symbol`] - The symbol tree: node kinds, payloads and attribute enums
//! - [`decoder`] - Stack-based grammar engine producing a [`Symbol`] tree
//! - [`printer`] - Options-driven rendering of symbol trees as text
//! - [`batch`] - Demangling of free-form text such as crash-log lines
//! - [`fixture`] - `mangled ---> expected` regression files and their runner

pub mod batch;
pub mod core;
pub mod decoder;
pub mod fixture;
pub mod printer;
pub mod symbol;

pub use crate::core::{DemangleError, DemangleResult};
pub use batch::{decode_and_render, demangle_line, demangle_text};
pub use decoder::decode;
pub use printer::{render, RenderOptions};
pub use symbol::{Kind, Symbol};
