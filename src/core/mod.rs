//! Shared infrastructure for the decoder: the error taxonomy and the input scanner.

pub mod error;
pub mod scanner;

pub use error::{DemangleError, DemangleResult};
pub use scanner::Scanner;
