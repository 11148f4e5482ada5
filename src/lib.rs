#![deny(clippy::print_stdout)]

pub mod command_line;
pub mod error;
pub mod output;
pub mod patterns;
pub mod pipeline;
pub mod pubchem;
pub mod selection;
pub mod toolkit;
