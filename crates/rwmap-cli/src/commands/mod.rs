//! Command implementations for the rwmap CLI

pub mod generate;

pub use generate::generate_command;
