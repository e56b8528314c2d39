//! ctk-directive - Test Directive Interpreter
//!
//! This crate turns the annotation block embedded in a conformance fixture
//! into a structured, immutable [`Instructions`] value.
//!
//! # Overview
//!
//! A fixture is a source file carrying a block comment such as:
//!
//! ```text
//! /*
//!  * @test
//!  * @compile A.java B.java
//!  * @clean p.B
//!  * @compile B2.java
//!  * @run main/fail A arg1
//!  */
//! ```
//!
//! The parser locates the first block comment containing the `@test` marker,
//! recognizes a fixed table of directive keywords (`@run`, `@compile`,
//! `@clean`, `@library`) and ignores every other line.
//!
//! # Example Usage
//!
//! ```
//! use ctk_directive::{DirectiveParser, FilterSet};
//!
//! let source = "/* @test\n * @run main Hello world\n */\nclass Hello {}";
//! let filters = FilterSet::default();
//! let parser = DirectiveParser::new(&filters);
//!
//! let instructions = parser.parse_source(source, Some("Hello")).unwrap();
//! assert_eq!(instructions.runs()[0].entry_point, "Hello");
//! assert_eq!(instructions.runs()[0].args, vec!["world".to_string()]);
//! ```
//!
//! Fixtures that are not applicable (no marker, no directive, a negative
//! compile directive, or a blacklisted substring) yield `None` and are never
//! scheduled.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

#[cfg(test)]
mod edge_cases;

pub mod filters;
pub mod instructions;
pub mod parser;

pub use filters::FilterSet;
pub use instructions::{
    Classification, CleanStep, CompileStep, Instructions, RunInvocation, Step,
};
pub use parser::{DirectiveParser, SOURCE_EXTENSION, TEST_MARKER};
