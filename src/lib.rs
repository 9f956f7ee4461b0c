//! Parsing and rendering of protobuf schema files.
//!
//! [`parse()`] turns the text of a `.proto` file into an immutable [`ProtoFile`]. Elements can also
//! be assembled directly through their builders, which enforce the same rules as the parser. Every
//! element renders itself back to canonical schema text through its [`Display`](std::fmt::Display)
//! impl, and parsing the rendered text of a file produces an equal tree.
//!
//! # Examples
//!
//! ```
//! # #[cfg(feature = "parse")] {
//! let file = protoschema::parse("greeter.proto", r#"
//!     syntax = "proto3";
//!     package greeter;
//!
//!     // A greeting.
//!     message Hello {
//!         string name = 1;
//!     }
//! "#).unwrap();
//!
//! assert_eq!(file.types()[0].qualified_name(), "greeter.Hello");
//! assert_eq!(file.render(), "\
//! // greeter.proto
//! syntax = \"proto3\";
//! package greeter;
//!
//! // A greeting.
//! message Hello {
//!   string name = 1;
//! }
//! ");
//! # }
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(not(feature = "parse"), allow(dead_code))]
#![doc(html_root_url = "https://docs.rs/protoschema/0.1.0/")]

mod ast;
mod case;
mod error;
mod fmt;
#[cfg(feature = "parse")]
mod lex;
mod lines;
#[cfg(feature = "parse")]
mod parse;
mod tag;

pub use self::{
    ast::*,
    error::{ErrorCategory, ParseError, ValidationError},
    tag::{
        is_valid_enum_value, is_valid_tag, MAX_TAG_VALUE, MIN_TAG_VALUE, RESERVED_TAG_VALUE_END,
        RESERVED_TAG_VALUE_START,
    },
};

/// Parses a single protobuf source file.
///
/// The `file_name` is recorded in the returned [`ProtoFile`], and in any error, but is not used to
/// locate the file: the caller supplies its contents as `source`.
///
/// Parsing stops at the first error. The error records the line and column at which it occurred,
/// and implements [`miette::Diagnostic`] so it can be rendered with a snippet of the source.
///
/// # Examples
///
/// ```
/// # use protoschema::{parse, ErrorCategory};
/// let source = "syntax = \"proto3\";\nmessage Foo { int32 bar = 0; }";
/// let err = parse("foo.proto", source).unwrap_err();
///
/// assert_eq!(err.to_string(), "field 'bar' has invalid number 0");
/// assert_eq!(err.category(), ErrorCategory::Validation);
/// assert_eq!((err.line(), err.column()), (2, 27));
/// ```
#[cfg(feature = "parse")]
pub fn parse(file_name: &str, source: &str) -> Result<ProtoFile, ParseError> {
    parse::parse_file(file_name, source).map_err(|kind| ParseError::new(kind, file_name, source))
}
