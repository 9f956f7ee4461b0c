//! The elements of a parsed protobuf schema.
//!
//! Every element is immutable once built. Elements are created either by [`parse()`](crate::parse)
//! or through their builders, which check the same rules the parser does. The [`Display`] impl of
//! each element renders it as canonical schema text.
//!
//! [`Display`]: std::fmt::Display

mod enum_;
mod extend;
mod field;
mod file;
mod message;
mod option;
mod service;

use std::collections::HashSet;

pub use self::{
    enum_::{EnumConstantElement, EnumConstantElementBuilder, EnumElement, EnumElementBuilder},
    extend::{ExtendElement, ExtendElementBuilder},
    field::{FieldElement, FieldElementBuilder, Label},
    file::{ProtoFile, ProtoFileBuilder, Syntax},
    message::{
        ExtensionsElement, ExtensionsElementBuilder, MessageElement, MessageElementBuilder,
        OneofElement, OneofElementBuilder, ReservedElement, ReservedElementBuilder,
        ReservedValue, TypeElement,
    },
    option::{OptionElement, OptionElementBuilder, OptionValue},
    service::{RpcElement, RpcElementBuilder, ServiceElement, ServiceElementBuilder},
};
use crate::{case::is_valid_ident, error::ValidationError};

/// Trims each line of a documentation comment, and removes leading and trailing blank lines.
pub(crate) fn normalize_documentation(documentation: &str) -> String {
    let lines: Vec<&str> = documentation.lines().map(str::trim).collect();
    let start = lines.iter().position(|line| !line.is_empty());
    let end = lines.iter().rposition(|line| !line.is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

pub(crate) fn check_ident(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if is_valid_ident(name) {
        Ok(())
    } else {
        Err(ValidationError::InvalidName {
            kind,
            name: name.to_owned(),
        })
    }
}

pub(crate) fn check_unique<'a>(
    kind: &'static str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
    }
    Ok(())
}

/// Replaces a defaulted qualified name with `expected`, or checks that an explicit one matches it.
///
/// A qualified name equal to `default` is treated as unset.
pub(crate) fn resolve_qualified_name(
    qualified_name: &mut String,
    default: &str,
    expected: String,
) -> Result<(), ValidationError> {
    if *qualified_name == expected {
        Ok(())
    } else if *qualified_name == default {
        *qualified_name = expected;
        Ok(())
    } else {
        Err(ValidationError::QualifiedNameMismatch {
            name: qualified_name.clone(),
            expected,
        })
    }
}

pub(crate) fn missing(element: &'static str, property: &'static str) -> ValidationError {
    ValidationError::MissingProperty { element, property }
}

#[test]
fn documentation_normalization() {
    assert_eq!(normalize_documentation(""), "");
    assert_eq!(normalize_documentation("  \n \n"), "");
    assert_eq!(normalize_documentation(" hello "), "hello");
    assert_eq!(
        normalize_documentation("\n first\n\n  second  \n\n"),
        "first\n\nsecond"
    );
}
