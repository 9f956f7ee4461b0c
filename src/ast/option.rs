use std::fmt;

use crate::{
    ast::missing,
    case::{
        is_valid_full_ident, is_valid_number, is_valid_option_entry_name, is_valid_option_name,
    },
    error::ValidationError,
    fmt::Escaped,
};

/// An option, such as `java_package = "com.example"` or `(my.ext).field = { a: 1 }`.
///
/// Options appear as `option` statements in files and declaration bodies, in brackets after fields
/// and enum constants, and as the entries of [`OptionValue::Aggregate`] values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionElement {
    name: String,
    value: OptionValue,
    is_parenthesized: bool,
}

/// The value of an option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    /// A string literal. Rendered in double quotes.
    String(String),
    /// `true` or `false`.
    Bool(bool),
    /// An integer or floating point literal, kept as written, for example `-5`, `0x1F` or `1.5e3`.
    Number(String),
    /// A bare identifier, such as an enum value name like `SPEED` or `google.protobuf.NULL_VALUE`.
    Enum(String),
    /// A bracketed list of values.
    List(Vec<OptionValue>),
    /// A brace-delimited message value, whose entries are themselves options.
    Aggregate(Vec<OptionElement>),
}

/// A builder for [`OptionElement`].
#[derive(Debug, Default)]
pub struct OptionElementBuilder {
    name: Option<String>,
    value: Option<OptionValue>,
    parenthesized: bool,
}

impl OptionElement {
    /// Creates a new builder.
    pub fn builder() -> OptionElementBuilder {
        OptionElementBuilder::default()
    }

    /// Creates an option with the given name and value.
    ///
    /// The name is used verbatim, so an extension option should be written with its parentheses,
    /// for example `(my.option)`.
    pub fn new(name: impl Into<String>, value: OptionValue) -> Result<Self, ValidationError> {
        OptionElement::builder().name(name).value(value).build()
    }

    /// Creates an entry of an [`OptionValue::Aggregate`] value.
    ///
    /// Unlike an option statement, an entry is named by a single field name, or by an extension
    /// name or type URL in brackets, for example `[my.ext]`. Entries may only be used within
    /// aggregate values.
    pub fn entry(name: impl Into<String>, value: OptionValue) -> Result<Self, ValidationError> {
        let name = name.into();
        if !is_valid_option_entry_name(&name) {
            return Err(ValidationError::InvalidName {
                kind: "aggregate field",
                name,
            });
        }
        value.check()?;

        Ok(OptionElement {
            name,
            value,
            is_parenthesized: false,
        })
    }

    /// The name of the option, exactly as written in the source, including any parentheses.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value of the option.
    pub fn value(&self) -> &OptionValue {
        &self.value
    }

    /// Returns `true` if the name starts with a parenthesized extension reference.
    pub fn is_parenthesized(&self) -> bool {
        self.is_parenthesized
    }
}

impl OptionElementBuilder {
    /// Sets the name of the option.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the value of the option.
    pub fn value(mut self, value: OptionValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Marks the name as an extension reference, adding parentheses around it if necessary.
    pub fn parenthesized(mut self, parenthesized: bool) -> Self {
        self.parenthesized = parenthesized;
        self
    }

    /// Validates and builds the option.
    pub fn build(self) -> Result<OptionElement, ValidationError> {
        let mut name = self.name.ok_or_else(|| missing("option", "name"))?;
        let value = self.value.ok_or_else(|| missing("option", "value"))?;

        if self.parenthesized && !name.starts_with('(') {
            name = format!("({})", name);
        }

        if !is_valid_option_name(&name) {
            return Err(ValidationError::InvalidName { kind: "option", name });
        }
        value.check()?;

        Ok(OptionElement {
            is_parenthesized: name.starts_with('('),
            name,
            value,
        })
    }
}

impl OptionValue {
    fn check(&self) -> Result<(), ValidationError> {
        match self {
            OptionValue::String(_) | OptionValue::Bool(_) => Ok(()),
            OptionValue::Number(value) if is_valid_number(value) => Ok(()),
            OptionValue::Number(value) => Err(ValidationError::InvalidNumber {
                value: value.clone(),
            }),
            OptionValue::Enum(value) if is_valid_enum_ident(value) => Ok(()),
            OptionValue::Enum(value) => Err(ValidationError::InvalidName {
                kind: "enum value",
                name: value.clone(),
            }),
            OptionValue::List(values) => values.iter().try_for_each(OptionValue::check),
            // Entry values were validated when they were built.
            OptionValue::Aggregate(entries) => match entries
                .iter()
                .find(|entry| !is_valid_option_entry_name(&entry.name))
            {
                Some(entry) => Err(ValidationError::InvalidName {
                    kind: "aggregate field",
                    name: entry.name.clone(),
                }),
                None => Ok(()),
            },
        }
    }
}

/// Checks that options used as statements or in brackets are not aggregate entries.
pub(crate) fn check_options(options: &[OptionElement]) -> Result<(), ValidationError> {
    match options
        .iter()
        .find(|option| !is_valid_option_name(&option.name))
    {
        Some(option) => Err(ValidationError::InvalidName {
            kind: "option",
            name: option.name.clone(),
        }),
        None => Ok(()),
    }
}

// 'true' and 'false' would be read back as booleans.
fn is_valid_enum_ident(value: &str) -> bool {
    is_valid_full_ident(value) && value != "true" && value != "false"
}

impl fmt::Display for OptionElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(value) => write!(f, "\"{}\"", Escaped(value)),
            OptionValue::Bool(value) => write!(f, "{}", value),
            OptionValue::Number(value) | OptionValue::Enum(value) => f.write_str(value),
            OptionValue::List(values) => {
                f.write_str("[")?;
                for (index, value) in values.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                f.write_str("]")
            }
            OptionValue::Aggregate(entries) if entries.is_empty() => f.write_str("{}"),
            OptionValue::Aggregate(entries) => {
                f.write_str("{ ")?;
                for (index, entry) in entries.iter().enumerate() {
                    if index != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.name, entry.value)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Writes an option as a statement, for example `option foo = 1;`.
pub(crate) struct OptionStatement<'a>(pub &'a OptionElement);

impl<'a> fmt::Display for OptionStatement<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "option {};", self.0)
    }
}

/// Writes a bracketed list of options, with a leading space, for example ` [deprecated = true]`.
pub(crate) struct OptionList<'a>(pub &'a [OptionElement]);

impl<'a> fmt::Display for OptionList<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }

        f.write_str(" [")?;
        for (index, option) in self.0.iter().enumerate() {
            if index != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", option)?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_values() {
        let option = OptionElement::new("kit", OptionValue::String("kat".to_owned())).unwrap();
        assert_eq!(option.to_string(), "kit = \"kat\"");
        assert!(!option.is_parenthesized());

        let option = OptionElement::new("deprecated", OptionValue::Bool(true)).unwrap();
        assert_eq!(option.to_string(), "deprecated = true");

        let option = OptionElement::new("default", OptionValue::Number("-0x1F".to_owned())).unwrap();
        assert_eq!(option.to_string(), "default = -0x1F");

        let option =
            OptionElement::new("optimize_for", OptionValue::Enum("SPEED".to_owned())).unwrap();
        assert_eq!(option.to_string(), "optimize_for = SPEED");

        let option =
            OptionElement::new("quote", OptionValue::String("a \"b\"\n".to_owned())).unwrap();
        assert_eq!(option.to_string(), "quote = \"a \\\"b\\\"\\n\"");
    }

    #[test]
    fn parenthesized_name() {
        let option = OptionElement::builder()
            .name("custom.option")
            .parenthesized(true)
            .value(OptionValue::Number("5".to_owned()))
            .build()
            .unwrap();
        assert_eq!(option.name(), "(custom.option)");
        assert!(option.is_parenthesized());
        assert_eq!(option.to_string(), "(custom.option) = 5");

        let option = OptionElement::new("(custom).field", OptionValue::Bool(false)).unwrap();
        assert!(option.is_parenthesized());
    }

    #[test]
    fn nested_values() {
        let inner = OptionElement::new("b", OptionValue::Number("2".to_owned())).unwrap();
        let entries = vec![
            OptionElement::new("a", OptionValue::Number("1".to_owned())).unwrap(),
            OptionElement::new("nested", OptionValue::Aggregate(vec![inner])).unwrap(),
            OptionElement::new(
                "list",
                OptionValue::List(vec![
                    OptionValue::String("x".to_owned()),
                    OptionValue::Enum("Y".to_owned()),
                ]),
            )
            .unwrap(),
            OptionElement::new("empty", OptionValue::Aggregate(vec![])).unwrap(),
        ];
        let option = OptionElement::new("(my.ext)", OptionValue::Aggregate(entries)).unwrap();
        assert_eq!(
            option.to_string(),
            "(my.ext) = { a: 1, nested: { b: 2 }, list: [\"x\", Y], empty: {} }"
        );
    }

    #[test]
    fn invalid_options() {
        assert_eq!(
            OptionElement::builder().value(OptionValue::Bool(true)).build(),
            Err(ValidationError::MissingProperty {
                element: "option",
                property: "name",
            })
        );
        assert_eq!(
            OptionElement::builder().name("foo").build(),
            Err(ValidationError::MissingProperty {
                element: "option",
                property: "value",
            })
        );
        assert_eq!(
            OptionElement::new("foo bar", OptionValue::Bool(true)),
            Err(ValidationError::InvalidName {
                kind: "option",
                name: "foo bar".to_owned(),
            })
        );
        assert_eq!(
            OptionElement::new("foo", OptionValue::Number("12abc".to_owned())),
            Err(ValidationError::InvalidNumber {
                value: "12abc".to_owned(),
            })
        );
        assert_eq!(
            OptionElement::new("foo", OptionValue::Enum("true".to_owned())),
            Err(ValidationError::InvalidName {
                kind: "enum value",
                name: "true".to_owned(),
            })
        );
        assert!(OptionElement::new(
            "foo",
            OptionValue::List(vec![OptionValue::Number("x".to_owned())])
        )
        .is_err());
    }

    #[test]
    fn entry_names() {
        let entry = OptionElement::entry("[my.ext]", OptionValue::Bool(true)).unwrap();
        assert!(!entry.is_parenthesized());
        let option = OptionElement::new("(my.ext)", OptionValue::Aggregate(vec![entry])).unwrap();
        assert_eq!(option.to_string(), "(my.ext) = { [my.ext]: true }");

        assert_eq!(
            OptionElement::new("[foo.bar]", OptionValue::Number("1".to_owned())),
            Err(ValidationError::InvalidName {
                kind: "option",
                name: "[foo.bar]".to_owned(),
            })
        );
        assert_eq!(
            OptionElement::entry("a.b", OptionValue::Number("1".to_owned())),
            Err(ValidationError::InvalidName {
                kind: "aggregate field",
                name: "a.b".to_owned(),
            })
        );
    }

    #[test]
    fn statement_names_are_not_entry_names() {
        let dotted = OptionElement::new("a.b", OptionValue::Number("1".to_owned())).unwrap();
        assert_eq!(
            OptionElement::new("(my.ext)", OptionValue::Aggregate(vec![dotted])),
            Err(ValidationError::InvalidName {
                kind: "aggregate field",
                name: "a.b".to_owned(),
            })
        );

        let extension = OptionElement::new("(ext)", OptionValue::Bool(true)).unwrap();
        assert!(OptionElement::new(
            "foo",
            OptionValue::List(vec![OptionValue::Aggregate(vec![extension])])
        )
        .is_err());

        let bracketed = OptionElement::entry("[foo.bar]", OptionValue::Bool(true)).unwrap();
        assert_eq!(
            check_options(&[bracketed]),
            Err(ValidationError::InvalidName {
                kind: "option",
                name: "[foo.bar]".to_owned(),
            })
        );
    }
}
