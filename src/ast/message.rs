use std::fmt;

use crate::{
    ast::{
        check_ident, check_unique, missing, normalize_documentation,
        option::{check_options, OptionStatement},
        resolve_qualified_name, EnumElement, ExtendElement, FieldElement, OptionElement,
    },
    case::is_valid_full_ident,
    error::ValidationError,
    fmt::{write_documentation, Block},
    MAX_TAG_VALUE, MIN_TAG_VALUE,
};

/// A type declaration: either a message or an enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeElement {
    /// A `message` declaration.
    Message(MessageElement),
    /// An `enum` declaration.
    Enum(EnumElement),
}

/// A message declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageElement {
    name: String,
    qualified_name: String,
    documentation: String,
    fields: Vec<FieldElement>,
    oneofs: Vec<OneofElement>,
    nested_types: Vec<TypeElement>,
    extensions: Vec<ExtensionsElement>,
    reserved: Vec<ReservedElement>,
    extend_declarations: Vec<ExtendElement>,
    options: Vec<OptionElement>,
}

/// A builder for [`MessageElement`].
#[derive(Debug, Default)]
pub struct MessageElementBuilder {
    name: Option<String>,
    qualified_name: Option<String>,
    documentation: String,
    fields: Vec<FieldElement>,
    oneofs: Vec<OneofElement>,
    nested_types: Vec<TypeElement>,
    extensions: Vec<ExtensionsElement>,
    reserved: Vec<ReservedElement>,
    extend_declarations: Vec<ExtendElement>,
    options: Vec<OptionElement>,
}

/// A `oneof` declaration within a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OneofElement {
    name: String,
    documentation: String,
    fields: Vec<FieldElement>,
    options: Vec<OptionElement>,
}

/// A builder for [`OneofElement`].
#[derive(Debug, Default)]
pub struct OneofElementBuilder {
    name: Option<String>,
    documentation: String,
    fields: Vec<FieldElement>,
    options: Vec<OptionElement>,
}

/// A range of field numbers reserved for extensions, such as `extensions 100 to max;`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionsElement {
    documentation: String,
    start: i32,
    end: i32,
}

/// A builder for [`ExtensionsElement`].
#[derive(Debug, Default)]
pub struct ExtensionsElementBuilder {
    documentation: String,
    start: Option<i32>,
    end: Option<i32>,
}

/// A `reserved` statement in a message or enum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservedElement {
    documentation: String,
    values: Vec<ReservedValue>,
}

/// A builder for [`ReservedElement`].
#[derive(Debug, Default)]
pub struct ReservedElementBuilder {
    documentation: String,
    values: Vec<ReservedValue>,
}

/// A single entry of a `reserved` statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReservedValue {
    /// A single number, such as `5`.
    Tag(i32),
    /// An inclusive range of numbers, such as `5 to 9`.
    Range(i32, i32),
    /// A range extending to the maximum number, such as `5 to max`.
    RangeToMax(i32),
    /// A reserved field or value name, such as `"foo"`.
    Name(String),
}

impl TypeElement {
    /// The name of the type.
    pub fn name(&self) -> &str {
        match self {
            TypeElement::Message(message) => message.name(),
            TypeElement::Enum(enum_) => enum_.name(),
        }
    }

    /// The name of the type, prefixed with the package and any enclosing messages.
    pub fn qualified_name(&self) -> &str {
        match self {
            TypeElement::Message(message) => message.qualified_name(),
            TypeElement::Enum(enum_) => enum_.qualified_name(),
        }
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        match self {
            TypeElement::Message(message) => message.documentation(),
            TypeElement::Enum(enum_) => enum_.documentation(),
        }
    }

    /// The types nested within this type. Always empty for enums.
    pub fn nested_types(&self) -> &[TypeElement] {
        match self {
            TypeElement::Message(message) => message.nested_types(),
            TypeElement::Enum(_) => &[],
        }
    }

    pub(crate) fn qualify(&mut self, prefix: &str) -> Result<(), ValidationError> {
        match self {
            TypeElement::Message(message) => message.qualify(prefix),
            TypeElement::Enum(enum_) => enum_.qualify(prefix),
        }
    }
}

impl From<MessageElement> for TypeElement {
    fn from(message: MessageElement) -> Self {
        TypeElement::Message(message)
    }
}

impl From<EnumElement> for TypeElement {
    fn from(enum_: EnumElement) -> Self {
        TypeElement::Enum(enum_)
    }
}

impl MessageElement {
    /// Creates a new builder.
    pub fn builder() -> MessageElementBuilder {
        MessageElementBuilder::default()
    }

    /// The name of the message.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the message, prefixed with the package and any enclosing messages.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Sets the qualified names of this message and everything nested in it, given the prefix
    /// of the enclosing scope (such as `package.Outer.`).
    pub(crate) fn qualify(&mut self, prefix: &str) -> Result<(), ValidationError> {
        let expected = format!("{}{}", prefix, self.name);
        resolve_qualified_name(&mut self.qualified_name, &self.name, expected)?;

        let nested_prefix = format!("{}.", self.qualified_name);
        for ty in &mut self.nested_types {
            ty.qualify(&nested_prefix)?;
        }
        for extend in &mut self.extend_declarations {
            extend.qualify(&nested_prefix)?;
        }
        Ok(())
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The fields declared directly in the message body, excluding oneof members.
    pub fn fields(&self) -> &[FieldElement] {
        &self.fields
    }

    /// The oneofs of the message.
    pub fn oneofs(&self) -> &[OneofElement] {
        &self.oneofs
    }

    /// The messages and enums nested within this message.
    pub fn nested_types(&self) -> &[TypeElement] {
        &self.nested_types
    }

    /// The extension ranges of the message.
    pub fn extensions(&self) -> &[ExtensionsElement] {
        &self.extensions
    }

    /// The `reserved` statements of the message.
    pub fn reserved(&self) -> &[ReservedElement] {
        &self.reserved
    }

    /// The `extend` blocks nested within this message.
    pub fn extend_declarations(&self) -> &[ExtendElement] {
        &self.extend_declarations
    }

    /// The `option` statements in the message body.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }
}

impl MessageElementBuilder {
    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the fully-qualified name. Defaults to the name, and is filled in from the enclosing
    /// scope when the element is added to a [`ProtoFile`](crate::ProtoFile).
    pub fn qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = Some(qualified_name.into());
        self
    }

    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Adds a field.
    pub fn add_field(mut self, field: FieldElement) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a oneof.
    pub fn add_oneof(mut self, oneof: OneofElement) -> Self {
        self.oneofs.push(oneof);
        self
    }

    /// Adds a nested message or enum.
    pub fn add_type(mut self, ty: impl Into<TypeElement>) -> Self {
        self.nested_types.push(ty.into());
        self
    }

    /// Adds an extension range.
    pub fn add_extensions(mut self, extensions: ExtensionsElement) -> Self {
        self.extensions.push(extensions);
        self
    }

    /// Adds a `reserved` statement.
    pub fn add_reserved(mut self, reserved: ReservedElement) -> Self {
        self.reserved.push(reserved);
        self
    }

    /// Adds a nested `extend` block.
    pub fn add_extend_declaration(mut self, extend: ExtendElement) -> Self {
        self.extend_declarations.push(extend);
        self
    }

    /// Adds an option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Validates and builds the message.
    ///
    /// Fields, oneof members, oneofs and nested types share a single scope, so their names must
    /// all be distinct.
    pub fn build(self) -> Result<MessageElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("message", "name"))?;
        check_ident("message", &name)?;

        let qualified_name = self.qualified_name.unwrap_or_else(|| name.clone());
        if !is_valid_full_ident(&qualified_name) {
            return Err(ValidationError::InvalidName {
                kind: "qualified",
                name: qualified_name,
            });
        }

        check_unique(
            "message member",
            self.fields
                .iter()
                .chain(self.oneofs.iter().flat_map(|oneof| oneof.fields()))
                .map(FieldElement::name)
                .chain(self.oneofs.iter().map(OneofElement::name))
                .chain(self.nested_types.iter().map(TypeElement::name)),
        )?;

        check_options(&self.options)?;

        Ok(MessageElement {
            name,
            qualified_name,
            documentation: self.documentation,
            fields: self.fields,
            oneofs: self.oneofs,
            nested_types: self.nested_types,
            extensions: self.extensions,
            reserved: self.reserved,
            extend_declarations: self.extend_declarations,
            options: self.options,
        })
    }
}

impl OneofElement {
    /// Creates a new builder.
    pub fn builder() -> OneofElementBuilder {
        OneofElementBuilder::default()
    }

    /// The name of the oneof.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The members of the oneof. None of them have a label.
    pub fn fields(&self) -> &[FieldElement] {
        &self.fields
    }

    /// The `option` statements in the oneof body.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }
}

impl OneofElementBuilder {
    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Adds a member field.
    pub fn add_field(mut self, field: FieldElement) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds an option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Validates and builds the oneof.
    pub fn build(self) -> Result<OneofElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("oneof", "name"))?;
        check_ident("oneof", &name)?;

        if self.fields.is_empty() {
            return Err(ValidationError::EmptyOneof { name });
        }
        if let Some(field) = self.fields.iter().find(|field| field.label().is_some()) {
            return Err(ValidationError::OneofFieldWithLabel {
                name: field.name().to_owned(),
            });
        }
        check_unique("oneof field", self.fields.iter().map(FieldElement::name))?;

        check_options(&self.options)?;

        Ok(OneofElement {
            name,
            documentation: self.documentation,
            fields: self.fields,
            options: self.options,
        })
    }
}

impl ExtensionsElement {
    /// Creates a new builder.
    pub fn builder() -> ExtensionsElementBuilder {
        ExtensionsElementBuilder::default()
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The first field number of the range.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// The last field number of the range, inclusive.
    pub fn end(&self) -> i32 {
        self.end
    }
}

impl ExtensionsElementBuilder {
    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Sets the first field number of the range.
    pub fn start(mut self, start: i32) -> Self {
        self.start = Some(start);
        self
    }

    /// Sets the last field number of the range. Defaults to the start.
    pub fn end(mut self, end: i32) -> Self {
        self.end = Some(end);
        self
    }

    /// Validates and builds the range.
    pub fn build(self) -> Result<ExtensionsElement, ValidationError> {
        let start = self.start.ok_or_else(|| missing("extension range", "start"))?;
        let end = self.end.unwrap_or(start);

        if start < MIN_TAG_VALUE || end > MAX_TAG_VALUE || start > end {
            return Err(ValidationError::InvalidExtensionRange { start, end });
        }

        Ok(ExtensionsElement {
            documentation: self.documentation,
            start,
            end,
        })
    }
}

impl ReservedElement {
    /// Creates a new builder.
    pub fn builder() -> ReservedElementBuilder {
        ReservedElementBuilder::default()
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The reserved numbers, ranges or names.
    pub fn values(&self) -> &[ReservedValue] {
        &self.values
    }
}

impl ReservedElementBuilder {
    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Adds a reserved number, range or name.
    pub fn add_value(mut self, value: ReservedValue) -> Self {
        self.values.push(value);
        self
    }

    /// Validates and builds the statement.
    ///
    /// A statement must contain at least one value, and may not mix names with numbers.
    pub fn build(self) -> Result<ReservedElement, ValidationError> {
        let names = self
            .values
            .iter()
            .filter(|value| matches!(value, ReservedValue::Name(_)))
            .count();
        if self.values.is_empty() || (names != 0 && names != self.values.len()) {
            return Err(ValidationError::InvalidReserved);
        }

        for value in &self.values {
            match *value {
                ReservedValue::Range(start, end) if start > end => {
                    return Err(ValidationError::InvalidReservedRange { start, end })
                }
                ReservedValue::Name(ref name) => check_ident("reserved", name)?,
                _ => (),
            }
        }

        Ok(ReservedElement {
            documentation: self.documentation,
            values: self.values,
        })
    }
}

impl fmt::Display for TypeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeElement::Message(message) => message.fmt(f),
            TypeElement::Enum(enum_) => enum_.fmt(f),
        }
    }
}

impl fmt::Display for MessageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;

        let mut block = Block::new();
        block.group(self.options.iter().map(OptionStatement));
        block.group(&self.reserved);
        block.group(&self.fields);
        block.group(&self.oneofs);
        block.group(&self.extensions);
        block.group(&self.nested_types);
        block.group(&self.extend_declarations);
        block.write(f, format_args!("message {}", self.name))
    }
}

impl fmt::Display for OneofElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;

        let mut block = Block::new();
        block.group(self.options.iter().map(OptionStatement));
        block.group(&self.fields);
        block.write(f, format_args!("oneof {}", self.name))
    }
}

impl fmt::Display for ExtensionsElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;
        if self.start == self.end {
            writeln!(f, "extensions {};", self.start)
        } else if self.end == MAX_TAG_VALUE {
            writeln!(f, "extensions {} to max;", self.start)
        } else {
            writeln!(f, "extensions {} to {};", self.start, self.end)
        }
    }
}

impl fmt::Display for ReservedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;
        f.write_str("reserved ")?;
        for (index, value) in self.values.iter().enumerate() {
            if index != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        writeln!(f, ";")
    }
}

impl fmt::Display for ReservedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservedValue::Tag(tag) => write!(f, "{}", tag),
            ReservedValue::Range(start, end) => write!(f, "{} to {}", start, end),
            ReservedValue::RangeToMax(start) => write!(f, "{} to max", start),
            ReservedValue::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnumConstantElement, Label, OptionValue};

    fn field(label: Option<Label>, name: &str, tag: i32) -> FieldElement {
        let builder = FieldElement::builder().type_name("int32").name(name).tag(tag);
        match label {
            Some(label) => builder.label(label).build().unwrap(),
            None => builder.build().unwrap(),
        }
    }

    #[test]
    fn empty_message() {
        let message = MessageElement::builder().name("Message").build().unwrap();
        assert_eq!(message.qualified_name(), "Message");
        assert_eq!(message.to_string(), "message Message {}\n");
    }

    #[test]
    fn full_message() {
        let nested_enum = EnumElement::builder()
            .name("Kind")
            .qualified_name("pkg.Outer.Kind")
            .add_constant(
                EnumConstantElement::builder()
                    .name("A")
                    .tag(0)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let nested = MessageElement::builder()
            .name("Inner")
            .qualified_name("pkg.Outer.Inner")
            .build()
            .unwrap();
        let oneof = OneofElement::builder()
            .name("choice")
            .documentation("Pick one.")
            .add_field(field(None, "a", 3))
            .add_field(field(None, "b", 4))
            .build()
            .unwrap();

        let message = MessageElement::builder()
            .name("Outer")
            .qualified_name("pkg.Outer")
            .documentation("The outer message.")
            .add_option(OptionElement::new("deprecated", OptionValue::Bool(true)).unwrap())
            .add_reserved(
                ReservedElement::builder()
                    .add_value(ReservedValue::Tag(5))
                    .add_value(ReservedValue::Range(7, 9))
                    .add_value(ReservedValue::RangeToMax(1000))
                    .build()
                    .unwrap(),
            )
            .add_reserved(
                ReservedElement::builder()
                    .add_value(ReservedValue::Name("old".to_owned()))
                    .build()
                    .unwrap(),
            )
            .add_field(field(Some(Label::Required), "id", 1))
            .add_field(field(Some(Label::Repeated), "values", 2))
            .add_oneof(oneof)
            .add_extensions(ExtensionsElement::builder().start(100).end(199).build().unwrap())
            .add_extensions(
                ExtensionsElement::builder()
                    .start(500)
                    .end(MAX_TAG_VALUE)
                    .build()
                    .unwrap(),
            )
            .add_type(nested)
            .add_type(nested_enum)
            .build()
            .unwrap();

        similar_asserts::assert_eq!(
            message.to_string(),
            [
                "// The outer message.",
                "message Outer {",
                "  option deprecated = true;",
                "",
                "  reserved 5, 7 to 9, 1000 to max;",
                "  reserved \"old\";",
                "",
                "  required int32 id = 1;",
                "  repeated int32 values = 2;",
                "",
                "  // Pick one.",
                "  oneof choice {",
                "    int32 a = 3;",
                "    int32 b = 4;",
                "  }",
                "",
                "  extensions 100 to 199;",
                "  extensions 500 to max;",
                "",
                "  message Inner {}",
                "  enum Kind {",
                "    A = 0;",
                "  }",
                "}",
                "",
            ]
            .join("\n")
        );
    }

    #[test]
    fn duplicate_members() {
        assert_eq!(
            MessageElement::builder()
                .name("Dup")
                .add_field(field(Some(Label::Optional), "foo", 1))
                .add_field(field(Some(Label::Optional), "foo", 2))
                .build(),
            Err(ValidationError::DuplicateName {
                kind: "message member",
                name: "foo".to_owned(),
            })
        );

        let oneof = OneofElement::builder()
            .name("choice")
            .add_field(field(None, "foo", 2))
            .build()
            .unwrap();
        assert_eq!(
            MessageElement::builder()
                .name("Dup")
                .add_field(field(Some(Label::Optional), "foo", 1))
                .add_oneof(oneof)
                .build(),
            Err(ValidationError::DuplicateName {
                kind: "message member",
                name: "foo".to_owned(),
            })
        );
    }

    #[test]
    fn invalid_oneofs() {
        assert_eq!(
            OneofElement::builder().name("empty").build(),
            Err(ValidationError::EmptyOneof {
                name: "empty".to_owned(),
            })
        );
        assert_eq!(
            OneofElement::builder()
                .name("labelled")
                .add_field(field(Some(Label::Optional), "foo", 1))
                .build(),
            Err(ValidationError::OneofFieldWithLabel {
                name: "foo".to_owned(),
            })
        );
    }

    #[test]
    fn invalid_ranges() {
        assert_eq!(
            ExtensionsElement::builder().start(10).end(5).build(),
            Err(ValidationError::InvalidExtensionRange { start: 10, end: 5 })
        );
        assert_eq!(
            ExtensionsElement::builder().start(0).build(),
            Err(ValidationError::InvalidExtensionRange { start: 0, end: 0 })
        );
        assert_eq!(
            ReservedElement::builder().build(),
            Err(ValidationError::InvalidReserved)
        );
        assert_eq!(
            ReservedElement::builder()
                .add_value(ReservedValue::Tag(1))
                .add_value(ReservedValue::Name("foo".to_owned()))
                .build(),
            Err(ValidationError::InvalidReserved)
        );
        assert_eq!(
            ReservedElement::builder()
                .add_value(ReservedValue::Range(9, 3))
                .build(),
            Err(ValidationError::InvalidReservedRange { start: 9, end: 3 })
        );
    }
}
