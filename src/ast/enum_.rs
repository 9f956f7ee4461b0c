use std::fmt;

use crate::{
    ast::{
        check_ident, check_unique, missing, normalize_documentation,
        option::{check_options, OptionList, OptionStatement},
        resolve_qualified_name, OptionElement, ReservedElement,
    },
    case::is_valid_full_ident,
    error::ValidationError,
    fmt::{write_documentation, Block},
};

/// An enum declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumElement {
    name: String,
    qualified_name: String,
    documentation: String,
    constants: Vec<EnumConstantElement>,
    options: Vec<OptionElement>,
    reserved: Vec<ReservedElement>,
}

/// A builder for [`EnumElement`].
#[derive(Debug, Default)]
pub struct EnumElementBuilder {
    name: Option<String>,
    qualified_name: Option<String>,
    documentation: String,
    constants: Vec<EnumConstantElement>,
    options: Vec<OptionElement>,
    reserved: Vec<ReservedElement>,
}

/// A value of an enum, such as `FOO = 1;`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumConstantElement {
    name: String,
    tag: i32,
    documentation: String,
    options: Vec<OptionElement>,
}

/// A builder for [`EnumConstantElement`].
#[derive(Debug, Default)]
pub struct EnumConstantElementBuilder {
    name: Option<String>,
    tag: Option<i32>,
    documentation: String,
    options: Vec<OptionElement>,
}

impl EnumElement {
    /// Creates a new builder.
    pub fn builder() -> EnumElementBuilder {
        EnumElementBuilder::default()
    }

    /// The name of the enum.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name of the enum, prefixed with the package and any enclosing messages.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub(crate) fn qualify(&mut self, prefix: &str) -> Result<(), ValidationError> {
        let expected = format!("{}{}", prefix, self.name);
        resolve_qualified_name(&mut self.qualified_name, &self.name, expected)
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The values of the enum.
    pub fn constants(&self) -> &[EnumConstantElement] {
        &self.constants
    }

    /// The `option` statements in the enum body.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }

    /// The `reserved` statements in the enum body.
    pub fn reserved(&self) -> &[ReservedElement] {
        &self.reserved
    }
}

impl EnumElementBuilder {
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

    /// Adds a value.
    pub fn add_constant(mut self, constant: EnumConstantElement) -> Self {
        self.constants.push(constant);
        self
    }

    /// Adds an option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Adds a `reserved` statement.
    pub fn add_reserved(mut self, reserved: ReservedElement) -> Self {
        self.reserved.push(reserved);
        self
    }

    /// Validates and builds the enum.
    pub fn build(self) -> Result<EnumElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("enum", "name"))?;
        check_ident("enum", &name)?;

        let qualified_name = self.qualified_name.unwrap_or_else(|| name.clone());
        if !is_valid_full_ident(&qualified_name) {
            return Err(ValidationError::InvalidName {
                kind: "qualified",
                name: qualified_name,
            });
        }

        check_unique("enum value", self.constants.iter().map(|c| c.name()))?;

        check_options(&self.options)?;

        Ok(EnumElement {
            name,
            qualified_name,
            documentation: self.documentation,
            constants: self.constants,
            options: self.options,
            reserved: self.reserved,
        })
    }
}

impl EnumConstantElement {
    /// Creates a new builder.
    pub fn builder() -> EnumConstantElementBuilder {
        EnumConstantElementBuilder::default()
    }

    /// The name of the value.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The number of the value.
    pub fn tag(&self) -> i32 {
        self.tag
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The options given in brackets after the number.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }
}

impl EnumConstantElementBuilder {
    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the number.
    pub fn tag(mut self, tag: i32) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Adds an option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Validates and builds the value.
    pub fn build(self) -> Result<EnumConstantElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("enum value", "name"))?;
        let tag = self.tag.ok_or_else(|| missing("enum value", "number"))?;
        check_ident("enum value", &name)?;

        check_options(&self.options)?;

        Ok(EnumConstantElement {
            name,
            tag,
            documentation: self.documentation,
            options: self.options,
        })
    }
}

impl fmt::Display for EnumElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;

        let mut block = Block::new();
        block.group(self.options.iter().map(OptionStatement));
        block.group(&self.reserved);
        block.group(&self.constants);
        block.write(f, format_args!("enum {}", self.name))
    }
}

impl fmt::Display for EnumConstantElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;
        writeln!(
            f,
            "{} = {}{};",
            self.name,
            self.tag,
            OptionList(&self.options)
        )
    }
}
