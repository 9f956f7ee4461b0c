use std::fmt;

use crate::{
    ast::{
        check_unique, missing, normalize_documentation, resolve_qualified_name, FieldElement,
    },
    case::{is_valid_full_ident, is_valid_type_name},
    error::ValidationError,
    fmt::{write_documentation, Block},
};

/// An `extend` block, which adds fields to a message declared elsewhere.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtendElement {
    name: String,
    qualified_name: String,
    documentation: String,
    fields: Vec<FieldElement>,
}

/// A builder for [`ExtendElement`].
#[derive(Debug, Default)]
pub struct ExtendElementBuilder {
    name: Option<String>,
    qualified_name: Option<String>,
    documentation: String,
    fields: Vec<FieldElement>,
}

impl ExtendElement {
    /// Creates a new builder.
    pub fn builder() -> ExtendElementBuilder {
        ExtendElementBuilder::default()
    }

    /// The name of the extended message, as written. May start with `.` if fully qualified.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved name of the extended message.
    ///
    /// A name containing a `.` is taken to be qualified already, otherwise it is assumed to refer
    /// to a type in the enclosing package.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub(crate) fn qualify(&mut self, prefix: &str) -> Result<(), ValidationError> {
        let expected = match self.name.strip_prefix('.') {
            Some(qualified) => qualified.to_owned(),
            None if self.name.contains('.') => self.name.clone(),
            None => format!("{}{}", prefix, self.name),
        };
        let default = self.name.trim_start_matches('.');
        resolve_qualified_name(&mut self.qualified_name, default, expected)
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The extension fields.
    pub fn fields(&self) -> &[FieldElement] {
        &self.fields
    }
}

impl ExtendElementBuilder {
    /// Sets the name of the extended message.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the resolved name of the extended message. Defaults to the name, without any leading `.`.
    pub fn qualified_name(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = Some(qualified_name.into());
        self
    }

    /// Sets the documentation comment.
    pub fn documentation(mut self, documentation: impl AsRef<str>) -> Self {
        self.documentation = normalize_documentation(documentation.as_ref());
        self
    }

    /// Adds an extension field.
    pub fn add_field(mut self, field: FieldElement) -> Self {
        self.fields.push(field);
        self
    }

    /// Validates and builds the extend block.
    pub fn build(self) -> Result<ExtendElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("extend", "name"))?;
        if !is_valid_type_name(&name) {
            return Err(ValidationError::InvalidName {
                kind: "extend",
                name,
            });
        }

        let qualified_name = self
            .qualified_name
            .unwrap_or_else(|| name.trim_start_matches('.').to_owned());
        if !is_valid_full_ident(&qualified_name) {
            return Err(ValidationError::InvalidName {
                kind: "qualified",
                name: qualified_name,
            });
        }

        check_unique("extension field", self.fields.iter().map(FieldElement::name))?;

        Ok(ExtendElement {
            name,
            qualified_name,
            documentation: self.documentation,
            fields: self.fields,
        })
    }
}

impl fmt::Display for ExtendElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;

        let mut block = Block::new();
        block.group(&self.fields);
        block.write(f, format_args!("extend {}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;

    #[test]
    fn render() {
        let extend = ExtendElement::builder()
            .name(".google.protobuf.FieldOptions")
            .documentation("Custom options.")
            .add_field(
                FieldElement::builder()
                    .label(Label::Optional)
                    .type_name("string")
                    .name("my_option")
                    .tag(51234)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        assert_eq!(extend.qualified_name(), "google.protobuf.FieldOptions");
        assert_eq!(
            extend.to_string(),
            "// Custom options.\n\
             extend .google.protobuf.FieldOptions {\n  \
               optional string my_option = 51234;\n\
             }\n"
        );
    }

    #[test]
    fn empty() {
        let extend = ExtendElement::builder().name("Foo").build().unwrap();
        assert_eq!(extend.qualified_name(), "Foo");
        assert_eq!(extend.to_string(), "extend Foo {}\n");
    }

    #[test]
    fn invalid_name() {
        assert_eq!(
            ExtendElement::builder().name("foo..Bar").build(),
            Err(ValidationError::InvalidName {
                kind: "extend",
                name: "foo..Bar".to_owned(),
            })
        );
        assert_eq!(
            ExtendElement::builder().build(),
            Err(ValidationError::MissingProperty {
                element: "extend",
                property: "name",
            })
        );
    }
}
