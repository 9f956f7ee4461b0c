use std::fmt;

use crate::{
    ast::{
        check_ident, missing, normalize_documentation,
        option::{check_options, OptionList},
        OptionElement,
    },
    case::{is_keyword_type, is_map_type, normalize_field_type},
    error::ValidationError,
    fmt::write_documentation,
    is_valid_tag,
};

/// The label of a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Label {
    /// `optional`
    Optional,
    /// `required`
    Required,
    /// `repeated`
    Repeated,
}

/// A field of a message, oneof or extend block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldElement {
    label: Option<Label>,
    type_name: String,
    name: String,
    tag: i32,
    documentation: String,
    options: Vec<OptionElement>,
}

/// A builder for [`FieldElement`].
#[derive(Debug, Default)]
pub struct FieldElementBuilder {
    label: Option<Label>,
    type_name: Option<String>,
    name: Option<String>,
    tag: Option<i32>,
    documentation: String,
    options: Vec<OptionElement>,
}

impl FieldElement {
    /// Creates a new builder.
    pub fn builder() -> FieldElementBuilder {
        FieldElementBuilder::default()
    }

    /// The label of the field, or `None` if it was declared without one.
    pub fn label(&self) -> Option<Label> {
        self.label
    }

    /// The type of the field as written, for example `int32`, `.foo.Bar` or `map<string, Bar>`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field number.
    pub fn tag(&self) -> i32 {
        self.tag
    }

    /// The documentation comment, or an empty string.
    pub fn documentation(&self) -> &str {
        &self.documentation
    }

    /// The options given in brackets after the field number.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }

    /// Returns `true` if this is a map field.
    pub fn is_map(&self) -> bool {
        is_map_type(&self.type_name)
    }
}

impl FieldElementBuilder {
    /// Sets the label.
    pub fn label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// Sets the type.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Sets the name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the field number.
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

    /// Validates and builds the field.
    pub fn build(self) -> Result<FieldElement, ValidationError> {
        let name = self.name.ok_or_else(|| missing("field", "name"))?;
        let raw_type = self.type_name.ok_or_else(|| missing("field", "type"))?;
        let tag = self.tag.ok_or_else(|| missing("field", "tag"))?;

        check_ident("field", &name)?;
        let type_name = match normalize_field_type(&raw_type) {
            Some(type_name) => type_name,
            None => {
                return Err(ValidationError::InvalidTypeName {
                    name,
                    ty: raw_type,
                })
            }
        };
        if !is_valid_tag(tag) {
            return Err(ValidationError::InvalidTag { name, tag });
        }
        if self.label.is_some() && is_map_type(&type_name) {
            return Err(ValidationError::MapFieldWithLabel { name });
        }
        if self.label.is_none() && is_keyword_type(&type_name) {
            return Err(ValidationError::ReservedTypeName {
                name,
                ty: type_name,
            });
        }

        check_options(&self.options)?;

        Ok(FieldElement {
            label: self.label,
            type_name,
            name,
            tag,
            documentation: self.documentation,
            options: self.options,
        })
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Optional => write!(f, "optional"),
            Label::Required => write!(f, "required"),
            Label::Repeated => write!(f, "repeated"),
        }
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_documentation(f, &self.documentation)?;
        if let Some(label) = self.label {
            write!(f, "{} ", label)?;
        }
        writeln!(
            f,
            "{} {} = {}{};",
            self.type_name,
            self.name,
            self.tag,
            OptionList(&self.options)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptionValue;

    #[test]
    fn render() {
        let field = FieldElement::builder()
            .label(Label::Optional)
            .type_name("string")
            .name("name")
            .tag(1)
            .documentation("  The name.\n  Second line.  ")
            .add_option(OptionElement::new("deprecated", OptionValue::Bool(true)).unwrap())
            .add_option(
                OptionElement::new("default", OptionValue::String("bob".to_owned())).unwrap(),
            )
            .build()
            .unwrap();
        assert_eq!(field.documentation(), "The name.\nSecond line.");
        assert_eq!(
            field.to_string(),
            "// The name.\n// Second line.\noptional string name = 1 [deprecated = true, default = \"bob\"];\n"
        );

        let field = FieldElement::builder()
            .type_name("map<string,Foo>")
            .name("things")
            .tag(2)
            .build()
            .unwrap();
        assert!(field.is_map());
        assert_eq!(field.label(), None);
        assert_eq!(field.to_string(), "map<string, Foo> things = 2;\n");
    }

    #[test]
    fn invalid_tags() {
        for tag in [0, -1, 19_000, 19_999, 536_870_912] {
            assert_eq!(
                FieldElement::builder()
                    .type_name("int32")
                    .name("foo")
                    .tag(tag)
                    .build(),
                Err(ValidationError::InvalidTag {
                    name: "foo".to_owned(),
                    tag,
                })
            );
        }
    }

    #[test]
    fn invalid_fields() {
        assert_eq!(
            FieldElement::builder().type_name("int32").tag(1).build(),
            Err(ValidationError::MissingProperty {
                element: "field",
                property: "name",
            })
        );
        assert_eq!(
            FieldElement::builder().type_name("int32").name("").tag(1).build(),
            Err(ValidationError::InvalidName {
                kind: "field",
                name: String::new(),
            })
        );
        assert_eq!(
            FieldElement::builder().type_name("in t32").name("foo").tag(1).build(),
            Err(ValidationError::InvalidTypeName {
                name: "foo".to_owned(),
                ty: "in t32".to_owned(),
            })
        );
        assert_eq!(
            FieldElement::builder()
                .label(Label::Repeated)
                .type_name("map<int32, int32>")
                .name("foo")
                .tag(1)
                .build(),
            Err(ValidationError::MapFieldWithLabel {
                name: "foo".to_owned(),
            })
        );
    }

    #[test]
    fn keyword_types_need_a_label() {
        for ty in ["optional", "repeated", "message", "oneof", "extensions", "option.Foo"] {
            assert_eq!(
                FieldElement::builder().type_name(ty).name("foo").tag(1).build(),
                Err(ValidationError::ReservedTypeName {
                    name: "foo".to_owned(),
                    ty: ty.to_owned(),
                })
            );
        }

        let field = FieldElement::builder()
            .label(Label::Optional)
            .type_name("optional")
            .name("foo")
            .tag(1)
            .build()
            .unwrap();
        assert_eq!(field.to_string(), "optional optional foo = 1;\n");

        let field = FieldElement::builder()
            .type_name(".message.Foo")
            .name("foo")
            .tag(1)
            .build()
            .unwrap();
        assert_eq!(field.to_string(), ".message.Foo foo = 1;\n");
    }
}
