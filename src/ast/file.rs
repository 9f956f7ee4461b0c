use std::{fmt, str::FromStr};

use crate::{
    ast::{
        check_unique, missing,
        option::{check_options, OptionStatement},
        ExtendElement, FieldElement, Label, OptionElement, ServiceElement, TypeElement,
    },
    case::is_valid_full_ident,
    error::ValidationError,
    fmt::Escaped,
};

/// The `syntax` version of a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Syntax {
    /// `syntax = "proto2";`
    Proto2,
    /// `syntax = "proto3";`
    Proto3,
}

/// A single parsed protobuf source file.
///
/// This is the root of the syntax tree returned by [`parse()`](crate::parse). Its [`Display`]
/// implementation (or [`render()`](ProtoFile::render)) writes the file back out as canonical
/// schema text, which parses to a value equal to the original.
///
/// [`Display`]: std::fmt::Display
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoFile {
    file_name: String,
    syntax: Option<Syntax>,
    package_name: Option<String>,
    dependencies: Vec<String>,
    public_dependencies: Vec<String>,
    types: Vec<TypeElement>,
    services: Vec<ServiceElement>,
    extend_declarations: Vec<ExtendElement>,
    options: Vec<OptionElement>,
}

/// A builder for [`ProtoFile`].
#[derive(Debug)]
pub struct ProtoFileBuilder {
    file_name: String,
    syntax: Option<Syntax>,
    package_name: Option<String>,
    dependencies: Vec<String>,
    public_dependencies: Vec<String>,
    types: Vec<TypeElement>,
    services: Vec<ServiceElement>,
    extend_declarations: Vec<ExtendElement>,
    options: Vec<OptionElement>,
}

impl Syntax {
    /// The string used for this syntax in a `syntax` statement.
    pub fn as_str(&self) -> &'static str {
        match self {
            Syntax::Proto2 => "proto2",
            Syntax::Proto3 => "proto3",
        }
    }
}

impl FromStr for Syntax {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proto2" => Ok(Syntax::Proto2),
            "proto3" => Ok(Syntax::Proto3),
            _ => Err(ValidationError::UnknownSyntax {
                syntax: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProtoFile {
    /// Creates a new builder for a file with the given name.
    pub fn builder(file_name: impl Into<String>) -> ProtoFileBuilder {
        ProtoFileBuilder {
            file_name: file_name.into(),
            syntax: None,
            package_name: None,
            dependencies: Vec::new(),
            public_dependencies: Vec::new(),
            types: Vec::new(),
            services: Vec::new(),
            extend_declarations: Vec::new(),
            options: Vec::new(),
        }
    }

    /// The logical name of the file, such as `foo/bar.proto`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The syntax version declared by the file, if any.
    pub fn syntax(&self) -> Option<Syntax> {
        self.syntax
    }

    /// The package name declared by the file, if any.
    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    /// The plain (and weak) imports of the file.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// The `import public` statements of the file.
    pub fn public_dependencies(&self) -> &[String] {
        &self.public_dependencies
    }

    /// The top-level messages and enums.
    pub fn types(&self) -> &[TypeElement] {
        &self.types
    }

    /// The services.
    pub fn services(&self) -> &[ServiceElement] {
        &self.services
    }

    /// The top-level `extend` blocks.
    pub fn extend_declarations(&self) -> &[ExtendElement] {
        &self.extend_declarations
    }

    /// The file-level `option` statements.
    pub fn options(&self) -> &[OptionElement] {
        &self.options
    }

    /// Renders the file as canonical schema text.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl ProtoFileBuilder {
    /// Sets the syntax version.
    pub fn syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = Some(syntax);
        self
    }

    /// Sets the package name.
    pub fn package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = Some(package_name.into());
        self
    }

    /// Adds a plain import.
    pub fn add_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    /// Adds an `import public`.
    pub fn add_public_dependency(mut self, dependency: impl Into<String>) -> Self {
        self.public_dependencies.push(dependency.into());
        self
    }

    /// Adds a top-level message or enum.
    pub fn add_type(mut self, ty: impl Into<TypeElement>) -> Self {
        self.types.push(ty.into());
        self
    }

    /// Adds a service.
    pub fn add_service(mut self, service: ServiceElement) -> Self {
        self.services.push(service);
        self
    }

    /// Adds a top-level `extend` block.
    pub fn add_extend_declaration(mut self, extend: ExtendElement) -> Self {
        self.extend_declarations.push(extend);
        self
    }

    /// Adds a file-level option.
    pub fn add_option(mut self, option: OptionElement) -> Self {
        self.options.push(option);
        self
    }

    /// Validates and builds the file.
    ///
    /// In addition to checking the file's own properties, this checks that the labels of every
    /// field in the file are consistent with its syntax: without `syntax = "proto3"`, every field
    /// outside a oneof that is not a map must have a label, and with it, no field may be
    /// `required`.
    ///
    /// Qualified names are derived from the package and the enclosing messages, the same way the
    /// parser derives them. An element whose qualified name was left unset receives the derived
    /// name; an explicit qualified name that differs from it is an error.
    pub fn build(mut self) -> Result<ProtoFile, ValidationError> {
        if self.file_name.is_empty() || self.file_name.contains('\n') {
            return Err(ValidationError::InvalidFileName {
                name: self.file_name,
            });
        }
        if let Some(package_name) = &self.package_name {
            if !is_valid_full_ident(package_name) {
                return Err(ValidationError::InvalidName {
                    kind: "package",
                    name: package_name.clone(),
                });
            }
        }
        if self
            .dependencies
            .iter()
            .chain(&self.public_dependencies)
            .any(|dependency| dependency.is_empty())
        {
            return Err(missing("import", "path"));
        }

        check_unique(
            "top-level",
            self.types
                .iter()
                .map(TypeElement::name)
                .chain(self.services.iter().map(ServiceElement::name)),
        )?;

        let prefix = match &self.package_name {
            Some(package_name) => format!("{}.", package_name),
            None => String::new(),
        };
        for ty in &mut self.types {
            ty.qualify(&prefix)?;
        }
        for service in &mut self.services {
            service.qualify(&prefix)?;
        }
        for extend in &mut self.extend_declarations {
            extend.qualify(&prefix)?;
        }

        let labels = LabelCheck {
            syntax: self.syntax,
        };
        labels.check_types(&self.types)?;
        labels.check_extends(&self.extend_declarations)?;

        check_options(&self.options)?;

        Ok(ProtoFile {
            file_name: self.file_name,
            syntax: self.syntax,
            package_name: self.package_name,
            dependencies: self.dependencies,
            public_dependencies: self.public_dependencies,
            types: self.types,
            services: self.services,
            extend_declarations: self.extend_declarations,
            options: self.options,
        })
    }
}

struct LabelCheck {
    syntax: Option<Syntax>,
}

impl LabelCheck {
    fn check_types(&self, types: &[TypeElement]) -> Result<(), ValidationError> {
        for ty in types {
            if let TypeElement::Message(message) = ty {
                self.check_fields(message.fields())?;
                self.check_types(message.nested_types())?;
                self.check_extends(message.extend_declarations())?;
            }
        }
        Ok(())
    }

    fn check_extends(&self, extends: &[ExtendElement]) -> Result<(), ValidationError> {
        extends
            .iter()
            .try_for_each(|extend| self.check_fields(extend.fields()))
    }

    // Oneof members are checked by the oneof builder.
    fn check_fields(&self, fields: &[FieldElement]) -> Result<(), ValidationError> {
        for field in fields {
            match (self.syntax, field.label()) {
                (Some(Syntax::Proto3), Some(Label::Required)) => {
                    return Err(ValidationError::Proto3RequiredField {
                        name: field.name().to_owned(),
                    })
                }
                (Some(Syntax::Proto2) | None, None) if !field.is_map() => {
                    return Err(ValidationError::MissingLabel {
                        name: field.name().to_owned(),
                    })
                }
                _ => (),
            }
        }
        Ok(())
    }
}

impl fmt::Display for ProtoFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// {}", self.file_name)?;
        if let Some(syntax) = self.syntax {
            writeln!(f, "syntax = \"{}\";", syntax)?;
        }
        if let Some(package_name) = &self.package_name {
            writeln!(f, "package {};", package_name)?;
        }

        if !self.dependencies.is_empty() || !self.public_dependencies.is_empty() {
            writeln!(f)?;
            for dependency in &self.dependencies {
                writeln!(f, "import \"{}\";", Escaped(dependency))?;
            }
            for dependency in &self.public_dependencies {
                writeln!(f, "import public \"{}\";", Escaped(dependency))?;
            }
        }

        write_section(f, self.options.iter().map(OptionStatement))?;
        write_section(f, &self.types)?;
        write_section(f, &self.extend_declarations)?;
        write_section(f, &self.services)
    }
}

fn write_section<I>(f: &mut fmt::Formatter<'_>, members: I) -> fmt::Result
where
    I: IntoIterator,
    I::Item: fmt::Display,
{
    let mut members = members.into_iter().peekable();
    if members.peek().is_some() {
        writeln!(f)?;
    }
    members.try_for_each(|member| write!(f, "{}", member))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageElement, OneofElement, OptionValue};

    fn field(label: Option<Label>, type_name: &str, name: &str) -> FieldElement {
        let builder = FieldElement::builder().type_name(type_name).name(name).tag(1);
        match label {
            Some(label) => builder.label(label).build().unwrap(),
            None => builder.build().unwrap(),
        }
    }

    fn message_with(field: FieldElement) -> MessageElement {
        MessageElement::builder()
            .name("Message")
            .add_field(field)
            .build()
            .unwrap()
    }

    #[test]
    fn empty_file() {
        let file = ProtoFile::builder("file.proto").build().unwrap();
        assert_eq!(file.render(), "// file.proto\n");
    }

    #[test]
    fn syntax_and_package() {
        let file = ProtoFile::builder("file.proto")
            .syntax(Syntax::Proto3)
            .package_name("example.simple")
            .build()
            .unwrap();
        assert_eq!(
            file.render(),
            "// file.proto\nsyntax = \"proto3\";\npackage example.simple;\n"
        );
    }

    #[test]
    fn options_section() {
        let file = ProtoFile::builder("file.proto")
            .add_option(OptionElement::new("kit", OptionValue::String("kat".to_owned())).unwrap())
            .add_type(MessageElement::builder().name("Message").build().unwrap())
            .build()
            .unwrap();
        assert_eq!(
            file.render(),
            "// file.proto\n\noption kit = \"kat\";\n\nmessage Message {}\n"
        );
    }

    #[test]
    fn syntax_from_str() {
        assert_eq!("proto2".parse::<Syntax>(), Ok(Syntax::Proto2));
        assert_eq!("proto3".parse::<Syntax>(), Ok(Syntax::Proto3));
        assert_eq!(
            "proto4".parse::<Syntax>(),
            Err(ValidationError::UnknownSyntax {
                syntax: "proto4".to_owned(),
            })
        );
    }

    #[test]
    fn invalid_files() {
        assert_eq!(
            ProtoFile::builder("").build(),
            Err(ValidationError::InvalidFileName {
                name: String::new(),
            })
        );
        assert_eq!(
            ProtoFile::builder("file.proto")
                .package_name("foo..bar")
                .build(),
            Err(ValidationError::InvalidName {
                kind: "package",
                name: "foo..bar".to_owned(),
            })
        );
        assert_eq!(
            ProtoFile::builder("file.proto")
                .add_type(MessageElement::builder().name("Foo").build().unwrap())
                .add_service(ServiceElement::builder().name("Foo").build().unwrap())
                .build(),
            Err(ValidationError::DuplicateName {
                kind: "top-level",
                name: "Foo".to_owned(),
            })
        );
    }

    #[test]
    fn qualified_names_follow_package_and_nesting() {
        let inner = MessageElement::builder().name("Inner").build().unwrap();
        let kind = crate::EnumElement::builder().name("Kind").build().unwrap();
        let nested_extend = ExtendElement::builder().name("Other").build().unwrap();
        let outer = MessageElement::builder()
            .name("Outer")
            .add_type(inner)
            .add_type(kind)
            .add_extend_declaration(nested_extend)
            .build()
            .unwrap();
        let file = ProtoFile::builder("file.proto")
            .syntax(Syntax::Proto3)
            .package_name("example.simple")
            .add_type(outer)
            .add_service(ServiceElement::builder().name("Service").build().unwrap())
            .add_extend_declaration(ExtendElement::builder().name("Outer").build().unwrap())
            .add_extend_declaration(
                ExtendElement::builder()
                    .name(".google.protobuf.FieldOptions")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        let outer = &file.types()[0];
        assert_eq!(outer.qualified_name(), "example.simple.Outer");
        assert_eq!(
            outer.nested_types()[0].qualified_name(),
            "example.simple.Outer.Inner"
        );
        assert_eq!(
            outer.nested_types()[1].qualified_name(),
            "example.simple.Outer.Kind"
        );
        match outer {
            TypeElement::Message(message) => assert_eq!(
                message.extend_declarations()[0].qualified_name(),
                "example.simple.Outer.Other"
            ),
            TypeElement::Enum(_) => panic!("expected a message"),
        }
        assert_eq!(file.services()[0].qualified_name(), "example.simple.Service");
        assert_eq!(
            file.extend_declarations()[0].qualified_name(),
            "example.simple.Outer"
        );
        assert_eq!(
            file.extend_declarations()[1].qualified_name(),
            "google.protobuf.FieldOptions"
        );
    }

    #[test]
    fn qualified_names_without_package() {
        let inner = MessageElement::builder().name("Inner").build().unwrap();
        let outer = MessageElement::builder()
            .name("Outer")
            .add_type(inner)
            .build()
            .unwrap();
        let file = ProtoFile::builder("file.proto")
            .syntax(Syntax::Proto3)
            .add_type(outer)
            .build()
            .unwrap();

        assert_eq!(file.types()[0].qualified_name(), "Outer");
        assert_eq!(
            file.types()[0].nested_types()[0].qualified_name(),
            "Outer.Inner"
        );
    }

    #[test]
    fn mismatched_qualified_name() {
        let message = MessageElement::builder()
            .name("Message")
            .qualified_name("other.Message")
            .build()
            .unwrap();
        assert_eq!(
            ProtoFile::builder("file.proto")
                .package_name("example")
                .add_type(message)
                .build(),
            Err(ValidationError::QualifiedNameMismatch {
                name: "other.Message".to_owned(),
                expected: "example.Message".to_owned(),
            })
        );
    }

    #[test]
    fn label_rules() {
        assert_eq!(
            ProtoFile::builder("file.proto")
                .add_type(message_with(field(None, "int32", "foo")))
                .build(),
            Err(ValidationError::MissingLabel {
                name: "foo".to_owned(),
            })
        );
        assert!(ProtoFile::builder("file.proto")
            .syntax(Syntax::Proto3)
            .add_type(message_with(field(None, "int32", "foo")))
            .build()
            .is_ok());
        assert_eq!(
            ProtoFile::builder("file.proto")
                .syntax(Syntax::Proto3)
                .add_type(message_with(field(Some(Label::Required), "int32", "foo")))
                .build(),
            Err(ValidationError::Proto3RequiredField {
                name: "foo".to_owned(),
            })
        );

        let oneof = OneofElement::builder()
            .name("choice")
            .add_field(field(None, "int32", "foo"))
            .build()
            .unwrap();
        let message = MessageElement::builder()
            .name("Message")
            .add_field(field(None, "map<string, int32>", "bar"))
            .add_oneof(oneof)
            .build()
            .unwrap();
        assert!(ProtoFile::builder("file.proto")
            .syntax(Syntax::Proto2)
            .add_type(message)
            .build()
            .is_ok());

        let nested = message_with(field(None, "int32", "foo"));
        let outer = MessageElement::builder()
            .name("Outer")
            .add_type(nested)
            .build()
            .unwrap();
        assert_eq!(
            ProtoFile::builder("file.proto").add_type(outer).build(),
            Err(ValidationError::MissingLabel {
                name: "foo".to_owned(),
            })
        );
    }
}
