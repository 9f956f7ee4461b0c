use std::{fmt, ops::Range};

use miette::{Diagnostic, NamedSource};
use thiserror::Error;

use crate::lines::LineResolver;

pub(crate) type Span = Range<usize>;

/// An error that may occur while parsing a protobuf source file.
///
/// The error records the name of the file, and the line and column of the offending source, so
/// it can be reported without access to the original text. It also implements
/// [`Diagnostic`], so a [`miette::Report`] will render the source snippet along with any labels.
#[derive(Error, Diagnostic)]
#[error("{}", kind)]
#[diagnostic(forward(kind))]
pub struct ParseError {
    kind: Box<ParseErrorKind>,
    file: String,
    line: usize,
    column: usize,
    #[source_code]
    source_code: NamedSource,
}

/// The broad category of a [`ParseError`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A malformed token, such as an unterminated string or comment.
    Lex,
    /// The token stream does not match the protobuf grammar.
    Syntax,
    /// The source is well-formed, but violates a rule such as the allowed range of field numbers,
    /// or defines the same name twice.
    Validation,
}

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub(crate) enum ParseErrorKind {
    #[error("invalid token")]
    InvalidToken {
        #[label("found here")]
        span: Span,
    },
    #[error("integer is too large")]
    IntegerOutOfRange {
        #[label("integer defined here")]
        span: Span,
    },
    #[error("invalid string character")]
    InvalidStringCharacters {
        #[label("invalid characters")]
        span: Span,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },
    #[error("invalid string escape")]
    InvalidStringEscape {
        #[label("defined here")]
        span: Span,
    },
    #[error("string is not valid utf-8")]
    InvalidUtf8String {
        #[label("defined here")]
        span: Span,
    },
    #[error("nested block comments are not supported")]
    NestedBlockComment {
        #[label("defined here")]
        span: Span,
    },
    #[error("unterminated block comment")]
    UnterminatedComment {
        #[label("comment starts here")]
        span: Span,
    },
    #[error("whitespace is required between an integer literal and an identifier")]
    NoSpaceBetweenIntAndIdent {
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but reached end of file")]
    UnexpectedEof {
        expected: String,
        #[label("file ends here")]
        span: Span,
    },
    #[error("unknown syntax '{syntax}'")]
    #[diagnostic(help("possible values are 'proto2' and 'proto3'"))]
    UnknownSyntax {
        syntax: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("the syntax statement must be the first statement in the file")]
    SyntaxNotFirst {
        #[label("defined here")]
        span: Span,
    },
    #[error("multiple package names specified")]
    DuplicatePackage {
        #[label("defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("'{name}' is already defined at {first_position}")]
    DuplicateName {
        name: String,
        first_position: Position,
        #[label("first defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("invalid identifier '{name}'")]
    #[diagnostic(help("identifiers must consist of letters, numbers and underscores, and may not start with a number"))]
    InvalidIdentifier {
        name: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("field '{name}' has invalid number {tag}")]
    #[diagnostic(help(
        "field numbers must be between 1 and 536,870,911, excluding 19,000 to 19,999"
    ))]
    InvalidTag {
        name: String,
        tag: i64,
        #[label("defined here")]
        span: Span,
    },
    #[error("enum value '{name}' has invalid number {value}")]
    #[diagnostic(help("enum numbers must be between -2,147,483,648 and 2,147,483,647"))]
    InvalidEnumValue {
        name: String,
        value: i64,
        #[label("defined here")]
        span: Span,
    },
    #[error("fields must have a label with proto2 syntax (expected one of 'optional', 'repeated' or 'required')")]
    Proto2FieldMissingLabel {
        #[label("field defined here")]
        span: Span,
    },
    #[error("required fields are not allowed in proto3 syntax")]
    Proto3RequiredField {
        #[label("defined here")]
        span: Span,
    },
    #[error("map fields cannot have labels")]
    MapFieldWithLabel {
        #[label("defined here")]
        span: Span,
    },
    #[error("oneof fields cannot have labels")]
    OneofFieldWithLabel {
        #[label("defined here")]
        span: Span,
    },
    #[error("{err}")]
    Invalid {
        err: ValidationError,
        #[label("defined here")]
        span: Span,
    },
}

/// An error returned when building an element with invalid contents.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required property of a builder was never set.
    #[error("{element} is missing a {property}")]
    MissingProperty {
        /// The kind of element being built.
        element: &'static str,
        /// The name of the property which was not set.
        property: &'static str,
    },
    /// The file name is empty or spans multiple lines.
    #[error("invalid file name '{name}'")]
    InvalidFileName {
        /// The invalid file name.
        name: String,
    },
    /// The syntax string is neither `proto2` nor `proto3`.
    #[error("unknown syntax '{syntax}'")]
    #[diagnostic(help("possible values are 'proto2' and 'proto3'"))]
    UnknownSyntax {
        /// The unrecognized syntax string.
        syntax: String,
    },
    /// A name is not a valid identifier, or dotted identifier where one is allowed.
    #[error("invalid {kind} name '{name}'")]
    InvalidName {
        /// The kind of element being named.
        kind: &'static str,
        /// The invalid name.
        name: String,
    },
    /// A field type is not a scalar type, type name or map type.
    #[error("invalid type '{ty}' for field '{name}'")]
    InvalidTypeName {
        /// The name of the field.
        name: String,
        /// The invalid type.
        ty: String,
    },
    /// A field number is outside the valid range.
    #[error("field '{name}' has invalid number {tag}")]
    #[diagnostic(help(
        "field numbers must be between 1 and 536,870,911, excluding 19,000 to 19,999"
    ))]
    InvalidTag {
        /// The name of the field.
        name: String,
        /// The invalid number.
        tag: i32,
    },
    /// An extension range is empty or outside the valid range of field numbers.
    #[error("invalid extension range {start} to {end}")]
    InvalidExtensionRange {
        /// The start of the range.
        start: i32,
        /// The end of the range.
        end: i32,
    },
    /// A reserved range ends before it starts.
    #[error("invalid reserved range {start} to {end}")]
    InvalidReservedRange {
        /// The start of the range.
        start: i32,
        /// The end of the range.
        end: i32,
    },
    /// A reserved statement has no values, or mixes names and numbers.
    #[error("reserved statements must contain either names or numbers, and may not be empty")]
    InvalidReserved,
    /// A oneof has no fields.
    #[error("oneof '{name}' must have at least one field")]
    EmptyOneof {
        /// The name of the oneof.
        name: String,
    },
    /// Two members of the same scope share a name.
    #[error("{kind} '{name}' is defined more than once")]
    DuplicateName {
        /// The kind of scope in which the name is defined.
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },
    /// A field in a proto2 file has no label.
    #[error("field '{name}' must have a label with proto2 syntax (expected one of 'optional', 'repeated' or 'required')")]
    MissingLabel {
        /// The name of the field.
        name: String,
    },
    /// A field in a proto3 file is marked as required.
    #[error("field '{name}' is required, which is not allowed in proto3 syntax")]
    Proto3RequiredField {
        /// The name of the field.
        name: String,
    },
    /// A map field has a label.
    #[error("map field '{name}' cannot have a label")]
    MapFieldWithLabel {
        /// The name of the field.
        name: String,
    },
    /// A oneof member has a label.
    #[error("oneof field '{name}' cannot have a label")]
    OneofFieldWithLabel {
        /// The name of the field.
        name: String,
    },
    /// A qualified name does not match the package and enclosing messages of its element.
    #[error("qualified name '{name}' does not match its position in the file (expected '{expected}')")]
    QualifiedNameMismatch {
        /// The qualified name set on the element.
        name: String,
        /// The qualified name implied by the file's package and the enclosing messages.
        expected: String,
    },
    /// A field type would be read back as a keyword.
    #[error("field '{name}' cannot have type '{ty}', which is a keyword in this position")]
    ReservedTypeName {
        /// The name of the field.
        name: String,
        /// The type which clashes with a keyword.
        ty: String,
    },
    /// A numeric option value is not a valid integer or float literal.
    #[error("invalid numeric value '{value}'")]
    InvalidNumber {
        /// The invalid value.
        value: String,
    },
}

/// A 1-based line and column in a source file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Position {
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, name: &str, source: &str) -> Self {
        let offset = kind.span().map_or(source.len(), |span| span.start);
        let (line, column) = LineResolver::new(source).resolve(offset);
        ParseError {
            kind: Box::new(kind),
            file: name.to_owned(),
            line: line + 1,
            column: column + 1,
            source_code: NamedSource::new(name, source.to_owned()),
        }
    }

    /// Gets the name of the file in which this error occurred.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Gets the 1-based line number at which this error occurred.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Gets the 1-based column number at which this error occurred.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Gets the primary source code span associated with this error, if any.
    pub fn span(&self) -> Option<Range<usize>> {
        self.kind.span()
    }

    /// Gets the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match &*self.kind {
            ParseErrorKind::InvalidToken { .. }
            | ParseErrorKind::IntegerOutOfRange { .. }
            | ParseErrorKind::InvalidStringCharacters { .. }
            | ParseErrorKind::UnterminatedString { .. }
            | ParseErrorKind::InvalidStringEscape { .. }
            | ParseErrorKind::InvalidUtf8String { .. }
            | ParseErrorKind::NestedBlockComment { .. }
            | ParseErrorKind::UnterminatedComment { .. }
            | ParseErrorKind::NoSpaceBetweenIntAndIdent { .. } => ErrorCategory::Lex,
            ParseErrorKind::UnexpectedToken { .. }
            | ParseErrorKind::UnexpectedEof { .. }
            | ParseErrorKind::SyntaxNotFirst { .. } => ErrorCategory::Syntax,
            ParseErrorKind::UnknownSyntax { .. }
            | ParseErrorKind::DuplicatePackage { .. }
            | ParseErrorKind::DuplicateName { .. }
            | ParseErrorKind::InvalidIdentifier { .. }
            | ParseErrorKind::InvalidTag { .. }
            | ParseErrorKind::InvalidEnumValue { .. }
            | ParseErrorKind::Proto2FieldMissingLabel { .. }
            | ParseErrorKind::Proto3RequiredField { .. }
            | ParseErrorKind::MapFieldWithLabel { .. }
            | ParseErrorKind::OneofFieldWithLabel { .. }
            | ParseErrorKind::Invalid { .. } => ErrorCategory::Validation,
        }
    }
}

impl ParseErrorKind {
    fn span(&self) -> Option<Span> {
        match self {
            ParseErrorKind::InvalidToken { span }
            | ParseErrorKind::IntegerOutOfRange { span }
            | ParseErrorKind::InvalidStringCharacters { span }
            | ParseErrorKind::UnterminatedString { span }
            | ParseErrorKind::InvalidStringEscape { span }
            | ParseErrorKind::InvalidUtf8String { span }
            | ParseErrorKind::NestedBlockComment { span }
            | ParseErrorKind::UnterminatedComment { span }
            | ParseErrorKind::NoSpaceBetweenIntAndIdent { span }
            | ParseErrorKind::UnexpectedToken { span, .. }
            | ParseErrorKind::UnexpectedEof { span, .. }
            | ParseErrorKind::UnknownSyntax { span, .. }
            | ParseErrorKind::SyntaxNotFirst { span }
            | ParseErrorKind::InvalidIdentifier { span, .. }
            | ParseErrorKind::InvalidTag { span, .. }
            | ParseErrorKind::InvalidEnumValue { span, .. }
            | ParseErrorKind::Proto2FieldMissingLabel { span }
            | ParseErrorKind::Proto3RequiredField { span }
            | ParseErrorKind::MapFieldWithLabel { span }
            | ParseErrorKind::OneofFieldWithLabel { span }
            | ParseErrorKind::Invalid { span, .. } => Some(span.clone()),
            ParseErrorKind::DuplicatePackage { second, .. }
            | ParseErrorKind::DuplicateName { second, .. } => Some(second.clone()),
        }
    }
}

impl fmt::Debug for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.column, self)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
