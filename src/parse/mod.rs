use std::{
    collections::{hash_map::Entry, HashMap},
    mem::take,
};

use logos::{Lexer, Logos};

mod comments;

use self::comments::Comments;
use crate::{
    ast::{
        EnumConstantElement, EnumElement, ExtendElement, ExtensionsElement, FieldElement, Label,
        MessageElement, OneofElement, OptionElement, OptionValue, ProtoFile, ReservedElement,
        ReservedValue, RpcElement, ServiceElement, Syntax,
    },
    case::is_valid_ident,
    error::{ParseErrorKind, Position, Span, ValidationError},
    is_valid_enum_value, is_valid_tag,
    lex::Token,
    lines::LineResolver,
    MAX_TAG_VALUE,
};

pub(crate) fn parse_file(name: &str, source: &str) -> Result<ProtoFile, ParseErrorKind> {
    let mut parser = Parser::new(source);
    let result = parser.parse_file(name);

    let mut errors = take(&mut parser.lexer.extras.errors).into_iter();
    match (result, errors.next()) {
        (Ok(file), None) => Ok(file),
        (_, Some(err)) => Err(err),
        (Err(()), None) => Err(ParseErrorKind::UnexpectedEof {
            expected: "a declaration".to_owned(),
            span: source.len()..source.len(),
        }),
    }
}

struct Parser<'a> {
    lexer: Lexer<'a, Token<'a>>,
    peek: Option<(Token<'a>, Span)>,
    comments: Comments,
    doc: String,
    syntax: Option<Syntax>,
    package: Option<String>,
}

type Names = HashMap<String, Span>;

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lexer: Token::lexer(source),
            peek: None,
            comments: Comments::new(),
            doc: String::new(),
            syntax: None,
            package: None,
        }
    }

    fn parse_file(&mut self, name: &str) -> Result<ProtoFile, ()> {
        let mut builder = ProtoFile::builder(name);
        let mut package_span: Option<Span> = None;
        let mut names = Names::new();
        let mut first_statement = true;

        loop {
            match self.peek() {
                Some((Token::SYNTAX, span)) => {
                    if !first_statement {
                        self.add_error(ParseErrorKind::SyntaxNotFirst { span });
                        return Err(());
                    }
                    let syntax = self.parse_syntax()?;
                    self.syntax = Some(syntax);
                    builder = builder.syntax(syntax);
                }
                Some((Token::PACKAGE, _)) => {
                    let (package, span) = self.parse_package()?;
                    if let Some(first) = package_span {
                        self.add_error(ParseErrorKind::DuplicatePackage {
                            first,
                            second: span,
                        });
                        return Err(());
                    }
                    package_span = Some(span);
                    self.package = Some(package.clone());
                    builder = builder.package_name(package);
                }
                Some((Token::IMPORT, _)) => {
                    let (path, public) = self.parse_import()?;
                    builder = if public {
                        builder.add_public_dependency(path)
                    } else {
                        builder.add_dependency(path)
                    };
                }
                Some((Token::OPTION, _)) => {
                    builder = builder.add_option(self.parse_option_statement()?);
                }
                Some((Token::MESSAGE, _)) => {
                    let prefix = self.package_prefix();
                    let (message, span) = self.parse_message(&prefix)?;
                    self.add_name(&mut names, message.name(), span)?;
                    builder = builder.add_type(message);
                }
                Some((Token::ENUM, _)) => {
                    let prefix = self.package_prefix();
                    let (enum_, span) = self.parse_enum(&prefix)?;
                    self.add_name(&mut names, enum_.name(), span)?;
                    builder = builder.add_type(enum_);
                }
                Some((Token::EXTEND, _)) => {
                    let prefix = self.package_prefix();
                    builder = builder.add_extend_declaration(self.parse_extend(&prefix)?);
                }
                Some((Token::SERVICE, _)) => {
                    let (service, span) = self.parse_service()?;
                    self.add_name(&mut names, service.name(), span)?;
                    builder = builder.add_service(service);
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                None => break,
                _ => self.unexpected_token(
                    "'enum', 'extend', 'import', 'message', 'option', 'package', 'service', 'syntax' or ';'",
                )?,
            }
            first_statement = false;
        }

        self.check(builder.build(), 0..0)
    }

    fn parse_syntax(&mut self) -> Result<Syntax, ()> {
        self.expect_eq(Token::SYNTAX)?;
        self.expect_eq(Token::Equals)?;

        let (syntax, span) = self.parse_string()?;
        let syntax = match syntax.parse() {
            Ok(syntax) => syntax,
            Err(_) => {
                self.add_error(ParseErrorKind::UnknownSyntax { syntax, span });
                return Err(());
            }
        };

        self.expect_eq(Token::Semicolon)?;
        Ok(syntax)
    }

    fn parse_package(&mut self) -> Result<(String, Span), ()> {
        let start = self.expect_eq(Token::PACKAGE)?;
        let (name, _) = self.parse_full_ident()?;
        let end = self.expect_eq(Token::Semicolon)?;

        Ok((name, join_span(start, end)))
    }

    fn parse_import(&mut self) -> Result<(String, bool), ()> {
        self.expect_eq(Token::IMPORT)?;

        let public = match self.peek() {
            Some((Token::PUBLIC, _)) => {
                self.bump();
                true
            }
            Some((Token::WEAK, _)) => {
                self.bump();
                false
            }
            Some((Token::StringLiteral(_), _)) => false,
            _ => self.unexpected_token("a string literal, 'public' or 'weak'")?,
        };

        let (path, span) = self.parse_string()?;
        if path.is_empty() {
            self.add_error(ParseErrorKind::Invalid {
                err: ValidationError::MissingProperty {
                    element: "import",
                    property: "path",
                },
                span,
            });
            return Err(());
        }

        self.expect_eq(Token::Semicolon)?;
        Ok((path, public))
    }

    fn parse_message(&mut self, prefix: &str) -> Result<(MessageElement, Span), ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::MESSAGE)?;
        let (name, name_span) = self.parse_ident()?;

        let qualified_name = format!("{}{}", prefix, name);
        let nested_prefix = format!("{}.", qualified_name);
        let mut builder = MessageElement::builder()
            .name(name)
            .qualified_name(qualified_name)
            .documentation(documentation);
        let mut names = Names::new();

        self.expect_eq(Token::LeftBrace)?;
        loop {
            match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::MESSAGE, _)) => {
                    let (message, span) = self.parse_message(&nested_prefix)?;
                    self.add_name(&mut names, message.name(), span)?;
                    builder = builder.add_type(message);
                }
                Some((Token::ENUM, _)) => {
                    let (enum_, span) = self.parse_enum(&nested_prefix)?;
                    self.add_name(&mut names, enum_.name(), span)?;
                    builder = builder.add_type(enum_);
                }
                Some((Token::ONEOF, _)) => {
                    builder = builder.add_oneof(self.parse_oneof(&mut names)?);
                }
                Some((Token::EXTEND, _)) => {
                    builder = builder.add_extend_declaration(self.parse_extend(&nested_prefix)?);
                }
                Some((Token::OPTION, _)) => {
                    builder = builder.add_option(self.parse_option_statement()?);
                }
                Some((Token::RESERVED, _)) => {
                    builder = builder.add_reserved(self.parse_reserved()?);
                }
                Some((Token::EXTENSIONS, _)) => {
                    for extensions in self.parse_extensions()? {
                        builder = builder.add_extensions(extensions);
                    }
                }
                Some((Token::Ident(_) | Token::Dot, _)) => {
                    let (field, span) = self.parse_field(FieldScope::Message)?;
                    self.add_name(&mut names, field.name(), span)?;
                    builder = builder.add_field(field);
                }
                _ => self.unexpected_token(
                    "a message field, oneof, reserved range, extension range, enum, message, extend, option or '}'",
                )?,
            }
        }

        let message = self.check(builder.build(), name_span.clone())?;
        Ok((message, name_span))
    }

    fn parse_field(&mut self, scope: FieldScope) -> Result<(FieldElement, Span), ()> {
        let documentation = self.take_doc();

        let (label, label_span) = match self.peek() {
            Some((Token::OPTIONAL, span)) => (Some(Label::Optional), span),
            Some((Token::REQUIRED, span)) => (Some(Label::Required), span),
            Some((Token::REPEATED, span)) => (Some(Label::Repeated), span),
            Some((_, span)) => (None, span.start..span.start),
            None => self.unexpected_token("a field")?,
        };
        if label.is_some() {
            self.bump();
        }

        let (type_name, type_span) = self.parse_field_type()?;
        let (name, name_span) = self.parse_ident()?;

        let is_map = type_name.starts_with("map<");
        match (label, scope) {
            (Some(_), _) if is_map => {
                self.add_error(ParseErrorKind::MapFieldWithLabel { span: label_span });
                return Err(());
            }
            (Some(_), FieldScope::Oneof) => {
                self.add_error(ParseErrorKind::OneofFieldWithLabel { span: label_span });
                return Err(());
            }
            (Some(Label::Required), _) if self.syntax == Some(Syntax::Proto3) => {
                self.add_error(ParseErrorKind::Proto3RequiredField { span: label_span });
                return Err(());
            }
            (None, FieldScope::Message | FieldScope::Extend)
                if !is_map && self.syntax != Some(Syntax::Proto3) =>
            {
                self.add_error(ParseErrorKind::Proto2FieldMissingLabel {
                    span: join_span(type_span, name_span),
                });
                return Err(());
            }
            _ => (),
        }

        self.expect_eq(Token::Equals)?;

        let (tag, tag_span) = self.parse_signed_int()?;
        let tag = match i32::try_from(tag) {
            Ok(tag) if is_valid_tag(tag) => tag,
            _ => {
                self.add_error(ParseErrorKind::InvalidTag {
                    name: name.to_owned(),
                    tag,
                    span: tag_span,
                });
                return Err(());
            }
        };

        let options = self.parse_options_list()?;
        self.expect_eq(Token::Semicolon)?;

        let mut builder = FieldElement::builder()
            .type_name(type_name)
            .name(name)
            .tag(tag)
            .documentation(documentation);
        if let Some(label) = label {
            builder = builder.label(label);
        }
        for option in options {
            builder = builder.add_option(option);
        }

        let field = self.check(builder.build(), name_span.clone())?;
        Ok((field, name_span))
    }

    fn parse_field_type(&mut self) -> Result<(String, Span), ()> {
        match self.peek() {
            Some((Token::MAP, start)) => {
                self.bump();
                match self.peek() {
                    Some((Token::LeftAngleBracket, _)) => {
                        self.bump();
                        let (key, _) = self.parse_ident()?;
                        self.expect_eq(Token::Comma)?;
                        let (value, _) = self.parse_type_name()?;
                        let end = self.expect_eq(Token::RightAngleBracket)?;
                        Ok((format!("map<{}, {}>", key, value), join_span(start, end)))
                    }
                    // A message type which happens to be named 'map'.
                    _ => self.parse_full_ident_rest("map".to_owned(), start),
                }
            }
            Some((Token::Ident(_) | Token::Dot, _)) => self.parse_type_name(),
            _ => self.unexpected_token("a field type"),
        }
    }

    fn parse_oneof(&mut self, names: &mut Names) -> Result<OneofElement, ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::ONEOF)?;
        let (name, name_span) = self.parse_ident()?;
        self.add_name(names, name, name_span.clone())?;

        let mut builder = OneofElement::builder()
            .name(name)
            .documentation(documentation);

        self.expect_eq(Token::LeftBrace)?;
        loop {
            match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::OPTION, _)) => {
                    builder = builder.add_option(self.parse_option_statement()?);
                }
                Some((Token::Ident(_) | Token::Dot, _)) => {
                    let (field, span) = self.parse_field(FieldScope::Oneof)?;
                    self.add_name(names, field.name(), span)?;
                    builder = builder.add_field(field);
                }
                _ => self.unexpected_token("a oneof field, option or '}'")?,
            }
        }

        self.check(builder.build(), name_span)
    }

    fn parse_enum(&mut self, prefix: &str) -> Result<(EnumElement, Span), ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::ENUM)?;
        let (name, name_span) = self.parse_ident()?;

        let mut builder = EnumElement::builder()
            .name(name)
            .qualified_name(format!("{}{}", prefix, name))
            .documentation(documentation);
        let mut names = Names::new();

        self.expect_eq(Token::LeftBrace)?;
        loop {
            match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::OPTION, _)) => {
                    builder = builder.add_option(self.parse_option_statement()?);
                }
                Some((Token::RESERVED, _)) => {
                    builder = builder.add_reserved(self.parse_reserved()?);
                }
                Some((Token::Ident(_), _)) => {
                    let (constant, span) = self.parse_enum_constant()?;
                    self.add_name(&mut names, constant.name(), span)?;
                    builder = builder.add_constant(constant);
                }
                _ => self.unexpected_token("an enum value, reserved range, option or '}'")?,
            }
        }

        let enum_ = self.check(builder.build(), name_span.clone())?;
        Ok((enum_, name_span))
    }

    fn parse_enum_constant(&mut self) -> Result<(EnumConstantElement, Span), ()> {
        let documentation = self.take_doc();
        let (name, name_span) = self.parse_ident()?;
        self.expect_eq(Token::Equals)?;

        let (value, value_span) = self.parse_signed_int()?;
        if !is_valid_enum_value(value) {
            self.add_error(ParseErrorKind::InvalidEnumValue {
                name: name.to_owned(),
                value,
                span: value_span,
            });
            return Err(());
        }

        let options = self.parse_options_list()?;
        self.expect_eq(Token::Semicolon)?;

        let mut builder = EnumConstantElement::builder()
            .name(name)
            .tag(value as i32)
            .documentation(documentation);
        for option in options {
            builder = builder.add_option(option);
        }

        let constant = self.check(builder.build(), name_span.clone())?;
        Ok((constant, name_span))
    }

    fn parse_extend(&mut self, prefix: &str) -> Result<ExtendElement, ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::EXTEND)?;
        let (name, name_span) = self.parse_type_name()?;

        let qualified_name = match name.strip_prefix('.') {
            Some(qualified) => qualified.to_owned(),
            None if name.contains('.') => name.clone(),
            None => format!("{}{}", prefix, name),
        };
        let mut builder = ExtendElement::builder()
            .name(name)
            .qualified_name(qualified_name)
            .documentation(documentation);
        let mut names = Names::new();

        self.expect_eq(Token::LeftBrace)?;
        loop {
            match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::Ident(_) | Token::Dot, _)) => {
                    let (field, span) = self.parse_field(FieldScope::Extend)?;
                    self.add_name(&mut names, field.name(), span)?;
                    builder = builder.add_field(field);
                }
                _ => self.unexpected_token("a field or '}'")?,
            }
        }

        self.check(builder.build(), name_span)
    }

    fn parse_service(&mut self) -> Result<(ServiceElement, Span), ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::SERVICE)?;
        let (name, name_span) = self.parse_ident()?;

        let mut builder = ServiceElement::builder()
            .name(name)
            .qualified_name(format!("{}{}", self.package_prefix(), name))
            .documentation(documentation);
        let mut names = Names::new();

        self.expect_eq(Token::LeftBrace)?;
        loop {
            match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::OPTION, _)) => {
                    builder = builder.add_option(self.parse_option_statement()?);
                }
                Some((Token::RPC, _)) => {
                    let (rpc, span) = self.parse_rpc()?;
                    self.add_name(&mut names, rpc.name(), span)?;
                    builder = builder.add_rpc(rpc);
                }
                _ => self.unexpected_token("'rpc', 'option', '}' or ';'")?,
            }
        }

        let service = self.check(builder.build(), name_span.clone())?;
        Ok((service, name_span))
    }

    fn parse_rpc(&mut self) -> Result<(RpcElement, Span), ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::RPC)?;
        let (name, name_span) = self.parse_ident()?;

        let (request_type, request_streaming) = self.parse_rpc_type()?;
        self.expect_eq(Token::RETURNS)?;
        let (response_type, response_streaming) = self.parse_rpc_type()?;

        let mut builder = RpcElement::builder()
            .name(name)
            .documentation(documentation)
            .request_type(request_type)
            .request_streaming(request_streaming)
            .response_type(response_type)
            .response_streaming(response_streaming);

        match self.peek() {
            Some((Token::Semicolon, _)) => {
                self.bump();
            }
            Some((Token::LeftBrace, _)) => {
                self.bump();
                loop {
                    match self.peek() {
                        Some((Token::OPTION, _)) => {
                            builder = builder.add_option(self.parse_option_statement()?);
                        }
                        Some((Token::RightBrace, _)) => {
                            self.bump();
                            break;
                        }
                        Some((Token::Semicolon, _)) => {
                            self.bump();
                        }
                        _ => self.unexpected_token("'option', '}' or ';'")?,
                    }
                }
            }
            _ => self.unexpected_token("';' or '{'")?,
        }

        let rpc = self.check(builder.build(), name_span.clone())?;
        Ok((rpc, name_span))
    }

    fn parse_rpc_type(&mut self) -> Result<(String, bool), ()> {
        self.expect_eq(Token::LeftParen)?;

        let (type_name, streaming) = match self.peek() {
            Some((Token::STREAM, _)) => {
                self.bump();
                match self.peek() {
                    // A message type which happens to be named 'stream'.
                    Some((Token::RightParen, _)) => ("stream".to_owned(), false),
                    _ => (self.parse_type_name()?.0, true),
                }
            }
            _ => (self.parse_type_name()?.0, false),
        };

        self.expect_eq(Token::RightParen)?;
        Ok((type_name, streaming))
    }

    fn parse_reserved(&mut self) -> Result<ReservedElement, ()> {
        let documentation = self.take_doc();
        let start = self.expect_eq(Token::RESERVED)?;

        let mut builder = ReservedElement::builder().documentation(documentation);
        match self.peek() {
            Some((Token::StringLiteral(_), _)) => loop {
                let (name, span) = self.parse_string()?;
                if !is_valid_ident(&name) {
                    self.add_error(ParseErrorKind::InvalidIdentifier { name, span });
                    return Err(());
                }
                builder = builder.add_value(ReservedValue::Name(name));

                if !self.bump_if_eq(Token::Comma) {
                    break;
                }
            },
            Some((Token::IntLiteral(_) | Token::Minus, _)) => loop {
                builder = builder.add_value(self.parse_reserved_range()?);

                if !self.bump_if_eq(Token::Comma) {
                    break;
                }
            },
            _ => self.unexpected_token("an integer or a string")?,
        }

        let end = self.expect_eq(Token::Semicolon)?;
        self.check(builder.build(), join_span(start, end))
    }

    fn parse_reserved_range(&mut self) -> Result<ReservedValue, ()> {
        let (start, _) = self.parse_i32()?;

        if !self.bump_if_eq(Token::TO) {
            return Ok(ReservedValue::Tag(start));
        }

        match self.peek() {
            Some((Token::MAX, _)) => {
                self.bump();
                Ok(ReservedValue::RangeToMax(start))
            }
            Some((Token::IntLiteral(_) | Token::Minus, _)) => {
                let (end, _) = self.parse_i32()?;
                Ok(ReservedValue::Range(start, end))
            }
            _ => self.unexpected_token("an integer or 'max'"),
        }
    }

    fn parse_extensions(&mut self) -> Result<Vec<ExtensionsElement>, ()> {
        let documentation = self.take_doc();
        self.expect_eq(Token::EXTENSIONS)?;

        let mut ranges = Vec::new();
        loop {
            let (start, start_span) = self.parse_i32()?;
            let (end, end_span) = if self.bump_if_eq(Token::TO) {
                match self.peek() {
                    Some((Token::MAX, span)) => {
                        self.bump();
                        (MAX_TAG_VALUE, span)
                    }
                    Some((Token::IntLiteral(_) | Token::Minus, _)) => self.parse_i32()?,
                    _ => self.unexpected_token("an integer or 'max'")?,
                }
            } else {
                (start, start_span.clone())
            };

            let range = ExtensionsElement::builder()
                .documentation(&documentation)
                .start(start)
                .end(end)
                .build();
            ranges.push(self.check(range, join_span(start_span, end_span))?);

            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                }
                Some((Token::Semicolon, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("',' or ';'")?,
            }
        }

        Ok(ranges)
    }

    fn parse_options_list(&mut self) -> Result<Vec<OptionElement>, ()> {
        if !self.bump_if_eq(Token::LeftBracket) {
            return Ok(Vec::new());
        }

        let mut options = vec![self.parse_option_body()?];
        loop {
            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                    options.push(self.parse_option_body()?);
                }
                Some((Token::RightBracket, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("',' or ']'")?,
            }
        }

        Ok(options)
    }

    fn parse_option_statement(&mut self) -> Result<OptionElement, ()> {
        self.expect_eq(Token::OPTION)?;
        let option = self.parse_option_body()?;
        self.expect_eq(Token::Semicolon)?;
        Ok(option)
    }

    fn parse_option_body(&mut self) -> Result<OptionElement, ()> {
        let (name, span) = self.parse_option_name()?;
        self.expect_eq(Token::Equals)?;
        let value = self.parse_option_value()?;

        self.check(OptionElement::new(name, value), span)
    }

    fn parse_option_name(&mut self) -> Result<(String, Span), ()> {
        let mut name = String::new();
        let mut span: Option<Span> = None;

        loop {
            let part = match self.peek() {
                Some((Token::LeftParen, start)) => {
                    self.bump();
                    name.push('(');
                    let (type_name, _) = self.parse_type_name()?;
                    name.push_str(&type_name);
                    name.push(')');
                    let end = self.expect_eq(Token::RightParen)?;
                    join_span(start, end)
                }
                Some((Token::Ident(ident), ident_span)) => {
                    self.bump();
                    name.push_str(ident);
                    ident_span
                }
                _ => self.unexpected_token("an identifier or '('")?,
            };
            span = Some(match span {
                Some(span) => join_span(span, part),
                None => part,
            });

            if !self.bump_if_eq(Token::Dot) {
                break;
            }
            name.push('.');
        }

        Ok((name, span.unwrap_or_default()))
    }

    fn parse_option_value(&mut self) -> Result<OptionValue, ()> {
        match self.peek() {
            Some((Token::StringLiteral(_), _)) => {
                let (value, _) = self.parse_string()?;
                Ok(OptionValue::String(value))
            }
            Some((Token::TRUE, _)) => {
                self.bump();
                Ok(OptionValue::Bool(true))
            }
            Some((Token::FALSE, _)) => {
                self.bump();
                Ok(OptionValue::Bool(false))
            }
            Some((Token::Ident(_), _)) => {
                let (value, _) = self.parse_full_ident()?;
                Ok(OptionValue::Enum(value))
            }
            Some((Token::IntLiteral(_) | Token::FloatLiteral(_), span)) => {
                self.bump();
                Ok(OptionValue::Number(self.lexer.source()[span].to_owned()))
            }
            Some((Token::Plus, _)) => {
                self.bump();
                match self.peek() {
                    Some((Token::IntLiteral(_) | Token::FloatLiteral(_), span)) => {
                        self.bump();
                        Ok(OptionValue::Number(self.lexer.source()[span].to_owned()))
                    }
                    _ => self.unexpected_token("a numeric literal"),
                }
            }
            Some((Token::Minus, _)) => {
                self.bump();
                match self.peek() {
                    Some((Token::IntLiteral(_) | Token::FloatLiteral(_), span)) => {
                        self.bump();
                        Ok(OptionValue::Number(format!(
                            "-{}",
                            &self.lexer.source()[span]
                        )))
                    }
                    Some((Token::Ident(ident), _)) if is_special_float(ident) => {
                        self.bump();
                        Ok(OptionValue::Number(format!("-{}", ident)))
                    }
                    _ => self.unexpected_token("a numeric literal"),
                }
            }
            Some((Token::LeftBracket, _)) => {
                self.bump();
                let mut values = Vec::new();
                if self.bump_if_eq(Token::RightBracket) {
                    return Ok(OptionValue::List(values));
                }
                loop {
                    values.push(self.parse_option_value()?);
                    match self.peek() {
                        Some((Token::Comma, _)) => {
                            self.bump();
                        }
                        Some((Token::RightBracket, _)) => {
                            self.bump();
                            break;
                        }
                        _ => self.unexpected_token("',' or ']'")?,
                    }
                }
                Ok(OptionValue::List(values))
            }
            Some((Token::LeftBrace, _)) => self.parse_aggregate(),
            _ => self.unexpected_token("a constant"),
        }
    }

    fn parse_aggregate(&mut self) -> Result<OptionValue, ()> {
        self.expect_eq(Token::LeftBrace)?;

        let mut entries = Vec::new();
        loop {
            let (name, span) = match self.peek() {
                Some((Token::RightBrace, _)) => {
                    self.bump();
                    break;
                }
                Some((Token::Ident(name), span)) => {
                    self.bump();
                    (name.to_owned(), span)
                }
                Some((Token::LeftBracket, start)) => {
                    self.bump();
                    let mut name = "[".to_owned();
                    let (type_name, _) = self.parse_full_ident()?;
                    name.push_str(&type_name);
                    while self.bump_if_eq(Token::ForwardSlash) {
                        let (type_name, _) = self.parse_full_ident()?;
                        name.push('/');
                        name.push_str(&type_name);
                    }
                    name.push(']');
                    let end = self.expect_eq(Token::RightBracket)?;
                    (name, join_span(start, end))
                }
                _ => self.unexpected_token("a field name or '}'")?,
            };

            let value = match self.peek() {
                Some((Token::Colon, _)) => {
                    self.bump();
                    self.parse_option_value()?
                }
                Some((Token::LeftBrace, _)) => self.parse_aggregate()?,
                _ => self.unexpected_token("':' or '{'")?,
            };
            entries.push(self.check(OptionElement::entry(name, value), span)?);

            if !self.bump_if_eq(Token::Comma) {
                self.bump_if_eq(Token::Semicolon);
            }
        }

        Ok(OptionValue::Aggregate(entries))
    }

    fn parse_type_name(&mut self) -> Result<(String, Span), ()> {
        match self.peek() {
            Some((Token::Dot, start)) => {
                self.bump();
                let (name, end) = self.parse_full_ident()?;
                Ok((format!(".{}", name), join_span(start, end)))
            }
            Some((Token::Ident(_), _)) => self.parse_full_ident(),
            _ => self.unexpected_token("a type name"),
        }
    }

    fn parse_full_ident(&mut self) -> Result<(String, Span), ()> {
        let (first, span) = self.parse_ident()?;
        self.parse_full_ident_rest(first.to_owned(), span)
    }

    fn parse_full_ident_rest(
        &mut self,
        mut name: String,
        mut span: Span,
    ) -> Result<(String, Span), ()> {
        while self.bump_if_eq(Token::Dot) {
            let (part, part_span) = self.parse_ident()?;
            name.push('.');
            name.push_str(part);
            span = join_span(span, part_span);
        }

        Ok((name, span))
    }

    fn parse_ident(&mut self) -> Result<(&'a str, Span), ()> {
        match self.peek() {
            Some((Token::Ident(value), span)) => {
                self.bump();
                Ok((value, span))
            }
            _ => self.unexpected_token("an identifier"),
        }
    }

    fn parse_signed_int(&mut self) -> Result<(i64, Span), ()> {
        let sign = match self.peek() {
            Some((Token::Minus, span)) => {
                self.bump();
                Some(span)
            }
            _ => None,
        };

        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                let value = i64::try_from(value).unwrap_or(i64::MAX);
                match sign {
                    Some(start) => Ok((-value, join_span(start, span))),
                    None => Ok((value, span)),
                }
            }
            _ => self.unexpected_token("an integer"),
        }
    }

    fn parse_i32(&mut self) -> Result<(i32, Span), ()> {
        let (value, span) = self.parse_signed_int()?;
        match i32::try_from(value) {
            Ok(value) => Ok((value, span)),
            Err(_) => {
                self.add_error(ParseErrorKind::IntegerOutOfRange { span });
                Err(())
            }
        }
    }

    fn parse_string(&mut self) -> Result<(String, Span), ()> {
        let (mut bytes, mut span) = match self.peek() {
            Some((Token::StringLiteral(value), span)) => {
                self.bump();
                (value.into_owned(), span)
            }
            _ => self.unexpected_token("a string literal")?,
        };

        // Adjacent string literals are concatenated.
        while let Some((Token::StringLiteral(value), next)) = self.peek() {
            self.bump();
            bytes.extend_from_slice(&value);
            span = join_span(span, next);
        }

        match String::from_utf8(bytes) {
            Ok(value) => Ok((value, span)),
            Err(_) => {
                self.add_error(ParseErrorKind::InvalidUtf8String { span });
                Err(())
            }
        }
    }

    fn package_prefix(&self) -> String {
        match &self.package {
            Some(package) => format!("{}.", package),
            None => String::new(),
        }
    }

    fn add_name(&mut self, names: &mut Names, name: &str, span: Span) -> Result<(), ()> {
        match names.entry(name.to_owned()) {
            Entry::Vacant(entry) => {
                entry.insert(span);
                Ok(())
            }
            Entry::Occupied(entry) => {
                let first = entry.get().clone();
                let (line, column) = LineResolver::new(self.lexer.source()).resolve(first.start);
                self.add_error(ParseErrorKind::DuplicateName {
                    name: name.to_owned(),
                    first_position: Position {
                        line: line + 1,
                        column: column + 1,
                    },
                    first,
                    second: span,
                });
                Err(())
            }
        }
    }

    fn check<T>(&mut self, result: Result<T, ValidationError>, span: Span) -> Result<T, ()> {
        result.map_err(|err| self.add_error(ParseErrorKind::Invalid { err, span }))
    }

    /// Takes the documentation comment attached to the next token.
    fn take_doc(&mut self) -> String {
        self.peek();
        take(&mut self.doc)
    }

    fn expect_eq(&mut self, t: Token) -> Result<Span, ()> {
        match self.peek() {
            Some((tok, span)) if tok == t => {
                self.bump();
                Ok(span)
            }
            _ => self.unexpected_token(format!("'{}'", t)),
        }
    }

    fn bump_if_eq(&mut self, t: Token) -> bool {
        match self.peek() {
            Some((tok, _)) if tok == t => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn bump(&mut self) {
        debug_assert!(self.peek.is_some(), "called bump without peek returning Some()");
        self.peek = None;
    }

    fn peek(&mut self) -> Option<(Token<'a>, Span)> {
        if self.peek.is_none() {
            self.peek = self.next();
        }
        self.peek.clone()
    }

    fn next(&mut self) -> Option<(Token<'a>, Span)> {
        if let Some(peek) = self.peek.take() {
            return Some(peek);
        }

        loop {
            // Stop at the first error.
            if !self.lexer.extras.errors.is_empty() {
                return None;
            }

            match self.lexer.next() {
                Some(Ok(Token::Newline)) => self.comments.newline(),
                Some(Ok(Token::LineComment(comment))) => self.comments.line_comment(&comment),
                Some(Ok(Token::BlockComment(comment))) => self.comments.block_comment(&comment),
                Some(Ok(tok)) => {
                    self.doc = self.comments.token();
                    return Some((tok, self.lexer.span()));
                }
                Some(Err(())) => {
                    self.add_error(ParseErrorKind::InvalidToken {
                        span: self.lexer.span(),
                    });
                    return None;
                }
                None => return None,
            }
        }
    }

    fn unexpected_token<T>(&mut self, expected: impl ToString) -> Result<T, ()> {
        match self.peek() {
            Some((found, span)) => {
                self.add_error(ParseErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: found.to_string(),
                    span,
                });
            }
            None => {
                let end = self.lexer.source().len();
                self.add_error(ParseErrorKind::UnexpectedEof {
                    expected: expected.to_string(),
                    span: end..end,
                });
            }
        }
        Err(())
    }

    fn add_error(&mut self, err: ParseErrorKind) {
        self.lexer.extras.errors.push(err);
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum FieldScope {
    Message,
    Oneof,
    Extend,
}

fn join_span(start: Span, end: Span) -> Span {
    start.start..end.end
}

fn is_special_float(ident: &str) -> bool {
    ["inf", "infinity", "nan"]
        .iter()
        .any(|special| ident.eq_ignore_ascii_case(special))
}
