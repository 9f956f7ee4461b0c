
use std::{ascii, borrow::Cow, fmt};

use logos::{Lexer, Logos};

use crate::error::ParseErrorKind;

#[derive(Debug, Clone, Logos, PartialEq, Eq)]
#[logos(extras = TokenExtras)]
#[logos(skip r"[\t\v\f\r ]+")]
#[logos(subpattern exponent = r"[eE][+\-]?[0-9]+")]
pub(crate) enum Token<'a> {
    #[regex("[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'a str),
    #[regex("0", |_| 0)]
    #[regex("0[0-7]+", |lex| int(lex, 8, 1))]
    #[regex("[1-9][0-9]*", |lex| int(lex, 10, 0))]
    #[regex("0[xX][0-9A-Fa-f]+", |lex| int(lex, 16, 2))]
    IntLiteral(u64),
    #[regex(r#"[0-9]+\.[0-9]*(?&exponent)?"#)]
    #[regex(r#"[0-9]+(?&exponent)"#)]
    #[regex(r#"\.[0-9]+(?&exponent)?"#)]
    FloatLiteral(&'a str),
    #[regex(r#"'|""#, string)]
    StringLiteral(Cow<'a, [u8]>),
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("<")]
    LeftAngleBracket,
    #[token(">")]
    RightAngleBracket,
    #[token(",")]
    Comma,
    #[token("=")]
    Equals,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("/")]
    ForwardSlash,
    #[regex(r#"//[^\n]*\n?"#, line_comment)]
    LineComment(Cow<'a, str>),
    #[token(r#"/*"#, block_comment)]
    BlockComment(Cow<'a, str>),
    #[token("\n")]
    Newline,
}

impl Token<'_> {
    pub const SYNTAX: Token<'static> = Token::Ident("syntax");
    pub const PACKAGE: Token<'static> = Token::Ident("package");
    pub const IMPORT: Token<'static> = Token::Ident("import");
    pub const WEAK: Token<'static> = Token::Ident("weak");
    pub const PUBLIC: Token<'static> = Token::Ident("public");
    pub const ENUM: Token<'static> = Token::Ident("enum");
    pub const OPTION: Token<'static> = Token::Ident("option");
    pub const SERVICE: Token<'static> = Token::Ident("service");
    pub const RPC: Token<'static> = Token::Ident("rpc");
    pub const STREAM: Token<'static> = Token::Ident("stream");
    pub const RETURNS: Token<'static> = Token::Ident("returns");
    pub const EXTEND: Token<'static> = Token::Ident("extend");
    pub const MESSAGE: Token<'static> = Token::Ident("message");
    pub const OPTIONAL: Token<'static> = Token::Ident("optional");
    pub const REQUIRED: Token<'static> = Token::Ident("required");
    pub const REPEATED: Token<'static> = Token::Ident("repeated");
    pub const MAP: Token<'static> = Token::Ident("map");
    pub const ONEOF: Token<'static> = Token::Ident("oneof");
    pub const RESERVED: Token<'static> = Token::Ident("reserved");
    pub const EXTENSIONS: Token<'static> = Token::Ident("extensions");
    pub const TO: Token<'static> = Token::Ident("to");
    pub const MAX: Token<'static> = Token::Ident("max");
    pub const TRUE: Token<'static> = Token::Ident("true");
    pub const FALSE: Token<'static> = Token::Ident("false");
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(value) => write!(f, "{}", value),
            Token::IntLiteral(value) => write!(f, "{}", value),
            Token::FloatLiteral(value) => write!(f, "{}", value),
            Token::StringLiteral(bytes) => {
                write!(f, "\"")?;
                for &ch in bytes.as_ref() {
                    write!(f, "{}", ascii::escape_default(ch))?;
                }
                write!(f, "\"")?;
                Ok(())
            }
            Token::Dot => write!(f, "."),
            Token::Minus => write!(f, "-"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::LeftAngleBracket => write!(f, "<"),
            Token::RightAngleBracket => write!(f, ">"),
            Token::Comma => write!(f, ","),
            Token::Plus => write!(f, "+"),
            Token::Equals => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Semicolon => write!(f, ";"),
            Token::ForwardSlash => write!(f, "/"),
            Token::LineComment(value) => write!(f, "//{}", value),
            Token::BlockComment(value) => write!(f, "/*{}*/", value),
            Token::Newline => writeln!(f),
        }
    }
}

#[derive(Default)]
pub(crate) struct TokenExtras {
    pub errors: Vec<ParseErrorKind>,
}

/// Parses the digits of an integer literal after `prefix_len` bytes of radix prefix.
///
/// An identifier immediately following the number, as in `1foo`, is an error. A value too large
/// for a `u64` is reported and replaced by zero.
fn int<'a>(lex: &mut Lexer<'a, Token<'a>>, radix: u32, prefix_len: usize) -> u64 {
    let suffix_len = lex
        .remainder()
        .bytes()
        .take_while(|&b| b.is_ascii_alphanumeric() || b == b'_')
        .count();
    if suffix_len != 0 {
        let span = lex.span().start..lex.span().end + suffix_len;
        lex.extras
            .errors
            .push(ParseErrorKind::NoSpaceBetweenIntAndIdent { span });
    }

    match u64::from_str_radix(&lex.slice()[prefix_len..], radix) {
        Ok(value) => value,
        Err(_) => {
            let span = lex.span();
            lex.extras
                .errors
                .push(ParseErrorKind::IntegerOutOfRange { span });
            0
        }
    }
}

#[derive(Logos)]
#[logos(subpattern hex = r"[0-9A-Fa-f]")]
enum Segment<'a> {
    #[regex(r#"[^\x00\n\\'"]+"#)]
    Text(&'a str),
    #[regex(r#"['"]"#, |lex| lex.slice().as_bytes()[0])]
    Quote(u8),
    #[regex(r#"\\[xX](?&hex)(?&hex)?"#, |lex| radix_escape(lex.slice(), 2, 16))]
    #[regex(r#"\\[0-7][0-7]?[0-7]?"#, |lex| radix_escape(lex.slice(), 1, 8))]
    #[regex(r#"\\[abfnrtv?\\'"]"#, |lex| simple_escape(lex.slice().as_bytes()[1]))]
    Byte(u8),
    #[regex(r#"\\u(?&hex)(?&hex)(?&hex)(?&hex)"#, |lex| unicode_escape(lex.slice()))]
    #[regex(
        r#"\\U(?&hex)(?&hex)(?&hex)(?&hex)(?&hex)(?&hex)(?&hex)(?&hex)"#,
        |lex| unicode_escape(lex.slice())
    )]
    Char(char),
}

fn radix_escape(escape: &str, prefix_len: usize, radix: u32) -> Option<u8> {
    u32::from_str_radix(&escape[prefix_len..], radix)
        .ok()
        .and_then(|value| u8::try_from(value).ok())
}

fn simple_escape(ch: u8) -> Option<u8> {
    Some(match ch {
        b'a' => 0x07,
        b'b' => 0x08,
        b'f' => 0x0c,
        b'n' => b'\n',
        b'r' => b'\r',
        b't' => b'\t',
        b'v' => 0x0b,
        b'?' | b'\\' | b'\'' | b'"' => ch,
        _ => return None,
    })
}

fn unicode_escape(escape: &str) -> Option<char> {
    u32::from_str_radix(&escape[2..], 16)
        .ok()
        .and_then(char::from_u32)
}

/// Reads the body of a string literal, up to the quote which opened it.
///
/// Lexing of the string stops at the first invalid character or escape.
fn string<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Cow<'a, [u8]> {
    let quote = lex.slice().as_bytes()[0];
    let mut segments = Segment::lexer(lex.remainder());
    let mut value = Cow::Borrowed(&b""[..]);

    let len = loop {
        match segments.next() {
            Some(Ok(Segment::Quote(ch))) if ch == quote => break segments.span().end,
            Some(Ok(Segment::Text(text))) => append(&mut value, text.as_bytes()),
            Some(Ok(Segment::Quote(ch) | Segment::Byte(ch))) => value.to_mut().push(ch),
            Some(Ok(Segment::Char(ch))) => value
                .to_mut()
                .extend_from_slice(ch.encode_utf8(&mut [0; 4]).as_bytes()),
            Some(Err(())) if !segments.slice().contains('\n') => {
                let start = lex.span().end + segments.span().start;
                let span = start..lex.span().end + segments.span().end;
                lex.extras.errors.push(if segments.slice().starts_with('\\') {
                    ParseErrorKind::InvalidStringEscape { span }
                } else {
                    ParseErrorKind::InvalidStringCharacters { span }
                });
                break segments.span().end;
            }
            // Strings may not span lines.
            Some(Err(())) => {
                lex.extras
                    .errors
                    .push(ParseErrorKind::UnterminatedString { span: lex.span() });
                break segments.span().start;
            }
            None => {
                lex.extras
                    .errors
                    .push(ParseErrorKind::UnterminatedString { span: lex.span() });
                break lex.remainder().len();
            }
        }
    };

    lex.bump(len);
    value
}

fn line_comment<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Cow<'a, str> {
    normalize_newlines(Cow::Borrowed(&lex.slice()[2..]))
}

#[derive(Logos)]
enum CommentPart<'a> {
    #[token("*/")]
    End,
    #[token("/*")]
    Start,
    #[token("\n")]
    Newline,
    #[regex(r#"[^*/\n]+|[*/]"#)]
    Text(&'a str),
}

/// Reads the body of a block comment.
///
/// A leading `*` on the first line (as in `/**`) and on each following line is dropped, along with
/// the indentation before it. Block comments do not nest.
fn block_comment<'a>(lex: &mut Lexer<'a, Token<'a>>) -> Cow<'a, str> {
    fn skip_star<'a>(parts: &mut Lexer<'a, CommentPart<'a>>) {
        let rest = parts.remainder();
        if rest.starts_with('*') && !rest.starts_with("*/") {
            parts.bump(1);
        }
    }

    let mut parts = CommentPart::lexer(lex.remainder());
    let mut text = Cow::Borrowed("");
    skip_star(&mut parts);

    let len = loop {
        match parts.next() {
            Some(Ok(CommentPart::End)) => break parts.span().end,
            Some(Ok(CommentPart::Start)) => {
                let start = lex.span().end + parts.span().start;
                lex.extras.errors.push(ParseErrorKind::NestedBlockComment {
                    span: start..start + 2,
                });
            }
            Some(Ok(CommentPart::Newline)) => {
                text.to_mut().push('\n');
                let rest = parts.remainder();
                let indented =
                    rest.trim_start_matches(|ch: char| ch != '\n' && ch.is_whitespace());
                parts.bump(rest.len() - indented.len());
                skip_star(&mut parts);
            }
            Some(Ok(CommentPart::Text(slice))) => {
                if text.is_empty() {
                    text = Cow::Borrowed(slice);
                } else {
                    text.to_mut().push_str(slice);
                }
            }
            Some(Err(())) | None => {
                lex.extras
                    .errors
                    .push(ParseErrorKind::UnterminatedComment { span: lex.span() });
                break lex.remainder().len();
            }
        }
    };

    lex.bump(len);
    normalize_newlines(text)
}

fn append<'a>(value: &mut Cow<'a, [u8]>, bytes: &'a [u8]) {
    if value.is_empty() {
        *value = Cow::Borrowed(bytes);
    } else {
        value.to_mut().extend_from_slice(bytes);
    }
}

fn normalize_newlines(s: Cow<str>) -> Cow<str> {
    if s.contains("\r\n") {
        Cow::Owned(s.replace("\r\n", "\n"))
    } else {
        s
    }
}
