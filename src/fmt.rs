use std::fmt::{self, Write};

const INDENT: &str = "  ";

/// Writes a string with the escapes needed to place it between double quotes.
pub(crate) struct Escaped<'a>(pub &'a str);

impl<'a> fmt::Display for Escaped<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ch in self.0.chars() {
            match ch {
                '\t' => f.write_str("\\t")?,
                '\r' => f.write_str("\\r")?,
                '\n' => f.write_str("\\n")?,
                '\\' => f.write_str("\\\\")?,
                '\'' => f.write_str("\\'")?,
                '"' => f.write_str("\\\"")?,
                '\0'..='\x1f' | '\x7f' => write!(f, "\\{:03o}", ch as u32)?,
                _ => f.write_char(ch)?,
            }
        }

        Ok(())
    }
}

/// Writes documentation as one `//` comment per line.
pub(crate) fn write_documentation(f: &mut fmt::Formatter<'_>, documentation: &str) -> fmt::Result {
    if documentation.is_empty() {
        return Ok(());
    }

    for line in documentation.lines() {
        if line.is_empty() {
            writeln!(f, "//")?;
        } else {
            writeln!(f, "// {}", line)?;
        }
    }
    Ok(())
}

/// Accumulates the members of a braced declaration body.
///
/// Members are added in groups; non-empty groups are separated by a blank line, and the whole body
/// is indented one level when written.
#[derive(Default)]
pub(crate) struct Block {
    body: String,
    group_started: bool,
}

impl Block {
    pub fn new() -> Self {
        Block::default()
    }

    pub fn group<I>(&mut self, members: I)
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        let mut members = members.into_iter().peekable();
        if members.peek().is_none() {
            return;
        }

        if self.group_started {
            self.body.push('\n');
        }
        self.group_started = true;

        for member in members {
            // Writing to a string is infallible.
            let _ = write!(self.body, "{}", member);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Writes `header {}` if the body is empty, or the header followed by the indented body.
    pub fn write(&self, f: &mut fmt::Formatter<'_>, header: fmt::Arguments<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "{} {{}}", header);
        }

        writeln!(f, "{} {{", header)?;
        for line in self.body.lines() {
            if line.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, "{}{}", INDENT, line)?;
            }
        }
        writeln!(f, "}}")
    }
}

#[test]
fn escapes() {
    assert_eq!(Escaped("plain").to_string(), "plain");
    assert_eq!(
        Escaped("tab\tquote\"slash\\").to_string(),
        "tab\\tquote\\\"slash\\\\"
    );
    assert_eq!(Escaped("\0\x07").to_string(), "\\000\\007");
    assert_eq!(Escaped("héllo 😀").to_string(), "héllo 😀");
}

#[test]
fn block_groups() {
    struct Show(&'static str);

    impl fmt::Display for Show {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut block = Block::new();
            block.group(["a;\n", "b;\n"]);
            block.group(Vec::<String>::new());
            block.group(["c {\n  d;\n}\n"]);
            block.write(f, format_args!("message {}", self.0))
        }
    }

    assert_eq!(
        Show("Foo").to_string(),
        "message Foo {\n  a;\n  b;\n\n  c {\n    d;\n  }\n}\n"
    );
}
