use std::mem::take;

/// Collects the comments preceding a declaration.
///
/// Comments on the lines directly above a token are attached to it as documentation. A blank line
/// discards any comments collected so far, as does a comment following other tokens on the same
/// line.
#[derive(Debug)]
pub(super) struct Comments {
    lines: Vec<String>,
    line_start: bool,
}

impl Comments {
    pub fn new() -> Comments {
        Comments {
            lines: Vec::new(),
            line_start: true,
        }
    }

    pub fn line_comment(&mut self, comment: &str) {
        if self.line_start {
            self.lines
                .push(comment.strip_suffix('\n').unwrap_or(comment).to_owned());
        }
        // The comment includes the line ending.
        self.line_start = true;
    }

    pub fn block_comment(&mut self, comment: &str) {
        if self.line_start {
            self.lines.push(comment.to_owned());
        }
        self.line_start = false;
    }

    pub fn newline(&mut self) {
        if self.line_start {
            self.lines.clear();
        }
        self.line_start = true;
    }

    /// Returns the documentation for the token following the comments seen so far.
    pub fn token(&mut self) -> String {
        self.line_start = false;
        take(&mut self.lines).join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_comments() {
        let mut comments = Comments::new();
        comments.line_comment(" first\n");
        comments.line_comment(" second\n");
        assert_eq!(comments.token(), " first\n second");
        assert_eq!(comments.token(), "");
    }

    #[test]
    fn blank_line_detaches() {
        let mut comments = Comments::new();
        comments.line_comment(" detached\n");
        comments.newline();
        comments.block_comment(" leading ");
        comments.newline();
        assert_eq!(comments.token(), " leading ");
    }

    #[test]
    fn trailing_comments() {
        let mut comments = Comments::new();
        comments.token();
        comments.line_comment(" trailing\n");
        comments.line_comment(" leading\n");
        assert_eq!(comments.token(), " leading");

        comments.block_comment(" trailing ");
        comments.newline();
        assert_eq!(comments.token(), "");
    }
}
