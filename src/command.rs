//! Encode command representation.
//!
//! An [`EncodeCommand`] is an ordered sequence of argument tokens for one
//! external engine invocation. It is a plan, never executed here; spawning
//! and shell escaping belong to the embedding application.

use std::fmt;
use std::path::Path;

/// An ordered token sequence describing one ffmpeg invocation.
///
/// The first token is the program name and the last token is always the
/// output path (builders uphold this; [`EncodeCommand::inject_before_output`]
/// relies on it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeCommand {
    tokens: Vec<String>,
}

impl EncodeCommand {
    /// Start a command for the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            tokens: vec![program.into()],
        }
    }

    /// Start a standard ffmpeg invocation: overwrite output, suppress banner.
    pub fn ffmpeg() -> Self {
        let mut cmd = Self::new("ffmpeg");
        cmd.args(["-y", "-hide_banner"]);
        cmd
    }

    /// Append a single token.
    pub fn arg(&mut self, token: impl Into<String>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    /// Append several tokens.
    pub fn args<I, S>(&mut self, tokens: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    /// Append a path token.
    pub fn path(&mut self, path: &Path) -> &mut Self {
        self.tokens.push(path.display().to_string());
        self
    }

    /// Number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether the command has no tokens.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The final token, which for a well-formed command is the output path.
    pub fn output_token(&self) -> Option<&str> {
        self.tokens.last().map(String::as_str)
    }

    /// Borrow the token sequence.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Consume the command, yielding its tokens.
    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    /// Insert a flag/value pair immediately before the output path.
    ///
    /// Commands with fewer than two tokens are returned unchanged; such a
    /// command has no separable output token and indicates a caller bug.
    pub fn inject_before_output(mut self, flag: impl Into<String>, value: impl Into<String>) -> Self {
        if self.tokens.len() < 2 {
            return self;
        }
        let at = self.tokens.len() - 1;
        self.tokens.insert(at, flag.into());
        self.tokens.insert(at + 1, value.into());
        self
    }
}

impl fmt::Display for EncodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

impl From<Vec<String>> for EncodeCommand {
    fn from(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}
