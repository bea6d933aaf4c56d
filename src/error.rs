//! Error types for mediaforge.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building commands or running analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A codec parameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The output extension does not match the chosen codec's container set.
    #[error("unsupported output extension '.{extension}' for {codec}")]
    UnsupportedExtension { codec: String, extension: String },

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external process exited with a non-zero status.
    #[error("{tool} failed (code {code:?}): {tail}")]
    ProcessFailed {
        tool: String,
        code: Option<i32>,
        tail: String,
    },

    /// An external process exceeded its time bound and was terminated.
    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    /// Failed to locate or parse expected tool output.
    #[error("failed to parse {tool} output: {message}")]
    Parse { tool: String, message: String },

    /// One or more measurement fields were missing or non-finite.
    #[error("invalid loudnorm measurement values: {fields}")]
    InvalidMeasurements { fields: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an unsupported-extension error.
    pub fn unsupported_extension(codec: impl Into<String>, extension: impl Into<String>) -> Self {
        Self::UnsupportedExtension {
            codec: codec.into(),
            extension: extension.into(),
        }
    }

    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a process failure error carrying the diagnostic tail.
    pub fn process_failed(tool: impl Into<String>, code: Option<i32>, tail: impl Into<String>) -> Self {
        Self::ProcessFailed {
            tool: tool.into(),
            code,
            tail: tail.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(tool: impl Into<String>, seconds: u64) -> Self {
        Self::Timeout {
            tool: tool.into(),
            seconds,
        }
    }

    /// Create a parse error.
    pub fn parse(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            tool: tool.into(),
            message: message.into(),
        }
    }
}
