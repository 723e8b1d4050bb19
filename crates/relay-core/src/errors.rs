use std::sync::Arc;

use thiserror::Error;

/// Result type alias using ChainError
pub type Result<T> = std::result::Result<T, ChainError>;

/// Opaque error raised by an individual command
pub type UnitError = Arc<dyn std::error::Error + Send + Sync + 'static>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling, testing, and log assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Programmer errors
    InvalidArgument,
    IllegalState,
    InvalidIdentifier,
    NoSuchMethod,

    // Soft lookup failures (reported, never raised by the registry itself)
    NotFound,

    // Unit errors
    CommandFailed,

    // Context conversion
    Serialization,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::IllegalState => "ERR_ILLEGAL_STATE",
            ExErrorKind::InvalidIdentifier => "ERR_INVALID_IDENTIFIER",
            ExErrorKind::NoSuchMethod => "ERR_NO_SUCH_METHOD",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::CommandFailed => "ERR_COMMAND_FAILED",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }
}

/// Canonical structured error type
///
/// A classified view of a [`ChainError`] carrying the registry coordinates
/// (catalog, command, method) that were involved. The chain engine never
/// returns this type; it exists for logging and for callers that want a
/// stable code instead of matching on variants.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    catalog: Option<String>,
    command: Option<String>,
    method: Option<String>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            catalog: None,
            command: None,
            method: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add catalog name context
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Add command name context
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Add method name context
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(catalog) = &self.catalog {
            write!(f, " (catalog: {})", catalog)?;
        }
        if let Some(command) = &self.command {
            write!(f, " (command: {})", command)?;
        }
        if let Some(method) = &self.method {
            write!(f, " (method: {})", method)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for chain, catalog and dispatch operations
///
/// Errors raised by commands themselves travel through a chain untouched:
/// whatever a command returns is what the caller of the chain receives,
/// unless a filter handles it during unwind.
#[derive(Error, Debug, Clone)]
pub enum ChainError {
    /// A required input was missing or unusable
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The operation is not valid in the current lifecycle state
    #[error("Illegal state: {reason}")]
    IllegalState { reason: String },

    /// A composite command identifier had more than one delimiter
    #[error("Invalid command identifier '{identifier}': too many delimiters")]
    InvalidIdentifier { identifier: String },

    /// A dispatch target does not expose the requested method
    #[error("No such method '{method}': {reason}")]
    NoSuchMethod { method: String, reason: String },

    /// Generic failure raised by a command
    #[error("Command failed: {message}")]
    Failed { message: String },

    /// Opaque failure raised by a command with its own error type
    #[error(transparent)]
    Command(UnitError),

    /// A context value could not be converted to or from the requested type
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl ChainError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        ChainError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn illegal_state(reason: impl Into<String>) -> Self {
        ChainError::IllegalState {
            reason: reason.into(),
        }
    }

    /// Generic command failure with a message
    pub fn failed(message: impl Into<String>) -> Self {
        ChainError::Failed {
            message: message.into(),
        }
    }

    /// Wrap a command's own error type
    pub fn command<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ChainError::Command(Arc::new(err))
    }

    /// Downcast an opaque command error to its concrete type
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            ChainError::Command(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Whether this error is the very same instance as `other`
    ///
    /// Only meaningful for [`ChainError::Command`]; other variants are
    /// compared structurally since they carry no identity.
    pub fn is_same(&self, other: &ChainError) -> bool {
        match (self, other) {
            (ChainError::Command(a), ChainError::Command(b)) => Arc::ptr_eq(a, b),
            _ => self.to_string() == other.to_string(),
        }
    }

    /// Canonical kind of this error
    pub fn kind(&self) -> ExErrorKind {
        match self {
            ChainError::InvalidArgument { .. } => ExErrorKind::InvalidArgument,
            ChainError::IllegalState { .. } => ExErrorKind::IllegalState,
            ChainError::InvalidIdentifier { .. } => ExErrorKind::InvalidIdentifier,
            ChainError::NoSuchMethod { .. } => ExErrorKind::NoSuchMethod,
            ChainError::Failed { .. } | ChainError::Command(_) => ExErrorKind::CommandFailed,
            ChainError::Serialization { .. } => ExErrorKind::Serialization,
        }
    }
}

/// Conversion from ChainError to ExError
impl From<&ChainError> for ExError {
    fn from(err: &ChainError) -> Self {
        let ex = ExError::new(err.kind());
        match err {
            ChainError::InvalidArgument { reason } => ex.with_message(reason.clone()),
            ChainError::IllegalState { reason } => ex.with_message(reason.clone()),
            ChainError::InvalidIdentifier { identifier } => ex
                .with_command(identifier.clone())
                .with_message("Too many delimiters in command identifier"),
            ChainError::NoSuchMethod { method, reason } => {
                ex.with_method(method.clone()).with_message(reason.clone())
            }
            ChainError::Failed { message } => ex.with_message(message.clone()),
            ChainError::Command(inner) => ex.with_message(inner.to_string()),
            ChainError::Serialization { message } => ex.with_message(message.clone()),
        }
    }
}

impl From<ChainError> for ExError {
    fn from(err: ChainError) -> Self {
        ExError::from(&err)
    }
}

/// Conversion from serde_json::Error to ChainError
impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::Serialization {
            message: err.to_string(),
        }
    }
}
