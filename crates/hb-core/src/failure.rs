//! Error taxonomy shared by the CLI and the bot.
//!
//! Application code raises [`AppError`] when it detects a user-input problem, a
//! business-rule violation or a system problem. Everything that propagates out
//! of an operation travels as a [`Failure`] to the reporters in
//! [`crate::report`].

use std::fmt;

/// Closed set of categories a failure is classified into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UserInput,
    DomainRule,
    System,
    /// Fallback for failures that are not an [`AppError`]. Never raised directly.
    Unclassified,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 4] = [
        ErrorKind::UserInput,
        ErrorKind::DomainRule,
        ErrorKind::System,
        ErrorKind::Unclassified,
    ];

    /// Stable code shown in structured output (`USERINPUT`, `DOMAINRULE`, ...).
    pub const fn code(self) -> &'static str {
        match self {
            Self::UserInput => "USERINPUT",
            Self::DomainRule => "DOMAINRULE",
            Self::System => "SYSTEM",
            Self::Unclassified => "UNCLASSIFIED",
        }
    }

    /// Process exit code used by the command-line path.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::UserInput => 2,
            Self::DomainRule => 3,
            Self::System | Self::Unclassified => 1,
        }
    }

    pub const fn default_hint(self) -> &'static str {
        match self {
            Self::UserInput => "check command format and arguments",
            Self::DomainRule => "confirm the operation satisfies business rules",
            Self::System => "contact the administrator",
            Self::Unclassified => "unexpected system error",
        }
    }

    pub const fn default_message(self) -> &'static str {
        match self {
            Self::UserInput => "invalid input",
            Self::DomainRule => "business rule violated",
            Self::System => "unexpected system error occurred",
            Self::Unclassified => "unexpected error",
        }
    }

    /// `true` for the three kinds application code raises itself.
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Failure raised on purpose by application code.
///
/// Message and hint are optional; blank or missing values are replaced by the
/// per-kind defaults when the error is classified.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("{}", text_or(.message, ErrorKind::UserInput.default_message()))]
    UserInput {
        message: Option<String>,
        hint: Option<String>,
    },

    #[error("{}", text_or(.message, ErrorKind::DomainRule.default_message()))]
    DomainRule {
        message: Option<String>,
        hint: Option<String>,
    },

    #[error("{}", text_or(.message, ErrorKind::System.default_message()))]
    System {
        message: Option<String>,
        hint: Option<String>,
    },
}

impl AppError {
    pub fn user_input(message: impl Into<String>) -> Self {
        Self::UserInput {
            message: Some(message.into()),
            hint: None,
        }
    }

    pub fn domain_rule(message: impl Into<String>) -> Self {
        Self::DomainRule {
            message: Some(message.into()),
            hint: None,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: Some(message.into()),
            hint: None,
        }
    }

    /// Replace the remediation hint.
    pub fn with_hint(mut self, new_hint: impl Into<String>) -> Self {
        match &mut self {
            Self::UserInput { hint, .. }
            | Self::DomainRule { hint, .. }
            | Self::System { hint, .. } => *hint = Some(new_hint.into()),
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UserInput { .. } => ErrorKind::UserInput,
            Self::DomainRule { .. } => ErrorKind::DomainRule,
            Self::System { .. } => ErrorKind::System,
        }
    }

    /// Caller-supplied message, if any and non-blank.
    pub fn message(&self) -> Option<&str> {
        let (Self::UserInput { message, .. }
        | Self::DomainRule { message, .. }
        | Self::System { message, .. }) = self;
        non_blank(message)
    }

    /// Caller-supplied hint, if any and non-blank.
    pub fn hint(&self) -> Option<&str> {
        let (Self::UserInput { hint, .. } | Self::DomainRule { hint, .. } | Self::System { hint, .. }) =
            self;
        non_blank(hint)
    }
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.trim().is_empty())
}

fn text_or<'a>(s: &'a Option<String>, fallback: &'a str) -> &'a str {
    non_blank(s).unwrap_or(fallback)
}

/// Operator-requested cancellation (Ctrl-C).
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("interrupted by user")]
pub struct Interrupted;

/// Any failure that escaped an operation.
///
/// Every `std::error::Error` converts into a `Failure` with `?`; the short name
/// of the original type is kept so unclassified failures can say what they
/// were.
pub struct Failure {
    type_name: &'static str,
    error: anyhow::Error,
}

impl<E> From<E> for Failure
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self {
            type_name: short_type_name(std::any::type_name::<E>()),
            error: anyhow::Error::new(error),
        }
    }
}

impl Failure {
    pub fn interrupted() -> Self {
        Interrupted.into()
    }

    /// Wrap an `anyhow::Error` coming from adapter code.
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        let type_name = if error.is::<AppError>() {
            "AppError"
        } else if error.is::<Interrupted>() {
            "Interrupted"
        } else {
            "Error"
        };
        Self { type_name, error }
    }

    pub fn is_interrupt(&self) -> bool {
        self.error.is::<Interrupted>()
    }

    /// The raised [`AppError`], if this failure is one.
    pub fn app_error(&self) -> Option<&AppError> {
        self.error.downcast_ref::<AppError>()
    }

    /// Short name of the original error type (`ParseIntError`, `AppError`, ...).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Top-level message of the original error.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Full cause chain, `outer: inner: root`.
    pub fn chain(&self) -> String {
        format!("{:#}", self.error)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("type_name", &self.type_name)
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
