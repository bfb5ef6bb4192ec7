use std::fmt;

use serde::Serialize;

use crate::failure::{ErrorKind, Failure};

/// Length of a correlation id.
pub const CORRELATION_ID_LEN: usize = 8;

/// Classified failure: kind, message, hint and a fresh correlation id.
///
/// The correlation id is the first 8 hex characters of a random UUID. It is
/// meant for matching a user-visible message with its log line, not for
/// deduplication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "code", serialize_with = "serialize_kind")]
    kind: ErrorKind,
    message: String,
    hint: String,
    #[serde(rename = "correlationId")]
    correlation_id: String,
}

impl ErrorRecord {
    /// Build a record, substituting per-kind defaults for blank message/hint.
    pub fn new(kind: ErrorKind, message: Option<&str>, hint: Option<&str>) -> Self {
        let pick = |v: Option<&str>, fallback: &str| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(fallback)
                .to_string()
        };
        Self {
            kind,
            message: pick(message, kind.default_message()),
            hint: pick(hint, kind.default_hint()),
            correlation_id: new_correlation_id(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Three-line message shown to the user.
    pub fn to_user_message(&self) -> String {
        format!(
            "❌ {}\n💡 {}\n🔍 trace: {}",
            self.message, self.hint, self.correlation_id
        )
    }

    /// `{"code","message","hint","correlationId"}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.code(),
            "message": self.message,
            "hint": self.hint,
            "correlationId": self.correlation_id,
        })
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (hint: {}; trace: {})",
            self.code(),
            self.message,
            self.hint,
            self.correlation_id
        )
    }
}

fn serialize_kind<S: serde::Serializer>(kind: &ErrorKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(kind.code())
}

/// Map any failure onto an [`ErrorRecord`].
///
/// Raised [`crate::failure::AppError`]s keep their kind; everything else is
/// `Unclassified` with the original type name in the message. Never fails.
pub fn classify(failure: &Failure) -> ErrorRecord {
    if let Some(app) = failure.app_error() {
        return ErrorRecord::new(app.kind(), app.message(), app.hint());
    }

    let original = failure.message();
    let original = original.trim();
    let message = if original.is_empty() {
        format!("unexpected error ({})", failure.type_name())
    } else {
        format!("unexpected error ({}): {original}", failure.type_name())
    };
    ErrorRecord::new(ErrorKind::Unclassified, Some(&message), None)
}

pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(CORRELATION_ID_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::failure::AppError;

    #[test]
    fn known_kinds_keep_kind_and_exit_code() {
        let cases = [
            (AppError::user_input("a"), ErrorKind::UserInput, 2),
            (AppError::domain_rule("b"), ErrorKind::DomainRule, 3),
            (AppError::system("c"), ErrorKind::System, 1),
        ];
        for (err, kind, code) in cases {
            let rec = classify(&Failure::from(err));
            assert_eq!(rec.kind(), kind);
            assert_eq!(rec.exit_code(), code);
        }
    }

    #[test]
    fn missing_message_and_hint_use_defaults() {
        let rec = classify(&Failure::from(AppError::UserInput {
            message: None,
            hint: None,
        }));
        assert_eq!(rec.message(), "invalid input");
        assert_eq!(rec.hint(), "check command format and arguments");

        let rec = classify(&Failure::from(AppError::System {
            message: Some(String::new()),
            hint: Some(" ".to_string()),
        }));
        assert_eq!(rec.message(), "unexpected system error occurred");
        assert_eq!(rec.hint(), "contact the administrator");
    }

    #[test]
    fn unknown_failure_is_unclassified_with_type_name() {
        let err = "abc".parse::<u32>().unwrap_err();
        let rec = classify(&Failure::from(err));
        assert_eq!(rec.kind(), ErrorKind::Unclassified);
        assert_eq!(rec.exit_code(), 1);
        assert!(rec
            .message()
            .starts_with("unexpected error (ParseIntError): invalid digit"));
        assert_eq!(rec.hint(), "unexpected system error");
    }

    #[test]
    fn unknown_failure_with_empty_message() {
        #[derive(Debug, thiserror::Error)]
        #[error("")]
        struct Silent;

        let rec = classify(&Failure::from(Silent));
        assert_eq!(rec.message(), "unexpected error (Silent)");
    }

    #[test]
    fn correlation_ids_have_fixed_length_and_do_not_repeat() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let rec = classify(&Failure::from(AppError::user_input("x")));
            assert_eq!(rec.correlation_id().chars().count(), CORRELATION_ID_LEN);
            assert!(seen.insert(rec.correlation_id().to_string()));
        }
    }

    #[test]
    fn domain_rule_rendering_contains_message_hint_and_code() {
        let rec = classify(&Failure::from(AppError::domain_rule("X").with_hint("Y")));
        let rendered = rec.to_string();
        assert!(rendered.contains('X'));
        assert!(rendered.contains('Y'));
        assert!(rendered.contains("DOMAINRULE"));

        let user = rec.to_user_message();
        assert_eq!(
            user,
            format!("❌ X\n💡 Y\n🔍 trace: {}", rec.correlation_id())
        );
    }

    #[test]
    fn json_has_exactly_four_keys() {
        let rec = classify(&Failure::from(AppError::domain_rule("text too long")));
        let v = rec.to_json();
        let obj = v.as_object().unwrap();
        let keys: HashSet<&str> = obj.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            HashSet::from(["code", "message", "hint", "correlationId"])
        );
        assert_eq!(obj["code"], "DOMAINRULE");

        // Serialize derive agrees with to_json.
        assert_eq!(serde_json::to_value(&rec).unwrap(), v);
    }
}
