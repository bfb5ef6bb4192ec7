//! Error reporting for the two kinds of entry points.
//!
//! - Service path ([`report_and_continue`], [`run_reported`]): long-running
//!   handlers. The failure is logged, replied to the user when a reply channel
//!   exists, and the caller carries on.
//! - Process path ([`report_and_exit`], [`run_until_interrupted`]): one-shot
//!   command-line invocations. The failure is printed to stdout and the process
//!   ends with the exit code of its kind.

use std::{future::Future, io::Write};

use tracing::{error, info, warn};

use crate::{
    classify::{classify, ErrorRecord},
    failure::Failure,
    logging::LogGuard,
    messaging::ReplyChannel,
};

/// Exit code for operator-requested cancellation.
pub const INTERRUPT_EXIT_CODE: u8 = 130;

/// Printed instead of the three-line message when the run was interrupted.
pub const INTERRUPT_NOTICE: &str = "\n⚠️  interrupted by user";

/// What the process path does with a failure: print `message`, exit with
/// `exit_code`.
#[derive(Clone, Debug)]
pub struct Disposition {
    pub exit_code: u8,
    pub message: String,
    /// `None` for interrupts, which bypass classification.
    pub record: Option<ErrorRecord>,
}

impl Disposition {
    pub fn for_failure(failure: &Failure) -> Self {
        if failure.is_interrupt() {
            return Self {
                exit_code: INTERRUPT_EXIT_CODE,
                message: INTERRUPT_NOTICE.to_string(),
                record: None,
            };
        }

        let record = classify(failure);
        Self {
            exit_code: record.exit_code(),
            message: record.to_user_message(),
            record: Some(record),
        }
    }
}

/// Emit the structured log line for a classified failure.
///
/// Known kinds log at WARN, named by `kind`. Unclassified failures log at
/// ERROR with the original type name and the full cause chain.
pub fn log_record(record: &ErrorRecord, failure: &Failure) {
    if record.kind().is_known() {
        warn!(
            kind = record.code(),
            correlation_id = record.correlation_id(),
            "{}",
            record.message()
        );
    } else {
        error!(
            kind = record.code(),
            correlation_id = record.correlation_id(),
            failure_type = failure.type_name(),
            chain = %failure.chain(),
            detail = ?failure,
            "{}",
            record.message()
        );
    }
}

/// Service-path sink: classify, log, reply once if a channel exists.
///
/// Never propagates. A failed reply is logged with the same correlation id and
/// dropped; there is no retry.
pub async fn report_and_continue(
    failure: Failure,
    reply: Option<&dyn ReplyChannel>,
) -> ErrorRecord {
    let record = classify(&failure);
    log_record(&record, &failure);

    if let Some(channel) = reply {
        if let Err(e) = channel.reply(&record.to_user_message()).await {
            error!(
                correlation_id = record.correlation_id(),
                chat_id = channel.chat_id().map(|c| c.0),
                error = %e,
                "failed to deliver error reply"
            );
        }
    }

    record
}

/// Run `op`; on failure report it through [`report_and_continue`].
///
/// Returns `Some(value)` on success and `None` when the failure was reported.
pub async fn run_reported<T, Fut>(op: Fut, reply: Option<&dyn ReplyChannel>) -> Option<T>
where
    Fut: Future<Output = Result<T, Failure>>,
{
    match op.await {
        Ok(v) => Some(v),
        Err(failure) => {
            report_and_continue(failure, reply).await;
            None
        }
    }
}

/// Run the top-level future of a command-line invocation, turning Ctrl-C into
/// an [`crate::failure::Interrupted`] failure.
pub async fn run_until_interrupted<T, Fut>(op: Fut) -> Result<T, Failure>
where
    Fut: Future<Output = Result<T, Failure>>,
{
    tokio::pin!(op);
    tokio::select! {
        out = &mut op => out,
        sig = tokio::signal::ctrl_c() => match sig {
            Ok(()) => Err(Failure::interrupted()),
            Err(e) => {
                warn!(error = %e, "ctrl-c handler unavailable");
                op.await
            }
        },
    }
}

/// Process-path sink: print the message to stdout, flush logs and exit.
///
/// Call once, around the single top-level entry function.
pub fn report_and_exit(failure: Failure, guard: LogGuard) -> ! {
    let disposition = Disposition::for_failure(&failure);
    match &disposition.record {
        Some(record) => log_record(record, &failure),
        None => info!("interrupted by operator"),
    }

    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "{}", disposition.message);
    let _ = out.flush();
    drop(out);

    drop(guard);
    std::process::exit(i32::from(disposition.exit_code));
}

#[cfg(test)]
mod tests {
    use std::{
        fmt,
        sync::{Arc, Mutex},
    };

    use tracing::{
        field::{Field, Visit},
        Event, Level, Subscriber,
    };
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer,
    };

    use super::*;
    use crate::{
        failure::{AppError, ErrorKind},
        messaging::RecordingReply,
    };

    #[derive(Clone, Debug, Default)]
    struct Logged {
        level: Option<Level>,
        correlation_id: Option<String>,
        failure_type: Option<String>,
    }

    impl Visit for Logged {
        fn record_str(&mut self, field: &Field, value: &str) {
            match field.name() {
                "correlation_id" => self.correlation_id = Some(value.to_string()),
                "failure_type" => self.failure_type = Some(value.to_string()),
                _ => {}
            }
        }

        fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
    }

    /// Layer that keeps every event it sees.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<Logged>>>);

    impl Capture {
        fn events(&self) -> Vec<Logged> {
            self.0.lock().unwrap().clone()
        }
    }

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut logged = Logged {
                level: Some(*event.metadata().level()),
                ..Logged::default()
            };
            event.record(&mut logged);
            self.0.lock().unwrap().push(logged);
        }
    }

    fn capturing() -> (Capture, impl Subscriber + Send + Sync) {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        (capture, subscriber)
    }

    #[test]
    fn log_level_follows_kind() {
        let (capture, subscriber) = capturing();
        let (known, unknown) = tracing::subscriber::with_default(subscriber, || {
            let known: Failure = AppError::user_input("bad flag").into();
            let known_rec = classify(&known);
            log_record(&known_rec, &known);

            let unknown: Failure = std::io::Error::other("disk gone").into();
            let unknown_rec = classify(&unknown);
            log_record(&unknown_rec, &unknown);
            (known_rec, unknown_rec)
        });

        let events = capture.events();
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].level, Some(Level::WARN));
        assert_eq!(events[0].correlation_id.as_deref(), Some(known.correlation_id()));
        assert_eq!(events[0].failure_type, None);

        assert_eq!(events[1].level, Some(Level::ERROR));
        assert_eq!(events[1].correlation_id.as_deref(), Some(unknown.correlation_id()));
        assert_eq!(events[1].failure_type.as_deref(), Some("Error"));
    }

    #[tokio::test]
    async fn reply_and_log_share_the_correlation_id() {
        let (capture, subscriber) = capturing();
        let _default = tracing::subscriber::set_default(subscriber);

        let channel = RecordingReply::failing();
        let rec = report_and_continue(AppError::domain_rule("too long").into(), Some(&channel)).await;

        let sent = channel.sent();
        assert!(sent[0].ends_with(&format!("🔍 trace: {}", rec.correlation_id())));

        // The classified failure, then the failed delivery, both under one id.
        let events = capture.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, Some(Level::WARN));
        assert_eq!(events[1].level, Some(Level::ERROR));
        for event in &events {
            assert_eq!(event.correlation_id.as_deref(), Some(rec.correlation_id()));
        }
    }

    #[test]
    fn exit_codes_per_failure() {
        let cases: Vec<(Failure, u8)> = vec![
            (AppError::user_input("u").into(), 2),
            (AppError::domain_rule("d").into(), 3),
            (AppError::system("s").into(), 1),
            (std::io::Error::other("boom").into(), 1),
            (Failure::interrupted(), 130),
        ];
        for (failure, code) in cases {
            assert_eq!(Disposition::for_failure(&failure).exit_code, code);
        }
    }

    #[test]
    fn interrupt_bypasses_classification() {
        let d = Disposition::for_failure(&Failure::interrupted());
        assert!(d.record.is_none());
        assert_eq!(d.message, INTERRUPT_NOTICE);
    }

    #[test]
    fn missing_parameter_end_to_end() {
        let d = Disposition::for_failure(&AppError::user_input("missing parameter").into());
        let rec = d.record.as_ref().unwrap();
        assert_eq!(rec.kind(), ErrorKind::UserInput);
        assert_eq!(rec.message(), "missing parameter");
        assert_eq!(rec.hint(), ErrorKind::UserInput.default_hint());
        assert_eq!(
            d.message,
            format!(
                "❌ missing parameter\n💡 check command format and arguments\n🔍 trace: {}",
                rec.correlation_id()
            )
        );
        assert_eq!(d.exit_code, 2);
    }

    #[test]
    fn runtime_failure_message_names_type() {
        let d = Disposition::for_failure(&std::io::Error::other("disk gone").into());
        assert!(d.message.starts_with("❌ unexpected error (Error): disk gone"));
    }

    #[tokio::test]
    async fn continue_replies_once_for_unclassified_failure() {
        let channel = RecordingReply::new();
        let rec = report_and_continue(
            std::io::Error::other("socket reset").into(),
            Some(&channel),
        )
        .await;

        let sent = channel.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(rec.kind(), ErrorKind::Unclassified);
        assert!(sent[0].contains(rec.correlation_id()));
        assert_eq!(sent[0].lines().count(), 3);
    }

    #[tokio::test]
    async fn continue_without_channel_is_a_noop() {
        let rec = report_and_continue(AppError::user_input("x").into(), None).await;
        assert_eq!(rec.kind(), ErrorKind::UserInput);
    }

    #[tokio::test]
    async fn failed_reply_does_not_propagate() {
        let channel = RecordingReply::failing();
        let rec = report_and_continue(AppError::domain_rule("too long").into(), Some(&channel)).await;
        assert_eq!(channel.sent().len(), 1);
        assert_eq!(rec.message(), "too long");
    }

    #[tokio::test]
    async fn run_reported_passes_value_through() {
        let channel = RecordingReply::new();
        let out = run_reported(async { Ok::<_, Failure>(7) }, Some(&channel)).await;
        assert_eq!(out, Some(7));
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn run_reported_swallows_failure() {
        let channel = RecordingReply::new();
        let out: Option<()> = run_reported(
            async { Err::<(), Failure>(AppError::user_input("bad flag").into()) },
            Some(&channel),
        )
        .await;
        assert!(out.is_none());
        assert!(channel.sent()[0].starts_with("❌ bad flag\n"));
    }

    #[tokio::test]
    async fn run_until_interrupted_returns_result() {
        let out = run_until_interrupted(async { Ok::<_, Failure>("done") }).await;
        assert_eq!(out.unwrap(), "done");
    }
}
