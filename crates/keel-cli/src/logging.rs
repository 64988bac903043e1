use std::io::Write;

use nu_ansi_term::Color::{Blue, Cyan, DarkGray, Magenta, Red, Yellow};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self,
        format::{FmtSpan, Writer},
        FmtContext, FormatEvent, FormatFields, MakeWriter,
    },
    registry::LookupSpan,
};

use crate::{cli::Args, utils::Colored};

/// Fields of one event, split into the message, the registry/package it concerns,
/// and everything else.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    registry: Option<String>,
    package: Option<String>,
    extra: Vec<(&'static str, String)>,
}

impl EventFields {
    fn record(&mut self, name: &'static str, value: String) {
        match name {
            "message" => self.message = Some(value),
            "registry" => self.registry = Some(value),
            "package" => self.package = Some(value),
            _ => self.extra.push((name, value)),
        }
    }

    /// `registry/package`, or whichever of the two is set.
    fn subject(&self) -> Option<String> {
        match (&self.registry, &self.package) {
            (Some(registry), Some(package)) => Some(format!("{registry}/{package}")),
            (Some(one), None) | (None, Some(one)) => Some(one.clone()),
            (None, None) => None,
        }
    }

    /// INFO events are command output and print the message alone. Diagnostics
    /// carry a level tag, their subject and the remaining fields.
    fn render(&self, level: Level, out: &mut impl std::fmt::Write) -> std::fmt::Result {
        let tag = match level {
            Level::TRACE => Some(Colored(Magenta, "[TRACE]")),
            Level::DEBUG => Some(Colored(Blue, "[DEBUG]")),
            Level::INFO => None,
            Level::WARN => Some(Colored(Yellow, "[WARN]")),
            Level::ERROR => Some(Colored(Red, "[ERROR]")),
        };
        let message = self.message.as_deref().unwrap_or_default();

        let Some(tag) = tag else {
            return writeln!(out, "{message}");
        };

        write!(out, "{tag} ")?;
        if let Some(subject) = self.subject() {
            write!(out, "{}: ", Colored(Cyan, subject))?;
        }
        write!(out, "{message}")?;
        for (name, value) in &self.extra {
            write!(out, " {}", Colored(DarkGray, format!("{name}={value}")))?;
        }
        writeln!(out)
    }
}

impl tracing::field::Visit for EventFields {
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.record(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.record(field.name(), format!("{value:?}"));
    }
}

pub struct CustomFormatter;

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        fields.render(*event.metadata().level(), &mut writer)
    }
}

struct WriterBuilder;

/// Buffers one formatted event and writes it in a single call on drop, so lines
/// from the two streams never interleave mid-event.
struct EventWriter {
    buffer: Vec<u8>,
    use_stderr: bool,
}

impl EventWriter {
    fn new(use_stderr: bool) -> Self {
        Self {
            buffer: Vec::new(),
            use_stderr,
        }
    }
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        // Write errors, such as a closed pipe, are dropped.
        let _ = if self.use_stderr {
            std::io::stderr().lock().write_all(&self.buffer)
        } else {
            std::io::stdout().lock().write_all(&self.buffer)
        };
    }
}

impl<'a> MakeWriter<'a> for WriterBuilder {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        EventWriter::new(false)
    }

    fn make_writer_for(&'a self, meta: &tracing::Metadata<'_>) -> Self::Writer {
        EventWriter::new(meta.level() != &Level::INFO)
    }
}

/// Installs the global subscriber. INFO events are the command output and go to
/// stdout; every other level goes to stderr.
pub fn setup_logging(args: &Args) {
    let filter_level = if args.quiet {
        Level::ERROR
    } else if args.verbose >= 2 {
        Level::TRACE
    } else if args.verbose == 1 {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let builder = fmt::Subscriber::builder()
        .with_env_filter(format!("keel={filter_level}"))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(WriterBuilder)
        .compact()
        .without_time();

    let subscriber: Box<dyn Subscriber + Send + Sync> = if args.json {
        Box::new(builder.json().flatten_event(true).finish())
    } else {
        Box::new(builder.event_format(CustomFormatter).finish())
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::utils::set_color;

    fn render(fields: &EventFields, level: Level) -> String {
        let mut out = String::new();
        fields.render(level, &mut out).unwrap();
        out
    }

    #[test]
    #[serial]
    fn test_info_prints_message_only() {
        set_color(false);
        let mut fields = EventFields::default();
        fields.record("message", "Foo 1.0.0".to_string());
        fields.record("registry", "General".to_string());
        fields.record("count", "3".to_string());

        assert_eq!(render(&fields, Level::INFO), "Foo 1.0.0\n");
        set_color(true);
    }

    #[test]
    #[serial]
    fn test_diagnostic_shows_subject_and_fields() {
        set_color(false);
        let mut fields = EventFields::default();
        fields.record("message", "loading package metadata".to_string());
        fields.record("package", "Foo".to_string());
        fields.record("path", "/depot/F/Foo".to_string());
        assert_eq!(
            render(&fields, Level::DEBUG),
            "[DEBUG] Foo: loading package metadata path=/depot/F/Foo\n"
        );

        fields.record("registry", "General".to_string());
        assert_eq!(
            render(&fields, Level::WARN),
            "[WARN] General/Foo: loading package metadata path=/depot/F/Foo\n"
        );

        let bare = EventFields::default();
        assert_eq!(render(&bare, Level::TRACE), "[TRACE] \n");
        set_color(true);
    }
}
