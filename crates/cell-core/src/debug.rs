use core::fmt;
use std::cell::Cell;
use std::fs::OpenOptions;
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt as tracingfmt};

use crate::SimTime;

#[macro_export]
macro_rules! unimplemented_log {
    ( $($arg:tt)* ) => {{
        tracing::warn!(
            "unimplemented: {}",
            format_args!($($arg)*),
        );
    }};
}

/// if `cond` is false, logs a warning with your message.
#[macro_export]
macro_rules! assert_warn {
    ($cond:expr, $($arg:tt)+) => {{
        if !$cond {
            tracing::warn!(
                target: module_path!(),
                "assertion warning: `{}` failed: {} at {}:{}",
                stringify!($cond),
                format_args!($($arg)+),
                file!(),
                line!(),
            );
        }
    }};
}

thread_local! {
    /// Simulated time of the event being processed, prefixed to every log line
    static LOG_TIME: Cell<Option<SimTime>> = const { Cell::new(None) };
}

/// Sets the simulated time shown in log lines emitted from this thread
pub fn set_log_time(t: SimTime) {
    LOG_TIME.with(|c| c.set(Some(t)));
}

struct AlignedFormatter;

impl<S, N> FormatEvent<S, N> for AlignedFormatter
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let time_str = match LOG_TIME.with(|c| c.get()) {
            Some(t) => format!("{:>10}", t.to_string()),
            None => "          ".to_string(),
        };

        let (color_level, color_reset) = if writer.has_ansi_escapes() {
            match *metadata.level() {
                tracing::Level::ERROR => ("\x1b[31m", "\x1b[0m"),
                tracing::Level::WARN => ("\x1b[33m", "\x1b[0m"),
                tracing::Level::INFO => ("\x1b[32m", "\x1b[0m"),
                tracing::Level::DEBUG => ("\x1b[34m", "\x1b[0m"),
                tracing::Level::TRACE => ("\x1b[35m", "\x1b[0m"),
            }
        } else {
            ("", "")
        };

        // "crates/cell-entities/src/sc/subentities/cc_sc.rs" becomes "[entities/sc] cc_sc.rs"
        let file_path = metadata.file().unwrap_or("unknown");
        let formatted_path = if let Some(src_idx) = file_path.find("/src/") {
            let before_src = &file_path[..src_idx];
            let after_src = &file_path[src_idx + 5..];

            let crate_name = if let Some(idx) = before_src.rfind("cell-") {
                &before_src[idx + 5..]
            } else {
                before_src.rsplit('/').next().unwrap_or("unknown")
            };

            if let Some(last_slash) = after_src.rfind('/') {
                let module_path = &after_src[..last_slash];
                let filename = &after_src[last_slash + 1..];
                let first_module = module_path.split('/').next().unwrap_or("");
                format!("{} [{}/{}] {}", time_str, crate_name, first_module, filename)
            } else {
                format!("{} [{}] {}", time_str, crate_name, after_src)
            }
        } else {
            format!("{} {}", time_str, file_path)
        };

        let location = format!(
            "{}{:<5}{} {}:{}:",
            color_level,
            metadata.level(),
            color_reset,
            formatted_path,
            metadata.line().unwrap_or(0)
        );

        let mut message_buf = String::new();
        let message_writer = format::Writer::new(&mut message_buf);
        ctx.field_format().format_fields(message_writer, event)?;

        // Messages starting with "->" or "<-" are pulled left a bit
        let mut padding = 66;
        if message_buf.starts_with("->") || message_buf.starts_with("<-") {
            padding -= 3;
        }

        write!(writer, "{:<width$} {}", location, message_buf, width = padding)?;
        writeln!(writer)
    }
}

static INIT_LOG: Once = Once::new();

/// Sets up logging with maximum verbosity (trace level)
/// Mainly for unit tests
pub fn setup_logging_verbose() {
    setup_logging(EnvFilter::new("trace"), None);
}

/// Sets up default logging to stdout and optionally, a verbose log file
/// Returns a guard, that needs to be kept alive for logging to file to work
pub fn setup_logging_default(verbose_logfile: Option<String>) -> Option<WorkerGuard> {
    let stdout_filter = get_default_stdout_filter();
    let logfile_and_filter = verbose_logfile.map(|file| (file, get_default_logfile_filter()));
    setup_logging(stdout_filter, logfile_and_filter)
}

fn directive(s: &str) -> tracing_subscriber::filter::Directive {
    // Directives below are literals, a typo is a programming error
    s.parse().unwrap_or_else(|e| panic!("invalid log directive {}: {}", s, e))
}

pub fn get_default_stdout_filter() -> EnvFilter {
    EnvFilter::new("info")
        // Hide continuous logs from the plumbing
        .add_directive(directive("cell_entities::messagerouter=warn"))
        .add_directive(directive("cell_core::bitbuffer=warn"))
        .add_directive(directive("cell_core::timer_registry=warn"))
        .add_directive(directive("cell_core::resource_pool=info"))

        // Role state machines
        .add_directive(directive("cell_entities::ms=info"))
        .add_directive(directive("cell_entities::bs=info"))
        .add_directive(directive("cell_entities::sc=info"))
        .add_directive(directive("cell_entities::gateway=info"))
        .add_directive(directive("cell_entities::hlr=info"))
}

fn get_default_logfile_filter() -> EnvFilter {
    EnvFilter::new("debug")
        .add_directive(directive("cell_core::bitbuffer=info"))
}

/// Sets up logging to stdout and optionally, a verbose log file
/// If an output file is requested, returns Some<WorkerGuard>. Keep this value alive
/// or logging to file may cease working. If no output file is provided, returns None.
fn setup_logging(stdout_filter: EnvFilter, outfile: Option<(String, EnvFilter)>) -> Option<WorkerGuard> {
    if let Some((outfile, outfile_filter)) = outfile {
        let file = match OpenOptions::new().create(true).append(true).open(&outfile) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", outfile, e);
                return setup_logging(stdout_filter, None);
            }
        };
        let (file_writer, guard) = tracing_appender::non_blocking(file);

        INIT_LOG.call_once(|| {
            let file_layer = tracingfmt::layer()
                .event_format(AlignedFormatter)
                .with_writer(file_writer)
                .with_ansi(false);
            let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter);

            tracing_subscriber::registry()
                .with(file_layer.with_filter(outfile_filter))
                .with(stdout_layer.with_filter(stdout_filter))
                .init();
        });

        Some(guard)
    } else {
        INIT_LOG.call_once(|| {
            let stdout_layer = tracingfmt::layer().event_format(AlignedFormatter);
            tracing_subscriber::registry()
                .with(stdout_layer.with_filter(stdout_filter))
                .init();
        });
        None
    }
}
