//! User-facing notifications
//!
//! The conversation store reports every outcome the user should see through a
//! [`Notifier`]. Delivery is fire-and-forget; the store never inspects a
//! result.

use colored::Colorize;

/// How a notification should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// An action completed
    Success,
    /// Neutral information
    Info,
    /// Something degraded but the action went through
    Warning,
    /// An action failed
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(s)
    }
}

/// Sink for user-facing messages.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Show `message` to the user.
    fn notify(&self, message: &str, severity: Severity);
}

/// Forwards notifications to `tracing`, for headless embedding.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::error!(%severity, "{}", message),
            Severity::Warning => tracing::warn!(%severity, "{}", message),
            Severity::Success | Severity::Info => tracing::info!(%severity, "{}", message),
        }
    }
}

/// Prints colored notifications to the terminal.
///
/// Errors and warnings go to stderr so piped `--json` output stays clean.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    /// The line printed for `message` at `severity`.
    pub fn render(message: &str, severity: Severity) -> String {
        match severity {
            Severity::Success => format!("{} {}", "✓".green(), message.green()),
            Severity::Info => message.cyan().to_string(),
            Severity::Warning => format!("{} {}", "!".yellow(), message.yellow()),
            Severity::Error => format!("{} {}", "✗".red(), message.red()),
        }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let line = Self::render(message, severity);
        match severity {
            Severity::Error | Severity::Warning => eprintln!("{}", line),
            Severity::Success | Severity::Info => println!("{}", line),
        }
    }
}
