//! Terminal alarm sink.
//!
//! Rings the terminal bell and prints a styled banner instead of playing the
//! configured sound file.

use console::{style, Term};
use geoalarm::sound::{AlarmSink, SoundConfig};

/// An [`AlarmSink`] that writes to the terminal.
#[derive(Debug)]
pub struct TerminalSink {
    config: SoundConfig,
    term: Term,
}

impl TerminalSink {
    pub fn new(config: SoundConfig) -> Self {
        Self {
            config,
            term: Term::stdout(),
        }
    }

    fn describe(&self) -> String {
        format!(
            "{} at {:.0}% volume{}",
            self.config.path.display(),
            self.config.volume * 100.0,
            if self.config.looped { ", looped" } else { "" }
        )
    }
}

impl AlarmSink for TerminalSink {
    fn start(&self) {
        let line = format!(
            "\u{7}{} {}",
            style("ALARM").red().bold(),
            style(format!("You have arrived ({})", self.describe())).bold()
        );
        if let Err(e) = self.term.write_line(&line) {
            tracing::warn!(error = %e, "Could not write alarm to terminal");
        }
    }

    fn stop(&self) {
        let line = style("Alarm silenced").dim().to_string();
        if let Err(e) = self.term.write_line(&line) {
            tracing::warn!(error = %e, "Could not write to terminal");
        }
    }
}
