//! Human-readable diagnostic output with optional ANSI color.

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

use super::{DiagnosticEmitter, SourceFile};

mod colors {
    pub const ERROR: &str = "\x1b[1;31m";
    pub const WARNING: &str = "\x1b[1;33m";
    pub const NOTE: &str = "\x1b[1;36m";
    pub const HELP: &str = "\x1b[1;32m";
    pub const BOLD: &str = "\x1b[1m";
    pub const SECONDARY: &str = "\x1b[1;34m";
    pub const RESET: &str = "\x1b[0m";
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Color output mode for the terminal emitter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// For `Auto`, `is_tty` decides.
    pub fn should_use_colors(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }

    /// Parse a `--color=` value.
    pub fn from_flag(value: &str) -> Option<Self> {
        match value {
            "auto" => Some(ColorMode::Auto),
            "always" => Some(ColorMode::Always),
            "never" => Some(ColorMode::Never),
            _ => None,
        }
    }
}

/// Terminal emitter. With a [`SourceFile`] attached, labels are shown as
/// `path:line:col` followed by the source line and a caret underline;
/// without one, labels fall back to raw byte ranges.
pub struct TerminalEmitter<'src, W: Write> {
    writer: W,
    colors: bool,
    source: Option<SourceFile<'src>>,
}

impl<'src, W: Write> TerminalEmitter<'src, W> {
    pub fn with_color_mode(writer: W, mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter {
            writer,
            colors: mode.should_use_colors(is_tty),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceFile<'src>) -> Self {
        self.source = Some(source);
        self
    }

    fn write_colored(&mut self, text: &str, color: &str) {
        if self.colors {
            let _ = write!(self.writer, "{color}{text}{}", colors::RESET);
        } else {
            let _ = write!(self.writer, "{text}");
        }
    }

    fn write_severity(&mut self, severity: Severity) {
        let color = match severity {
            Severity::Error => colors::ERROR,
            Severity::Warning => colors::WARNING,
            Severity::Note => colors::NOTE,
        };
        self.write_colored(&severity.to_string(), color);
    }

    fn write_code(&mut self, code: &str) {
        self.write_colored(&format!("[{code}]"), colors::BOLD);
    }

    /// `--> path:line:col`, then the line and an underline when the source
    /// is available and belongs to the diagnostic's file.
    fn write_label(&mut self, diagnostic: &Diagnostic, index: usize) {
        let label = &diagnostic.labels[index];
        let marker = if label.is_primary { "-->" } else { ":::" };
        let color = if label.is_primary {
            colors::ERROR
        } else {
            colors::SECONDARY
        };

        let source = self
            .source
            .clone()
            .filter(|s| diagnostic.file.as_deref().is_none_or(|f| f == s.path));
        let Some(source) = source else {
            let file = diagnostic.file.as_deref().unwrap_or("<input>");
            let _ = write!(self.writer, "  {marker} {file} {:?}: ", label.span);
            self.write_colored(&label.message, color);
            let _ = writeln!(self.writer);
            return;
        };

        let (line, col) = label.span.line_col(source.text);
        let _ = writeln!(self.writer, "  {marker} {}:{line}:{col}", source.path);
        let text = source.text.lines().nth(line - 1).unwrap_or_default();
        let gutter = line.to_string().len();
        let _ = writeln!(self.writer, " {:gutter$} |", "");
        let _ = writeln!(self.writer, " {line} | {text}");
        let width = (label.span.len() as usize)
            .min(text.len().saturating_sub(col - 1))
            .max(1);
        let mark = if label.is_primary { "^" } else { "-" };
        let _ = write!(self.writer, " {:gutter$} | {:pad$}", "", "", pad = col - 1);
        self.write_colored(&format!("{} {}", mark.repeat(width), label.message), color);
        let _ = writeln!(self.writer);
    }
}

impl TerminalEmitter<'_, io::Stderr> {
    pub fn stderr(mode: ColorMode, is_tty: bool) -> Self {
        TerminalEmitter::with_color_mode(io::stderr(), mode, is_tty)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<'_, W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.write_severity(diagnostic.severity);
        self.write_code(diagnostic.code.as_str());
        let _ = writeln!(self.writer, ": {}", diagnostic.message);

        for index in 0..diagnostic.labels.len() {
            self.write_label(diagnostic, index);
        }
        if diagnostic.labels.is_empty() {
            if let Some(file) = &diagnostic.file {
                let _ = writeln!(self.writer, "  --> {file}");
            }
        }

        for note in &diagnostic.notes {
            let _ = write!(self.writer, "  = ");
            self.write_colored("note", colors::BOLD);
            let _ = writeln!(self.writer, ": {note}");
        }
        for suggestion in &diagnostic.suggestions {
            let _ = write!(self.writer, "  = ");
            self.write_colored("help", colors::HELP);
            let _ = writeln!(self.writer, ": {suggestion}");
        }
        let _ = writeln!(self.writer);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        if error_count > 0 {
            self.write_colored("error", colors::ERROR);
            let error_part = if error_count == 1 {
                "previous error".to_string()
            } else {
                format!("{error_count} previous errors")
            };
            if warning_count > 0 {
                let _ = writeln!(
                    self.writer,
                    ": aborting due to {error_part}; {warning_count} warning{} emitted",
                    plural_s(warning_count)
                );
            } else {
                let _ = writeln!(self.writer, ": aborting due to {error_part}");
            }
        } else if warning_count > 0 {
            self.write_colored("warning", colors::WARNING);
            let _ = writeln!(
                self.writer,
                ": {warning_count} warning{} emitted",
                plural_s(warning_count)
            );
        }
    }
}
