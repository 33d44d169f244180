#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use garnet_ir::Span;

use super::*;
use crate::ErrorCode;

const SOURCE: &str = "(begin\n  (const nil :Foo))";

fn sample() -> Diagnostic {
    Diagnostic::error(ErrorCode::E1001)
        .with_message("unknown constant `Foo`")
        .with_label(Span::new(9, 25), "not defined")
        .with_note("constants are resolved lexically")
}

fn render(diag: &Diagnostic, source: Option<SourceFile<'_>>) -> String {
    let mut output = Vec::new();
    {
        let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Never, false);
        if let Some(source) = source {
            emitter = emitter.with_source(source);
        }
        emitter.emit(diag);
        emitter.flush();
    }
    String::from_utf8(output).unwrap()
}

#[test]
fn test_snippet_with_source() {
    let text = render(
        &sample(),
        Some(SourceFile {
            path: "main.ast",
            text: SOURCE,
        }),
    );
    assert_eq!(
        text,
        "error[E1001]: unknown constant `Foo`\n\
         \x20 --> main.ast:2:3\n\
         \x20  |\n\
         \x202 |   (const nil :Foo))\n\
         \x20  |   ^^^^^^^^^^^^^^^^ not defined\n\
         \x20 = note: constants are resolved lexically\n\n"
    );
}

#[test]
fn test_without_source_uses_byte_range() {
    let text = render(&sample(), None);
    assert!(text.contains("--> <input> 9..25: not defined"));
}

#[test]
fn test_source_of_other_file_is_not_used() {
    let diag = sample().in_file("lib.ast");
    let text = render(
        &diag,
        Some(SourceFile {
            path: "main.ast",
            text: SOURCE,
        }),
    );
    assert!(text.contains("--> lib.ast 9..25"));
}

#[test]
fn test_colors() {
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Always, false);
    emitter.emit(&sample());
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("\x1b[1;31merror"));
}

#[test]
fn test_summary() {
    let mut output = Vec::new();
    let mut emitter = TerminalEmitter::with_color_mode(&mut output, ColorMode::Never, false);
    emitter.emit_summary(2, 1);
    emitter.emit_summary(0, 3);
    let text = String::from_utf8(output).unwrap();
    assert_eq!(
        text,
        "error: aborting due to 2 previous errors; 1 warning emitted\nwarning: 3 warnings emitted\n"
    );
}

#[test]
fn test_color_flag() {
    assert_eq!(ColorMode::from_flag("never"), Some(ColorMode::Never));
    assert_eq!(ColorMode::from_flag("sometimes"), None);
    assert!(ColorMode::Auto.should_use_colors(true));
    assert!(!ColorMode::Auto.should_use_colors(false));
}
