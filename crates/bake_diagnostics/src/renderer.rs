//! Diagnostic rendering for human-readable output.

use bake_source::SourceFile;

use crate::diagnostic::Diagnostic;

/// Trait for rendering diagnostics into formatted output strings.
pub trait DiagnosticRenderer {
    /// Renders a single diagnostic.
    ///
    /// `source` is the file the diagnostic's call site points into, when the
    /// caller has it.
    fn render(&self, diag: &Diagnostic, source: Option<&SourceFile>) -> String;
}

/// Renders diagnostics in a rustc-style terminal format.
///
/// ```text
/// error[E004]: Error evaluating macro: boom
///   --> src/main.js:18:15
///    |
/// 18 |     <p class="${css('color: red')}">
///    |               ^
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    /// Creates a new terminal renderer.
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source: Option<&SourceFile>) -> String {
        let mut lines = diag.message.lines();
        let mut out = format!("error[{}]: {}\n", diag.code, lines.next().unwrap_or_default());
        for extra in lines {
            out.push_str(&format!("  {extra}\n"));
        }

        if let Some(site) = &diag.call_site {
            out.push_str(&format!("  --> {site}\n"));

            let line_text = source
                .filter(|file| file.path == site.file)
                .and_then(|file| file.line_text(site.location.line));
            if let Some(text) = line_text {
                let line_num = site.location.line.to_string();
                let padding = " ".repeat(line_num.len());
                let col_padding = " ".repeat(site.location.col as usize);
                out.push_str(&format!("{padding} |\n"));
                out.push_str(&format!("{line_num} | {text}\n"));
                out.push_str(&format!("{padding} | {col_padding}^\n"));
            }
        }
        out
    }
}
