use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;

/// A source region given as 1-based line/column pairs. `end_col` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(start_line: usize, start_col: usize, end_line: usize, end_col: usize) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A one-column span at the given position.
    pub fn point(line: usize, col: usize) -> Self {
        Self::new(line, col, line, col + 1)
    }

    pub fn dummy() -> Self {
        Self::default()
    }

    pub fn merge(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        let (start_line, start_col) =
            (self.start_line, self.start_col).min((other.start_line, other.start_col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.start_line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A label pointing to a specific span in the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A complete diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    fn with_severity(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, message)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Location of the first labelled span, if any.
    pub fn location(&self) -> Option<Span> {
        self.labels
            .iter()
            .map(|label| label.span)
            .find(|span| !span.is_dummy())
    }
}

fn source_line(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.checked_sub(1)?)
}

/// Renders diagnostics in a compiler-like layout with a gutter and carets.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        self.render_header(&mut output, diagnostic);

        let mut lines_to_show: Vec<usize> = Vec::new();
        for label in diagnostic.labels.iter().filter(|l| !l.span.is_dummy()) {
            for line in label.span.start_line..=label.span.end_line.max(label.span.start_line) {
                if !lines_to_show.contains(&line) {
                    lines_to_show.push(line);
                }
            }
        }
        lines_to_show.sort_unstable();

        if let Some(span) = diagnostic.location() {
            output.push_str(&format!(
                "  {} {}:{}:{}\n",
                self.blue("-->"),
                self.file_name,
                span.start_line,
                span.start_col
            ));

            let max_line = lines_to_show.last().copied().unwrap_or(1);
            let width = max_line.to_string().len();

            output.push_str(&format!("{} {}\n", " ".repeat(width + 1), self.blue("|")));
            for &line_num in &lines_to_show {
                self.render_line(&mut output, diagnostic, line_num, width);
            }
            output.push_str(&format!("{} {}\n", " ".repeat(width + 1), self.blue("|")));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("  {} {}\n", self.blue("="), note));
        }

        output
    }

    fn render_header(&self, output: &mut String, diagnostic: &Diagnostic) {
        let severity = match diagnostic.severity {
            Severity::Error => self.paint(diagnostic.severity, |s| s.red().bold().to_string()),
            Severity::Warning => self.paint(diagnostic.severity, |s| s.yellow().bold().to_string()),
            Severity::Note => self.paint(diagnostic.severity, |s| s.cyan().to_string()),
        };
        let message = if self.use_color {
            diagnostic.message.bold().to_string()
        } else {
            diagnostic.message.clone()
        };

        match &diagnostic.code {
            Some(code) => output.push_str(&format!("{}[{}]: {}\n", severity, code, message)),
            None => output.push_str(&format!("{}: {}\n", severity, message)),
        }
    }

    fn render_line(&self, output: &mut String, diagnostic: &Diagnostic, line_num: usize, width: usize) {
        let Some(content) = source_line(self.source, line_num) else {
            return;
        };
        let line_len = content.chars().count();

        output.push_str(&format!(
            "{:>width$} {} {}\n",
            self.blue(&line_num.to_string()),
            self.blue("|"),
            content,
            width = width + 1
        ));

        let mut underlines: Vec<(usize, usize, &str, LabelStyle)> = Vec::new();
        for label in &diagnostic.labels {
            let span = label.span;
            if span.is_dummy() || span.start_line > line_num || span.end_line.max(span.start_line) < line_num {
                continue;
            }
            let col_start = if span.start_line == line_num { span.start_col } else { 1 };
            let col_end = if span.end_line == line_num {
                span.end_col.max(col_start + 1)
            } else {
                line_len + 1
            };
            underlines.push((col_start, col_end, &label.message, label.style));
        }

        if underlines.is_empty() {
            return;
        }
        underlines.sort_by_key(|(start, _, _, _)| *start);

        let mut underline = String::new();
        let mut pos = 1;
        for (col_start, col_end, _, style) in &underlines {
            while pos < *col_start {
                underline.push(' ');
                pos += 1;
            }
            let mark = match style {
                LabelStyle::Primary => '^',
                LabelStyle::Secondary => '-',
            };
            while pos < *col_end {
                underline.push(mark);
                pos += 1;
            }
        }

        let underline = if underlines.iter().any(|(_, _, _, s)| *s == LabelStyle::Primary) {
            self.red(&underline)
        } else {
            self.blue(&underline)
        };
        output.push_str(&format!("{} {} {}\n", " ".repeat(width + 1), self.blue("|"), underline));

        for (col_start, _, message, style) in &underlines {
            if message.is_empty() {
                continue;
            }
            let padding = " ".repeat(col_start.saturating_sub(1));
            let message = match style {
                LabelStyle::Primary => self.red(message),
                LabelStyle::Secondary => self.blue(message),
            };
            output.push_str(&format!(
                "{} {} {}{}\n",
                " ".repeat(width + 1),
                self.blue("|"),
                padding,
                message
            ));
        }
    }

    fn paint(&self, severity: Severity, style: impl Fn(&str) -> String) -> String {
        let text = severity.to_string();
        if self.use_color {
            style(&text)
        } else {
            text
        }
    }

    fn red(&self, s: &str) -> String {
        if self.use_color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn blue(&self, s: &str) -> String {
        if self.use_color {
            s.blue().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Render multiple diagnostics followed by an error-count summary.
pub fn render_diagnostics(source: &str, file_name: &str, diagnostics: &[Diagnostic], use_color: bool) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    let mut output = String::new();

    for diagnostic in diagnostics {
        output.push_str(&renderer.render(diagnostic));
        output.push('\n');
    }

    let error_count = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    if error_count > 0 {
        output.push_str(&format!(
            "error: aborting due to {} error{}\n",
            error_count,
            if error_count == 1 { "" } else { "s" }
        ));
    }

    output
}
