//! Terminal rendering
//!
//! The countdown and the input listener never print directly. They talk to
//! a [`Renderer`], and the terminal implementation takes its colors from an
//! injected [`Theme`] instead of process-wide constants.

use pom_core::format;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::countdown::{IntervalKind, IntervalSpec};

const RESET: &str = "\x1b[0m";

/// Bar width used when the terminal size is unknown
pub const DEFAULT_BAR_WIDTH: usize = 40;

/// Columns reserved for the label, clock and percentage
const LINE_OVERHEAD: usize = 20;

const MIN_BAR_WIDTH: usize = 10;

/// Role of a piece of output, mapped to a color by the theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Timer,
    Progress,
    Success,
    Warning,
    Text,
    Highlight,
}

/// Named style strings (ANSI sequences)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: String,
    pub timer: String,
    pub progress: String,
    pub success: String,
    pub warning: String,
    pub text: String,
    pub highlight: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(
            "default",
            ["\x1b[1;32m", "\x1b[1;34m", "\x1b[1;32m", "\x1b[1;33m", "\x1b[0m", "\x1b[1;36m"],
        )
    }
}

impl Theme {
    pub const NAMES: [&'static str; 3] = ["default", "minimal", "vibrant"];

    fn new(name: &str, codes: [&str; 6]) -> Self {
        let [timer, progress, success, warning, text, highlight] = codes.map(str::to_string);
        Self {
            name: name.to_string(),
            timer,
            progress,
            success,
            warning,
            text,
            highlight,
        }
    }

    /// Look up a built-in theme
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "minimal" => Some(Self::new(
                "minimal",
                ["\x1b[0m", "\x1b[0m", "\x1b[0m", "\x1b[0m", "\x1b[0m", "\x1b[1m"],
            )),
            "vibrant" => Some(Self::new(
                "vibrant",
                ["\x1b[1;35m", "\x1b[1;36m", "\x1b[1;32m", "\x1b[1;31m", "\x1b[1;37m", "\x1b[1;33m"],
            )),
            _ => None,
        }
    }

    /// No escape sequences at all, for pipes and logs
    pub fn plain() -> Self {
        Self::new("plain", ["", "", "", "", "", ""])
    }

    pub fn code(&self, style: Style) -> &str {
        match style {
            Style::Timer => &self.timer,
            Style::Progress => &self.progress,
            Style::Success => &self.success,
            Style::Warning => &self.warning,
            Style::Text => &self.text,
            Style::Highlight => &self.highlight,
        }
    }

    /// Wrap text in a style, resetting afterwards
    pub fn paint(&self, style: Style, text: &str) -> String {
        let code = self.code(style);
        if code.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", code, text, RESET)
        }
    }
}

/// One frame of the progress display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressLine {
    /// Whole seconds left
    pub remaining_secs: u64,
    /// Filled cells of the bar
    pub filled: usize,
    /// Total cells of the bar
    pub width: usize,
    /// Rounded percentage, 0..=100
    pub percent: u32,
}

impl ProgressLine {
    /// Compute a frame for an interval of `duration_secs` with `remaining` left
    pub fn compute(duration_secs: u64, remaining: std::time::Duration, width: usize) -> Self {
        let remaining_secs = (remaining.as_millis() as u64 + 500) / 1000;
        let remaining_secs = remaining_secs.min(duration_secs);
        let fraction = if duration_secs == 0 {
            1.0
        } else {
            let elapsed = duration_secs - remaining_secs;
            (elapsed as f64 / duration_secs as f64).clamp(0.0, 1.0)
        };

        Self {
            remaining_secs,
            filled: (fraction * width as f64).round() as usize,
            width,
            percent: (fraction * 100.0).round() as u32,
        }
    }

    pub fn bar(&self) -> String {
        format!(
            "{}{}",
            "\u{2588}".repeat(self.filled),
            "\u{2591}".repeat(self.width - self.filled)
        )
    }

    /// `MM:SS [bar] NN%`
    pub fn text(&self) -> String {
        format!("{} [{}] {}%", format::clock(self.remaining_secs), self.bar(), self.percent)
    }
}

/// Query the terminal once for a bar width
pub fn bar_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) => (cols as usize).saturating_sub(LINE_OVERHEAD).max(MIN_BAR_WIDTH),
        Err(_) => DEFAULT_BAR_WIDTH,
    }
}

/// Sink for everything the timer shows the operator
pub trait Renderer: Send {
    /// Redraw the progress line of the running interval in place
    fn progress(&mut self, interval: &IntervalSpec, line: &ProgressLine);

    /// Print a full line of text
    fn message(&mut self, style: Style, text: &str);
}

/// Renders to a terminal (or any writer) with carriage-return overwrite
pub struct TerminalRenderer<W: Write + Send> {
    out: W,
    theme: Theme,
    /// A progress line is drawn and the cursor sits at its end
    mid_line: bool,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(theme: Theme) -> Self {
        Self::new(io::stdout(), theme)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out,
            theme,
            mid_line: false,
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn progress(&mut self, interval: &IntervalSpec, line: &ProgressLine) {
        let style = match interval.kind {
            IntervalKind::Work => Style::Timer,
            IntervalKind::Break => Style::Progress,
        };
        let text = format!("{} {}", interval.label, line.text());
        // Terminal write failures leave nothing sensible to do mid-countdown
        let _ = write!(self.out, "\r{}", self.theme.paint(style, &text));
        let _ = self.out.flush();
        self.mid_line = true;
    }

    fn message(&mut self, style: Style, text: &str) {
        if self.mid_line {
            let _ = writeln!(self.out);
            self.mid_line = false;
        }
        let _ = writeln!(self.out, "{}", self.theme.paint(style, text));
        let _ = self.out.flush();
    }
}

/// One renderer used from several tasks
///
/// The countdown and the input listener write to the same terminal; sharing
/// the renderer keeps its line state consistent between them.
pub struct SharedRenderer<R> {
    inner: Arc<Mutex<R>>,
}

impl<R> Clone for SharedRenderer<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Renderer> SharedRenderer<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            inner: Arc::new(Mutex::new(renderer)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, R> {
        // A panic mid-write leaves nothing worth protecting
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Renderer> Renderer for SharedRenderer<R> {
    fn progress(&mut self, interval: &IntervalSpec, line: &ProgressLine) {
        self.lock().progress(interval, line);
    }

    fn message(&mut self, style: Style, text: &str) {
        self.lock().message(style, text);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Rendered {
        Progress { label: String, line: ProgressLine },
        Message { style: Style, text: String },
    }

    /// Records frames; clones share the same log
    #[derive(Debug, Clone, Default)]
    pub struct RecordingRenderer {
        events: Arc<Mutex<Vec<Rendered>>>,
    }

    impl RecordingRenderer {
        pub fn events(&self) -> Vec<Rendered> {
            self.events.lock().unwrap().clone()
        }

        pub fn frames(&self) -> Vec<ProgressLine> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Rendered::Progress { line, .. } => Some(line),
                    _ => None,
                })
                .collect()
        }

        pub fn messages(&self) -> Vec<String> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Rendered::Message { text, .. } => Some(text),
                    _ => None,
                })
                .collect()
        }
    }

    impl Renderer for RecordingRenderer {
        fn progress(&mut self, interval: &IntervalSpec, line: &ProgressLine) {
            self.events.lock().unwrap().push(Rendered::Progress {
                label: interval.label.to_string(),
                line: *line,
            });
        }

        fn message(&mut self, style: Style, text: &str) {
            self.events.lock().unwrap().push(Rendered::Message {
                style,
                text: text.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::countdown::IntervalSpec;
    use std::time::Duration;

    #[test]
    fn test_progress_at_start_and_end() {
        let start = ProgressLine::compute(60, Duration::from_secs(60), 40);
        assert_eq!(start.filled, 0);
        assert_eq!(start.percent, 0);

        let end = ProgressLine::compute(60, Duration::ZERO, 40);
        assert_eq!(end.filled, 40);
        assert_eq!(end.percent, 100);
        assert_eq!(end.remaining_secs, 0);
    }

    #[test]
    fn test_progress_rounds_remaining_to_seconds() {
        let line = ProgressLine::compute(100, Duration::from_millis(49_600), 10);
        assert_eq!(line.remaining_secs, 50);
        assert_eq!(line.filled, 5);
        assert_eq!(line.percent, 50);
    }

    #[test]
    fn test_filled_cells_never_decrease() {
        let mut last = 0;
        for remaining in (0..=300u64).rev() {
            let line = ProgressLine::compute(300, Duration::from_secs(remaining), 37);
            assert!(line.filled >= last);
            last = line.filled;
        }
        assert_eq!(last, 37);
    }

    #[test]
    fn test_remaining_clamped_to_duration() {
        let line = ProgressLine::compute(10, Duration::from_secs(12), 20);
        assert_eq!(line.remaining_secs, 10);
        assert_eq!(line.filled, 0);
    }

    #[test]
    fn test_text_layout() {
        let line = ProgressLine::compute(1500, Duration::from_secs(750), 4);
        assert_eq!(line.text(), "12:30 [\u{2588}\u{2588}\u{2591}\u{2591}] 50%");
    }

    #[test]
    fn test_themes() {
        for name in Theme::NAMES {
            assert_eq!(Theme::by_name(name).unwrap().name, name);
        }
        assert!(Theme::by_name("neon").is_none());
        assert_eq!(Theme::plain().paint(Style::Success, "ok"), "ok");
        assert_eq!(Theme::default().paint(Style::Warning, "!"), "\x1b[1;33m!\x1b[0m");
    }

    #[test]
    fn test_terminal_renderer_overwrites_then_breaks_line() {
        let mut renderer = TerminalRenderer::new(Vec::new(), Theme::plain());
        let spec = IntervalSpec::work(100);
        renderer.progress(&spec, &ProgressLine::compute(100, Duration::from_secs(99), 4));
        renderer.progress(&spec, &ProgressLine::compute(100, Duration::from_secs(98), 4));
        renderer.message(Style::Success, "done");

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(
            out,
            "\rFocus 01:39 [\u{2591}\u{2591}\u{2591}\u{2591}] 1%\
             \rFocus 01:38 [\u{2591}\u{2591}\u{2591}\u{2591}] 2%\ndone\n"
        );
    }

    #[test]
    fn test_shared_renderer_clones_share_line_state() {
        let mut countdown_side = SharedRenderer::new(testing::RecordingRenderer::default());
        let mut listener_side = countdown_side.clone();

        countdown_side.progress(&IntervalSpec::rest(10), &ProgressLine::compute(10, Duration::from_secs(9), 4));
        listener_side.message(Style::Warning, "paused");

        let recorded = countdown_side.lock().events();
        assert_eq!(recorded.len(), 2);
        assert_eq!(countdown_side.lock().messages(), vec!["paused".to_string()]);
    }
}
