use crossterm::event::{KeyCode, KeyEvent};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::overlay::{put_line, put_right, OverlayLayout};
use super::{Modal, Step};
use crate::delivery::{DispatchReport, RecipientOutcome};

const HELP_LINES: [&str; 6] = [
    "Send: select lists, choose recipients, write message, preview, send.",
    "Lists: preview, add, or remove names and numbers.",
    "Recipients: comma or space separated; use aliases if set.",
    "Message: Ctrl+D to finish, Esc to cancel.",
    "List browser: type to filter; Space toggles selection.",
    "Keys: arrows or j/k to move, Enter to select, Esc to go back.",
];

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

/// Dismissible message box; any key closes it.
pub struct Notice {
    title: String,
    body: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Modal for Notice {
    type Output = ();

    fn overlay(&self, _screen: Rect) -> OverlayLayout {
        let width = (self.title.len() as u16).saturating_add(10).clamp(40, 70);
        OverlayLayout::new(7, width, &self.title).footer("Press any key.")
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        for (row, line) in wrap_text(&self.body, content.width as usize)
            .iter()
            .take(3)
            .enumerate()
        {
            put_line(buf, content, row as u16 + 1, line, Style::default());
        }
    }

    fn handle_key(&mut self, _key: KeyEvent) -> Step<()> {
        Step::Done(())
    }
}

/// Vertical menu of labelled options. Choosing an option without a value
/// (such as "Back") behaves like Esc.
pub struct MenuPrompt<V> {
    title: String,
    options: Vec<(String, Option<V>)>,
    index: usize,
    offset: usize,
    rows: usize,
}

impl<V: Clone> MenuPrompt<V> {
    pub fn new(title: impl Into<String>, options: Vec<(String, Option<V>)>) -> Self {
        Self {
            title: title.into(),
            options,
            index: 0,
            offset: 0,
            rows: 1,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    fn move_by(&mut self, delta: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() as isize - 1;
        self.index = (self.index as isize + delta).clamp(0, last) as usize;
        self.scroll();
    }

    fn scroll(&mut self) {
        if self.index < self.offset {
            self.offset = self.index;
        }
        if self.index >= self.offset + self.rows {
            self.offset = self.index + 1 - self.rows;
        }
    }
}

impl<V: Clone> Modal for MenuPrompt<V> {
    type Output = V;

    fn overlay(&self, _screen: Rect) -> OverlayLayout {
        let height = (self.options.len() as u16).saturating_add(4).min(12);
        OverlayLayout::new(height, 32, &self.title).footer("Enter select | Esc back")
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        self.rows = (content.height.saturating_sub(1) as usize).max(1);
        self.scroll();
        let end = (self.offset + self.rows).min(self.options.len());
        for (row, position) in (self.offset..end).enumerate() {
            let style = if position == self.index {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            let label = format!("{:<20}", self.options[position].0);
            put_line(buf, content, row as u16 + 1, &label, style);
        }
        if self.offset > 0 {
            put_right(buf, content, 0, "^", dim());
        }
        if end < self.options.len() {
            put_right(buf, content, self.rows as u16, "v", dim());
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<V> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.move_by(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_by(1),
            KeyCode::Enter => {
                return match self.options.get(self.index).and_then(|(_, v)| v.clone()) {
                    Some(value) => Step::Done(value),
                    None => Step::Cancel,
                }
            }
            KeyCode::Esc => return Step::Cancel,
            _ => {}
        }
        Step::Continue
    }
}

/// Final confirmation before dispatch.
pub struct PreviewView {
    list_label: String,
    recipients: Vec<String>,
    missing: Vec<String>,
    message: String,
}

impl PreviewView {
    pub fn new(
        list_label: impl Into<String>,
        recipients: Vec<String>,
        missing: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            list_label: list_label.into(),
            recipients,
            missing,
            message: message.into(),
        }
    }

    fn lines(&self, width: usize) -> Vec<(String, Style)> {
        let mut lines = vec![(format!("List: {}", self.list_label), Style::default())];
        let names = format!(
            "Recipients ({}): {}",
            self.recipients.len(),
            self.recipients.join(", ")
        );
        lines.extend(
            wrap_text(&names, width)
                .into_iter()
                .map(|line| (line, Style::default())),
        );
        if !self.missing.is_empty() {
            let missing = format!("Unmatched (ignored): {}", self.missing.join(", "));
            lines.extend(wrap_text(&missing, width).into_iter().map(|line| (line, dim())));
        }
        lines.push((String::new(), Style::default()));
        lines.push((
            "Message:".to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        if self.message.is_empty() {
            lines.push(("(empty)".to_string(), Style::default()));
        }
        for paragraph in self.message.lines() {
            let wrapped = wrap_text(paragraph, width);
            if wrapped.is_empty() {
                lines.push((String::new(), Style::default()));
            }
            lines.extend(wrapped.into_iter().map(|line| (line, Style::default())));
        }
        lines
    }
}

impl Modal for PreviewView {
    type Output = ();

    fn overlay(&self, screen: Rect) -> OverlayLayout {
        OverlayLayout::new(
            20.min(screen.height.saturating_sub(4)),
            78.min(screen.width.saturating_sub(6)),
            "Preview",
        )
        .footer("Enter send | Esc cancel")
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        for (row, (line, style)) in self.lines(content.width as usize).iter().enumerate() {
            let row = row as u16 + 1;
            if row >= content.height {
                break;
            }
            put_line(buf, content, row, line, *style);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<()> {
        match key.code {
            KeyCode::Enter => Step::Done(()),
            KeyCode::Esc => Step::Cancel,
            _ => Step::Continue,
        }
    }
}

pub struct HelpView;

impl Modal for HelpView {
    type Output = ();

    fn overlay(&self, _screen: Rect) -> OverlayLayout {
        let height = (HELP_LINES.len() as u16 + 4).min(12);
        OverlayLayout::new(height, 78, "Help").footer("Press any key.")
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        for (row, line) in HELP_LINES.iter().enumerate() {
            put_line(buf, content, row as u16 + 1, line, Style::default());
        }
    }

    fn handle_key(&mut self, _key: KeyEvent) -> Step<()> {
        Step::Done(())
    }
}

/// Live status of a dispatch. Accepts a key only once the report is in.
pub struct ProgressView {
    total: usize,
    lines: Vec<(String, Style)>,
    done: bool,
}

impl ProgressView {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            lines: Vec::new(),
            done: false,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|(line, _)| line.as_str())
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn started(&mut self, name: &str) {
        self.lines
            .push((format!("-> {name} ..."), Style::default()));
    }

    /// Replaces the pending line for this recipient with its outcome.
    pub fn finished(&mut self, result: &RecipientOutcome) {
        let pending = format!("-> {} ...", result.name);
        if self.lines.last().map(|(line, _)| line == &pending) == Some(true) {
            self.lines.pop();
        }
        let (status, color) = if result.outcome.ok {
            ("OK", Color::Green)
        } else {
            ("FAIL", Color::Red)
        };
        let mut line = format!("{status} {}", result.name);
        if !result.outcome.detail.is_empty() {
            line = format!("{line} ({})", result.outcome.detail);
        }
        self.lines.push((line, Style::default().fg(color)));
    }

    pub fn complete(&mut self, report: &DispatchReport) {
        self.lines.push((String::new(), Style::default()));
        self.lines.push((
            format!(
                "Sent: {} | Failed: {} | {}",
                report.sent(),
                report.failed(),
                report.finished_clock()
            ),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let failed = report.failed_names();
        if !failed.is_empty() {
            self.lines
                .push((format!("Failed: {}", failed.join(", ")), dim()));
        }
        self.done = true;
    }
}

impl Modal for ProgressView {
    type Output = ();

    fn overlay(&self, screen: Rect) -> OverlayLayout {
        let wanted = (self.total as u16).saturating_add(6).max(10);
        let footer = if self.done {
            "Done. Press any key."
        } else {
            "Sending..."
        };
        OverlayLayout::new(
            wanted.min(screen.height.saturating_sub(4)),
            70.min(screen.width.saturating_sub(6)),
            "Sending",
        )
        .footer(footer)
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        let header = format!("Sending {} message(s)...", self.total);
        put_line(buf, content, 1, &header, Style::default());
        let room = content.height.saturating_sub(3) as usize;
        let skip = self.lines.len().saturating_sub(room);
        for (row, (line, style)) in self.lines.iter().skip(skip).enumerate() {
            put_line(buf, content, row as u16 + 3, line, *style);
        }
    }

    fn handle_key(&mut self, _key: KeyEvent) -> Step<()> {
        if self.done {
            Step::Done(())
        } else {
            Step::Continue
        }
    }
}

/// Greedy word wrap to `width` columns; words wider than a line are split.
/// Blank input yields no lines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while UnicodeWidthStr::width(word.as_str()) > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let (head, tail) = split_at_width(&word, width);
            lines.push(head);
            word = tail;
        }
        let needed = if current.is_empty() {
            UnicodeWidthStr::width(word.as_str())
        } else {
            UnicodeWidthStr::width(current.as_str()) + 1 + UnicodeWidthStr::width(word.as_str())
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_at_width(word: &str, width: usize) -> (String, String) {
    let mut head = String::new();
    let mut used = 0;
    let mut rest = String::new();
    let mut full = false;
    for grapheme in word.graphemes(true) {
        let w = UnicodeWidthStr::width(grapheme);
        if !full && (used + w <= width || head.is_empty()) {
            head.push_str(grapheme);
            used += w;
        } else {
            full = true;
            rest.push_str(grapheme);
        }
    }
    (head, rest)
}
