use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::overlay::{put_line, put_str, OverlayLayout};
use super::{Modal, Step};

fn is_plain_char(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

/// Bounded single-line buffer with a grapheme-aware cursor.
#[derive(Debug, Clone)]
pub struct LineEditor {
    buffer: String,
    cursor: usize,
    max_len: usize,
}

impl LineEditor {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: String::new(),
            cursor: 0,
            max_len,
        }
    }

    pub fn with_initial(max_len: usize, initial: &str) -> Self {
        let buffer: String = initial.chars().take(max_len).collect();
        Self {
            cursor: buffer.len(),
            buffer,
            max_len,
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch.is_control() || self.buffer.chars().count() >= self.max_len {
            return false;
        }
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    /// Enter commits the trimmed text, Esc cancels.
    pub fn handle_key(&mut self, key: KeyEvent) -> Step<String> {
        match key.code {
            KeyCode::Enter => return Step::Done(self.buffer.trim().to_string()),
            KeyCode::Esc => return Step::Cancel,
            KeyCode::Backspace => {
                self.backspace();
            }
            KeyCode::Left => {
                self.move_left();
            }
            KeyCode::Right => {
                self.move_right();
            }
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Char(ch) if is_plain_char(&key) => {
                self.insert_char(ch);
            }
            _ => {}
        }
        Step::Continue
    }

    /// Draws the slice of the buffer that keeps the cursor inside `width`
    /// columns and returns the cursor column relative to `x`.
    pub fn render(&self, buf: &mut Buffer, x: u16, y: u16, width: u16, style: Style) -> u16 {
        if width == 0 {
            return 0;
        }
        let before = &self.buffer[..self.cursor];
        let cursor_col = UnicodeWidthStr::width(before);
        let limit = width as usize - 1;
        let mut start = 0;
        if cursor_col > limit {
            let mut skipped = 0;
            for (idx, grapheme) in before.grapheme_indices(true) {
                if cursor_col - skipped <= limit {
                    start = idx;
                    break;
                }
                skipped += UnicodeWidthStr::width(grapheme);
                start = idx + grapheme.len();
            }
        }
        put_str(buf, x, y, &self.buffer[start..], width, style);
        UnicodeWidthStr::width(&self.buffer[start..self.cursor]) as u16
    }
}

/// Multi-line text region bounded to the rows and columns it is drawn in.
#[derive(Debug, Clone)]
pub struct TextArea {
    buffer: String,
    cursor: usize,
    preferred_column: Option<usize>,
    max_rows: usize,
    max_cols: usize,
}

impl TextArea {
    pub fn new(initial: &str) -> Self {
        Self {
            buffer: initial.to_string(),
            cursor: initial.len(),
            preferred_column: None,
            max_rows: usize::MAX,
            max_cols: usize::MAX,
        }
    }

    pub fn set_bounds(&mut self, rows: usize, cols: usize) {
        self.max_rows = rows.max(1);
        self.max_cols = cols.max(1);
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let start = line_start(&self.buffer, self.cursor);
        let end = line_end(&self.buffer, self.cursor);
        let line_width = UnicodeWidthStr::width(&self.buffer[start..end]);
        if line_width + UnicodeWidthChar::width(ch).unwrap_or(0) > self.max_cols {
            return false;
        }
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.preferred_column = None;
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        if self.buffer.split('\n').count() >= self.max_rows {
            return false;
        }
        self.buffer.insert(self.cursor, '\n');
        self.cursor += 1;
        self.preferred_column = Some(0);
        true
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        self.preferred_column = None;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        self.preferred_column = None;
        true
    }

    pub fn move_up(&mut self) -> bool {
        let current_line_start = line_start(&self.buffer, self.cursor);
        if current_line_start == 0 {
            return false;
        }
        let column = self
            .preferred_column
            .unwrap_or_else(|| column_at(&self.buffer, current_line_start, self.cursor));
        let prev_line_start = line_start(&self.buffer, current_line_start - 1);
        self.cursor = position_for_column(&self.buffer, prev_line_start, column);
        self.preferred_column = Some(column);
        true
    }

    pub fn move_down(&mut self) -> bool {
        let current_line_end = line_end(&self.buffer, self.cursor);
        if current_line_end == self.buffer.len() {
            return false;
        }
        let column = self.preferred_column.unwrap_or_else(|| {
            column_at(
                &self.buffer,
                line_start(&self.buffer, self.cursor),
                self.cursor,
            )
        });
        self.cursor = position_for_column(&self.buffer, current_line_end + 1, column);
        self.preferred_column = Some(column);
        true
    }

    /// Ctrl+D commits the trimmed text, Esc cancels, Enter breaks the line.
    pub fn handle_key(&mut self, key: KeyEvent) -> Step<String> {
        match key.code {
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Step::Done(self.buffer.trim().to_string());
            }
            KeyCode::Esc => return Step::Cancel,
            KeyCode::Enter => {
                self.insert_newline();
            }
            KeyCode::Backspace => {
                self.backspace();
            }
            KeyCode::Left => {
                self.move_left();
            }
            KeyCode::Right => {
                self.move_right();
            }
            KeyCode::Up => {
                self.move_up();
            }
            KeyCode::Down => {
                self.move_down();
            }
            KeyCode::Char(ch) if is_plain_char(&key) => {
                self.insert_char(ch);
            }
            _ => {}
        }
        Step::Continue
    }

    /// Row and column of the cursor inside the text.
    pub fn cursor_position(&self) -> (usize, usize) {
        let before = &self.buffer[..self.cursor];
        let row = before.matches('\n').count();
        let start = line_start(&self.buffer, self.cursor);
        (row, UnicodeWidthStr::width(&self.buffer[start..self.cursor]))
    }

    pub fn render(&self, buf: &mut Buffer, area: Rect) {
        for (row, line) in self.buffer.split('\n').enumerate() {
            put_line(buf, area, row as u16, line, Style::default());
        }
    }
}

/// Single-line prompt in its own overlay.
pub struct LinePrompt {
    title: String,
    label: String,
    editor: LineEditor,
    width: u16,
    cursor: Option<(u16, u16)>,
}

impl LinePrompt {
    pub fn new(title: impl Into<String>, label: impl Into<String>, max_len: usize) -> Self {
        Self {
            title: title.into(),
            label: label.into(),
            editor: LineEditor::new(max_len),
            width: 70,
            cursor: None,
        }
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = width;
        self
    }

    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }
}

impl Modal for LinePrompt {
    type Output = String;

    fn overlay(&self, screen: Rect) -> OverlayLayout {
        OverlayLayout::new(7, self.width.min(screen.width.saturating_sub(6)), &self.title)
            .footer("Enter confirm | Esc cancel")
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        put_line(buf, content, 1, &self.label, Style::default());
        self.cursor = None;
        if content.height >= 3 && content.width > 0 {
            let y = content.y + 2;
            let col = self.editor.render(buf, content.x, y, content.width, Style::default());
            self.cursor = Some((content.x + col, y));
        }
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<String> {
        self.editor.handle_key(key)
    }

    fn handle_resize(&mut self) -> Step<String> {
        Step::Cancel
    }
}

/// Multi-line compose window; Ctrl+D finishes.
pub struct ComposePrompt {
    title: String,
    area: TextArea,
    cursor: Option<(u16, u16)>,
}

impl ComposePrompt {
    pub fn new(title: impl Into<String>, initial: &str) -> Self {
        Self {
            title: title.into(),
            area: TextArea::new(initial),
            cursor: None,
        }
    }

    pub fn text_area(&self) -> &TextArea {
        &self.area
    }
}

impl Modal for ComposePrompt {
    type Output = String;

    fn overlay(&self, screen: Rect) -> OverlayLayout {
        OverlayLayout::new(
            16.min(screen.height.saturating_sub(4)),
            72.min(screen.width.saturating_sub(6)),
            &self.title,
        )
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        put_line(
            buf,
            content,
            0,
            "Ctrl+D finish | Esc cancel",
            Style::default().add_modifier(Modifier::DIM),
        );
        let edit = Rect::new(
            content.x,
            content.y + 1,
            content.width,
            content.height.saturating_sub(1),
        );
        self.area
            .set_bounds(edit.height as usize, edit.width.saturating_sub(1) as usize);
        self.area.render(buf, edit);

        let (row, col) = self.area.cursor_position();
        let (row, col) = (row as u16, col as u16);
        self.cursor = (row < edit.height && col < edit.width).then(|| (edit.x + col, edit.y + row));
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        self.cursor
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<String> {
        self.area.handle_key(key)
    }

    fn handle_resize(&mut self) -> Step<String> {
        Step::Cancel
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let line_end = line_end(text, line_start);
    text[line_start..line_end]
        .grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| line_start + idx)
        .unwrap_or(line_end)
}
