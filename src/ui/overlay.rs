use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Widget};
use unicode_width::UnicodeWidthStr;

pub const MIN_COLS: u16 = 80;
pub const MIN_ROWS: u16 = 24;

/// What a modal asks of the overlay manager. Sizes are requests; the
/// manager clamps them to the current screen on every draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayLayout {
    pub height: u16,
    pub width: u16,
    pub title: String,
    pub footer: Option<String>,
}

impl OverlayLayout {
    pub fn new(height: u16, width: u16, title: impl Into<String>) -> Self {
        Self {
            height,
            width,
            title: title.into(),
            footer: None,
        }
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

pub fn is_too_small(screen: Rect) -> bool {
    screen.width < MIN_COLS || screen.height < MIN_ROWS
}

/// Centers a `height` x `width` window in `screen`, never larger than
/// `(rows - 2, cols - 2)`.
pub fn overlay_rect(screen: Rect, height: u16, width: u16) -> Rect {
    let height = height.min(screen.height.saturating_sub(2));
    let width = width.min(screen.width.saturating_sub(2));
    let top = (screen.height - height) / 2;
    let left = (screen.width - width) / 2;
    Rect::new(screen.x + left, screen.y + top, width, height)
}

/// Dims everything already drawn.
pub fn draw_scrim(buf: &mut Buffer) {
    let area = buf.area;
    buf.set_style(area, Style::default().add_modifier(Modifier::DIM));
}

/// One-cell shadow along the right and bottom edges of `window`, clipped to
/// the buffer.
pub fn draw_shadow(buf: &mut Buffer, window: Rect) {
    let screen = buf.area;
    let style = Style::default().bg(Color::Black).add_modifier(Modifier::DIM);
    let right = window.right();
    if right < screen.right() {
        for y in window.top() + 1..(window.bottom() + 1).min(screen.bottom()) {
            shade_cell(buf, right, y, style);
        }
    }
    let bottom = window.bottom();
    if bottom < screen.bottom() {
        let end = window.right().min(screen.right().saturating_sub(1));
        for x in window.left() + 1..end {
            shade_cell(buf, x, bottom, style);
        }
    }
}

fn shade_cell(buf: &mut Buffer, x: u16, y: u16, style: Style) {
    if contains(buf.area, x, y) {
        buf.get_mut(x, y).set_symbol(" ").set_style(style);
    }
}

/// Clears `window`, draws its border with a centered title and the footer
/// hint on the last inner row. Returns the padded content area above the
/// footer.
pub fn draw_window(buf: &mut Buffer, window: Rect, layout: &OverlayLayout) -> Rect {
    let window = window.intersection(buf.area);
    if window.width < 2 || window.height < 2 {
        return Rect::new(window.x, window.y, 0, 0);
    }
    Clear.render(window, buf);
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    if !layout.title.is_empty() {
        block = block
            .title(format!(" {} ", layout.title))
            .title_alignment(Alignment::Center);
    }
    block.render(window, buf);

    let inner_width = window.width.saturating_sub(4);
    let inner_height = window.height.saturating_sub(2);
    if let Some(footer) = &layout.footer {
        if inner_height > 0 {
            put_str(
                buf,
                window.x + 2,
                window.bottom() - 2,
                footer,
                inner_width,
                Style::default().add_modifier(Modifier::DIM),
            );
        }
    }
    let content_height = if layout.footer.is_some() {
        inner_height.saturating_sub(1)
    } else {
        inner_height
    };
    Rect::new(window.x + 2, window.y + 1, inner_width, content_height)
}

/// Writes `text` at `(x, y)`, at most `max_width` columns, dropping anything
/// that falls outside the buffer.
pub fn put_str(buf: &mut Buffer, x: u16, y: u16, text: &str, max_width: u16, style: Style) {
    let area = buf.area;
    if !contains(area, x, y) {
        return;
    }
    let width = max_width.min(area.right() - x);
    if width == 0 {
        return;
    }
    buf.set_stringn(x, y, text, width as usize, style);
}

/// Styled variant of [`put_str`].
pub fn put_spans(buf: &mut Buffer, x: u16, y: u16, line: &Line<'_>, max_width: u16) {
    let area = buf.area;
    if !contains(area, x, y) {
        return;
    }
    let width = max_width.min(area.right() - x);
    if width > 0 {
        buf.set_line(x, y, line, width);
    }
}

/// Writes `text` on `row` of `area`, clipped to the area.
pub fn put_line(buf: &mut Buffer, area: Rect, row: u16, text: &str, style: Style) {
    if row >= area.height {
        return;
    }
    put_str(buf, area.x, area.y + row, text, area.width, style);
}

/// Writes `text` right-aligned on `row` of `area`.
pub fn put_right(buf: &mut Buffer, area: Rect, row: u16, text: &str, style: Style) {
    let width = UnicodeWidthStr::width(text) as u16;
    if width > area.width {
        return;
    }
    put_str(buf, area.right() - width, area.y + row, text, width, style);
}

fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.left() && x < area.right() && y >= area.top() && y < area.bottom()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen(width: u16, height: u16) -> Rect {
        Rect::new(0, 0, width, height)
    }

    #[test]
    fn overlay_is_centered_and_clamped() {
        assert_eq!(overlay_rect(screen(80, 24), 10, 40), Rect::new(20, 7, 40, 10));
        assert_eq!(overlay_rect(screen(30, 10), 20, 78), Rect::new(1, 1, 28, 8));
        assert_eq!(overlay_rect(screen(1, 1), 5, 5), Rect::new(0, 0, 0, 0));
    }

    #[test]
    fn overlay_recenters_for_new_size() {
        let small = overlay_rect(screen(80, 24), 12, 40);
        let large = overlay_rect(screen(120, 40), 12, 40);
        assert_ne!(small, large);
        assert_eq!(large, Rect::new(40, 14, 40, 12));
    }

    #[test]
    fn window_draws_title_footer_and_content_area() {
        let mut buf = Buffer::empty(screen(40, 12));
        let window = overlay_rect(buf.area, 8, 30);
        let layout = OverlayLayout::new(8, 30, "Pick").footer("Esc back");
        let content = draw_window(&mut buf, window, &layout);

        assert_eq!(window, Rect::new(5, 2, 30, 8));
        assert_eq!(content, Rect::new(7, 3, 26, 5));
        let top: String = (window.x..window.right())
            .map(|x| buf.get(x, window.y).symbol().to_string())
            .collect();
        assert!(top.contains(" Pick "), "{top}");
        let footer_row: String = (window.x..window.right())
            .map(|x| buf.get(x, window.bottom() - 2).symbol().to_string())
            .collect();
        assert!(footer_row.contains("Esc back"));
    }

    #[test]
    fn shadow_stays_inside_buffer() {
        let mut buf = Buffer::empty(screen(10, 5));
        draw_shadow(&mut buf, Rect::new(0, 0, 10, 5));
        draw_shadow(&mut buf, Rect::new(7, 3, 5, 5));
        let mut buf = Buffer::empty(screen(20, 10));
        draw_shadow(&mut buf, Rect::new(2, 2, 6, 4));
        assert_eq!(buf.get(8, 3).bg, Color::Black);
        assert_eq!(buf.get(3, 6).bg, Color::Black);
        assert_ne!(buf.get(2, 6).bg, Color::Black);
    }

    #[test]
    fn out_of_bounds_text_is_dropped() {
        let mut buf = Buffer::empty(screen(5, 2));
        put_str(&mut buf, 9, 9, "nope", 4, Style::default());
        put_str(&mut buf, 3, 1, "abcdef", 10, Style::default());
        assert_eq!(buf.get(3, 1).symbol(), "a");
        assert_eq!(buf.get(4, 1).symbol(), "b");
        put_line(&mut buf, Rect::new(0, 0, 5, 2), 7, "x", Style::default());
    }

    #[test]
    fn tiny_window_is_harmless() {
        let mut buf = Buffer::empty(screen(3, 3));
        let layout = OverlayLayout::new(10, 10, "Title").footer("footer");
        let window = overlay_rect(buf.area, 10, 10);
        let content = draw_window(&mut buf, window, &layout);
        assert_eq!(content.width, 0);
    }
}
