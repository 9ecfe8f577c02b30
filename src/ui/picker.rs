use std::collections::HashSet;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::overlay::{self, put_line, put_right, put_spans, put_str, OverlayLayout};
use super::{Modal, Step};
use crate::contacts::Contact;
use crate::highlight::{build_highlight_regex, highlight_spans};
use crate::search;
use crate::storage::RosterEntry;

/// Anything a picker can list. `key` identifies the item inside a selection.
pub trait Pickable: Clone {
    fn key(&self) -> String;
    fn label(&self) -> &str;
    fn detail(&self) -> Option<String> {
        None
    }
    fn search_text(&self) -> String {
        self.label().to_string()
    }
}

impl Pickable for Contact {
    fn key(&self) -> String {
        self.number.clone()
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn detail(&self) -> Option<String> {
        let mut parts = vec![self.number.clone()];
        if !self.aliases.is_empty() {
            parts.push(self.aliases_joined(","));
        }
        Some(parts.join(" | "))
    }

    fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.aliases_joined(" "), self.number)
    }
}

impl Pickable for RosterEntry {
    fn key(&self) -> String {
        self.label.clone()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickMode {
    /// Read-only listing; Enter closes.
    Browse,
    Single,
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerLayout {
    Compact,
    /// Adds the detail column and grows with the terminal.
    Wide,
}

/// Filterable list state: filter text, highlighted index, scroll offset and
/// the selection set, plus an optional notice drawn above the list.
pub struct Picker<T: Pickable> {
    title: String,
    items: Vec<T>,
    mode: PickMode,
    layout: PickerLayout,
    filter: String,
    visible: Vec<usize>,
    index: usize,
    offset: usize,
    selected: HashSet<String>,
    viewport: usize,
    notice: Option<(String, String)>,
    empty_selection: (String, String),
}

impl<T: Pickable> Picker<T> {
    pub fn new(title: impl Into<String>, items: Vec<T>, mode: PickMode) -> Self {
        let mut picker = Self {
            title: title.into(),
            items,
            mode,
            layout: PickerLayout::Compact,
            filter: String::new(),
            visible: Vec::new(),
            index: 0,
            offset: 0,
            selected: HashSet::new(),
            viewport: 8,
            notice: None,
            empty_selection: ("No selection".into(), "Select at least one item.".into()),
        };
        picker.refilter();
        picker
    }

    pub fn layout(mut self, layout: PickerLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn empty_selection_notice(
        mut self,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.empty_selection = (title.into(), body.into());
        self
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    pub fn notice(&self) -> Option<&(String, String)> {
        self.notice.as_ref()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn visible_labels(&self) -> Vec<&str> {
        self.visible
            .iter()
            .map(|&idx| self.items[idx].label())
            .collect()
    }

    pub fn highlighted(&self) -> Option<&T> {
        self.visible.get(self.index).map(|&idx| &self.items[idx])
    }

    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.keep_visible();
    }

    pub fn move_by(&mut self, delta: isize) {
        if self.visible.is_empty() {
            return;
        }
        let last = self.visible.len() as isize - 1;
        self.index = (self.index as isize + delta).clamp(0, last) as usize;
        self.keep_visible();
    }

    pub fn push_filter(&mut self, ch: char) {
        self.filter.push(ch);
        self.refilter();
    }

    pub fn pop_filter(&mut self) {
        self.filter.pop();
        self.refilter();
    }

    pub fn toggle_highlighted(&mut self) {
        if self.mode != PickMode::Multi {
            return;
        }
        let Some(key) = self.highlighted().map(Pickable::key) else {
            return;
        };
        if !self.selected.remove(&key) {
            self.selected.insert(key);
        }
    }

    pub fn confirm(&mut self) -> Step<Vec<T>> {
        match self.mode {
            PickMode::Browse => Step::Done(Vec::new()),
            PickMode::Single => match self.highlighted() {
                Some(item) => Step::Done(vec![item.clone()]),
                None => Step::Cancel,
            },
            PickMode::Multi => {
                if self.selected.is_empty() {
                    self.notice = Some(self.empty_selection.clone());
                    return Step::Continue;
                }
                Step::Done(
                    self.items
                        .iter()
                        .filter(|item| self.selected.contains(&item.key()))
                        .cloned()
                        .collect(),
                )
            }
        }
    }

    fn refilter(&mut self) {
        self.visible = search::rank(
            &self.items,
            &self.filter,
            |item| item.label().to_string(),
            |item| item.search_text(),
        );
        self.index = 0;
        self.offset = 0;
    }

    fn keep_visible(&mut self) {
        if self.visible.is_empty() {
            self.index = 0;
            self.offset = 0;
            return;
        }
        self.index = self.index.min(self.visible.len() - 1);
        let max_offset = self.visible.len().saturating_sub(self.viewport);
        self.offset = self.offset.min(max_offset);
        if self.index < self.offset {
            self.offset = self.index;
        }
        if self.index >= self.offset + self.viewport {
            self.offset = self.index + 1 - self.viewport;
        }
    }

    fn footer(&self) -> &'static str {
        match self.mode {
            PickMode::Browse => "Type to filter | Esc back",
            PickMode::Single => "Enter select | Esc back",
            PickMode::Multi => "Space toggle | Enter confirm | Esc back",
        }
    }

    fn render_row(&self, buf: &mut Buffer, area: Rect, row: u16, item: &T, active: bool) {
        let y = area.y + row;
        let row_style = if active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        let marker = match self.mode {
            PickMode::Multi if self.selected.contains(&item.key()) => "[x] ",
            PickMode::Multi => "[ ] ",
            _ => "",
        };
        let inner = (area.width as usize).saturating_sub(marker.len());
        let detail = match self.layout {
            PickerLayout::Wide => item.detail(),
            PickerLayout::Compact => None,
        };
        let name_w = if detail.is_some() {
            (inner / 2).min(26).max(8).min(inner)
        } else {
            inner
        };

        let regex = build_highlight_regex(&self.filter);
        let highlight = row_style.fg(Color::Yellow).add_modifier(Modifier::BOLD);
        let mut spans = vec![Span::styled(marker.to_string(), row_style)];
        spans.extend(highlight_spans(
            &fit(item.label(), name_w),
            regex.as_ref(),
            highlight,
            row_style,
        ));
        put_spans(buf, area.x, y, &Line::from(spans), area.width);

        if let Some(detail) = detail {
            let meta_x = marker.len() + name_w + 1;
            let meta_w = inner.saturating_sub(name_w + 1);
            if meta_w > 0 {
                put_str(
                    buf,
                    area.x + meta_x as u16,
                    y,
                    &detail,
                    meta_w as u16,
                    row_style.add_modifier(Modifier::DIM),
                );
            }
        }
    }

    fn render_notice(&self, buf: &mut Buffer) {
        let Some((title, body)) = &self.notice else {
            return;
        };
        let width = (title.len() as u16 + 10).clamp(40, 70);
        let layout = OverlayLayout::new(7, width, title.as_str()).footer("Press any key.");
        let window = overlay::overlay_rect(buf.area, layout.height, layout.width);
        overlay::draw_shadow(buf, window);
        let content = overlay::draw_window(buf, window, &layout);
        put_line(buf, content, 1, body, Style::default());
    }
}

impl<T: Pickable> Modal for Picker<T> {
    type Output = Vec<T>;

    fn overlay(&self, screen: Rect) -> OverlayLayout {
        let (height, width) = match self.layout {
            PickerLayout::Compact => ((self.items.len() as u16).saturating_add(5).min(12), 40),
            PickerLayout::Wide => (
                20.min(screen.height.saturating_sub(4)),
                78.min(screen.width.saturating_sub(6)),
            ),
        };
        OverlayLayout::new(height, width, &self.title).footer(self.footer())
    }

    fn render(&mut self, buf: &mut Buffer, content: Rect) {
        if content.height == 0 || content.width == 0 {
            return;
        }
        self.set_viewport(content.height.saturating_sub(1) as usize);

        let filter_label = if self.filter.is_empty() {
            "Filter: (type to search)".to_string()
        } else {
            format!("Filter: {}", self.filter)
        };
        put_line(buf, content, 0, &filter_label, Style::default());
        let mut counter = format!("{}/{}", self.visible.len(), self.items.len());
        if self.mode == PickMode::Multi {
            counter = format!("Selected {} | {counter}", self.selected.len());
        }
        if counter.len() + filter_label.len() + 1 < content.width as usize {
            put_right(
                buf,
                content,
                0,
                &counter,
                Style::default().add_modifier(Modifier::DIM),
            );
        }

        let dim = Style::default().add_modifier(Modifier::DIM);
        if self.visible.is_empty() {
            put_line(buf, content, 1, "No matches.", dim);
        } else {
            let end = (self.offset + self.viewport).min(self.visible.len());
            for (row, position) in (self.offset..end).enumerate() {
                let item = &self.items[self.visible[position]];
                self.render_row(buf, content, row as u16 + 1, item, position == self.index);
            }
            if self.offset > 0 {
                put_right(buf, content, 1, "^", dim);
            }
            if end < self.visible.len() {
                put_right(buf, content, self.viewport as u16, "v", dim);
            }
        }

        self.render_notice(buf);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<Vec<T>> {
        if self.notice.take().is_some() {
            return Step::Continue;
        }
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        match key.code {
            KeyCode::Up => self.move_by(-1),
            KeyCode::Down => self.move_by(1),
            KeyCode::Char('k') if plain => self.move_by(-1),
            KeyCode::Char('j') if plain => self.move_by(1),
            KeyCode::PageUp => self.move_by(-(self.viewport as isize)),
            KeyCode::PageDown => self.move_by(self.viewport as isize),
            KeyCode::Enter => return self.confirm(),
            KeyCode::Esc => return Step::Cancel,
            KeyCode::Backspace => self.pop_filter(),
            KeyCode::Char(' ') if plain && self.mode == PickMode::Multi => {
                self.toggle_highlighted()
            }
            KeyCode::Char(ch) if plain && !ch.is_control() => self.push_filter(ch),
            _ => {}
        }
        Step::Continue
    }
}

/// Truncates or pads `text` to exactly `width` columns.
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for grapheme in text.graphemes(true) {
        let w = UnicodeWidthStr::width(grapheme);
        if used + w > width {
            break;
        }
        out.push_str(grapheme);
        used += w;
    }
    out.extend(std::iter::repeat(' ').take(width - used));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str);

    impl Pickable for Item {
        fn key(&self) -> String {
            self.0.to_string()
        }

        fn label(&self) -> &str {
            self.0
        }
    }

    fn items(names: &[&'static str]) -> Vec<Item> {
        names.iter().map(|name| Item(name)).collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str<T: Pickable>(picker: &mut Picker<T>, text: &str) {
        for ch in text.chars() {
            picker.handle_key(key(KeyCode::Char(ch)));
        }
    }

    #[test]
    fn filter_ranks_by_score_then_name() {
        let mut picker = Picker::new("t", items(&["Anthony", "Bob", "Anna", "Ann"]), PickMode::Multi);
        assert_eq!(picker.visible_labels(), vec!["Ann", "Anna", "Anthony", "Bob"]);
        type_str(&mut picker, "an");
        assert_eq!(picker.filter(), "an");
        assert_eq!(picker.visible_labels(), vec!["Ann", "Anna", "Anthony"]);
    }

    #[test]
    fn typing_and_backspace_reset_position() {
        let mut picker = Picker::new("t", items(&["a1", "a2", "a3", "a4"]), PickMode::Single);
        picker.set_viewport(2);
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Down));
        assert_eq!((picker.index(), picker.offset()), (2, 1));
        picker.handle_key(key(KeyCode::Char('a')));
        assert_eq!((picker.index(), picker.offset()), (0, 0));
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Backspace));
        assert_eq!(picker.filter(), "");
        assert_eq!((picker.index(), picker.offset()), (0, 0));
    }

    #[test]
    fn vi_keys_navigate_and_clamp() {
        let mut picker = Picker::new("t", items(&["a", "b", "c"]), PickMode::Single);
        picker.handle_key(key(KeyCode::Char('k')));
        assert_eq!(picker.index(), 0);
        for _ in 0..5 {
            picker.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(picker.index(), 2);
        assert_eq!(picker.filter(), "");
    }

    #[test]
    fn highlighted_row_always_in_view() {
        for len in 0..15usize {
            let names: Vec<&'static str> = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o"][..len].to_vec();
            for viewport in 1..6 {
                let mut picker = Picker::new("t", items(&names), PickMode::Single);
                picker.set_viewport(viewport);
                let moves = [3isize, -1, 7, 2, -10, 1, 1, 20, -2, 5];
                for delta in moves {
                    picker.move_by(delta);
                    if len > 0 {
                        assert!(picker.offset() <= picker.index());
                        assert!(picker.index() < picker.offset() + picker.viewport());
                        assert!(picker.index() < len);
                    }
                }
                picker.set_viewport(viewport + 2);
                if len > 0 {
                    assert!(picker.index() < picker.offset() + picker.viewport());
                }
            }
        }
    }

    #[test]
    fn multi_select_requires_a_selection() {
        let mut picker = Picker::new("t", items(&["Ann", "Bo", "Cy"]), PickMode::Multi)
            .empty_selection_notice("No selection", "Select at least one contact to remove.");
        assert_matches!(picker.handle_key(key(KeyCode::Enter)), Step::Continue);
        assert!(picker.notice().is_some());
        assert_matches!(picker.handle_key(key(KeyCode::Char('x'))), Step::Continue);
        assert!(picker.notice().is_none());
        assert_eq!(picker.filter(), "");
    }

    #[test]
    fn multi_select_returns_original_order() {
        let mut picker = Picker::new("t", items(&["Cy", "Ann", "Bo"]), PickMode::Multi);
        picker.handle_key(key(KeyCode::Char(' ')));
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Down));
        picker.handle_key(key(KeyCode::Char(' ')));
        picker.handle_key(key(KeyCode::Down));
        assert_eq!(picker.selected_count(), 2);
        let done = picker.handle_key(key(KeyCode::Enter));
        assert_eq!(done, Step::Done(items(&["Cy", "Ann"])));
    }

    #[test]
    fn toggle_twice_deselects() {
        let mut picker = Picker::new("t", items(&["Ann"]), PickMode::Multi);
        picker.handle_key(key(KeyCode::Char(' ')));
        picker.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(picker.selected_count(), 0);
    }

    #[test]
    fn single_select_space_filters_and_empty_enter_cancels() {
        let mut picker = Picker::new("t", items(&["Bay Michaels", "Bo"]), PickMode::Single);
        type_str(&mut picker, "y m");
        assert_eq!(picker.visible_labels(), vec!["Bay Michaels"]);
        assert_eq!(picker.handle_key(key(KeyCode::Enter)), Step::Done(items(&["Bay Michaels"])));
        type_str(&mut picker, "zz");
        assert_matches!(picker.handle_key(key(KeyCode::Enter)), Step::Cancel);
    }

    #[test]
    fn resize_keeps_filter_and_selection() {
        let mut picker = Picker::new("t", items(&["Ann", "Anna"]), PickMode::Multi);
        picker.handle_key(key(KeyCode::Char(' ')));
        type_str(&mut picker, "ann");
        assert_matches!(picker.handle_resize(), Step::Continue);
        assert_eq!(picker.filter(), "ann");
        assert_eq!(picker.selected_count(), 1);
    }

    #[test]
    fn contact_rows_show_marker_and_detail() {
        let contacts = vec![Contact::new("Bay Michaels", "+15550001", "bay")];
        let mut picker = Picker::new("Remove", contacts, PickMode::Multi).layout(PickerLayout::Wide);
        picker.handle_key(key(KeyCode::Char(' ')));
        let mut buf = Buffer::empty(Rect::new(0, 0, 60, 6));
        let area = buf.area;
        picker.render(&mut buf, area);

        let row: String = (0..60).map(|x| buf.get(x, 1).symbol().to_string()).collect();
        assert!(row.starts_with("[x] Bay Michaels"), "{row}");
        assert!(row.contains("+15550001 | bay"), "{row}");
        assert_eq!(buf.get(0, 1).modifier, Modifier::REVERSED);
        let header: String = (0..60).map(|x| buf.get(x, 0).symbol().to_string()).collect();
        assert!(header.contains("Selected 1 | 1/1"), "{header}");
    }

    #[test]
    fn empty_filter_result_says_no_matches() {
        let mut picker = Picker::new("t", items(&["Ann"]), PickMode::Browse);
        type_str(&mut picker, "q");
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 4));
        let area = buf.area;
        picker.render(&mut buf, area);
        let row: String = (0..11).map(|x| buf.get(x, 1).symbol().to_string()).collect();
        assert_eq!(row, "No matches.");
    }

    #[test]
    fn fit_pads_and_truncates() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 3), "abc");
    }
}
