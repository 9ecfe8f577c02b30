pub mod dialogs;
pub mod editor;
pub mod overlay;
pub mod picker;

use crossterm::event::KeyEvent;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use strum::IntoEnumIterator;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{LandingState, MenuAction};
use overlay::{put_str, OverlayLayout};

const LANDING_HINT: &str = "s send  l lists  h help  q quit";
const RESIZE_NOTICE: &str = "Resize terminal to at least 80x24.";

/// What a modal reports after each input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Continue,
    Done(T),
    Cancel,
}

/// One interaction drawn in a centered overlay above the dimmed landing
/// screen. The session owns the loop; a modal only renders and reacts.
pub trait Modal {
    type Output;

    fn overlay(&self, screen: Rect) -> OverlayLayout;

    /// Draws into the padded content area of the window.
    fn render(&mut self, buf: &mut Buffer, content: Rect);

    /// Absolute cursor position after the last render, if the modal edits text.
    fn cursor(&self) -> Option<(u16, u16)> {
        None
    }

    fn handle_key(&mut self, key: KeyEvent) -> Step<Self::Output>;

    /// Called after the terminal has been resized. Text editors cancel here;
    /// everything else just redraws with its state intact.
    fn handle_resize(&mut self) -> Step<Self::Output> {
        Step::Continue
    }
}

/// Composites `modal` over whatever the frame already holds: scrim, shadow,
/// bordered window, then the modal's own content.
pub fn draw_modal<M: Modal + ?Sized>(frame: &mut Frame, modal: &mut M) {
    let screen = frame.size();
    let layout = modal.overlay(screen);
    let window = overlay::overlay_rect(screen, layout.height, layout.width);
    let buf = frame.buffer_mut();
    overlay::draw_scrim(buf);
    overlay::draw_shadow(buf, window);
    let content = overlay::draw_window(buf, window, &layout);
    modal.render(buf, content);
    if let Some((x, y)) = modal.cursor() {
        frame.set_cursor(x, y);
    }
}

pub fn draw_landing(frame: &mut Frame, landing: &LandingState) {
    let screen = frame.size();
    let buf = frame.buffer_mut();
    if overlay::is_too_small(screen) {
        let x = screen.width.saturating_sub(RESIZE_NOTICE.len() as u16) / 2;
        put_str(buf, x, screen.height / 2, RESIZE_NOTICE, screen.width, Style::default());
        return;
    }

    let menu: Vec<String> = MenuAction::iter()
        .map(|action| format!("{:<10} {}", action.label(), action.hotkey()))
        .collect();
    let menu_w = menu.iter().map(|line| line.width()).max().unwrap_or(0) as u16;
    let banner = landing.banner();
    let banner_w = banner.iter().map(|line| line.width()).max().unwrap_or(0) as u16;
    let gap = 2;
    let total_h = banner.len() as u16 + gap + menu.len() as u16;
    let top = screen.height.saturating_sub(total_h) / 2;
    let menu_left = screen.width.saturating_sub(menu_w) / 2;
    let banner_left = if banner_w > menu_w {
        menu_left.saturating_sub((banner_w - menu_w) / 2)
    } else {
        menu_left + (menu_w - banner_w) / 2
    };

    for (i, line) in banner.iter().enumerate() {
        put_str(
            buf,
            banner_left,
            top + i as u16,
            line,
            screen.width,
            Style::default(),
        );
    }
    let menu_top = top + banner.len() as u16 + gap;
    for (i, line) in menu.iter().enumerate() {
        let style = if i == landing.index() {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        };
        put_str(buf, menu_left, menu_top + i as u16, line, screen.width, style);
    }
    let hint_left = screen.width.saturating_sub(LANDING_HINT.len() as u16) / 2;
    put_str(
        buf,
        hint_left,
        screen.height - 2,
        LANDING_HINT,
        screen.width,
        Style::default().add_modifier(Modifier::DIM),
    );
}
