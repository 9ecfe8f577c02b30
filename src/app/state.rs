use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use strum::{EnumIter, IntoEnumIterator};

const DEFAULT_BANNER: &str = "rostertui";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum MenuAction {
    Send,
    Drafts,
    Schedule,
    Lists,
    Help,
    Quit,
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Send => "Send",
            MenuAction::Drafts => "Drafts",
            MenuAction::Schedule => "Schedule",
            MenuAction::Lists => "Lists",
            MenuAction::Help => "Help",
            MenuAction::Quit => "Quit",
        }
    }

    /// Case-sensitive: `s` sends, `S` schedules.
    pub fn hotkey(self) -> char {
        match self {
            MenuAction::Send => 's',
            MenuAction::Drafts => 'd',
            MenuAction::Schedule => 'S',
            MenuAction::Lists => 'l',
            MenuAction::Help => 'h',
            MenuAction::Quit => 'q',
        }
    }

    pub fn from_hotkey(ch: char) -> Option<Self> {
        MenuAction::iter().find(|action| action.hotkey() == ch)
    }

    pub fn is_placeholder(self) -> bool {
        matches!(self, MenuAction::Drafts | MenuAction::Schedule)
    }
}

/// Landing screen: highlighted menu row plus the banner drawn above it.
#[derive(Debug, Clone)]
pub struct LandingState {
    index: usize,
    banner: Vec<String>,
}

impl Default for LandingState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl LandingState {
    pub fn new(banner: Vec<String>) -> Self {
        let banner = if banner.iter().all(|line| line.trim().is_empty()) {
            vec![DEFAULT_BANNER.to_string()]
        } else {
            banner
        };
        Self { index: 0, banner }
    }

    pub fn banner(&self) -> &[String] {
        &self.banner
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected(&self) -> MenuAction {
        MenuAction::iter().nth(self.index).unwrap_or(MenuAction::Send)
    }

    pub fn move_selection(&mut self, delta: isize) {
        let last = MenuAction::iter().count() as isize - 1;
        self.index = (self.index as isize + delta).clamp(0, last) as usize;
    }

    /// Moves the highlight or returns the action the key triggers.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<MenuAction> {
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                None
            }
            KeyCode::Enter => Some(self.selected()),
            KeyCode::Char(ch) => MenuAction::from_hotkey(ch),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn hotkeys_map_to_actions() {
        let mut landing = LandingState::default();
        assert_eq!(landing.handle_key(key(KeyCode::Char('s'))), Some(MenuAction::Send));
        assert_eq!(
            landing.handle_key(KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT)),
            Some(MenuAction::Schedule)
        );
        assert_eq!(landing.handle_key(key(KeyCode::Char('l'))), Some(MenuAction::Lists));
        assert_eq!(landing.handle_key(key(KeyCode::Char('x'))), None);
        assert_eq!(landing.index(), 0);
    }

    #[test]
    fn navigation_clamps_and_enter_runs_selection() {
        let mut landing = LandingState::default();
        assert_eq!(landing.handle_key(key(KeyCode::Up)), None);
        assert_eq!(landing.index(), 0);
        for _ in 0..10 {
            landing.handle_key(key(KeyCode::Char('j')));
        }
        assert_eq!(landing.selected(), MenuAction::Quit);
        landing.handle_key(key(KeyCode::Char('k')));
        assert_eq!(landing.handle_key(key(KeyCode::Enter)), Some(MenuAction::Help));
    }

    #[test]
    fn every_action_has_a_unique_hotkey() {
        let keys: Vec<char> = MenuAction::iter().map(MenuAction::hotkey).collect();
        for action in MenuAction::iter() {
            assert_eq!(MenuAction::from_hotkey(action.hotkey()), Some(action));
        }
        let unique: HashSet<char> = keys.iter().copied().collect();
        assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn blank_banner_falls_back() {
        assert_eq!(LandingState::new(vec![" ".into()]).banner(), ["rostertui"]);
        assert!(MenuAction::Drafts.is_placeholder());
        assert!(!MenuAction::Send.is_placeholder());
    }
}
