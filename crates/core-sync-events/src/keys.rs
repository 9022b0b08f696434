//! Host key notation: the combos the host keyboard adapter reports, and their
//! translation into the engine's key-notation strings (`<Esc>`, `<C-a>`, ...).

/// A single logical key, independent of modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyInput {
    Char(char),
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

/// A key event as reported by the host, with the modifier bits the reducer
/// cares about. `command` is the host's platform modifier (⌘ on macOS); hosts
/// without one simply never set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: KeyInput,
    pub control: bool,
    pub command: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyCombo {
    pub fn plain(key: KeyInput) -> Self {
        Self {
            key,
            control: false,
            command: false,
            shift: false,
            alt: false,
        }
    }

    pub fn with_control(mut self) -> Self {
        self.control = true;
        self
    }

    pub fn with_command(mut self) -> Self {
        self.command = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// `true` for any combo that carries the host's command modifier, which
    /// the reducer treats as "host territory" unless explicitly handled
    /// (undo/redo/paste).
    pub fn has_command(self) -> bool {
        self.command
    }

    /// The printable character this combo types, if any, ignoring modifiers
    /// other than shift (which the host already folds into the char).
    pub fn printable_char(self) -> Option<char> {
        match self.key {
            KeyInput::Char(c) if !self.control && !self.command && !self.alt => Some(c),
            _ => None,
        }
    }

    /// Engine key notation for this combo, if one exists. Named keys map to
    /// `<Name>`; control combos (named or plain char) map to `<C-x>`. Plain,
    /// uncontrolled characters return `None` — callers should prefer
    /// `printable_char` for those.
    pub fn engine_notation(self) -> Option<String> {
        match self.key {
            KeyInput::Char(c) => self.control.then(|| format!("<C-{}>", c.to_ascii_lowercase())),
            named => {
                let base = named_key_notation(named)?;
                if self.control {
                    Some(format!("<C-{}>", base.trim_start_matches('<').trim_end_matches('>')))
                } else {
                    Some(base.to_string())
                }
            }
        }
    }
}

fn named_key_notation(key: KeyInput) -> Option<&'static str> {
    match key {
        KeyInput::Escape => Some("<Esc>"),
        KeyInput::Enter => Some("<CR>"),
        KeyInput::Tab => Some("<Tab>"),
        KeyInput::Backspace => Some("<BS>"),
        KeyInput::Delete => Some("<Del>"),
        KeyInput::Up => Some("<Up>"),
        KeyInput::Down => Some("<Down>"),
        KeyInput::Left => Some("<Left>"),
        KeyInput::Right => Some("<Right>"),
        KeyInput::Home => Some("<Home>"),
        KeyInput::End => Some("<End>"),
        KeyInput::PageUp => Some("<PageUp>"),
        KeyInput::PageDown => Some("<PageDown>"),
        KeyInput::F(_) | KeyInput::Char(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_notation() {
        let combo = KeyCombo::plain(KeyInput::Escape);
        assert_eq!(combo.engine_notation().as_deref(), Some("<Esc>"));
    }

    #[test]
    fn control_combo_notation() {
        let combo = KeyCombo::plain(KeyInput::Char('a')).with_control();
        assert_eq!(combo.engine_notation().as_deref(), Some("<C-a>"));

        let combo = KeyCombo::plain(KeyInput::Left).with_control();
        assert_eq!(combo.engine_notation().as_deref(), Some("<C-Left>"));
    }

    #[test]
    fn plain_char_has_no_notation() {
        let combo = KeyCombo::plain(KeyInput::Char('a'));
        assert_eq!(combo.engine_notation(), None);
    }

    #[test]
    fn printable_char_ignores_shift() {
        let combo = KeyCombo::plain(KeyInput::Char('A')).with_shift();
        assert_eq!(combo.printable_char(), Some('A'));
    }

    #[test]
    fn command_combo_is_not_printable() {
        let combo = KeyCombo::plain(KeyInput::Char('v')).with_command();
        assert_eq!(combo.printable_char(), None);
        assert!(combo.has_command());
    }
}
