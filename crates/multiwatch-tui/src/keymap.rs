//! Keybinding registry for the dashboard's normal mode.
//!
//! Overlay modes (help, prompts, the pane picker) interpret keys themselves;
//! everything listed here is routed only while no overlay is active. The
//! registry is also the source of the generated help text, so a binding
//! added here shows up in help automatically.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub token: KeyToken,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyChord {
    #[must_use]
    pub const fn plain(token: KeyToken) -> Self {
        Self {
            token,
            shift: false,
            ctrl: false,
            alt: false,
        }
    }

    #[must_use]
    pub const fn ch(ch: char) -> Self {
        Self::plain(KeyToken::Char(ch))
    }

    #[must_use]
    pub const fn alt_char(ch: char) -> Self {
        Self {
            token: KeyToken::Char(ch),
            shift: false,
            ctrl: false,
            alt: true,
        }
    }

    #[must_use]
    pub const fn shift_tab() -> Self {
        Self {
            token: KeyToken::Tab,
            shift: true,
            ctrl: false,
            alt: false,
        }
    }

    #[must_use]
    pub fn display(self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_owned());
        }
        if self.alt {
            parts.push("Alt".to_owned());
        }
        if self.shift && !matches!(self.token, KeyToken::Char(_)) {
            parts.push("Shift".to_owned());
        }
        let key = match self.token {
            KeyToken::Char(' ') => "Space".to_owned(),
            KeyToken::Char(ch) => ch.to_string(),
            KeyToken::Enter => "Enter".to_owned(),
            KeyToken::Escape => "Esc".to_owned(),
            KeyToken::Tab => "Tab".to_owned(),
            KeyToken::Backspace => "Backspace".to_owned(),
            KeyToken::Up => "Up".to_owned(),
            KeyToken::Down => "Down".to_owned(),
            KeyToken::Left => "Left".to_owned(),
            KeyToken::Right => "Right".to_owned(),
        };
        parts.push(key);
        parts.join("+")
    }
}

/// An action a normal-mode key maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCommand {
    Quit,
    Help,
    FocusIndex(usize),
    FocusNext,
    FocusPrev,
    AddPane,
    RemovePane,
    EditCommand,
    EditPattern,
    PauseAll,
    PauseFocused,
    IntervalUp,
    IntervalDown,
    ToggleDiffLast,
    ToggleDiffMark,
    MarkFocused,
    PickMarkPane,
    ClearMark,
    RerunNow,
    RerunNowReset,
    RotateLeft,
    RotateRight,
    BrowseOlder,
    BrowseNewer,
    BrowseLive,
    ExitOnError,
    PauseOnError,
    ExitOnChange,
    PauseOnChange,
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub chord: KeyChord,
    pub command: KeyCommand,
    pub description: String,
}

fn binding(chord: KeyChord, command: KeyCommand, description: &str) -> KeyBinding {
    KeyBinding {
        chord,
        command,
        description: description.to_owned(),
    }
}

/// Every normal-mode binding, in help-text order.
#[must_use]
pub fn bindings() -> Vec<KeyBinding> {
    let mut out = vec![
        binding(KeyChord::ch('q'), KeyCommand::Quit, "quit"),
        binding(KeyChord::ch('?'), KeyCommand::Help, "show help"),
        binding(KeyChord::ch('h'), KeyCommand::Help, "show help"),
    ];
    for n in 1..=9usize {
        out.push(binding(
            KeyChord::ch(char::from(b'0' + n as u8)),
            KeyCommand::FocusIndex(n - 1),
            &format!("focus pane {n}"),
        ));
    }
    out.extend([
        binding(
            KeyChord::plain(KeyToken::Tab),
            KeyCommand::FocusNext,
            "focus next pane",
        ),
        binding(
            KeyChord::shift_tab(),
            KeyCommand::FocusPrev,
            "focus previous pane",
        ),
        binding(KeyChord::ch('a'), KeyCommand::AddPane, "add a new command pane"),
        binding(KeyChord::ch('k'), KeyCommand::RemovePane, "remove the focused pane"),
        binding(
            KeyChord::ch('c'),
            KeyCommand::EditCommand,
            "edit the focused pane's command",
        ),
        binding(
            KeyChord::ch('p'),
            KeyCommand::EditPattern,
            "set or clear the highlight pattern",
        ),
        binding(KeyChord::ch(' '), KeyCommand::PauseAll, "pause/unpause all panes"),
        binding(
            KeyChord::ch('P'),
            KeyCommand::PauseFocused,
            "pause/unpause the focused pane",
        ),
        binding(
            KeyChord::ch('+'),
            KeyCommand::IntervalUp,
            "lengthen the focused pane's interval",
        ),
        binding(
            KeyChord::ch('-'),
            KeyCommand::IntervalDown,
            "shorten the focused pane's interval",
        ),
        binding(KeyChord::ch('d'), KeyCommand::ToggleDiffLast, "toggle diff-last"),
        binding(KeyChord::ch('D'), KeyCommand::ToggleDiffMark, "toggle diff-mark"),
        binding(
            KeyChord::ch('m'),
            KeyCommand::MarkFocused,
            "mark the focused pane's output as the diff baseline",
        ),
        binding(
            KeyChord::ch('M'),
            KeyCommand::PickMarkPane,
            "mark another pane (pick by number)",
        ),
        binding(KeyChord::ch('u'), KeyCommand::ClearMark, "clear the diff mark"),
        binding(KeyChord::ch('f'), KeyCommand::RerunNow, "run the focused command now"),
        binding(
            KeyChord::ch('F'),
            KeyCommand::RerunNowReset,
            "run now and restart the interval",
        ),
        binding(KeyChord::ch('['), KeyCommand::RotateLeft, "rotate panes left"),
        binding(KeyChord::ch(']'), KeyCommand::RotateRight, "rotate panes right"),
        binding(
            KeyChord::ch('<'),
            KeyCommand::BrowseOlder,
            "browse to the previous run's output",
        ),
        binding(
            KeyChord::ch('>'),
            KeyCommand::BrowseNewer,
            "browse to the next run's output",
        ),
        binding(KeyChord::ch('n'), KeyCommand::BrowseLive, "return to live output"),
        binding(
            KeyChord::alt_char('e'),
            KeyCommand::ExitOnError,
            "toggle exit-on-error for the focused pane",
        ),
        binding(
            KeyChord::alt_char('p'),
            KeyCommand::PauseOnError,
            "toggle pause-on-error for the focused pane",
        ),
        binding(
            KeyChord::alt_char('E'),
            KeyCommand::ExitOnChange,
            "toggle exit-on-change for the focused pane",
        ),
        binding(
            KeyChord::alt_char('P'),
            KeyCommand::PauseOnChange,
            "toggle pause-on-change for the focused pane",
        ),
    ]);
    out
}

/// Resolve a normal-mode chord.
#[must_use]
pub fn resolve(chord: KeyChord) -> Option<KeyCommand> {
    // Shift is implied by the character itself for letter chords, so only
    // the token and ctrl/alt flags participate in matching.
    let lookup = KeyChord {
        shift: matches!(chord.token, KeyToken::Tab) && chord.shift,
        ..chord
    };
    bindings()
        .into_iter()
        .find(|candidate| candidate.chord == lookup)
        .map(|candidate| candidate.command)
}

/// Chords bound to more than one command, ignoring intentional aliases.
#[must_use]
pub fn conflicts() -> Vec<KeyChord> {
    let all = bindings();
    let mut seen: Vec<(KeyChord, KeyCommand)> = Vec::new();
    let mut out = Vec::new();
    for entry in &all {
        if let Some((_, existing)) = seen.iter().find(|(chord, _)| *chord == entry.chord) {
            if *existing != entry.command && !out.contains(&entry.chord) {
                out.push(entry.chord);
            }
        } else {
            seen.push((entry.chord, entry.command));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{bindings, conflicts, resolve, KeyChord, KeyCommand, KeyToken};

    #[test]
    fn no_chord_is_bound_twice() {
        assert!(conflicts().is_empty(), "conflicting chords: {:?}", conflicts());
    }

    #[test]
    fn digits_focus_panes_by_position() {
        assert_eq!(resolve(KeyChord::ch('1')), Some(KeyCommand::FocusIndex(0)));
        assert_eq!(resolve(KeyChord::ch('9')), Some(KeyCommand::FocusIndex(8)));
        assert_eq!(resolve(KeyChord::ch('0')), None);
    }

    #[test]
    fn shift_tab_cycles_backwards() {
        assert_eq!(resolve(KeyChord::shift_tab()), Some(KeyCommand::FocusPrev));
        assert_eq!(
            resolve(KeyChord::plain(KeyToken::Tab)),
            Some(KeyCommand::FocusNext)
        );
    }

    #[test]
    fn case_distinguishes_commands() {
        assert_eq!(resolve(KeyChord::ch('d')), Some(KeyCommand::ToggleDiffLast));
        assert_eq!(resolve(KeyChord::ch('D')), Some(KeyCommand::ToggleDiffMark));
        assert_eq!(resolve(KeyChord::ch('f')), Some(KeyCommand::RerunNow));
        assert_eq!(resolve(KeyChord::ch('F')), Some(KeyCommand::RerunNowReset));
    }

    #[test]
    fn alt_chords_map_completion_triggers() {
        assert_eq!(resolve(KeyChord::alt_char('e')), Some(KeyCommand::ExitOnError));
        assert_eq!(resolve(KeyChord::alt_char('P')), Some(KeyCommand::PauseOnChange));
        assert_eq!(resolve(KeyChord::ch('e')), None);
    }

    #[test]
    fn every_binding_has_a_description() {
        for entry in bindings() {
            assert!(
                !entry.description.trim().is_empty(),
                "missing description for {}",
                entry.chord.display()
            );
        }
    }

    #[test]
    fn chord_display_is_readable() {
        assert_eq!(KeyChord::ch(' ').display(), "Space");
        assert_eq!(KeyChord::alt_char('e').display(), "Alt+e");
        assert_eq!(KeyChord::shift_tab().display(), "Shift+Tab");
    }
}
