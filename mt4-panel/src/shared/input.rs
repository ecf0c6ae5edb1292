/// Keyboard commands and key sources
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io;
use std::time::Duration;

use crate::shared::view::DisplayMode;

/// A panel command decoded from one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Advance to the next display mode
    Cycle,
    /// Jump to a display mode
    Show(DisplayMode),
    TogglePending,
    ToggleBalance,
    Quit,
}

impl Command {
    /// Map a key to a command
    ///
    /// space=cycle, p=positions, o=orders, P=pending, h=hide pending,
    /// H=hide balance, q=quit
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            ' ' => Some(Command::Cycle),
            'p' => Some(Command::Show(DisplayMode::Positions)),
            'o' => Some(Command::Show(DisplayMode::Orders)),
            'P' => Some(Command::Show(DisplayMode::Pending)),
            'h' => Some(Command::TogglePending),
            'H' => Some(Command::ToggleBalance),
            'q' => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Whether the input loop keeps running after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Source of single key presses
pub trait KeySource {
    /// Wait up to `timeout` for the next key
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<char>>;
}

/// Reads keys from the terminal via crossterm
///
/// Esc and Ctrl-C are reported as `q`.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<char>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some('q'),
                KeyCode::Char(c) => Some(c),
                KeyCode::Esc => Some('q'),
                _ => None,
            }),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        struct TestCase {
            input: char,
            expected: Option<Command>,
        }

        let tests = vec![
            TestCase {
                // TC0: space cycles
                input: ' ',
                expected: Some(Command::Cycle),
            },
            TestCase {
                // TC1: lowercase p is positions
                input: 'p',
                expected: Some(Command::Show(DisplayMode::Positions)),
            },
            TestCase {
                // TC2: uppercase P is pending
                input: 'P',
                expected: Some(Command::Show(DisplayMode::Pending)),
            },
            TestCase {
                // TC3: o is orders
                input: 'o',
                expected: Some(Command::Show(DisplayMode::Orders)),
            },
            TestCase {
                // TC4: h toggles pending
                input: 'h',
                expected: Some(Command::TogglePending),
            },
            TestCase {
                // TC5: H toggles balance
                input: 'H',
                expected: Some(Command::ToggleBalance),
            },
            TestCase {
                // TC6: q quits
                input: 'q',
                expected: Some(Command::Quit),
            },
            TestCase {
                // TC7: unbound
                input: 'x',
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(Command::from_key(test.input), test.expected, "TC{} failed", index);
        }
    }
}
