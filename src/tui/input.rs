use std::io::{self, Read};

#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Delete,
    Ctrl(char),
    MouseClick { row: u16, col: u16 },
    ScrollUp,
    ScrollDown,
}

/// Read a single keypress from stdin.
/// Returns None if no key is available (timeout expired).
pub fn read_key() -> Option<Key> {
    KeyReader::new(io::stdin().lock()).next_key()
}

/// Decodes keys from a byte source. In raw mode reads time out after 100ms,
/// which shows up here as a zero-length read.
pub struct KeyReader<R> {
    src: R,
}

impl<R: Read> KeyReader<R> {
    pub fn new(src: R) -> Self {
        KeyReader { src }
    }

    fn byte(&mut self) -> Option<u8> {
        let mut buf = [0u8; 1];
        match self.src.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            _ => None,
        }
    }

    pub fn next_key(&mut self) -> Option<Key> {
        let b = self.byte()?;
        Some(match b {
            13 | 10 => Key::Enter,
            27 => self.escape(),
            127 | 8 => Key::Backspace,
            9 => Key::Tab,
            b @ 1..=26 => Key::Ctrl((b'a' + b - 1) as char),
            b if (32..127).contains(&b) => Key::Char(b as char),
            b if b >= 0xC0 => self.utf8(b),
            _ => Key::Char('?'),
        })
    }

    fn utf8(&mut self, first: u8) -> Key {
        let len = match first {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            _ => 4,
        };
        let mut bytes = vec![first];
        for _ in 1..len {
            match self.byte() {
                Some(b) => bytes.push(b),
                None => break,
            }
        }
        std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .map(Key::Char)
            .unwrap_or(Key::Char('?'))
    }

    fn escape(&mut self) -> Key {
        match self.byte() {
            None => Key::Escape,
            Some(b'[') => self.csi(),
            Some(_) => Key::Escape,
        }
    }

    fn csi(&mut self) -> Key {
        match self.byte() {
            Some(b'A') => Key::Up,
            Some(b'B') => Key::Down,
            Some(b'C') => Key::Right,
            Some(b'D') => Key::Left,
            Some(b'H') => Key::Home,
            Some(b'F') => Key::End,
            Some(b'Z') => Key::BackTab,
            Some(d @ b'0'..=b'9') => self.csi_number(d),
            Some(b'<') => self.sgr_mouse(),
            _ => Key::Escape,
        }
    }

    /// `ESC [ n ~` sequences.
    fn csi_number(&mut self, first_digit: u8) -> Key {
        let mut num: u16 = (first_digit - b'0') as u16;
        loop {
            match self.byte() {
                Some(d @ b'0'..=b'9') => {
                    num = num.saturating_mul(10).saturating_add((d - b'0') as u16);
                }
                Some(b'~') => {
                    return match num {
                        1 | 7 => Key::Home,
                        3 => Key::Delete,
                        4 | 8 => Key::End,
                        5 => Key::PageUp,
                        6 => Key::PageDown,
                        _ => Key::Escape,
                    };
                }
                _ => return Key::Escape,
            }
        }
    }

    /// SGR mouse report: `ESC [ < btn ; col ; row M` (press) or `m` (release).
    fn sgr_mouse(&mut self) -> Key {
        let mut params = [0u16; 3];
        let mut idx = 0;
        loop {
            match self.byte() {
                Some(d @ b'0'..=b'9') => {
                    if idx < 3 {
                        params[idx] = params[idx]
                            .saturating_mul(10)
                            .saturating_add((d - b'0') as u16);
                    }
                }
                Some(b';') => idx += 1,
                Some(b'M') if idx == 2 => {
                    return match params[0] {
                        0 => Key::MouseClick {
                            row: params[2],
                            col: params[1],
                        },
                        64 => Key::ScrollUp,
                        65 => Key::ScrollDown,
                        _ => Key::Escape,
                    };
                }
                // Releases, malformed or truncated reports
                _ => return Key::Escape,
            }
        }
    }
}
