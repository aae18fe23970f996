use std::io::{self, BufWriter, Stdout, Write};
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};

static RESIZE_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigwinch(_: libc::c_int) {
    RESIZE_REQUESTED.store(true, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn ansi(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

pub struct Terminal {
    original_termios: libc::termios,
    raw_termios: libc::termios,
    out: BufWriter<Stdout>,
    pub rows: u16,
    pub cols: u16,
    mouse: bool,
}

fn set_termios(termios: &libc::termios) -> io::Result<()> {
    let stdin_fd = io::stdin().as_raw_fd();
    if unsafe { libc::tcsetattr(stdin_fd, libc::TCSAFLUSH, termios) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

impl Terminal {
    pub fn new(mouse: bool) -> io::Result<Self> {
        let stdin_fd = io::stdin().as_raw_fd();

        let mut original_termios: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(stdin_fd, &mut original_termios) } == -1 {
            return Err(io::Error::last_os_error());
        }

        let mut raw = original_termios;
        raw.c_iflag &= !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
        raw.c_oflag &= !libc::OPOST;
        raw.c_cflag |= libc::CS8;
        raw.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
        raw.c_cc[libc::VMIN] = 0;
        raw.c_cc[libc::VTIME] = 1; // 100ms read timeout
        set_termios(&raw)?;

        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = handle_sigwinch as libc::sighandler_t;
            libc::sigemptyset(&mut sa.sa_mask);
            sa.sa_flags = 0;
            libc::sigaction(libc::SIGWINCH, &sa, std::ptr::null_mut());
        }

        let (rows, cols) = get_window_size()?;

        let mut term = Terminal {
            original_termios,
            raw_termios: raw,
            out: BufWriter::new(io::stdout()),
            rows,
            cols,
            mouse,
        };
        term.enter_screen()?;
        Ok(term)
    }

    fn enter_screen(&mut self) -> io::Result<()> {
        // Alternate screen buffer, hidden cursor
        write!(self.out, "\x1b[?1049h\x1b[?25l")?;
        if self.mouse {
            // X10 mouse tracking + SGR extended coordinates
            write!(self.out, "\x1b[?1000h\x1b[?1006h")?;
        }
        self.out.flush()
    }

    fn leave_screen(&mut self) -> io::Result<()> {
        if self.mouse {
            write!(self.out, "\x1b[?1000l\x1b[?1006l")?;
        }
        write!(self.out, "\x1b[?25h\x1b[?1049l")?;
        self.out.flush()
    }

    /// Hand the terminal back to the shell, e.g. while an editor runs.
    pub fn suspend(&mut self) -> io::Result<()> {
        self.leave_screen()?;
        set_termios(&self.original_termios)
    }

    pub fn resume(&mut self) -> io::Result<()> {
        set_termios(&self.raw_termios)?;
        self.enter_screen()?;
        if let Ok((rows, cols)) = get_window_size() {
            self.rows = rows;
            self.cols = cols;
        }
        Ok(())
    }

    /// Check if a resize was signaled and update dimensions.
    pub fn check_resize(&mut self) -> bool {
        if RESIZE_REQUESTED.swap(false, Ordering::Relaxed) {
            if let Ok((rows, cols)) = get_window_size() {
                self.rows = rows;
                self.cols = cols;
                return true;
            }
        }
        false
    }

    pub fn clear(&mut self) -> io::Result<()> {
        write!(self.out, "\x1b[2J\x1b[H")
    }

    pub fn move_to(&mut self, row: u16, col: u16) -> io::Result<()> {
        write!(self.out, "\x1b[{};{}H", row, col)
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        write!(self.out, "{}", s)
    }

    pub fn set_reverse(&mut self) -> io::Result<()> {
        write!(self.out, "\x1b[7m")
    }

    pub fn set_bold(&mut self) -> io::Result<()> {
        write!(self.out, "\x1b[1m")
    }

    pub fn set_dim(&mut self) -> io::Result<()> {
        write!(self.out, "\x1b[2m")
    }

    pub fn set_fg(&mut self, color: Color) -> io::Result<()> {
        write!(self.out, "\x1b[{}m", color.ansi())
    }

    pub fn reset_attr(&mut self) -> io::Result<()> {
        write!(self.out, "\x1b[0m")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Write a string truncated to fit within `max_width` columns.
    pub fn write_truncated(&mut self, s: &str, max_width: u16) -> io::Result<()> {
        let clipped = clip(s, max_width as usize);
        write!(self.out, "{}", clipped)
    }

    /// Write `s` and pad with spaces to `width` columns.
    pub fn write_padded(&mut self, s: &str, width: u16) -> io::Result<()> {
        let clipped = clip(s, width as usize);
        let pad = (width as usize).saturating_sub(clipped.chars().count());
        write!(self.out, "{}{}", clipped, " ".repeat(pad))
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave_screen();
        let _ = set_termios(&self.original_termios);
    }
}

/// Clip to at most `max` characters; control characters become spaces so a
/// stray escape in message content cannot move the cursor.
pub fn clip(s: &str, max: usize) -> String {
    s.chars()
        .take(max)
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn get_window_size() -> io::Result<(u16, u16)> {
    #[repr(C)]
    struct WinSize {
        ws_row: u16,
        ws_col: u16,
        ws_xpixel: u16,
        ws_ypixel: u16,
    }

    let mut ws: WinSize = unsafe { std::mem::zeroed() };
    let fd = io::stdout().as_raw_fd();

    if unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) } == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok((ws.ws_row, ws.ws_col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_counts_chars_and_strips_controls() {
        assert_eq!(clip("héllo", 3), "hél");
        assert_eq!(clip("a\tb\x1b[2J", 4), "a b ");
        assert_eq!(clip("", 5), "");
    }
}
