//! Interactive prompts.
//!
//! The sync pipeline asks its questions through [`Prompter`] so that tests
//! can replay answers with [`ScriptedPrompter`] while the binary uses
//! [`TerminalPrompter`].

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Source of answers to interactive questions.
pub trait Prompter {
    /// Prints `question` and reads one line. The line ending is removed.
    fn ask(&mut self, question: &str) -> io::Result<String>;

    /// Like [`Prompter::ask`] but echoes `*` for each typed character.
    fn ask_masked(&mut self, question: &str) -> io::Result<String>;

    /// Prints a notice outside the normal output, such as a parse warning.
    fn say(&mut self, message: &str) -> io::Result<()>;
}

/// Removes a trailing `\n` or `\r\n`.
pub fn strip_line_ending(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Prompter backed by the process's stdin and stdout.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    /// Creates a terminal prompter.
    pub fn new() -> Self {
        Self
    }

    fn read_line() -> io::Result<String> {
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            ));
        }
        Ok(strip_line_ending(&line).to_string())
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(question.as_bytes())?;
        stdout.flush()?;
        drop(stdout);
        Self::read_line()
    }

    fn ask_masked(&mut self, question: &str) -> io::Result<String> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(question.as_bytes())?;
        stdout.flush()?;
        drop(stdout);

        #[cfg(unix)]
        {
            if let Some(raw_mode) = masked::RawMode::enable()? {
                let result = masked::read_masked(&mut io::stdin().lock(), &mut io::stdout());
                drop(raw_mode);
                return result;
            }
        }

        // Not a terminal: nothing would be echoed anyway.
        Self::read_line()
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(io::stderr(), "{}", message)
    }
}

/// What a keystroke does to a masked line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyEffect {
    /// A character was completed; echo one `*`.
    Star,
    /// Part of a multi-byte character; echo nothing yet.
    Pending,
    /// The last character was removed.
    Erase,
    /// Enter was pressed.
    Submit,
    /// Ctrl-C was pressed.
    Abort,
    /// Nothing changed.
    Ignore,
}

/// Applies one input byte to the masked buffer.
pub(crate) fn apply_key(buffer: &mut Vec<u8>, byte: u8) -> KeyEffect {
    match byte {
        b'\n' | b'\r' => KeyEffect::Submit,
        // ETX, delivered as a byte because ISIG is off
        0x03 => KeyEffect::Abort,
        // DEL and backspace
        0x7f | 0x08 => {
            if buffer.is_empty() {
                return KeyEffect::Ignore;
            }
            while let Some(b) = buffer.pop() {
                if b & 0xC0 != 0x80 {
                    break;
                }
            }
            KeyEffect::Erase
        }
        b if b < 0x20 => KeyEffect::Ignore,
        b => {
            buffer.push(b);
            if std::str::from_utf8(buffer).is_ok() {
                KeyEffect::Star
            } else {
                KeyEffect::Pending
            }
        }
    }
}

#[cfg(unix)]
mod masked {
    use std::io::{self, Read, Write};
    use std::mem::MaybeUninit;
    use std::os::fd::AsRawFd;

    use super::{KeyEffect, apply_key};

    /// Terminal with echo, line buffering and signal keys off. Restored on drop.
    pub(super) struct RawMode {
        fd: i32,
        original: libc::termios,
    }

    impl RawMode {
        /// Switches stdin to raw mode. Returns `None` if stdin is not a tty.
        pub(super) fn enable() -> io::Result<Option<Self>> {
            let fd = io::stdin().as_raw_fd();
            if unsafe { libc::isatty(fd) } != 1 {
                return Ok(None);
            }

            let mut original = MaybeUninit::<libc::termios>::uninit();
            if unsafe { libc::tcgetattr(fd, original.as_mut_ptr()) } != 0 {
                return Err(io::Error::last_os_error());
            }
            let original = unsafe { original.assume_init() };

            let mut raw = original;
            raw.c_lflag &= !(libc::ICANON | libc::ECHO | libc::ISIG);
            raw.c_cc[libc::VMIN] = 1;
            raw.c_cc[libc::VTIME] = 0;
            if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
                return Err(io::Error::last_os_error());
            }

            Ok(Some(Self { fd, original }))
        }
    }

    impl Drop for RawMode {
        fn drop(&mut self) {
            unsafe {
                libc::tcsetattr(self.fd, libc::TCSANOW, &self.original);
            }
        }
    }

    /// Reads until Enter, echoing one `*` per character.
    pub(super) fn read_masked(input: &mut impl Read, echo: &mut impl Write) -> io::Result<String> {
        let mut buffer = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            if input.read(&mut byte)? == 0 {
                break;
            }
            match apply_key(&mut buffer, byte[0]) {
                KeyEffect::Submit => break,
                KeyEffect::Abort => {
                    echo.write_all(b"\n")?;
                    echo.flush()?;
                    return Err(io::Error::new(
                        io::ErrorKind::Interrupted,
                        "password entry cancelled",
                    ));
                }
                KeyEffect::Star => echo.write_all(b"*")?,
                KeyEffect::Erase => echo.write_all(b"\x08 \x08")?,
                KeyEffect::Pending | KeyEffect::Ignore => {}
            }
            echo.flush()?;
        }

        echo.write_all(b"\n")?;
        echo.flush()?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

}

/// Prompter that replays scripted answers and records what was asked.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Questions asked so far, in order.
    pub questions: Vec<String>,
    /// Which questions were masked, parallel to `questions`.
    pub masked: Vec<bool>,
    /// Lines passed to [`Prompter::say`].
    pub messages: Vec<String>,
}

impl ScriptedPrompter {
    /// Creates a prompter that answers with `answers`, in order.
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Number of answers not consumed yet.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, question: &str, masked: bool) -> io::Result<String> {
        self.questions.push(question.to_string());
        self.masked.push(masked);
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("no scripted answer for {:?}", question),
            )
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        self.next(question, false)
    }

    fn ask_masked(&mut self, question: &str) -> io::Result<String> {
        self.next(question, true)
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }
}
