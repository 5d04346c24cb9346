//! Terminal prompts for identity fields and secrets.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;

/// Print `prompt` to stderr and read one trimmed line from stdin.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Read a secret without echoing it.
///
/// When stdin is not a terminal (piped input), the next line is read
/// verbatim instead so secrets can be supplied by scripts.
pub fn read_secret(prompt: &str) -> io::Result<String> {
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        return Ok(input.trim_end_matches(['\r', '\n']).to_string());
    }

    eprint!("{prompt}");
    io::stderr().flush()?;

    let secret = {
        let _raw = RawModeGuard::enable()?;
        read_hidden_line()
    };
    eprintln!();
    secret
}

/// Keeps the terminal in raw mode until dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_hidden_line() -> io::Result<String> {
    let mut buffer = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match apply_key(&mut buffer, key.code, key.modifiers) {
            KeyOutcome::Continue => {}
            KeyOutcome::Submit => return Ok(buffer),
            KeyOutcome::Cancel => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Submit,
    Cancel,
}

fn apply_key(buffer: &mut String, code: KeyCode, modifiers: KeyModifiers) -> KeyOutcome {
    match code {
        KeyCode::Enter => KeyOutcome::Submit,
        KeyCode::Esc => KeyOutcome::Cancel,
        KeyCode::Char('c' | 'd') if modifiers.contains(KeyModifiers::CONTROL) => KeyOutcome::Cancel,
        KeyCode::Backspace => {
            buffer.pop();
            KeyOutcome::Continue
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}
