use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEventKind};
use crossterm::terminal;

/// Abstract boundary to the keyboard input collaborator (spec.md §6). The
/// keypress state machine in `gol-client` reads one key at a time through
/// this trait and never touches a terminal directly.
pub trait KeyInput: Send {
    /// Blocks until a key is available, or returns `Ok(None)` if the input
    /// source has been closed.
    fn next_key(&mut self) -> anyhow::Result<Option<char>>;
}

/// Reads single keypresses from the process's controlling terminal in raw
/// mode, via `crossterm` — the corpus's usual terminal-input crate.
pub struct CrosstermKeyInput {
    raw_mode_enabled: bool,
}

impl CrosstermKeyInput {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { raw_mode_enabled: true })
    }
}

impl Drop for CrosstermKeyInput {
    fn drop(&mut self) {
        if self.raw_mode_enabled {
            let _ = terminal::disable_raw_mode();
        }
    }
}

impl KeyInput for CrosstermKeyInput {
    fn next_key(&mut self) -> anyhow::Result<Option<char>> {
        loop {
            match event::read()? {
                CtEvent::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char(c) => return Ok(Some(c)),
                    _ => continue,
                },
                _ => continue,
            }
        }
    }
}
