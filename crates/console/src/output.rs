//! Serialized terminal output shared by the monitor and command replies.

use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use parking_lot::Mutex;

/// Prompt shown after every write.
pub const PROMPT: &str = "> ";

/// Cloneable handle to one writer. Every write takes the same lock, so a
/// status redraw never lands in the middle of a command reply.
#[derive(Clone)]
pub struct Output {
	writer: Arc<Mutex<Box<dyn Write + Send>>>,
	clear_screen: bool,
}

impl Output {
	pub fn new(writer: impl Write + Send + 'static) -> Self {
		Self {
			writer: Arc::new(Mutex::new(Box::new(writer))),
			clear_screen: true,
		}
	}

	pub fn stdout() -> Self {
		Self::new(io::stdout())
	}

	/// Whether [`Self::redraw`] clears the terminal first.
	#[must_use]
	pub fn clear_screen(mut self, clear: bool) -> Self {
		self.clear_screen = clear;
		self
	}

	/// Writes `text` as one line, then the prompt.
	pub fn line(&self, text: &str) -> io::Result<()> {
		let mut writer = self.writer.lock();
		writeln!(writer, "{text}")?;
		writer.write_all(PROMPT.as_bytes())?;
		writer.flush()
	}

	/// Writes a last line with no prompt after it.
	pub fn close(&self, text: &str) -> io::Result<()> {
		let mut writer = self.writer.lock();
		writeln!(writer, "{text}")?;
		writer.flush()
	}

	/// Replaces the screen with `screen`, then the prompt.
	pub fn redraw(&self, screen: &str) -> io::Result<()> {
		let mut writer = self.writer.lock();
		if self.clear_screen {
			queue!(writer, Clear(ClearType::All), MoveTo(0, 0))?;
		}
		writer.write_all(screen.as_bytes())?;
		writer.write_all(PROMPT.as_bytes())?;
		writer.flush()
	}
}

impl fmt::Debug for Output {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Output").field("clear_screen", &self.clear_screen).finish_non_exhaustive()
	}
}
