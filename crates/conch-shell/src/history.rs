//! Submitted-command history with an up/down navigation cursor.

/// Ordered list of submitted lines plus a cursor for recall.
///
/// Lines are lowercased on entry and consecutive duplicates collapse.
/// The cursor rests one past the newest entry after every push.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: Vec<String>,
    cursor: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line. Empty lines are ignored.
    pub fn push(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        let line = line.to_lowercase();
        if self.entries.last() != Some(&line) {
            self.entries.push(line);
        }
        self.cursor = self.entries.len();
    }

    /// Step towards older entries.
    ///
    /// At the oldest entry (or with an empty history) the cursor is pinned
    /// to 1 first, so repeated presses keep recalling the oldest line.
    pub fn navigate_up(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            self.cursor = 1;
        }
        if self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step towards newer entries. Returns `None` at the newest entry and
    /// leaves the cursor where it is.
    pub fn navigate_down(&mut self) -> Option<&str> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            self.entries.get(self.cursor).map(String::as_str)
        } else {
            None
        }
    }

    /// Entries shown by the `history` command: everything but the newest
    /// line, which is the `history` invocation itself.
    pub fn list(&self) -> impl Iterator<Item = &str> + '_ {
        let shown = self.entries.len().saturating_sub(1);
        self.entries[..shown].iter().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
