//! The last-error channel.

/// Holds the session's last-error string.
///
/// A message written through [`set`](Self::set) may carry a
/// composition prefix: `+` appends to the current message, `-`
/// prepends, `=` replaces. An unprefixed message replaces.
#[derive(Debug, Default)]
pub struct ErrorChannel {
    last: String,
}

impl ErrorChannel {
    /// Creates an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a message, honoring its composition prefix.
    pub fn set(&mut self, message: &str) {
        match message.as_bytes().first() {
            Some(b'+') => {
                let rest = &message[1..];
                if self.last.is_empty() {
                    self.last = rest.to_string();
                } else if !rest.is_empty() {
                    self.last = format!("{}\n{rest}", self.last);
                }
            }
            Some(b'-') => {
                let rest = &message[1..];
                if self.last.is_empty() {
                    self.last = rest.to_string();
                } else if !rest.is_empty() {
                    self.last = format!("{rest}\n{}", self.last);
                }
            }
            Some(b'=') => self.last = message[1..].to_string(),
            _ => self.last = message.to_string(),
        }
    }

    /// The current message.
    #[must_use]
    pub fn last(&self) -> &str {
        &self.last
    }

    /// True if no message is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.last.is_empty()
    }

    /// Clears the channel.
    pub fn clear(&mut self) {
        self.last.clear();
    }
}
