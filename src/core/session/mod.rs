use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How many of the most recent history entries are included when a prompt
/// is composed.
pub const RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Per-session conversation state: who the user is and everything said so
/// far. Created on the first interaction, lives until the process exits.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    username: Option<String>,
    history: Vec<Turn>,
    started_at: DateTime<Utc>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            username: None,
            history: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// First non-empty write wins. Returns false when a name was already
    /// set or the candidate is blank.
    pub fn set_username(&mut self, name: &str) -> bool {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.username.is_some() {
            return false;
        }
        self.username = Some(trimmed.to_string());
        true
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn record(&mut self, role: Role, content: impl Into<String>) {
        self.history.push(Turn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Contents of the last `n` entries regardless of role, oldest first,
    /// joined with newlines. Empty string when there is no history yet.
    pub fn recent_window(&self, n: usize) -> String {
        let start = self.history.len().saturating_sub(n);
        self.history[start..]
            .iter()
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::{Role, Session, RECENT_WINDOW};

    #[test]
    fn three_turn_pairs_leave_six_alternating_entries() {
        let mut session = Session::new();
        for i in 0..3 {
            session.record(Role::User, format!("question {i}"));
            session.record(Role::Assistant, format!("answer {i}"));
        }

        assert_eq!(session.len(), 6);
        for (index, turn) in session.history().iter().enumerate() {
            let expected = if index % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            };
            assert_eq!(turn.role, expected);
        }
        for pair in session.history().windows(2) {
            assert!(pair[0].at <= pair[1].at);
        }
    }

    #[test]
    fn username_is_set_once() {
        let mut session = Session::new();
        assert!(!session.set_username("   "));
        assert!(session.set_username("Aoi"));
        assert!(!session.set_username("Somebody Else"));
        assert_eq!(session.username(), Some("Aoi"));
    }

    #[test]
    fn recent_window_keeps_only_the_tail() {
        let mut session = Session::new();
        for i in 0..8 {
            session.record(Role::User, format!("m{i}"));
        }

        let window = session.recent_window(RECENT_WINDOW);
        assert_eq!(window, "m3\nm4\nm5\nm6\nm7");
    }

    #[test]
    fn recent_window_on_short_history_takes_everything() {
        let mut session = Session::new();
        session.record(Role::User, "hello");
        session.record(Role::Assistant, "hi");

        assert_eq!(session.recent_window(RECENT_WINDOW), "hello\nhi");
        assert_eq!(Session::new().recent_window(RECENT_WINDOW), "");
    }
}
