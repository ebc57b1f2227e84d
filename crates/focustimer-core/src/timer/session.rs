use serde::{Deserialize, Serialize};

/// Kind of timed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionKind {
    Focus,
    Break,
    LongBreak,
}

impl SessionKind {
    pub const ALL: [SessionKind; 3] = [SessionKind::Focus, SessionKind::Break, SessionKind::LongBreak];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Focus => "focus",
            SessionKind::Break => "break",
            SessionKind::LongBreak => "longBreak",
        }
    }

    /// Parse a session kind, accepting the camelCase wire name as well as
    /// the snake/kebab spellings used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "focus" => Some(SessionKind::Focus),
            "break" | "short_break" | "short-break" => Some(SessionKind::Break),
            "longbreak" | "long_break" | "long-break" => Some(SessionKind::LongBreak),
            _ => None,
        }
    }

    pub fn is_break(&self) -> bool {
        !matches!(self, SessionKind::Focus)
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            SessionKind::Focus => "Focus Session",
            SessionKind::Break => "Break Time",
            SessionKind::LongBreak => "Long Break",
        }
    }

    /// Title of the notification announcing this session's completion.
    pub fn completion_title(&self) -> String {
        let label = match self {
            SessionKind::Focus => "Focus",
            SessionKind::Break => "Break",
            SessionKind::LongBreak => "Long Break",
        };
        format!("{label} Complete!")
    }

    /// Body of the completion notification; tells the user what comes next.
    pub fn completion_body(&self) -> &'static str {
        match self {
            SessionKind::Focus => "Break time!",
            SessionKind::Break | SessionKind::LongBreak => "Focus time!",
        }
    }
}

impl Default for SessionKind {
    fn default() -> Self {
        SessionKind::Focus
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
