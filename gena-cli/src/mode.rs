//! Task modes the REPL can route a query to.

use std::fmt;

/// Which answering path handles the next query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskMode {
    /// Answer from the indexed knowledge base.
    Knowledge,
    /// Free-form chat, language- and sentiment-aware, with optional images.
    Multimodal,
    /// Answer from the medical Q&A dataset.
    Medical,
    /// Answer from arXiv paper search.
    Research,
}

impl TaskMode {
    pub const ALL: [TaskMode; 4] = [
        TaskMode::Knowledge,
        TaskMode::Multimodal,
        TaskMode::Medical,
        TaskMode::Research,
    ];

    /// Parse a mode name as typed at the `/mode` command.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "knowledge" | "kb" | "rag" => Some(TaskMode::Knowledge),
            "multimodal" | "chat" => Some(TaskMode::Multimodal),
            "medical" | "med" => Some(TaskMode::Medical),
            "research" | "arxiv" => Some(TaskMode::Research),
            _ => None,
        }
    }
}

impl fmt::Display for TaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskMode::Knowledge => "knowledge",
            TaskMode::Multimodal => "multimodal",
            TaskMode::Medical => "medical",
            TaskMode::Research => "research",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!(TaskMode::parse("knowledge"), Some(TaskMode::Knowledge));
        assert_eq!(TaskMode::parse("RAG"), Some(TaskMode::Knowledge));
        assert_eq!(TaskMode::parse("chat"), Some(TaskMode::Multimodal));
        assert_eq!(TaskMode::parse(" med "), Some(TaskMode::Medical));
        assert_eq!(TaskMode::parse("arxiv"), Some(TaskMode::Research));
        assert_eq!(TaskMode::parse("unknown"), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for mode in TaskMode::ALL {
            assert_eq!(TaskMode::parse(&mode.to_string()), Some(mode));
        }
    }
}
