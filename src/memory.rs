//! Conversation memory.
//!
//! The full log is kept for the session; only the most recent turns are
//! rendered into a prompt.

use crate::models::{ConversationTurn, Role};

/// Rendered in place of history before the first exchange.
pub const NO_HISTORY: &str = "No previous conversation.";

#[derive(Debug, Clone)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
    assistant_label: String,
}

impl ConversationMemory {
    /// `assistant_label` is how assistant turns are labelled when rendered,
    /// normally the persona's name.
    pub fn new(assistant_label: impl Into<String>) -> Self {
        Self {
            turns: Vec::new(),
            assistant_label: assistant_label.into(),
        }
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Append one user/assistant pair, in that order.
    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ConversationTurn::user(question));
        self.turns.push(ConversationTurn::assistant(answer));
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// The last `limit` turns as `"{label}: {content}"` lines.
    pub fn render(&self, limit: usize) -> String {
        render_turns(&self.turns, limit, &self.assistant_label)
    }
}

/// Render the last `limit` of `turns`, or [`NO_HISTORY`] when there are none.
pub fn render_turns(turns: &[ConversationTurn], limit: usize, assistant_label: &str) -> String {
    if turns.is_empty() || limit == 0 {
        return NO_HISTORY.to_string();
    }
    let start = turns.len().saturating_sub(limit);
    turns[start..]
        .iter()
        .map(|turn| {
            let label = match turn.role {
                Role::User => "Human",
                Role::Assistant => assistant_label,
            };
            format!("{}: {}", label, turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_memory_renders_sentinel() {
        let memory = ConversationMemory::new("Yanga");
        assert_eq!(memory.render(6), NO_HISTORY);
    }

    #[test]
    fn renders_labels_in_order() {
        let mut memory = ConversationMemory::new("Yanga");
        memory.push_exchange("Hi", "Hello there");
        assert_eq!(memory.render(6), "Human: Hi\nYanga: Hello there");
    }

    #[test]
    fn keeps_only_the_last_turns_when_rendering() {
        let mut memory = ConversationMemory::new("Yanga");
        for i in 0..5 {
            memory.push_exchange(format!("q{}", i), format!("a{}", i));
        }
        let rendered = memory.render(6);
        assert_eq!(rendered.lines().count(), 6);
        assert!(rendered.starts_with("Human: q2"));
        assert!(rendered.ends_with("Yanga: a4"));
        assert_eq!(memory.len(), 10);
    }

    #[test]
    fn clear_resets_to_sentinel() {
        let mut memory = ConversationMemory::new("Sam");
        memory.push(ConversationTurn::user("Hi"));
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.render(6), NO_HISTORY);
    }
}
