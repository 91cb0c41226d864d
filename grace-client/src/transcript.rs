use grace_core::Turn;

/// Ordered history of one chat session.
///
/// The greeting is shown to the user but never sent to the relay, so it lives
/// apart from the exchanged turns. Turns are append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    greeting: Option<Turn>,
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            greeting: Some(Turn::assistant(greeting)),
            turns: Vec::new(),
        }
    }

    pub fn greeting(&self) -> Option<&Turn> {
        self.greeting.as_ref()
    }

    /// Exchanged turns only, exactly what the relay receives.
    pub fn outbound(&self) -> &[Turn] {
        &self.turns
    }

    /// Everything to render: greeting first, then the exchanged turns.
    pub fn display(&self) -> impl Iterator<Item = &Turn> {
        self.greeting.iter().chain(self.turns.iter())
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Number of exchanged turns (the greeting is not counted).
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub(crate) fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }
}
