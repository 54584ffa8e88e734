use thiserror::Error;

use crate::domain::conversation::ConversationStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid conversation transition from {from:?} to {to:?}")]
    InvalidConversationTransition { from: ConversationStatus, to: ConversationStatus },
}

#[cfg(test)]
mod tests {
    use super::DomainError;
    use crate::domain::conversation::ConversationStatus;

    #[test]
    fn transition_error_names_both_states() {
        let error = DomainError::InvalidConversationTransition {
            from: ConversationStatus::Booked,
            to: ConversationStatus::Active,
        };
        let rendered = error.to_string();
        assert!(rendered.contains("Booked"));
        assert!(rendered.contains("Active"));
    }
}
