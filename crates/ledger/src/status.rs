use serde::{Deserialize, Serialize};

use stockledger_core::{DomainError, DomainResult, TransactionId};

/// Transaction status life cycle.
///
/// ```text
/// PENDING ──commit──▶ COMMITTED (terminal)
///    │
///    └──void──▶ VOIDED (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Committed,
    Voided,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Committed => "COMMITTED",
            TransactionStatus::Voided => "VOIDED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Check that `self -> to` is an allowed transition for transaction `id`.
    pub fn ensure_transition(self, id: TransactionId, to: TransactionStatus) -> DomainResult<()> {
        match (self, to) {
            (TransactionStatus::Pending, TransactionStatus::Committed)
            | (TransactionStatus::Pending, TransactionStatus::Voided) => Ok(()),
            (from, to) => Err(DomainError::InvalidTransition {
                id,
                from: from.as_str(),
                to: to.as_str(),
            }),
        }
    }
}

impl core::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(TransactionStatus::Pending),
            "COMMITTED" => Ok(TransactionStatus::Committed),
            "VOIDED" => Ok(TransactionStatus::Voided),
            _ => Err(DomainError::validation(
                "status",
                "status must be one of: PENDING, COMMITTED, VOIDED",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransactionStatus::*;

    const ALL: [TransactionStatus; 3] = [Pending, Committed, Voided];

    #[test]
    fn only_pending_has_outgoing_transitions() {
        let id = TransactionId::new(1);
        for from in ALL {
            for to in ALL {
                let allowed = from == Pending && to != Pending;
                assert_eq!(
                    from.ensure_transition(id, to).is_ok(),
                    allowed,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn rejected_transition_names_both_states() {
        let err = Committed
            .ensure_transition(TransactionId::new(9), Voided)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                id: TransactionId::new(9),
                from: "COMMITTED",
                to: "VOIDED",
            }
        );
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("committed".parse::<TransactionStatus>().unwrap(), Committed);
        assert!("shipped".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(!Pending.is_terminal());
        assert!(Committed.is_terminal());
        assert!(Voided.is_terminal());
    }
}
