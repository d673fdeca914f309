//! Quote status lifecycle.
//!
//! The progression is one-directional with a single side exit:
//!
//! ```text
//! draft → sent → accepted → in_progress → completed → paid
//!           └──→ rejected
//! ```
//!
//! `paid` and `rejected` are terminal. There are no other edges.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Rejected,
    InProgress,
    Completed,
    Paid,
}

impl QuoteStatus {
    /// The next status on the forward chain, or `None` from a terminal state.
    pub fn next(self) -> Option<QuoteStatus> {
        match self {
            QuoteStatus::Draft => Some(QuoteStatus::Sent),
            QuoteStatus::Sent => Some(QuoteStatus::Accepted),
            QuoteStatus::Accepted => Some(QuoteStatus::InProgress),
            QuoteStatus::InProgress => Some(QuoteStatus::Completed),
            QuoteStatus::Completed => Some(QuoteStatus::Paid),
            QuoteStatus::Paid | QuoteStatus::Rejected => None,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, QuoteStatus::Paid | QuoteStatus::Rejected)
    }

    /// Rejection is only a legal exit from `sent`.
    pub fn can_reject(self) -> bool {
        matches!(self, QuoteStatus::Sent)
    }

    /// Whether quote contents (lines, adjustments) may still be edited.
    pub fn is_editable(self) -> bool {
        matches!(self, QuoteStatus::Draft)
    }
}
