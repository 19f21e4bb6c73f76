//! Per-batch lifecycle.
//!
//! ```text
//! Pending --Send--> Requested --Decoded--> Parsed --Complete--> Accepted
//!                       |
//!                       +--Undecodable--> RetryRequested --Decoded--> Accepted
//!                                               |
//!                                               +--Undecodable--> Failed
//! ```
//!
//! `Abort` (transport failure or cancellation) moves any in-flight state to
//! `Failed`. `Accepted` and `Failed` are terminal.

use crate::error::GenerationError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    Pending,
    Requested,
    Parsed,
    RetryRequested,
    Accepted,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchEvent {
    /// The prompt was sent to the backend
    Send,
    /// The response decoded into records
    Decoded,
    /// The response could not be decoded
    Undecodable,
    /// Parsed records were handed on
    Complete,
    /// The backend call failed or the run was cancelled
    Abort,
}

impl BatchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Failed)
    }

    /// Apply `event`, rejecting transitions the lifecycle does not allow.
    pub fn advance(self, event: BatchEvent) -> Result<Self, GenerationError> {
        use BatchEvent::*;
        use BatchState::*;

        let next = match (self, event) {
            (Pending, Send) => Requested,
            (Requested, Decoded) => Parsed,
            (Requested, Undecodable) => RetryRequested,
            (Parsed, Complete) => Accepted,
            (RetryRequested, Decoded) => Accepted,
            (RetryRequested, Undecodable) => Failed,
            (Pending | Requested | RetryRequested, Abort) => Failed,
            (from, event) => return Err(GenerationError::InvalidTransition { from, event }),
        };
        Ok(next)
    }
}
