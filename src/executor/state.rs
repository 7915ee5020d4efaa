//! Operation state machine.
//!
//! # States
//! - Ready: submitted, waiting for a worker
//! - Executing: attempts in progress
//! - Succeeded / Failed / Cancelled: terminal, mutually exclusive
//!
//! # State Transitions
//! ```text
//! Ready → Executing: worker permit acquired
//! Executing → Succeeded | Failed: executor returned
//! Ready | Executing → Cancelled: cancel() called
//! ```
//!
//! Transitions are compare-and-swap, so exactly one of "deliver a result" and
//! "cancel" wins a race.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of one logical call.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Ready = 0,
    Executing = 1,
    Succeeded = 2,
    Failed = 3,
    Cancelled = 4,
}

impl From<u8> for OperationState {
    fn from(val: u8) -> Self {
        match val {
            0 => OperationState::Ready,
            1 => OperationState::Executing,
            2 => OperationState::Succeeded,
            3 => OperationState::Failed,
            _ => OperationState::Cancelled,
        }
    }
}

impl OperationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationState::Succeeded | OperationState::Failed | OperationState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::Ready => "ready",
            OperationState::Executing => "executing",
            OperationState::Succeeded => "succeeded",
            OperationState::Failed => "failed",
            OperationState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic holder of an [`OperationState`].
#[derive(Debug)]
pub struct StateCell {
    state: AtomicU8,
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(OperationState::Ready as u8),
        }
    }

    pub fn get(&self) -> OperationState {
        OperationState::from(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: OperationState, to: OperationState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Ready → Executing.
    pub fn start(&self) -> bool {
        self.transition(OperationState::Ready, OperationState::Executing)
    }

    /// Executing → Succeeded/Failed. False means the result must be dropped.
    pub fn complete(&self, succeeded: bool) -> bool {
        let to = if succeeded {
            OperationState::Succeeded
        } else {
            OperationState::Failed
        };
        self.transition(OperationState::Executing, to)
    }

    /// Move any non-terminal state to Cancelled. False if already terminal.
    pub fn cancel(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if OperationState::from(current).is_terminal() {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                OperationState::Cancelled as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}
