//! Signal — a strategy's per-bar trading decision.
//!
//! Signals are ephemeral: the simulation loop consumes each one in the same
//! step it is produced. Entry variants may carry suggested risk levels; the
//! position model validates them against the actual fill price.

use serde::{Deserialize, Serialize};

/// Side of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short. P&L = (exit - entry) * qty * sign.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

/// Trading decision emitted by a strategy for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    EnterLong {
        stop_loss: Option<f64>,
        target: Option<f64>,
    },
    EnterShort {
        stop_loss: Option<f64>,
        target: Option<f64>,
    },
    Exit,
    Hold,
}

impl Signal {
    /// Bare entry without suggested stop or target.
    pub fn enter(direction: Direction) -> Self {
        match direction {
            Direction::Long => Signal::EnterLong {
                stop_loss: None,
                target: None,
            },
            Direction::Short => Signal::EnterShort {
                stop_loss: None,
                target: None,
            },
        }
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, Signal::EnterLong { .. } | Signal::EnterShort { .. })
    }

    /// Direction of an entry signal, if this is one.
    pub fn entry_direction(&self) -> Option<Direction> {
        match self {
            Signal::EnterLong { .. } => Some(Direction::Long),
            Signal::EnterShort { .. } => Some(Direction::Short),
            _ => None,
        }
    }
}
