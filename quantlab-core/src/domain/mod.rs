//! Domain types for quantlab.

pub mod bar;
pub mod equity;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::Bar;
pub use equity::EquityPoint;
pub use position::Position;
pub use signal::{Direction, Signal};
pub use trade::{ExitReason, Trade};
