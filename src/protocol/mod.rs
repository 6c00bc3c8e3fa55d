//! Text command protocol.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Command Stack                          │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐ │
//! │  │ Transport│──▶│  Framer  │──▶│  Queue   │──▶│ Command │ │
//! │  │ (UART/BT)│   │ ('#')    │   │ (FIFO10) │   │ parse   │ │
//! │  └──────────┘   └──────────┘   └──────────┘   └────┬────┘ │
//! │       ▲                                            ▼      │
//! │       │                                     DewController │
//! │  ┌──────────┐   ┌───────────────┐                  │      │
//! │  │ Transport│◀──│ ResponseSink  │◀─────────────────┘      │
//! │  │ (all)    │   │ (broadcast)   │  "<code><fields>$"      │
//! │  └──────────┘   └───────────────┘                         │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod command;
pub mod frame;
pub mod queue;
pub mod response;
pub mod transport;

pub use command::Command;
pub use frame::{Frame, Framer};
pub use queue::CommandQueue;
pub use response::{Response, ResponseBuilder};
pub use transport::{NullTransport, SerialLink, Transport};
