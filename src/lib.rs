#![no_std]
//! Physical-layer driver for Infineon OPTIGA Trust secure elements.
//!
//! The OPTIGA host protocol is layered: an application/command layer on top,
//! a data-link layer that frames and CRC-protects payloads, and at the bottom
//! the physical layer this crate implements — register-oriented I2C access to
//! the chip, power and reset sequencing, and a single-outstanding-operation
//! transfer engine that reports completion through an event callback.
//!
//! - At most one operation (send or receive) is in flight per [`OptigaPhy`].
//!   Requests issued while busy fail fast with [`Error::Busy`], producing no
//!   bus traffic and no event.
//! - [`OptigaPhy::send_frame`] and [`OptigaPhy::receive_frame`] deliver their
//!   outcome through the [`FrameEventHandler`] registered with
//!   [`OptigaPhy::init`], exactly once per accepted request, after the link
//!   has returned to idle. A handler may queue the next request immediately.
//! - The chip signals "request received, response not ready" by NACKing its
//!   address or by reporting BUSY in the `I2C_STATE` register. The receive
//!   path treats this as a bounded retry condition with capped backoff rather
//!   than an error; everything else is surfaced once and never retried here.
//!
//! The bus, delay source and the Vdd/Reset pins are injected at construction
//! (`embedded-hal-async` `I2c`/`DelayNs`, `embedded-hal` `OutputPin`) and are
//! exclusively owned by the driver for its lifetime.

mod config;
mod error;
mod event;
mod phy;
mod power;
pub mod registers;

pub use config::Config;
pub use error::{Error, TransferError};
pub use event::{Event, FrameEventHandler};
pub use phy::{AddressStorage, OptigaPhy};

/// Largest frame the physical layer will produce: the maximum data register
/// length (0x110) plus the 5-byte data-link envelope.
pub const MAX_FRAME_SIZE: usize = 0x115;
