//! Command and event synchronization for the host side of a Bluetooth Host Controller Interface
//!
//! This library keeps the host and the controller in step over the HCI. The host may only have one
//! command outstanding with the controller. A command is sent by a [`Host`] and it stays
//! outstanding until the controller acknowledges it with a *Command Complete* or *Command Status*
//! event. Every other event received from the controller is given to the handler registered for
//! its event code.
//!
//! ```
//! use bo_tie_hci_sync::hci::cb::reset;
//! use bo_tie_hci_sync::Host;
//!
//! let mut host = Host::new(|packet: &[u8]| -> Result<(), &'static str> {
//!     // write the packet to the controller here
//!     assert_eq!(&[0x03, 0x0C, 0x00], packet);
//!     Ok(())
//! });
//!
//! reset::send(&mut host).unwrap();
//!
//! assert!(host.outstanding().is_some());
//!
//! // command complete for the reset command
//! host.on_event(&[0x0E, 0x04, 0x01, 0x03, 0x0C, 0x00]).unwrap();
//!
//! assert!(host.outstanding().is_none());
//! ```
//!
//! # Features
//! * `std` (default): implementations of `std::error::Error`, the [`SharedHost`] and the UART
//!   transport. Without it this library is `no_std` but still requires `alloc`.
//! * `serde`: serialization of opcodes
//!
//! [`SharedHost`]: hci::host::SharedHost

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod hci;
pub mod hci_transport;

pub use hci::dispatch::{
    AcknowledgementHandler, DispatchError, EventDispatcher, EventHandler, RegisterError, RoutedEvent,
};
pub use hci::events::{decode, DecodeError, DecodedEvent, Events};
#[cfg(feature = "std")]
pub use hci::host::SharedHost;
pub use hci::host::{Host, IssueError};
pub use hci::opcodes::{Opcode, NOP};
pub use hci::tracker::{BeginError, CommandTracker, ResolveError};
pub use hci_transport::Transport;
