//! The Host Controller Interface (HCI)
//!
//! The HCI is the primary way of interacting with the controller for this library. Commands are
//! sent to the controller by a [`Host`] and the controller acknowledges them with either a
//! *Command Complete* or *Command Status* event. The host allows for only one command to be
//! outstanding with the controller at a time, a command must be acknowledged by the controller
//! before the next command can be sent.
//!
//! Commands are organized by modules in the form of `bo_tie_hci_sync::hci::*command_group*::*command*`.
//!
//! [`Host`]: host::Host

pub mod cb;
pub mod common;
pub mod dispatch;
pub mod events;
pub mod host;
pub mod le;
pub mod link_control;
pub mod opcodes;
pub mod tracker;

use alloc::vec::Vec;

/// The size of the header of a HCI command packet
pub const COMMAND_HEADER_SIZE: usize = 3;

/// The maximum size of the parameter of a HCI command packet
pub const MAX_COMMAND_PARAMETER_SIZE: usize = u8::MAX as usize;

/// Used to get the information required for sending a command from the host to the controller
///
/// The constant `PARAMETER_SIZE` is the size of the command's parameter.
pub trait CommandParameter<const PARAMETER_SIZE: usize> {
    /// The command to send to the Bluetooth Controller.
    ///
    /// This is the OGF & OCF pair.
    const COMMAND: opcodes::HciCommand;

    /// Convert Self into the parameter form
    ///
    /// The returned parameter is the structure defined as the parameter part of the command packet
    /// for the specific HCI command.
    fn get_parameter(&self) -> [u8; PARAMETER_SIZE];

    /// Get the command packet to be sent to the controller
    ///
    /// The format of the command packet is to send the command opcode, followed by the length of
    /// the parameter, and then finally the parameter.
    ///
    /// # Note
    /// HCI packets do not contain information on the type of packet that they are. The interface
    /// driver may need to wrap the packet (see [`HciPacketIndicator`]).
    ///
    /// [`HciPacketIndicator`]: crate::hci_transport::uart::HciPacketIndicator
    fn as_command_packet(&self, buffer: &mut Vec<u8>) {
        write_command_packet(buffer, Self::COMMAND.into_opcode(), &self.get_parameter())
    }
}

/// Write a HCI command packet to `buffer`
///
/// `buffer` is cleared before the packet is written.
///
/// # Panic
/// The length of `parameter` cannot be larger than [`MAX_COMMAND_PARAMETER_SIZE`].
pub(crate) fn write_command_packet(buffer: &mut Vec<u8>, opcode: u16, parameter: &[u8]) {
    assert!(parameter.len() <= MAX_COMMAND_PARAMETER_SIZE);

    buffer.clear();

    buffer.reserve(COMMAND_HEADER_SIZE + parameter.len());

    buffer.extend_from_slice(&opcode.to_le_bytes());

    buffer.push(parameter.len() as u8);

    buffer.extend_from_slice(parameter);
}
