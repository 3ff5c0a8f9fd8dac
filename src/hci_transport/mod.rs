//! Host Controller interface transport layer
//!
//! The transport is the driver of the physical interface between the host and controller. This
//! library only needs a way to send command packets to the controller, the driver is responsible
//! for giving every event packet it receives to [`Host::on_event`] in the order they were received.
//!
//! [`Host::on_event`]: crate::hci::host::Host::on_event

use core::fmt::{Debug, Display};

/// The outbound half of a transport
///
/// This is implemented for every `FnMut(&[u8]) -> Result<(), E>`.
pub trait Transport {
    type Error: Debug + Display;

    /// Transmit a complete HCI command packet to the controller
    ///
    /// The packet contains the opcode, parameter length and parameter. Any framing required by the
    /// interface (such as the [`HciPacketIndicator`](uart::HciPacketIndicator) for UART) must be
    /// added by the implementation.
    fn transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error>;
}

impl<F, E> Transport for F
where
    F: FnMut(&[u8]) -> Result<(), E>,
    E: Debug + Display,
{
    type Error = E;

    fn transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
        self(packet)
    }
}

/// UART interface
pub mod uart {

    /// Packet Indicator
    ///
    /// The packet indicator is used with UART to indicate the type of packet sent or received on
    /// the interface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum HciPacketIndicator {
        Command,
        AclData,
        ScoData,
        Event,
    }

    impl HciPacketIndicator {
        pub fn val(&self) -> u8 {
            match self {
                HciPacketIndicator::Command => 0x01,
                HciPacketIndicator::AclData => 0x02,
                HciPacketIndicator::ScoData => 0x03,
                HciPacketIndicator::Event => 0x04,
            }
        }

        pub fn try_from_val(val: u8) -> Result<Self, UartError> {
            match val {
                0x01 => Ok(HciPacketIndicator::Command),
                0x02 => Ok(HciPacketIndicator::AclData),
                0x03 => Ok(HciPacketIndicator::ScoData),
                0x04 => Ok(HciPacketIndicator::Event),
                _ => Err(UartError::InvalidIndicator(val)),
            }
        }
    }

    /// Remove the packet indicator from an event packet received over UART
    ///
    /// The returned slice is the HCI event packet. An error is returned if the packet is not an
    /// event.
    pub fn strip_event_indicator(packet: &[u8]) -> Result<&[u8], UartError> {
        let (indicator, event) = packet.split_first().ok_or(UartError::Empty)?;

        match HciPacketIndicator::try_from_val(*indicator)? {
            HciPacketIndicator::Event => Ok(event),
            other => Err(UartError::NotAnEvent(other)),
        }
    }

    /// A transport for a UART interface
    ///
    /// Every command packet is prefixed with the command packet indicator before it is written.
    #[cfg(feature = "std")]
    #[derive(Debug)]
    pub struct UartTransport<W> {
        writer: W,
    }

    #[cfg(feature = "std")]
    impl<W: std::io::Write> UartTransport<W> {
        pub fn new(writer: W) -> Self {
            UartTransport { writer }
        }

        pub fn get_ref(&self) -> &W {
            &self.writer
        }

        pub fn into_inner(self) -> W {
            self.writer
        }
    }

    #[cfg(feature = "std")]
    impl<W: std::io::Write> super::Transport for UartTransport<W> {
        type Error = std::io::Error;

        fn transmit(&mut self, packet: &[u8]) -> Result<(), Self::Error> {
            self.writer.write_all(&[HciPacketIndicator::Command.val()])?;

            self.writer.write_all(packet)?;

            self.writer.flush()
        }
    }

    /// Error for a UART packet
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum UartError {
        Empty,
        InvalidIndicator(u8),
        NotAnEvent(HciPacketIndicator),
    }

    impl core::fmt::Display for UartError {
        fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
            match self {
                UartError::Empty => f.write_str("empty UART packet"),
                UartError::InvalidIndicator(val) => write!(f, "invalid packet indicator {:#x}", val),
                UartError::NotAnEvent(indicator) => write!(f, "expected an event packet, found {:?}", indicator),
            }
        }
    }

    #[cfg(feature = "std")]
    impl std::error::Error for UartError {}

}
