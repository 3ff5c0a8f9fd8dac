//! The host of a HCI session
//!
//! A [`Host`] is the owner of everything needed by a host for communicating with the controller.
//! It contains the transport used for sending commands and the [`EventDispatcher`] for processing
//! the events sent from the controller.
//!
//! # Flow Control
//! Only one command can be outstanding with the controller at a time. Sending a command while
//! another command is awaiting its acknowledgement fails with [`IssueError::Busy`]. There is no
//! queue of commands within the host, the caller is responsible for resending the command once the
//! outstanding command is acknowledged.
//!
//! There is no timeout for an outstanding command. If the controller never acknowledges the
//! command the host will stay busy until [`reset`](Host::reset) is called.
//!
//! # Concurrency
//! The methods of a `Host` take a mutable reference, so all commands and events for a host are
//! processed within the same context. A [`SharedHost`] can be used when commands are sent from
//! multiple threads.

use crate::hci::dispatch::{AcknowledgementHandler, DispatchError, EventDispatcher, EventHandler, RegisterError};
use crate::hci::opcodes::Opcode;
use crate::hci::tracker::BeginError;
use crate::hci::{write_command_packet, CommandParameter, MAX_COMMAND_PARAMETER_SIZE};
use crate::hci_transport::Transport;
use alloc::boxed::Box;
use alloc::vec::Vec;

/// The host of a HCI session
///
/// There should be one `Host` for every controller.
pub struct Host<T> {
    transport: T,
    dispatcher: EventDispatcher,
    packet: Vec<u8>,
}

impl<T> Host<T>
where
    T: Transport,
{
    /// Create a new `Host`
    pub fn new(transport: T) -> Self {
        Host {
            transport,
            dispatcher: EventDispatcher::new(),
            packet: Vec::new(),
        }
    }

    /// Send a command to the controller
    ///
    /// The command is created from the raw `opcode` and the `parameter` of the command. Once the
    /// command is transmitted it becomes the outstanding command of the host. A command with the
    /// NOP opcode is transmitted but it is never outstanding.
    ///
    /// # Error
    /// * [`Busy`](IssueError::Busy) is returned if there is already an outstanding command.
    /// * [`ParameterTooLarge`](IssueError::ParameterTooLarge) is returned if the parameter is
    ///   larger than 255 bytes.
    /// * [`TransportFailure`](IssueError::TransportFailure) is returned if the transport failed to
    ///   transmit the command. The command is not outstanding when this occurs so the command can
    ///   be resent.
    pub fn send(&mut self, opcode: u16, parameter: &[u8]) -> Result<(), IssueError<T::Error>> {
        if let Some(outstanding) = self.dispatcher.tracker().outstanding() {
            return Err(IssueError::Busy { outstanding });
        }

        if parameter.len() > MAX_COMMAND_PARAMETER_SIZE {
            return Err(IssueError::ParameterTooLarge(parameter.len()));
        }

        match Opcode::new(opcode) {
            Some(opcode) => log::info!("(HCI) sending command {}", opcode),
            None => log::info!("(HCI) sending NOP"),
        }

        write_command_packet(&mut self.packet, opcode, parameter);

        self.transmit_packet(opcode)
    }

    /// Send a command from its `CommandParameter`
    ///
    /// This is the same as [`send`](Host::send) except the opcode and parameter are acquired from
    /// `parameter`.
    pub fn send_command<P, const PARAMETER_SIZE: usize>(&mut self, parameter: &P) -> Result<(), IssueError<T::Error>>
    where
        P: CommandParameter<PARAMETER_SIZE>,
    {
        if let Some(outstanding) = self.dispatcher.tracker().outstanding() {
            return Err(IssueError::Busy { outstanding });
        }

        if PARAMETER_SIZE > MAX_COMMAND_PARAMETER_SIZE {
            return Err(IssueError::ParameterTooLarge(PARAMETER_SIZE));
        }

        log::info!(r#"(HCI) sending command "{}""#, P::COMMAND);

        parameter.as_command_packet(&mut self.packet);

        self.transmit_packet(P::COMMAND.into_opcode())
    }

    fn transmit_packet(&mut self, opcode: u16) -> Result<(), IssueError<T::Error>> {
        let tracked = Opcode::new(opcode);

        self.transport
            .transmit(&self.packet)
            .map_err(IssueError::TransportFailure)?;

        self.dispatcher
            .tracker_mut()
            .begin(tracked)
            .map_err(|BeginError { outstanding }| IssueError::Busy { outstanding })
    }
}

impl<T> Host<T> {
    /// Process an event packet received from the controller
    ///
    /// See [`EventDispatcher::on_event`].
    pub fn on_event(&mut self, buffer: &[u8]) -> Result<(), DispatchError> {
        self.dispatcher.on_event(buffer)
    }

    /// Register a handler for an event code
    ///
    /// See [`EventDispatcher::register_handler`].
    pub fn register_handler<H>(
        &mut self,
        event_code: u8,
        handler: H,
    ) -> Result<Option<Box<dyn EventHandler>>, RegisterError>
    where
        H: EventHandler + 'static,
    {
        self.dispatcher.register_handler(event_code, handler)
    }

    /// Remove the handler for an event code
    pub fn unregister_handler(&mut self, event_code: u8) -> Option<Box<dyn EventHandler>> {
        self.dispatcher.unregister_handler(event_code)
    }

    /// Set the handler for matched command acknowledgements
    ///
    /// See [`EventDispatcher::set_acknowledgement_handler`].
    pub fn set_acknowledgement_handler<H>(&mut self, handler: H) -> Option<Box<dyn AcknowledgementHandler>>
    where
        H: AcknowledgementHandler + 'static,
    {
        self.dispatcher.set_acknowledgement_handler(handler)
    }

    /// Get the outstanding command
    pub fn outstanding(&self) -> Option<Opcode> {
        self.dispatcher.tracker().outstanding()
    }

    /// Get the number of command credits last reported by the controller
    pub fn command_credits(&self) -> u8 {
        self.dispatcher.tracker().command_credits()
    }

    /// Reset the command tracking of the host
    ///
    /// This drops the outstanding command. It should only be used when the controller is reset or
    /// when the caller gives up waiting on an acknowledgement. The dropped command is returned.
    pub fn reset(&mut self) -> Option<Opcode> {
        let dropped = self.dispatcher.tracker_mut().clear();

        if let Some(opcode) = dropped {
            log::warn!("(HCI) dropped outstanding command {}", opcode);
        }

        dropped
    }

    /// Get the event dispatcher
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    /// Get the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T> core::fmt::Debug for Host<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Host").field("dispatcher", &self.dispatcher).finish()
    }
}

/// Error returned when sending a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueError<E> {
    /// A command is already outstanding with the controller
    Busy { outstanding: Opcode },
    /// The parameter is too large for a command packet
    ParameterTooLarge(usize),
    /// The transport failed to transmit the command
    TransportFailure(E),
}

impl<E> core::fmt::Display for IssueError<E>
where
    E: core::fmt::Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            IssueError::Busy { outstanding } => write!(f, "host is busy, command {} is outstanding", outstanding),
            IssueError::ParameterTooLarge(len) => write!(
                f,
                "command parameter of {} bytes is larger than the maximum of {} bytes",
                len, MAX_COMMAND_PARAMETER_SIZE
            ),
            IssueError::TransportFailure(e) => write!(f, "transport failure, {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E> std::error::Error for IssueError<E> where E: core::fmt::Debug + core::fmt::Display {}

/// A host shared between threads
///
/// This is a [`Host`] behind a mutex, checking for an outstanding command and beginning the next
/// command is done under the same lock as resolving a command from an event. Event handlers are
/// never run with the lock held.
#[cfg(feature = "std")]
pub struct SharedHost<T> {
    host: std::sync::Mutex<Host<T>>,
}

#[cfg(feature = "std")]
impl<T> SharedHost<T>
where
    T: Transport,
{
    /// Create a new `SharedHost`
    pub fn new(transport: T) -> Self {
        SharedHost::from(Host::new(transport))
    }

    /// See [`Host::send`]
    pub fn send(&self, opcode: u16, parameter: &[u8]) -> Result<(), IssueError<T::Error>> {
        self.lock().send(opcode, parameter)
    }

    /// See [`Host::send_command`]
    pub fn send_command<P, const PARAMETER_SIZE: usize>(&self, parameter: &P) -> Result<(), IssueError<T::Error>>
    where
        P: CommandParameter<PARAMETER_SIZE>,
    {
        self.lock().send_command(parameter)
    }
}

#[cfg(feature = "std")]
impl<T> SharedHost<T> {
    /// Lock the host
    ///
    /// A poisoned lock is recovered, the host is always in a valid state between method calls.
    pub fn lock(&self) -> std::sync::MutexGuard<'_, Host<T>> {
        self.host.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Process an event packet received from the controller
    ///
    /// The event is routed while the host is locked, but the handler is run after the lock is
    /// released. A handler may call back into this `SharedHost`, such as sending the next command
    /// from the acknowledgement handler. See [`EventDispatcher::route`] for what happens to events
    /// received while their handler is running.
    pub fn on_event(&self, buffer: &[u8]) -> Result<(), DispatchError> {
        let routed = self.lock().dispatcher.route(buffer)?;

        if let Some(mut routed) = routed {
            routed.run();

            self.lock().dispatcher.restore(routed);
        }

        Ok(())
    }

    /// See [`Host::register_handler`]
    pub fn register_handler<H>(&self, event_code: u8, handler: H) -> Result<Option<Box<dyn EventHandler>>, RegisterError>
    where
        H: EventHandler + 'static,
    {
        self.lock().register_handler(event_code, handler)
    }

    /// See [`Host::outstanding`]
    pub fn outstanding(&self) -> Option<Opcode> {
        self.lock().outstanding()
    }

    /// See [`Host::reset`]
    pub fn reset(&self) -> Option<Opcode> {
        self.lock().reset()
    }

    /// Consume the `SharedHost` returning the inner `Host`
    pub fn into_inner(self) -> Host<T> {
        self.host.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(feature = "std")]
impl<T> From<Host<T>> for SharedHost<T> {
    fn from(host: Host<T>) -> Self {
        SharedHost {
            host: std::sync::Mutex::new(host),
        }
    }
}
