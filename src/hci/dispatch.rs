//! Routing of events received from the controller
//!
//! Every event packet received from the controller is given to [`EventDispatcher::on_event`] in
//! the order it was received. *Command Complete* and *Command Status* events resolve the
//! outstanding command of the [`CommandTracker`], every other event is given to the handler
//! registered for its event code.
//!
//! Events without a registered handler are dropped. This is not an error as the upper layers may
//! not have registered for the event yet.

use crate::hci::events::{self, DecodeError, DecodedEvent, Events};
use crate::hci::opcodes::Opcode;
use crate::hci::tracker::{CommandTracker, ResolveError};
use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet};

/// A handler of events that are not command acknowledgements
///
/// This is implemented for every `FnMut(u8, &[u8]) + Send`, so a closure can be used as a
/// handler. Input `payload` is the parameters of the event.
pub trait EventHandler: Send {
    fn handle(&mut self, event_code: u8, payload: &[u8]);
}

impl<F> EventHandler for F
where
    F: FnMut(u8, &[u8]) + Send,
{
    fn handle(&mut self, event_code: u8, payload: &[u8]) {
        self(event_code, payload)
    }
}

/// A handler of matched command acknowledgements
///
/// This is called with the *Command Complete* or *Command Status* event after it successfully
/// resolved the outstanding command. It is never called for acknowledgements containing the NOP
/// opcode or for acknowledgements that do not match.
pub trait AcknowledgementHandler: Send {
    fn acknowledged(&mut self, opcode: Opcode, event: &DecodedEvent<'_>);
}

impl<F> AcknowledgementHandler for F
where
    F: FnMut(Opcode, &DecodedEvent<'_>) + Send,
{
    fn acknowledged(&mut self, opcode: Opcode, event: &DecodedEvent<'_>) {
        self(opcode, event)
    }
}

/// Dispatcher of events received from the controller
///
/// The dispatcher owns the [`CommandTracker`] of the host session.
pub struct EventDispatcher {
    tracker: CommandTracker,
    handlers: BTreeMap<u8, Box<dyn EventHandler>>,
    acknowledgement_handler: Option<Box<dyn AcknowledgementHandler>>,
    routed_handlers: BTreeSet<u8>,
    routed_acknowledgement_handler: bool,
}

impl EventDispatcher {
    /// Create a new `EventDispatcher`
    ///
    /// The dispatcher is created with no outstanding command and no handlers.
    pub fn new() -> Self {
        EventDispatcher {
            tracker: CommandTracker::new(),
            handlers: BTreeMap::new(),
            acknowledgement_handler: None,
            routed_handlers: BTreeSet::new(),
            routed_acknowledgement_handler: false,
        }
    }

    /// Get the command tracker
    pub fn tracker(&self) -> &CommandTracker {
        &self.tracker
    }

    /// Get a mutable reference to the command tracker
    pub fn tracker_mut(&mut self) -> &mut CommandTracker {
        &mut self.tracker
    }

    /// Register a handler for an event code
    ///
    /// The previous handler for `event_code` is returned if there was one. Handlers cannot be
    /// registered for the *Command Complete* or *Command Status* events (see
    /// [`set_acknowledgement_handler`]) or for an event code that is not supported.
    ///
    /// [`set_acknowledgement_handler`]: EventDispatcher::set_acknowledgement_handler
    pub fn register_handler<H>(
        &mut self,
        event_code: u8,
        handler: H,
    ) -> Result<Option<Box<dyn EventHandler>>, RegisterError>
    where
        H: EventHandler + 'static,
    {
        let event = Events::try_from_event_code(event_code)
            .map_err(|_| RegisterError::UnsupportedEventCode(event_code))?;

        if event.is_command_acknowledgement() {
            return Err(RegisterError::ReservedEventCode(event));
        }

        log::debug!("(HCI) registered handler for event {}", event);

        self.routed_handlers.remove(&event_code);

        Ok(self.handlers.insert(event_code, Box::new(handler)))
    }

    /// Remove the handler for an event code
    pub fn unregister_handler(&mut self, event_code: u8) -> Option<Box<dyn EventHandler>> {
        self.routed_handlers.remove(&event_code);

        self.handlers.remove(&event_code)
    }

    /// Set the handler for matched command acknowledgements
    ///
    /// The previous handler is returned.
    pub fn set_acknowledgement_handler<H>(&mut self, handler: H) -> Option<Box<dyn AcknowledgementHandler>>
    where
        H: AcknowledgementHandler + 'static,
    {
        self.routed_acknowledgement_handler = false;

        self.acknowledgement_handler.replace(Box::new(handler))
    }

    /// Process an event packet received from the controller
    ///
    /// This must be called once per event packet in the order they were received. This is the
    /// same as calling [`route`](EventDispatcher::route), running the returned [`RoutedEvent`],
    /// and then giving it back to [`restore`](EventDispatcher::restore).
    pub fn on_event(&mut self, buffer: &[u8]) -> Result<(), DispatchError> {
        if let Some(mut routed) = self.route(buffer)? {
            routed.run();

            self.restore(routed);
        }

        Ok(())
    }

    /// Route an event packet without running a handler
    ///
    /// Acknowledgements are resolved against the command tracker here. The handler the event is
    /// for is taken out of the dispatcher and returned within a `RoutedEvent`, so it can be run
    /// after any lock around the dispatcher is released. `None` is returned when there is no
    /// handler for the event.
    ///
    /// While a handler is taken it does not receive events, an event for it is dropped. The
    /// handler is put back by [`restore`](EventDispatcher::restore) unless a handler for the same
    /// event was registered or unregistered in the meantime.
    pub fn route<'a>(&mut self, buffer: &'a [u8]) -> Result<Option<RoutedEvent<'a>>, DispatchError> {
        let event = events::decode(buffer)?;

        match event {
            DecodedEvent::CommandComplete {
                opcode,
                num_commands_allowed,
                ..
            } => self.acknowledge(opcode, num_commands_allowed, event),
            DecodedEvent::CommandStatus {
                status,
                opcode,
                num_commands_allowed,
            } => {
                if status != 0 {
                    log::debug!("(HCI) command status {:#x} received", status);
                }

                self.acknowledge(opcode, num_commands_allowed, event)
            }
            DecodedEvent::Other { event_code, payload } => match self.handlers.remove(&event_code) {
                Some(handler) => {
                    self.routed_handlers.insert(event_code);

                    Ok(Some(RoutedEvent {
                        target: Target::Event {
                            event_code,
                            payload,
                            handler,
                        },
                    }))
                }
                None => {
                    log::trace!("(HCI) no handler for event code {:#x}, event dropped", event_code);

                    Ok(None)
                }
            },
        }
    }

    /// Put back the handler taken by [`route`](EventDispatcher::route)
    pub fn restore(&mut self, routed: RoutedEvent<'_>) {
        match routed.target {
            Target::Event {
                event_code, handler, ..
            } => {
                if self.routed_handlers.remove(&event_code) {
                    self.handlers.insert(event_code, handler);
                }
            }
            Target::Acknowledgement { handler, .. } => {
                if core::mem::take(&mut self.routed_acknowledgement_handler) {
                    self.acknowledgement_handler = Some(handler);
                }
            }
        }
    }

    fn acknowledge<'a>(
        &mut self,
        opcode: Option<Opcode>,
        num_commands_allowed: u8,
        event: DecodedEvent<'a>,
    ) -> Result<Option<RoutedEvent<'a>>, DispatchError> {
        if num_commands_allowed != self.tracker.command_credits() {
            log::debug!("(HCI) controller command credits: {}", num_commands_allowed);
        }

        self.tracker.set_command_credits(num_commands_allowed);

        let Some(opcode) = opcode else {
            log::trace!("(HCI) NOP acknowledgement received");

            return Ok(None);
        };

        if let Err(ResolveError { received, outstanding }) = self.tracker.resolve(Some(opcode)) {
            log::warn!("(HCI) unmatched acknowledgement for command {}", received);

            return Err(DispatchError::NoSuchOutstandingCommand { received, outstanding });
        }

        log::debug!("(HCI) command {} acknowledged", opcode);

        let routed = self.acknowledgement_handler.take().map(|handler| RoutedEvent {
            target: Target::Acknowledgement { opcode, event, handler },
        });

        if routed.is_some() {
            self.routed_acknowledgement_handler = true;
        }

        Ok(routed)
    }
}

/// An event with the handler it was routed to
///
/// This is returned by [`EventDispatcher::route`].
pub struct RoutedEvent<'a> {
    target: Target<'a>,
}

enum Target<'a> {
    Event {
        event_code: u8,
        payload: &'a [u8],
        handler: Box<dyn EventHandler>,
    },
    Acknowledgement {
        opcode: Opcode,
        event: DecodedEvent<'a>,
        handler: Box<dyn AcknowledgementHandler>,
    },
}

impl RoutedEvent<'_> {
    /// Run the handler with the event
    pub fn run(&mut self) {
        match &mut self.target {
            Target::Event {
                event_code,
                payload,
                handler,
            } => handler.handle(*event_code, payload),
            Target::Acknowledgement { opcode, event, handler } => handler.acknowledged(*opcode, event),
        }
    }

    /// Get the event code of the routed event
    pub fn get_event_code(&self) -> u8 {
        match &self.target {
            Target::Event { event_code, .. } => *event_code,
            Target::Acknowledgement { event, .. } => event.get_event_code(),
        }
    }
}

impl core::fmt::Debug for RoutedEvent<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("RoutedEvent")
            .field("event_code", &self.get_event_code())
            .finish()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        EventDispatcher::new()
    }
}

impl core::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("tracker", &self.tracker)
            .field("handlers", &self.handlers.keys())
            .field("acknowledgement_handler", &self.acknowledgement_handler.is_some())
            .finish()
    }
}

/// Error returned by [`EventDispatcher::on_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// The event code is not supported
    NotSupported(u8),
    /// The event packet is malformed
    Malformed(DecodeError),
    /// The acknowledgement is for a command that is not outstanding
    NoSuchOutstandingCommand {
        received: Opcode,
        outstanding: Option<Opcode>,
    },
}

impl DispatchError {
    /// Try to resolve the error by logging
    ///
    /// An unsupported event or an acknowledgement without a matching command does not mean the
    /// link to the controller is in a bad state, these errors are logged and `Ok` is returned. A
    /// malformed packet is returned as an error.
    pub fn try_log(self) -> Result<(), Self> {
        match self {
            DispatchError::NotSupported(code) => {
                log::error!("(HCI) received unsupported event code {:#x}", code);

                Ok(())
            }
            DispatchError::NoSuchOutstandingCommand { received, .. } => {
                log::error!("(HCI) received acknowledgement for command {} that was not sent", received);

                Ok(())
            }
            e @ DispatchError::Malformed(_) => Err(e),
        }
    }
}

impl From<DecodeError> for DispatchError {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::UnsupportedEventCode(code) => DispatchError::NotSupported(code),
            e => DispatchError::Malformed(e),
        }
    }
}

impl core::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            DispatchError::NotSupported(code) => write!(f, "event code {:#x} is not supported", code),
            DispatchError::Malformed(e) => write!(f, "malformed event packet, {}", e),
            DispatchError::NoSuchOutstandingCommand { received, .. } => {
                write!(f, "no outstanding command for acknowledgement of {}", received)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DispatchError {}

/// Error returned by [`EventDispatcher::register_handler`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// The event is a command acknowledgement
    ReservedEventCode(Events),
    /// The event code is not supported
    UnsupportedEventCode(u8),
}

impl core::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            RegisterError::ReservedEventCode(event) => {
                write!(f, r#"cannot register a handler for event "{}""#, event)
            }
            RegisterError::UnsupportedEventCode(code) => write!(f, "event code {:#x} is not supported", code),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RegisterError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn opcode(raw: u16) -> Opcode {
        Opcode::new(raw).unwrap()
    }

    fn command_complete(opcode: u16) -> [u8; 6] {
        let [lo, hi] = opcode.to_le_bytes();

        [0x0E, 0x04, 0x01, lo, hi, 0x00]
    }

    fn command_status(status: u8, opcode: u16) -> [u8; 6] {
        let [lo, hi] = opcode.to_le_bytes();

        [0x0F, 0x04, status, 0x01, lo, hi]
    }

    #[test]
    fn acknowledge_outstanding_command() {
        let mut dispatcher = EventDispatcher::new();

        dispatcher.tracker_mut().begin(Some(opcode(0x2006))).unwrap();

        dispatcher.on_event(&command_complete(0x2006)).unwrap();

        assert_eq!(None, dispatcher.tracker().outstanding());

        assert_eq!(
            Err(DispatchError::NoSuchOutstandingCommand {
                received: opcode(0x2006),
                outstanding: None
            }),
            dispatcher.on_event(&command_complete(0x2006))
        );
    }

    #[test]
    fn status_acknowledges_command() {
        let mut dispatcher = EventDispatcher::new();

        dispatcher.tracker_mut().begin(Some(opcode(0x0406))).unwrap();

        // a failed status is still an acknowledgement
        dispatcher.on_event(&command_status(0x0C, 0x0406)).unwrap();

        assert!(!dispatcher.tracker().is_busy());
    }

    #[test]
    fn mismatched_acknowledgement() {
        let mut dispatcher = EventDispatcher::new();

        dispatcher.tracker_mut().begin(Some(opcode(0x2006))).unwrap();

        assert_eq!(
            Err(DispatchError::NoSuchOutstandingCommand {
                received: opcode(0x0C03),
                outstanding: Some(opcode(0x2006)),
            }),
            dispatcher.on_event(&command_status(0, 0x0C03))
        );

        assert_eq!(Some(opcode(0x2006)), dispatcher.tracker().outstanding());
    }

    #[test]
    fn nop_acknowledgement_updates_credits() {
        let mut dispatcher = EventDispatcher::new();

        let packet = [0x0E, 0x03, 0x05, 0x00, 0x00];

        dispatcher.on_event(&packet).unwrap();

        assert_eq!(5, dispatcher.tracker().command_credits());
        assert!(!dispatcher.tracker().is_busy());
    }

    #[test]
    fn route_to_handler() {
        let mut dispatcher = EventDispatcher::new();

        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();

        dispatcher
            .register_handler(0x05, move |code: u8, payload: &[u8]| {
                received_clone.lock().unwrap().push((code, payload.to_vec()))
            })
            .unwrap();

        dispatcher.on_event(&[0x05, 0x04, 0x00, 0x40, 0x00, 0x13]).unwrap();
        dispatcher.on_event(&[0x05, 0x04, 0x00, 0x41, 0x00, 0x16]).unwrap();

        // no handler for the LE meta event
        dispatcher.on_event(&[0x3E, 0x01, 0x02]).unwrap();

        assert_eq!(
            vec![(0x05, vec![0x00, 0x40, 0x00, 0x13]), (0x05, vec![0x00, 0x41, 0x00, 0x16])],
            *received.lock().unwrap()
        );

        assert!(dispatcher.unregister_handler(0x05).is_some());

        dispatcher.on_event(&[0x05, 0x04, 0x00, 0x42, 0x00, 0x13]).unwrap();

        assert_eq!(2, received.lock().unwrap().len());
    }

    #[test]
    fn register_replaces_handler() {
        let mut dispatcher = EventDispatcher::new();

        assert!(dispatcher
            .register_handler(0x13, |_: u8, _: &[u8]| ())
            .unwrap()
            .is_none());

        assert!(dispatcher
            .register_handler(0x13, |_: u8, _: &[u8]| ())
            .unwrap()
            .is_some());
    }

    #[test]
    fn register_rejected() {
        let mut dispatcher = EventDispatcher::new();

        assert_eq!(
            Some(RegisterError::ReservedEventCode(Events::CommandComplete)),
            dispatcher.register_handler(0x0E, |_: u8, _: &[u8]| ()).err()
        );

        assert_eq!(
            Some(RegisterError::ReservedEventCode(Events::CommandStatus)),
            dispatcher.register_handler(0x0F, |_: u8, _: &[u8]| ()).err()
        );

        assert_eq!(
            Some(RegisterError::UnsupportedEventCode(0xFF)),
            dispatcher.register_handler(0xFF, |_: u8, _: &[u8]| ()).err()
        );
    }

    #[test]
    fn acknowledgement_handler() {
        let mut dispatcher = EventDispatcher::new();

        let acknowledged = Arc::new(Mutex::new(Vec::new()));

        let acknowledged_clone = acknowledged.clone();

        dispatcher.set_acknowledgement_handler(move |opcode: Opcode, event: &DecodedEvent<'_>| {
            if let DecodedEvent::CommandComplete { return_params, .. } = event {
                acknowledged_clone.lock().unwrap().push((opcode, return_params.to_vec()))
            }
        });

        dispatcher.tracker_mut().begin(Some(opcode(0x1009))).unwrap();

        dispatcher
            .on_event(&[0x0E, 0x0A, 0x01, 0x09, 0x10, 0x00, 1, 2, 3, 4, 5, 6])
            .unwrap();

        // NOP and unmatched acknowledgements are not given to the handler
        dispatcher.on_event(&[0x0E, 0x03, 0x01, 0x00, 0x00]).unwrap();
        dispatcher.on_event(&command_complete(0x1009)).unwrap_err();

        assert_eq!(
            vec![(opcode(0x1009), vec![0x00, 1, 2, 3, 4, 5, 6])],
            *acknowledged.lock().unwrap()
        );
    }

    #[test]
    fn decode_errors() {
        let mut dispatcher = EventDispatcher::new();

        assert_eq!(Err(DispatchError::NotSupported(0xFF)), dispatcher.on_event(&[0xFF, 0x00]));

        assert!(matches!(
            dispatcher.on_event(&[0x0E, 0x05, 0x01]),
            Err(DispatchError::Malformed(DecodeError::Truncated { .. }))
        ));

        assert!(matches!(
            dispatcher.on_event(&[0x0F, 0x03, 0x00, 0x01, 0x06]),
            Err(DispatchError::Malformed(DecodeError::InvalidParameterLength { .. }))
        ));
    }

    #[test]
    fn try_log() {
        assert_eq!(Ok(()), DispatchError::NotSupported(0xFF).try_log());

        assert_eq!(
            Ok(()),
            DispatchError::NoSuchOutstandingCommand {
                received: opcode(0x3039),
                outstanding: None
            }
            .try_log()
        );

        let malformed = DispatchError::Malformed(DecodeError::Truncated {
            declared: 2,
            available: 0,
        });

        assert_eq!(Err(malformed), malformed.try_log());
    }

    #[test]
    fn routed_handler_is_restored() {
        let mut dispatcher = EventDispatcher::new();

        let count = Arc::new(Mutex::new(0));

        let count_clone = count.clone();

        dispatcher
            .register_handler(0x05, move |_: u8, _: &[u8]| *count_clone.lock().unwrap() += 1)
            .unwrap();

        let packet = [0x05, 0x04, 0x00, 0x40, 0x00, 0x13];

        let mut routed = dispatcher.route(&packet).unwrap().unwrap();

        assert_eq!(0x05, routed.get_event_code());

        // the handler is out of the dispatcher until it is restored
        assert!(dispatcher.route(&packet).unwrap().is_none());

        routed.run();

        dispatcher.restore(routed);

        dispatcher.on_event(&packet).unwrap();

        assert_eq!(2, *count.lock().unwrap());
    }

    #[test]
    fn registration_while_routed() {
        let mut dispatcher = EventDispatcher::new();

        let replaced = Arc::new(Mutex::new(false));

        let replaced_clone = replaced.clone();

        dispatcher.register_handler(0x05, |_: u8, _: &[u8]| ()).unwrap();

        let packet = [0x05, 0x04, 0x00, 0x40, 0x00, 0x13];

        let routed = dispatcher.route(&packet).unwrap().unwrap();

        dispatcher
            .register_handler(0x05, move |_: u8, _: &[u8]| *replaced_clone.lock().unwrap() = true)
            .unwrap();

        // the old handler does not overwrite the new one
        dispatcher.restore(routed);

        dispatcher.on_event(&packet).unwrap();

        assert!(*replaced.lock().unwrap());

        let routed = dispatcher.route(&packet).unwrap().unwrap();

        assert!(dispatcher.unregister_handler(0x05).is_none());

        dispatcher.restore(routed);

        assert!(dispatcher.unregister_handler(0x05).is_none());
    }

    #[test]
    fn routed_acknowledgement_handler_is_restored() {
        let mut dispatcher = EventDispatcher::new();

        let count = Arc::new(Mutex::new(0));

        let count_clone = count.clone();

        dispatcher.set_acknowledgement_handler(move |_: Opcode, _: &DecodedEvent<'_>| *count_clone.lock().unwrap() += 1);

        dispatcher.tracker_mut().begin(Some(opcode(0x0C03))).unwrap();

        let packet = command_complete(0x0C03);

        let mut routed = dispatcher.route(&packet).unwrap().unwrap();

        assert_eq!(0x0E, routed.get_event_code());

        // a second acknowledgement while the handler is taken is not given to it
        dispatcher.tracker_mut().begin(Some(opcode(0x0C01))).unwrap();

        assert!(dispatcher.route(&command_status(0, 0x0C01)).unwrap().is_none());

        routed.run();

        dispatcher.restore(routed);

        dispatcher.tracker_mut().begin(Some(opcode(0x0C03))).unwrap();

        dispatcher.on_event(&packet).unwrap();

        assert_eq!(2, *count.lock().unwrap());
    }
}
