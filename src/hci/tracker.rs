//! Outstanding command tracking
//!
//! The host may only have one command outstanding with the controller at a time. A command is
//! outstanding from the moment it is handed to the transport until the controller acknowledges it
//! with a *Command Complete* or *Command Status* event containing the same opcode.
//!
//! The NOP opcode is never tracked. Methods of [`CommandTracker`] accept an `Option<Opcode>` where
//! `None` is the NOP, and both `begin` and `resolve` of a NOP succeed without touching the state.

use crate::hci::opcodes::Opcode;

/// The default number of command credits of a controller before it reports its own count
const DEFAULT_COMMAND_CREDITS: u8 = 1;

/// Tracker of the command outstanding with the controller
///
/// There should be exactly one `CommandTracker` per host session.
#[derive(Debug)]
pub struct CommandTracker {
    outstanding: Option<Opcode>,
    command_credits: u8,
}

impl CommandTracker {
    /// Create a new tracker with no outstanding command
    pub const fn new() -> Self {
        CommandTracker {
            outstanding: None,
            command_credits: DEFAULT_COMMAND_CREDITS,
        }
    }

    /// Start tracking a command
    ///
    /// This fails if there is already a command outstanding, in which case the outstanding command
    /// is unchanged. Beginning a NOP (`None`) always succeeds and does nothing.
    pub fn begin(&mut self, opcode: Option<Opcode>) -> Result<(), BeginError> {
        let Some(opcode) = opcode else {
            return Ok(());
        };

        match self.outstanding {
            Some(outstanding) => Err(BeginError { outstanding }),
            None => {
                self.outstanding = Some(opcode);

                Ok(())
            }
        }
    }

    /// Resolve the outstanding command with the opcode of an acknowledgement
    ///
    /// Resolving a NOP (`None`) always succeeds and does nothing. Otherwise `opcode` must match
    /// the outstanding command, when it does the tracker is cleared. A failed resolve does not
    /// change the tracker.
    pub fn resolve(&mut self, opcode: Option<Opcode>) -> Result<(), ResolveError> {
        let Some(received) = opcode else {
            return Ok(());
        };

        match self.outstanding {
            Some(outstanding) if outstanding == received => {
                self.outstanding = None;

                Ok(())
            }
            outstanding => Err(ResolveError { received, outstanding }),
        }
    }

    /// Get the outstanding command
    pub fn outstanding(&self) -> Option<Opcode> {
        self.outstanding
    }

    /// Check if there is an outstanding command
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Get the number of commands the controller last reported it can accept
    ///
    /// This is the *Num_HCI_Command_Packets* field of the last command acknowledgement.
    pub fn command_credits(&self) -> u8 {
        self.command_credits
    }

    /// Set the number of command credits reported by the controller
    pub fn set_command_credits(&mut self, credits: u8) {
        self.command_credits = credits;
    }

    /// Clear the tracker
    ///
    /// This is for host teardown or a controller reset. The outstanding command (if there was one)
    /// is returned.
    pub fn clear(&mut self) -> Option<Opcode> {
        self.command_credits = DEFAULT_COMMAND_CREDITS;

        self.outstanding.take()
    }
}

impl Default for CommandTracker {
    fn default() -> Self {
        CommandTracker::new()
    }
}

/// Error returned by [`CommandTracker::begin`]
///
/// A command is already outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeginError {
    pub outstanding: Opcode,
}

impl core::fmt::Display for BeginError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "command {} is already outstanding", self.outstanding)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BeginError {}

/// Error returned by [`CommandTracker::resolve`]
///
/// The acknowledged opcode does not match an outstanding command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveError {
    pub received: Opcode,
    pub outstanding: Option<Opcode>,
}

impl core::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.outstanding {
            Some(outstanding) => write!(
                f,
                "acknowledgement for {} does not match outstanding command {}",
                self.received, outstanding
            ),
            None => write!(f, "acknowledgement for {} without an outstanding command", self.received),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ResolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn opcode(raw: u16) -> Opcode {
        Opcode::new(raw).unwrap()
    }

    #[test]
    fn begin_then_resolve() {
        let mut tracker = CommandTracker::new();

        for raw in [0x0001, 0x0C03, 0x2006, 0x3039, 0xFFFF] {
            tracker.begin(Some(opcode(raw))).unwrap();

            assert_eq!(Some(opcode(raw)), tracker.outstanding());

            tracker.resolve(Some(opcode(raw))).unwrap();

            assert!(!tracker.is_busy());

            assert_eq!(
                Err(ResolveError {
                    received: opcode(raw),
                    outstanding: None
                }),
                tracker.resolve(Some(opcode(raw)))
            );
        }
    }

    #[test]
    fn mismatched_resolve_keeps_state() {
        let mut tracker = CommandTracker::new();

        tracker.begin(Some(opcode(0x2006))).unwrap();

        assert_eq!(
            Err(ResolveError {
                received: opcode(0x200A),
                outstanding: Some(opcode(0x2006)),
            }),
            tracker.resolve(Some(opcode(0x200A)))
        );

        assert_eq!(Some(opcode(0x2006)), tracker.outstanding());
    }

    #[test]
    fn nop_resolve_never_changes_state() {
        let mut tracker = CommandTracker::new();

        tracker.resolve(None).unwrap();

        assert_eq!(None, tracker.outstanding());

        tracker.begin(Some(opcode(0x0C03))).unwrap();

        tracker.resolve(None).unwrap();

        assert_eq!(Some(opcode(0x0C03)), tracker.outstanding());
    }

    #[test]
    fn nop_begin_is_not_tracked() {
        let mut tracker = CommandTracker::new();

        tracker.begin(None).unwrap();

        assert!(!tracker.is_busy());

        tracker.begin(Some(opcode(0x0C03))).unwrap();

        // a NOP does not conflict with the outstanding command
        tracker.begin(None).unwrap();

        assert_eq!(Some(opcode(0x0C03)), tracker.outstanding());
    }

    #[test]
    fn second_begin_fails() {
        let mut tracker = CommandTracker::new();

        tracker.begin(Some(opcode(0x2006))).unwrap();

        assert_eq!(
            Err(BeginError {
                outstanding: opcode(0x2006)
            }),
            tracker.begin(Some(opcode(0x0C03)))
        );

        assert_eq!(
            Err(BeginError {
                outstanding: opcode(0x2006)
            }),
            tracker.begin(Some(opcode(0x2006)))
        );

        assert_eq!(Some(opcode(0x2006)), tracker.outstanding());
    }

    #[test]
    fn clear() {
        let mut tracker = CommandTracker::new();

        tracker.begin(Some(opcode(0x0C03))).unwrap();
        tracker.set_command_credits(5);

        assert_eq!(Some(opcode(0x0C03)), tracker.clear());
        assert_eq!(None, tracker.outstanding());
        assert_eq!(1, tracker.command_credits());
    }
}
