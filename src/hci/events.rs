//! Host Controller Interface Events
//!
//! Every event packet sent from the controller starts with a one byte event code, followed by a
//! one byte parameter length and then the parameters of the event.
//!
//! ```text
//! +------------+------------------+-----------------------------+
//! | event code | parameter length | parameters (length bytes)   |
//! +------------+------------------+-----------------------------+
//! ```
//!
//! Only the *Command Complete* and *Command Status* events are decoded by this library as they
//! are used for matching commands sent by the host. The parameters of every other event known to
//! the host are passed through unmodified within [`DecodedEvent::Other`] for the upper layers.

use crate::hci::opcodes::Opcode;

/// Create the events enumeration along with the conversions to and from the event code
macro_rules! events_markup {
    ( $( #[ $attrs:meta ] )* pub enum $EnumName:tt {
        $( $name:tt -> $code:literal, )*
    } ) => {
        $( #[ $attrs ] )*
        pub enum $EnumName {
            $( $name ),*
        }

        impl $EnumName {
            /// Get the event code
            pub const fn get_event_code(&self) -> u8 {
                match self {
                    $( $EnumName::$name => $code ),*
                }
            }

            /// Try to get the event from its event code
            pub fn try_from_event_code(code: u8) -> Result<Self, DecodeError> {
                match code {
                    $( $code => Ok($EnumName::$name), )*
                    _ => Err(DecodeError::UnsupportedEventCode(code)),
                }
            }
        }

        impl core::fmt::Display for $EnumName {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                match self {
                    $( $EnumName::$name => f.write_str(stringify!($name)) ),*
                }
            }
        }
    };
}

events_markup! {
    /// The events supported by the host
    ///
    /// The vendor specific event code (0xFF) is not part of this list, those events cannot be
    /// processed by this library.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub enum Events {
        InquiryComplete -> 0x01,
        InquiryResult -> 0x02,
        ConnectionComplete -> 0x03,
        ConnectionRequest -> 0x04,
        DisconnectionComplete -> 0x05,
        AuthenticationComplete -> 0x06,
        RemoteNameRequestComplete -> 0x07,
        EncryptionChangeV1 -> 0x08,
        ChangeConnectionLinkKeyComplete -> 0x09,
        LinkKeyTypeChanged -> 0x0A,
        ReadRemoteSupportedFeaturesComplete -> 0x0B,
        ReadRemoteVersionInformationComplete -> 0x0C,
        QosSetupComplete -> 0x0D,
        CommandComplete -> 0x0E,
        CommandStatus -> 0x0F,
        HardwareError -> 0x10,
        FlushOccurred -> 0x11,
        RoleChange -> 0x12,
        NumberOfCompletedPackets -> 0x13,
        ModeChange -> 0x14,
        ReturnLinkKeys -> 0x15,
        PinCodeRequest -> 0x16,
        LinkKeyRequest -> 0x17,
        LinkKeyNotification -> 0x18,
        LoopbackCommand -> 0x19,
        DataBufferOverflow -> 0x1A,
        MaxSlotsChange -> 0x1B,
        ReadClockOffsetComplete -> 0x1C,
        ConnectionPacketTypeChanged -> 0x1D,
        QosViolation -> 0x1E,
        PageScanRepetitionModeChange -> 0x20,
        FlowSpecificationComplete -> 0x21,
        InquiryResultWithRssi -> 0x22,
        ReadRemoteExtendedFeaturesComplete -> 0x23,
        SynchronousConnectionComplete -> 0x2C,
        SynchronousConnectionChanged -> 0x2D,
        SniffSubrating -> 0x2E,
        ExtendedInquiryResult -> 0x2F,
        EncryptionKeyRefreshComplete -> 0x30,
        IoCapabilityRequest -> 0x31,
        IoCapabilityResponse -> 0x32,
        UserConfirmationRequest -> 0x33,
        UserPasskeyRequest -> 0x34,
        RemoteOobDataRequest -> 0x35,
        SimplePairingComplete -> 0x36,
        LinkSupervisionTimeoutChanged -> 0x38,
        EnhancedFlushComplete -> 0x39,
        UserPasskeyNotification -> 0x3B,
        KeypressNotification -> 0x3C,
        RemoteHostSupportedFeaturesNotification -> 0x3D,
        LeMeta -> 0x3E,
        NumberOfCompletedDataBlocks -> 0x48,
        TriggeredClockCapture -> 0x4E,
        SynchronizationTrainComplete -> 0x4F,
        SynchronizationTrainReceived -> 0x50,
        ConnectionlessPeripheralBroadcastReceive -> 0x51,
        ConnectionlessPeripheralBroadcastTimeout -> 0x52,
        TruncatedPageComplete -> 0x53,
        PeripheralPageResponseTimeout -> 0x54,
        ConnectionlessPeripheralBroadcastChannelMapChange -> 0x55,
        InquiryResponseNotification -> 0x56,
        AuthenticatedPayloadTimeoutExpired -> 0x57,
        SamStatusChange -> 0x58,
        EncryptionChangeV2 -> 0x59,
    }
}

impl Events {
    /// Check if the event acknowledges a command
    ///
    /// Only *Command Complete* and *Command Status* are command acknowledgements.
    pub fn is_command_acknowledgement(&self) -> bool {
        matches!(self, Events::CommandComplete | Events::CommandStatus)
    }
}

/// The size of the header of a HCI event packet
pub const EVENT_HEADER_SIZE: usize = 2;

/// The minimum size of the parameters of a *Command Complete* event
pub const COMMAND_COMPLETE_MIN_PARAMETER_SIZE: usize = 3;

/// The size of the parameters of a *Command Status* event
pub const COMMAND_STATUS_PARAMETER_SIZE: usize = 4;

/// A decoded HCI event
///
/// The opcode within a `CommandComplete` or `CommandStatus` is `None` when the controller sent
/// the NOP opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodedEvent<'a> {
    CommandComplete {
        opcode: Option<Opcode>,
        num_commands_allowed: u8,
        return_params: &'a [u8],
    },
    CommandStatus {
        status: u8,
        opcode: Option<Opcode>,
        num_commands_allowed: u8,
    },
    Other {
        event_code: u8,
        payload: &'a [u8],
    },
}

impl DecodedEvent<'_> {
    /// Get the event code of the decoded event
    pub fn get_event_code(&self) -> u8 {
        match self {
            DecodedEvent::CommandComplete { .. } => Events::CommandComplete.get_event_code(),
            DecodedEvent::CommandStatus { .. } => Events::CommandStatus.get_event_code(),
            DecodedEvent::Other { event_code, .. } => *event_code,
        }
    }
}

/// Decode a raw HCI event packet
///
/// Any bytes within `buffer` after the parameters (as given by the parameter length) are
/// ignored.
pub fn decode(buffer: &[u8]) -> Result<DecodedEvent<'_>, DecodeError> {
    let (code, declared) = match buffer {
        [code, len, ..] => (*code, *len as usize),
        _ => {
            return Err(DecodeError::Truncated {
                declared: EVENT_HEADER_SIZE,
                available: buffer.len(),
            })
        }
    };

    let event = Events::try_from_event_code(code)?;

    let parameters = buffer[EVENT_HEADER_SIZE..]
        .get(..declared)
        .ok_or(DecodeError::Truncated {
            declared,
            available: buffer.len() - EVENT_HEADER_SIZE,
        })?;

    match event {
        Events::CommandComplete => match parameters {
            [num_commands_allowed, lo, hi, return_params @ ..] => Ok(DecodedEvent::CommandComplete {
                opcode: Opcode::new(u16::from_le_bytes([*lo, *hi])),
                num_commands_allowed: *num_commands_allowed,
                return_params,
            }),
            _ => Err(DecodeError::InvalidParameterLength {
                event,
                expected: COMMAND_COMPLETE_MIN_PARAMETER_SIZE,
                length: parameters.len(),
            }),
        },
        Events::CommandStatus => match parameters {
            [status, num_commands_allowed, lo, hi] => Ok(DecodedEvent::CommandStatus {
                status: *status,
                opcode: Opcode::new(u16::from_le_bytes([*lo, *hi])),
                num_commands_allowed: *num_commands_allowed,
            }),
            _ => Err(DecodeError::InvalidParameterLength {
                event,
                expected: COMMAND_STATUS_PARAMETER_SIZE,
                length: parameters.len(),
            }),
        },
        _ => Ok(DecodedEvent::Other {
            event_code: code,
            payload: parameters,
        }),
    }
}

/// Error returned when decoding an event packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The event code is not known to this library
    UnsupportedEventCode(u8),
    /// The packet is shorter than the length it declares
    Truncated { declared: usize, available: usize },
    /// The parameter length is invalid for the event
    ///
    /// `expected` is the exact size for a *Command Status* event and the minimum size for a
    /// *Command Complete* event.
    InvalidParameterLength {
        event: Events,
        expected: usize,
        length: usize,
    },
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            DecodeError::UnsupportedEventCode(code) => write!(f, "unsupported event code: {:#x}", code),
            DecodeError::Truncated { declared, available } => write!(
                f,
                "event packet is truncated, {} bytes declared but only {} available",
                declared, available
            ),
            DecodeError::InvalidParameterLength {
                event,
                expected,
                length,
            } => write!(
                f,
                r#"invalid parameter length {} (expected {}) for event "{}""#,
                length, expected, event
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_complete() {
        let packet = [0x0E, 0x05, 0x01, 0x0A, 0x20, 0x00, 0x07];

        assert_eq!(
            Ok(DecodedEvent::CommandComplete {
                opcode: Opcode::new(0x200A),
                num_commands_allowed: 1,
                return_params: &[0x00, 0x07],
            }),
            decode(&packet)
        );
    }

    #[test]
    fn command_complete_nop() {
        let packet = [0x0E, 0x03, 0x01, 0x00, 0x00];

        assert_eq!(
            Ok(DecodedEvent::CommandComplete {
                opcode: None,
                num_commands_allowed: 1,
                return_params: &[],
            }),
            decode(&packet)
        );
    }

    #[test]
    fn command_complete_too_short() {
        let packet = [0x0E, 0x02, 0x01, 0x0A];

        assert_eq!(
            Err(DecodeError::InvalidParameterLength {
                event: Events::CommandComplete,
                expected: 3,
                length: 2,
            }),
            decode(&packet)
        );
    }

    #[test]
    fn command_status() {
        let packet = [0x0F, 0x04, 0x00, 0x01, 0x06, 0x20];

        assert_eq!(
            Ok(DecodedEvent::CommandStatus {
                status: 0,
                opcode: Opcode::new(0x2006),
                num_commands_allowed: 1,
            }),
            decode(&packet)
        );
    }

    #[test]
    fn command_status_wrong_length() {
        for len in [0u8, 1, 2, 3, 5, 6] {
            let mut packet = vec![0x0F, len];

            packet.resize(2 + len as usize, 0x11);

            match decode(&packet) {
                Err(DecodeError::InvalidParameterLength { expected: 4, .. }) => (),
                other => panic!("parameter length {} decoded as {:?}", len, other),
            }
        }
    }

    #[test]
    fn truncated() {
        assert_eq!(
            Err(DecodeError::Truncated {
                declared: 2,
                available: 1
            }),
            decode(&[0x0E])
        );

        assert_eq!(
            Err(DecodeError::Truncated {
                declared: 4,
                available: 2
            }),
            decode(&[0x0F, 0x04, 0x00, 0x01])
        );
    }

    #[test]
    fn unsupported_event_codes() {
        let unknown = (0..=u8::MAX).filter(|code| Events::try_from_event_code(*code).is_err());

        for code in unknown {
            assert_eq!(Err(DecodeError::UnsupportedEventCode(code)), decode(&[code, 0]));
            assert_eq!(
                Err(DecodeError::UnsupportedEventCode(code)),
                decode(&[code, 3, 1, 2, 3])
            );
        }

        assert!(Events::try_from_event_code(0x00).is_err());
        assert!(Events::try_from_event_code(0xFF).is_err());
    }

    #[test]
    fn other_event_passes_through() {
        // disconnection complete with trailing garbage past the declared length
        let packet = [0x05, 0x04, 0x00, 0x40, 0x00, 0x13, 0xAA];

        assert_eq!(
            Ok(DecodedEvent::Other {
                event_code: 0x05,
                payload: &[0x00, 0x40, 0x00, 0x13],
            }),
            decode(&packet)
        );
    }

    #[test]
    fn event_code_round_trip() {
        for code in 0..=u8::MAX {
            if let Ok(event) = Events::try_from_event_code(code) {
                assert_eq!(code, event.get_event_code());
            }
        }
    }
}
