//! HCI Command Opcodes
//!
//! Opcodes are composed of a group identifier (the OGF) and an individual command identifier
//! specific to the group (the OCF). The group identifier and individual identifier are put
//! together to form the raw opcode value `(OGF << 10) | OCF`.
//!
//! The raw value `0x0000` is the *NOP* opcode. It is not a command, a controller uses it within
//! a *Command Complete* or *Command Status* event to report command credits without acknowledging
//! anything. Because of this NOP cannot be represented by [`Opcode`], the type used for tracking
//! commands sent to the controller. Any place where a raw opcode may be NOP uses an
//! `Option<Opcode>` with `None` as the NOP.
//!
//! ```
//! # use bo_tie_hci_sync::hci::opcodes::{HciCommand, ControllerAndBaseband, Opcode};
//! assert_eq!(0xC03, HciCommand::ControllerAndBaseband(ControllerAndBaseband::Reset).into_opcode());
//!
//! assert_eq!(None, Opcode::new(0));
//! ```

use core::convert::TryFrom;
use core::num::NonZeroU16;

/// The raw value of the NOP opcode
pub const NOP: u16 = 0x0000;

/// A command opcode
///
/// This is the opcode of a command that can be sent to the controller. It can never be the
/// [`NOP`] value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode(NonZeroU16);

impl Opcode {
    /// Create a new `Opcode` from a raw opcode value
    ///
    /// `None` is returned if `raw` is the NOP opcode.
    pub const fn new(raw: u16) -> Option<Self> {
        match NonZeroU16::new(raw) {
            Some(v) => Some(Opcode(v)),
            None => None,
        }
    }

    /// Create an `Opcode` from its group and command fields
    ///
    /// The OGF is masked to six bits and the OCF is masked to ten bits. `None` is returned when
    /// both fields are zero.
    pub const fn from_fields(ogf: u16, ocf: u16) -> Option<Self> {
        Opcode::new(OpCodePair { ogf, ocf }.into_opcode())
    }

    /// Get the raw opcode value
    pub const fn into_raw(self) -> u16 {
        self.0.get()
    }

    /// Get the OpCode Group Field
    pub const fn get_ogf(&self) -> u16 {
        self.0.get() >> 10
    }

    /// Get the OpCode Command Field
    pub const fn get_ocf(&self) -> u16 {
        self.0.get() & 0x3FF
    }

    /// Get the little endian bytes of this opcode as they appear in a HCI packet
    pub const fn to_le_bytes(self) -> [u8; 2] {
        self.0.get().to_le_bytes()
    }
}

impl From<Opcode> for u16 {
    fn from(opcode: Opcode) -> Self {
        opcode.into_raw()
    }
}

impl From<HciCommand> for Opcode {
    fn from(command: HciCommand) -> Self {
        command.into_command_opcode()
    }
}

impl From<Opcode> for OpCodePair {
    fn from(opcode: Opcode) -> Self {
        OpCodePair::from_opcode(opcode.into_raw())
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:#06x} ({:#x}:{:#x})", self.into_raw(), self.get_ogf(), self.get_ocf())
    }
}

/// An type for the pair of OGF (OpCode Group Field) and OCF (OpCode Command Field)
///
/// The main use for this is for converting from the `HciCommand` enumeration into the numerical
/// values to be passed over the interface to the controller.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpCodePair {
    pub ogf: u16,
    pub ocf: u16,
}

impl OpCodePair {
    /// Get the OpCode Group Field value
    pub fn get_ogf(&self) -> u16 {
        self.ogf
    }

    /// Get the OpCode Command Field value
    pub fn get_ocf(&self) -> u16 {
        self.ocf
    }

    /// Convert the OpCodePair into the opcode
    ///
    /// The returned value is the opcode in host byte order.
    pub const fn into_opcode(self) -> u16 {
        // The first 10 bits of the OpCode is the OCF field and the last 6 bits is the OGF field.
        (self.ocf & 0x3FF) | ((self.ogf & 0x3F) << 10)
    }

    /// Convert a raw opcode into an OpCodePair
    pub const fn from_opcode(val: u16) -> Self {
        OpCodePair {
            ogf: val >> 10,
            ocf: val & 0x3FF,
        }
    }
}

impl From<HciCommand> for OpCodePair {
    fn from(cmd: HciCommand) -> OpCodePair {
        cmd.into_opcode_pair()
    }
}

/// Error for an opcode that does not map to a known [`HciCommand`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommandError(pub OpCodePair);

impl core::fmt::Display for UnknownCommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "unknown command opcode ({:#x}:{:#x})", self.0.ogf, self.0.ocf)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownCommandError {}

/// Enumerations of the HCI commands known to this library
///
/// HciCommands consists of the HCI command groups containing the HCI commands within the group.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HciCommand {
    LinkControl(LinkControl),
    ControllerAndBaseband(ControllerAndBaseband),
    LEController(LEController),
}

impl HciCommand {
    /// Get the raw opcode for this command
    pub const fn into_opcode(self) -> u16 {
        self.into_opcode_pair().into_opcode()
    }

    /// Get the `OpCodePair` for this command
    pub const fn into_opcode_pair(self) -> OpCodePair {
        match self {
            HciCommand::LinkControl(ocf) => ocf.into_opcode_pair(),
            HciCommand::ControllerAndBaseband(ocf) => ocf.into_opcode_pair(),
            HciCommand::LEController(ocf) => ocf.into_opcode_pair(),
        }
    }

    /// Get the `Opcode` for this command
    ///
    /// Every command has a nonzero OGF so this cannot be NOP.
    pub const fn into_command_opcode(self) -> Opcode {
        let pair = self.into_opcode_pair();

        // The OGF is never zero for a known command
        match NonZeroU16::new(pair.into_opcode()) {
            Some(v) => Opcode(v),
            None => unreachable!(),
        }
    }
}

impl core::fmt::Display for HciCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let opcode = self.into_opcode_pair();

        match self {
            HciCommand::LinkControl(c) => write!(f, "link control - {} ({:#x}:{:#x})", c, opcode.ogf, opcode.ocf),
            HciCommand::ControllerAndBaseband(c) => write!(
                f,
                "controller and baseband - {} ({:#x}:{:#x})",
                c, opcode.ogf, opcode.ocf
            ),
            HciCommand::LEController(c) => write!(f, "LE controller - {} ({:#x}:{:#x})", c, opcode.ogf, opcode.ocf),
        }
    }
}

impl TryFrom<OpCodePair> for HciCommand {
    type Error = UnknownCommandError;

    fn try_from(opc_pair: OpCodePair) -> Result<Self, Self::Error> {
        let command = match opc_pair.ogf {
            LinkControl::OGF => LinkControl::try_from_ocf(opc_pair.ocf).map(HciCommand::LinkControl),
            ControllerAndBaseband::OGF => {
                ControllerAndBaseband::try_from_ocf(opc_pair.ocf).map(HciCommand::ControllerAndBaseband)
            }
            LEController::OGF => LEController::try_from_ocf(opc_pair.ocf).map(HciCommand::LEController),
            _ => None,
        };

        command.ok_or(UnknownCommandError(opc_pair))
    }
}

impl TryFrom<Opcode> for HciCommand {
    type Error = UnknownCommandError;

    fn try_from(opcode: Opcode) -> Result<Self, Self::Error> {
        HciCommand::try_from(OpCodePair::from(opcode))
    }
}

/// Link control commands
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum LinkControl {
    Disconnect,
}

impl LinkControl {
    const OGF: u16 = 0x1;

    const fn into_opcode_pair(self) -> OpCodePair {
        OpCodePair {
            ogf: LinkControl::OGF,
            ocf: match self {
                LinkControl::Disconnect => 0x6,
            },
        }
    }

    fn try_from_ocf(ocf: u16) -> Option<Self> {
        match ocf {
            0x6 => Some(LinkControl::Disconnect),
            _ => None,
        }
    }
}

impl core::fmt::Display for LinkControl {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            LinkControl::Disconnect => f.write_str("disconnect"),
        }
    }
}

/// Controller and baseband commands
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ControllerAndBaseband {
    SetEventMask,
    Reset,
}

impl ControllerAndBaseband {
    const OGF: u16 = 0x3;

    const fn into_opcode_pair(self) -> OpCodePair {
        OpCodePair {
            ogf: ControllerAndBaseband::OGF,
            ocf: match self {
                ControllerAndBaseband::SetEventMask => 0x1,
                ControllerAndBaseband::Reset => 0x3,
            },
        }
    }

    fn try_from_ocf(ocf: u16) -> Option<Self> {
        match ocf {
            0x1 => Some(ControllerAndBaseband::SetEventMask),
            0x3 => Some(ControllerAndBaseband::Reset),
            _ => None,
        }
    }
}

impl core::fmt::Display for ControllerAndBaseband {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            ControllerAndBaseband::SetEventMask => f.write_str("set event mask"),
            ControllerAndBaseband::Reset => f.write_str("reset"),
        }
    }
}

/// LE controller commands
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum LEController {
    SetEventMask,
    SetAdvertisingEnable,
    SetScanEnable,
}

impl LEController {
    const OGF: u16 = 0x8;

    const fn into_opcode_pair(self) -> OpCodePair {
        OpCodePair {
            ogf: LEController::OGF,
            ocf: match self {
                LEController::SetEventMask => 0x1,
                LEController::SetAdvertisingEnable => 0xA,
                LEController::SetScanEnable => 0xC,
            },
        }
    }

    fn try_from_ocf(ocf: u16) -> Option<Self> {
        match ocf {
            0x1 => Some(LEController::SetEventMask),
            0xA => Some(LEController::SetAdvertisingEnable),
            0xC => Some(LEController::SetScanEnable),
            _ => None,
        }
    }
}

impl core::fmt::Display for LEController {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            LEController::SetEventMask => f.write_str("set event mask"),
            LEController::SetAdvertisingEnable => f.write_str("set advertising enable"),
            LEController::SetScanEnable => f.write_str("set scan enable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nop_is_not_an_opcode() {
        assert_eq!(None, Opcode::new(NOP));
        assert_eq!(None, Opcode::from_fields(0, 0));
    }

    #[test]
    fn opcode_fields() {
        let opcode = Opcode::from_fields(0x8, 0x6).unwrap();

        assert_eq!(0x2006, opcode.into_raw());
        assert_eq!(0x8, opcode.get_ogf());
        assert_eq!(0x6, opcode.get_ocf());
        assert_eq!([0x06, 0x20], opcode.to_le_bytes());
    }

    #[test]
    fn fields_are_masked() {
        // OGF is 6 bits and OCF is 10 bits
        let opcode = Opcode::from_fields(0x48, 0x7FF).unwrap();

        assert_eq!(0x8, opcode.get_ogf());
        assert_eq!(0x3FF, opcode.get_ocf());
    }

    #[test]
    fn command_round_trip() {
        let command = HciCommand::LEController(LEController::SetAdvertisingEnable);

        assert_eq!(0x200A, command.into_opcode());

        let opcode = Opcode::from(command);

        assert_eq!(Ok(command), HciCommand::try_from(opcode));
    }

    #[test]
    fn unknown_command() {
        let opcode = Opcode::new(12345).unwrap();

        assert_eq!(
            Err(UnknownCommandError(OpCodePair::from_opcode(12345))),
            HciCommand::try_from(opcode)
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_opcode() {
        let opcode = Opcode::new(0x0C03).unwrap();

        let bytes = bincode::serialize(&opcode).unwrap();

        assert_eq!(opcode, bincode::deserialize::<Opcode>(&bytes).unwrap());
    }
}
