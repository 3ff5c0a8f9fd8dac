//! Controller and Baseband Commands

pub mod reset {

    use crate::hci::host::{Host, IssueError};
    use crate::hci::*;
    use crate::hci_transport::Transport;

    const COMMAND: opcodes::HciCommand =
        opcodes::HciCommand::ControllerAndBaseband(opcodes::ControllerAndBaseband::Reset);

    #[derive(Clone, Copy)]
    struct Parameter;

    impl CommandParameter<0> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;
        fn get_parameter(&self) -> [u8; 0] {
            []
        }
    }

    /// Send the reset command to the controller
    pub fn send<T: Transport>(host: &mut Host<T>) -> Result<(), IssueError<T::Error>> {
        host.send_command(&Parameter)
    }
}

pub mod set_event_mask {

    use crate::hci::host::{Host, IssueError};
    use crate::hci::*;
    use crate::hci_transport::Transport;

    const COMMAND: opcodes::HciCommand =
        opcodes::HciCommand::ControllerAndBaseband(opcodes::ControllerAndBaseband::SetEventMask);

    /// The default event mask of a controller
    pub const DEFAULT_MASK: u64 = 0x0000_1FFF_FFFF_FFFF;

    struct Parameter {
        mask: u64,
    }

    impl CommandParameter<8> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;
        fn get_parameter(&self) -> [u8; 8] {
            self.mask.to_le_bytes()
        }
    }

    /// Send the set event mask command
    ///
    /// Input `mask` is the raw event mask, each bit enables the event of the bit position plus
    /// one (bit 0 is the *Inquiry Complete* event).
    pub fn send<T: Transport>(host: &mut Host<T>, mask: u64) -> Result<(), IssueError<T::Error>> {
        host.send_command(&Parameter { mask })
    }
}
