//! Mandatory LE commands

pub mod set_event_mask {

    use crate::hci::host::{Host, IssueError};
    use crate::hci::*;
    use crate::hci_transport::Transport;

    const COMMAND: opcodes::HciCommand = opcodes::HciCommand::LEController(opcodes::LEController::SetEventMask);

    /// The default LE event mask of a controller
    pub const DEFAULT_MASK: u64 = 0x1F;

    struct Parameter {
        mask: u64,
    }

    impl CommandParameter<8> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;
        fn get_parameter(&self) -> [u8; 8] {
            self.mask.to_le_bytes()
        }
    }

    /// Send the LE set event mask command
    ///
    /// Input `mask` is the raw LE event mask, each bit enables the LE meta sub event of the bit
    /// position plus one.
    pub fn send<T: Transport>(host: &mut Host<T>, mask: u64) -> Result<(), IssueError<T::Error>> {
        host.send_command(&Parameter { mask })
    }
}
