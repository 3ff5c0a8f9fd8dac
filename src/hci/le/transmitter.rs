//! LE transmitter commands

pub mod set_advertising_enable {

    use crate::hci::host::{Host, IssueError};
    use crate::hci::*;
    use crate::hci_transport::Transport;

    const COMMAND: opcodes::HciCommand =
        opcodes::HciCommand::LEController(opcodes::LEController::SetAdvertisingEnable);

    struct Parameter {
        enable: bool,
    }

    impl CommandParameter<1> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;
        fn get_parameter(&self) -> [u8; 1] {
            [self.enable.into()]
        }
    }

    /// Send the LE Set Advertising Enable command
    pub fn send<T: Transport>(host: &mut Host<T>, enable: bool) -> Result<(), IssueError<T::Error>> {
        host.send_command(&Parameter { enable })
    }
}
