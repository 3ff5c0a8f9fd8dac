//! LE receiver commands

pub mod set_scan_enable {

    use crate::hci::host::{Host, IssueError};
    use crate::hci::*;
    use crate::hci_transport::Transport;

    const COMMAND: opcodes::HciCommand = opcodes::HciCommand::LEController(opcodes::LEController::SetScanEnable);

    struct Parameter {
        enable: bool,
        filter_duplicates: bool,
    }

    impl CommandParameter<2> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;
        fn get_parameter(&self) -> [u8; 2] {
            [self.enable.into(), self.filter_duplicates.into()]
        }
    }

    /// Send the LE Set Scan Enable command
    ///
    /// Advertising reports of scanning are received as *LE Meta* events, a handler for the LE meta
    /// event code should be registered with the host before scanning is enabled.
    pub fn send<T: Transport>(
        host: &mut Host<T>,
        enable: bool,
        filter_duplicates: bool,
    ) -> Result<(), IssueError<T::Error>> {
        host.send_command(&Parameter {
            enable,
            filter_duplicates,
        })
    }
}
