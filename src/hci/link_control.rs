//! Link Control Commands

pub mod disconnect {
    use crate::hci::common::ConnectionHandle;
    use crate::hci::host::{Host, IssueError};
    use crate::hci::*;
    use crate::hci_transport::Transport;

    const COMMAND: opcodes::HciCommand = opcodes::HciCommand::LinkControl(opcodes::LinkControl::Disconnect);

    /// These are the error codes that are given as reasons for disconnecting
    ///
    /// These enumerations are the acceptable error codes to be used as reasons for
    /// triggering the disconnect.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum DisconnectReason {
        AuthenticationFailure,
        RemoteUserTerminatedConnection,
        RemoteDeviceTerminatedConnectionDueToLowResources,
        RemoteDeviceTerminatedConnectionDueToPowerOff,
        UnsupportedRemoteFeature,
        PairingWithUnitKeyNotSupported,
        UnacceptableConnectionParameters,
    }

    impl DisconnectReason {
        fn get_val(&self) -> u8 {
            match *self {
                DisconnectReason::AuthenticationFailure => 0x05,
                DisconnectReason::RemoteUserTerminatedConnection => 0x13,
                DisconnectReason::RemoteDeviceTerminatedConnectionDueToLowResources => 0x14,
                DisconnectReason::RemoteDeviceTerminatedConnectionDueToPowerOff => 0x15,
                DisconnectReason::UnsupportedRemoteFeature => 0x1A,
                DisconnectReason::PairingWithUnitKeyNotSupported => 0x29,
                DisconnectReason::UnacceptableConnectionParameters => 0x3B,
            }
        }
    }

    struct Parameter {
        connection_handle: ConnectionHandle,
        disconnect_reason: DisconnectReason,
    }

    impl CommandParameter<3> for Parameter {
        const COMMAND: opcodes::HciCommand = COMMAND;
        fn get_parameter(&self) -> [u8; 3] {
            let [lo, hi] = self.connection_handle.get_raw_handle().to_le_bytes();

            [lo, hi, self.disconnect_reason.get_val()]
        }
    }

    /// Send the disconnect command
    ///
    /// The controller acknowledges this command with a *Command Status* event, the
    /// *Disconnection Complete* event is sent once the connection is terminated.
    pub fn send<T: Transport>(
        host: &mut Host<T>,
        connection_handle: ConnectionHandle,
        disconnect_reason: DisconnectReason,
    ) -> Result<(), IssueError<T::Error>> {
        host.send_command(&Parameter {
            connection_handle,
            disconnect_reason,
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn disconnect_parameter() {
            let mut sent = Vec::new();

            let mut host = Host::new(|packet: &[u8]| -> Result<(), &'static str> {
                sent.push(packet.to_vec());
                Ok(())
            });

            let handle = ConnectionHandle::try_from(0x0040).unwrap();

            send(&mut host, handle, DisconnectReason::RemoteUserTerminatedConnection).unwrap();

            // the disconnect is acknowledged by a command status
            host.on_event(&[0x0F, 0x04, 0x00, 0x01, 0x06, 0x04]).unwrap();

            assert_eq!(None, host.outstanding());

            drop(host);

            assert_eq!(vec![vec![0x06, 0x04, 0x03, 0x40, 0x00, 0x13]], sent);
        }
    }
}
