//! Types common to multiple HCI commands

use core::fmt;

/// A connection handle
///
/// Connection handles are created by the controller when a connection is established. The value of
/// a connection handle is in the range of `0x0000` to `0x0EFF`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionHandle {
    handle: u16,
}

impl ConnectionHandle {
    pub const MAX: u16 = 0x0EFF;

    /// Try to create a ConnectionHandle from a raw value
    ///
    /// # Error
    /// The raw value was greater then the maximum value.
    pub fn try_from(raw: u16) -> Result<ConnectionHandle, ConnectionHandleError> {
        if raw <= ConnectionHandle::MAX {
            Ok(ConnectionHandle { handle: raw })
        } else {
            Err(ConnectionHandleError(raw))
        }
    }

    pub fn get_raw_handle(&self) -> u16 {
        self.handle
    }
}

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.handle)
    }
}

impl fmt::LowerHex for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::LowerHex::fmt(&self.handle, f)
    }
}

/// Error for a raw connection handle larger than [`ConnectionHandle::MAX`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionHandleError(pub u16);

impl fmt::Display for ConnectionHandleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "raw connection handle {:#x} is larger than the maximum {:#x}", self.0, ConnectionHandle::MAX)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConnectionHandleError {}
