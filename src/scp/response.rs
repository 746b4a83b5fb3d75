use super::constants::*;
use super::error::ScpError;
use log::debug;
use std::io::Read;

/// Numeric classification of the status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Ok,
    Warning,
    Error,
}

/// Character classification of the status byte. Kept apart from
/// [`ResponseType`] because a directive line arrives on a non-failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolType {
    Permission,
    Time,
    None,
}

impl ProtocolType {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SCP_PERMISSION => ProtocolType::Permission,
            SCP_TIME => ProtocolType::Time,
            _ => ProtocolType::None,
        }
    }

    pub fn letter(&self) -> char {
        match self {
            ProtocolType::Permission => SCP_PERMISSION as char,
            ProtocolType::Time => SCP_TIME as char,
            ProtocolType::None => ' ',
        }
    }
}

/// One reply read from the remote.
///
/// The remote answers every directive and every payload with a status byte.
/// Warnings and errors are always followed by a message line (possibly empty),
/// and so are directive letters when the remote is acting as source. The
/// difference between a warning and an error is that after an error the remote
/// closes the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    response_type: ResponseType,
    message: String,
    protocol_type: ProtocolType,
}

impl Response {
    /// Reads exactly one status byte and, when it calls for one, one
    /// newline-terminated line. Never reads past the end of the line.
    pub fn parse<R: Read + ?Sized>(reader: &mut R) -> Result<Self, ScpError> {
        Self::try_parse(reader)?.ok_or_else(|| {
            ScpError::Transport(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "remote closed the stream",
            ))
        })
    }

    /// Like [`Response::parse`], but end of stream before the status byte is
    /// `Ok(None)`: that is how the remote says it has nothing more to send.
    pub fn try_parse<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Self>, ScpError> {
        let mut buffer: [u8; 1] = [0; 1];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        let status = buffer[0];

        let protocol_type = ProtocolType::from_byte(status);
        let response_type = match status {
            SCP_OK => ResponseType::Ok,
            SCP_WARNING => ResponseType::Warning,
            SCP_ERROR => ResponseType::Error,
            _ if protocol_type != ProtocolType::None => ResponseType::Ok,
            other => {
                return Err(ScpError::ProtocolViolation(format!(
                    "unknown status byte 0x{:02x}",
                    other
                )))
            }
        };

        let message = if response_type != ResponseType::Ok || protocol_type != ProtocolType::None
        {
            read_line(reader)?
        } else {
            String::new()
        };

        debug!(
            "Response {:?} directive '{}' message {:?}",
            response_type,
            protocol_type.letter(),
            message
        );

        Ok(Some(Response {
            response_type,
            message,
            protocol_type,
        }))
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    pub fn protocol_type(&self) -> ProtocolType {
        self.protocol_type
    }

    /// Raw text the remote sent after the status byte, newline included.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_ok(&self) -> bool {
        self.response_type == ResponseType::Ok
    }

    pub fn is_warning(&self) -> bool {
        self.response_type == ResponseType::Warning
    }

    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }

    pub fn is_failure(&self) -> bool {
        self.is_warning() || self.is_error()
    }

    pub fn is_permission(&self) -> bool {
        self.protocol_type == ProtocolType::Permission
    }

    pub fn is_time(&self) -> bool {
        self.protocol_type == ProtocolType::Time
    }

    pub fn no_standard_protocol_type(&self) -> bool {
        !(self.is_permission() || self.is_time())
    }

    /// Turns a warning or error into [`ScpError::RemoteFailure`].
    pub fn into_result(self) -> Result<Self, ScpError> {
        if self.is_failure() {
            Err(ScpError::RemoteFailure {
                kind: self.response_type,
                message: self.message,
            })
        } else {
            Ok(self)
        }
    }
}

fn read_line<R: Read + ?Sized>(reader: &mut R) -> Result<String, ScpError> {
    let mut line: Vec<u8> = Vec::new();
    let mut buffer: [u8; 1] = [0; 1];
    loop {
        reader.read_exact(&mut buffer)?;
        line.push(buffer[0]);
        if buffer[0] == LINE_TERMINATOR {
            break;
        }
        if line.len() > MAX_LINE_LENGTH {
            return Err(ScpError::ProtocolViolation(format!(
                "directive line longer than {} bytes",
                MAX_LINE_LENGTH
            )));
        }
    }
    Ok(String::from_utf8_lossy(&line).into_owned())
}
