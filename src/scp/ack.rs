use super::constants::*;
use super::error::ScpError;
use super::response::ResponseType;
use std::io::Write;

/// Writes a single zero byte. Does not wait for the remote: a separate
/// [`Response::parse`](super::response::Response::parse) is needed to learn
/// whether it was accepted.
pub fn send_ack<W: Write + ?Sized>(writer: &mut W) -> Result<(), ScpError> {
    let msg = [SCP_ACK];
    let n = writer.write(&msg)?;
    if n < msg.len() {
        return Err(ScpError::Transport(std::io::Error::new(
            std::io::ErrorKind::WriteZero,
            "failed to write ack buffer",
        )));
    }
    writer.flush()?;
    Ok(())
}

/// Tells the remote we could not take the current file. Uses the same
/// framing the remote uses for its own failures: status byte, text, newline.
pub fn send_failure<W: Write + ?Sized>(
    writer: &mut W,
    kind: ResponseType,
    message: &str,
) -> Result<(), ScpError> {
    let status = match kind {
        ResponseType::Warning => SCP_WARNING,
        ResponseType::Error => SCP_ERROR,
        ResponseType::Ok => {
            return Err(ScpError::ProtocolViolation(
                "a failure reply needs a warning or error status".to_string(),
            ))
        }
    };

    let mut packet: Vec<u8> = Vec::with_capacity(message.len() + 2);
    packet.push(status);
    packet.extend(message.replace('\n', " ").trim_end().as_bytes());
    packet.push(LINE_TERMINATOR);

    writer.write_all(&packet)?;
    writer.flush()?;
    Ok(())
}
