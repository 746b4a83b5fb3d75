// Status bytes sent by the remote after every directive or payload
pub const SCP_OK: u8 = 0;
pub const SCP_WARNING: u8 = 1;
pub const SCP_ERROR: u8 = 2;

// Directive letters
pub const SCP_PERMISSION: u8 = b'C';
pub const SCP_TIME: u8 = b'T';
pub const SCP_ENTER_DIRECTORY: u8 = b'D';
pub const SCP_EXIT_DIRECTORY: u8 = b'E';

// Positional zero byte: ack, and end-of-payload terminator
pub const SCP_ACK: u8 = 0;

pub const LINE_TERMINATOR: u8 = b'\n';

// Payload is moved in chunks of this size so cancellation is checked between them
pub const PAYLOAD_CHUNK_SIZE: usize = 32 * 1024;

// Upper bound on a directive line, a runaway line means we are desynchronized
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

pub const DEFAULT_SSH_PORT: u16 = 22;
