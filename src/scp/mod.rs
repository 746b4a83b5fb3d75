pub mod ack;
pub mod cancel;
pub mod constants;
pub mod directive;
pub mod error;
pub mod progress;
pub mod response;
pub mod transfer;

#[cfg(test)]
mod test_utils;

pub use ack::{send_ack, send_failure};
pub use cancel::{CancelHandle, Context};
pub use directive::FileInfos;
pub use error::{DirectiveParseError, ScpError};
pub use progress::{ProgressObserver, ProgressStream};
pub use response::{ProtocolType, Response, ResponseType};
pub use transfer::{FileFailure, ScpTransfer, TransferReport};
