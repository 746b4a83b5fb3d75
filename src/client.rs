use crate::scp::{Context, ScpError, ScpTransfer};
use log::info;
use ssh2::{Channel, Session};
use std::net::TcpStream;
use std::time::Duration;

/// Which end of the exchange the remote `scp` plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteMode {
    /// Remote receives (`scp -t`), we upload.
    Sink,
    /// Remote sends (`scp -f`), we download.
    Source,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoteOptions {
    pub recursive: bool,
    pub preserve_times: bool,
}

/// Authenticated SSH session that hands out one scp transfer per channel.
pub struct ScpClient {
    session: Session,
}

impl ScpClient {
    pub fn connect(
        host: &str,
        port: u16,
        user: &str,
        password: Option<&str>,
    ) -> Result<Self, ScpError> {
        let tcp = TcpStream::connect((host, port))?;

        let mut session = Session::new().map_err(std::io::Error::from)?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(std::io::Error::from)?;

        match password {
            Some(password) => session.userauth_password(user, password),
            None => session.userauth_agent(user),
        }
        .map_err(std::io::Error::from)?;

        if !session.authenticated() {
            return Err(ScpError::Transport(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "SSH authentication failed",
            )));
        }

        info!("SSH connection to {}:{} successful", host, port);
        Ok(Self::from_session(session))
    }

    pub fn from_session(session: Session) -> Self {
        Self { session }
    }

    /// Starts the remote `scp` on a fresh channel. Blocking calls on the
    /// session are bounded by what is left of the context's deadline.
    pub fn open(
        &self,
        mode: RemoteMode,
        remote_path: &str,
        options: RemoteOptions,
        ctx: Context,
    ) -> Result<ScpTransfer<Channel>, ScpError> {
        ctx.check()?;
        if let Some(remaining) = ctx.remaining() {
            self.session.set_timeout(timeout_millis(remaining));
        }

        let command = remote_command(mode, remote_path, options);
        info!("Executing {:?}", command);

        let mut channel = self
            .session
            .channel_session()
            .map_err(std::io::Error::from)?;
        channel.exec(&command).map_err(std::io::Error::from)?;

        Ok(ScpTransfer::new(channel, ctx))
    }

    /// Closes the channel of a finished transfer and returns the exit status
    /// of the remote `scp`.
    pub fn finish(transfer: ScpTransfer<Channel>) -> Result<i32, ScpError> {
        let mut channel = transfer.into_inner();
        channel.send_eof().map_err(std::io::Error::from)?;
        channel.wait_eof().map_err(std::io::Error::from)?;
        channel.close().map_err(std::io::Error::from)?;
        channel.wait_close().map_err(std::io::Error::from)?;
        Ok(channel.exit_status().map_err(std::io::Error::from)?)
    }
}

pub fn remote_command(mode: RemoteMode, remote_path: &str, options: RemoteOptions) -> String {
    let mut command = String::from("scp");
    // Directory records from a recursive source are not accepted on download
    if options.recursive && mode == RemoteMode::Sink {
        command.push_str(" -r");
    }
    if options.preserve_times {
        command.push_str(" -p");
    }
    command.push_str(match mode {
        RemoteMode::Sink => " -t",
        RemoteMode::Source => " -f",
    });
    command.push_str(" -- ");
    command.push_str(&shell_quote(remote_path));
    command
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

// ssh2 treats 0 as "no timeout", so an expired deadline becomes 1ms
fn timeout_millis(remaining: Duration) -> u32 {
    u32::try_from(remaining.as_millis())
        .unwrap_or(u32::MAX)
        .max(1)
}
