use super::ack::{send_ack, send_failure};
use super::cancel::Context;
use super::constants::*;
use super::directive::FileInfos;
use super::error::ScpError;
use super::response::{ProtocolType, Response, ResponseType};
use log::{debug, info, warn};
use std::io::{Read, Write};

/// A file the remote or the local side refused, while the session went on.
#[derive(Debug)]
pub struct FileFailure {
    pub filename: String,
    pub error: ScpError,
}

/// Per-file outcome of a batch upload or a download.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub completed: Vec<FileInfos>,
    pub failed: Vec<FileFailure>,
}

impl TransferReport {
    pub fn bytes(&self) -> u64 {
        self.completed.iter().map(|f| f.size).sum()
    }

    pub fn extend(&mut self, other: TransferReport) {
        self.completed.extend(other.completed);
        self.failed.extend(other.failed);
    }

    fn record(&mut self, filename: &str, error: ScpError) {
        warn!("Transfer of {:?} failed: {}", filename, error);
        self.failed.push(FileFailure {
            filename: filename.to_string(),
            error,
        });
    }
}

/// Drives one scp exchange over an exclusively owned transport.
///
/// The exchange is strictly half-duplex: nothing is sent before the reply to
/// the previous step has been read. After any session-fatal error the transfer
/// refuses further work and the transport should be discarded.
pub struct ScpTransfer<T: Read + Write> {
    transport: T,
    ctx: Context,
    terminated: bool,
}

impl<T: Read + Write> ScpTransfer<T> {
    pub fn new(transport: T, ctx: Context) -> Self {
        Self {
            transport,
            ctx,
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn get_ref(&self) -> &T {
        &self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Sends one file (source mode). `source` must yield at least
    /// `infos.size` bytes; wrap it in a
    /// [`ProgressStream`](super::progress::ProgressStream) to observe them.
    /// A filename that cannot travel in a directive (empty, `..`, or holding
    /// `/` or a newline) fails this file only and nothing is written.
    pub fn upload_file<R: Read>(&mut self, infos: &FileInfos, source: R) -> Result<(), ScpError> {
        self.ensure_usable()?;
        let result = self.send_file(infos, source);
        self.guard(result)
    }

    /// Uploads each file in turn. Files the remote refuses with a warning are
    /// reported and skipped; the first session-fatal error stops the batch.
    pub fn upload_files<R, I>(&mut self, files: I) -> Result<TransferReport, ScpError>
    where
        R: Read,
        I: IntoIterator<Item = (FileInfos, R)>,
    {
        let mut report = TransferReport::default();
        for (infos, source) in files {
            match self.upload_file(&infos, source) {
                Ok(()) => report.completed.push(infos),
                Err(e) if !e.is_session_fatal() => report.record(&infos.filename, e),
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Opens a directory on the remote; everything uploaded until the matching
    /// [`exit_directory`](Self::exit_directory) lands inside it. A warning here
    /// means the directory was refused and its contents should be skipped.
    pub fn enter_directory(&mut self, infos: &FileInfos) -> Result<(), ScpError> {
        self.ensure_usable()?;
        check_filename(&infos.filename)?;
        let result = self.send_directive(&infos.enter_directory_line());
        self.guard(result)
    }

    pub fn exit_directory(&mut self) -> Result<(), ScpError> {
        self.ensure_usable()?;
        let result = self.send_directive(&FileInfos::exit_directory_line());
        self.guard(result)
    }

    /// Receives files (sink mode) until the remote closes the stream.
    ///
    /// `open_sink` is called with the merged metadata of each incoming file and
    /// returns where its payload goes. If it fails, the remote is told with a
    /// warning and the file is skipped.
    pub fn download<W, F>(&mut self, mut open_sink: F) -> Result<TransferReport, ScpError>
    where
        W: Write,
        F: FnMut(&FileInfos) -> Result<W, ScpError>,
    {
        self.ensure_usable()?;
        let result = self.receive_files(&mut open_sink);
        self.guard(result)
    }

    fn ensure_usable(&self) -> Result<(), ScpError> {
        if self.terminated {
            return Err(ScpError::SessionTerminated);
        }
        Ok(())
    }

    fn guard<R>(&mut self, result: Result<R, ScpError>) -> Result<R, ScpError> {
        if let Err(e) = &result {
            if e.is_session_fatal() {
                warn!("Session terminated: {}", e);
                self.terminated = true;
            }
        }
        result
    }

    fn send_file<R: Read>(&mut self, infos: &FileInfos, source: R) -> Result<(), ScpError> {
        check_filename(&infos.filename)?;
        if infos.has_times() {
            self.send_directive(&infos.time_line())?;
        }
        self.send_directive(&infos.permission_line())?;

        self.send_payload(source, infos.size)?;

        // End of payload; same wire byte as an ack
        self.ctx.check()?;
        send_ack(&mut self.transport)?;
        self.expect_ok()?;

        info!("Sent {} ({} bytes)", infos.filename, infos.size);
        Ok(())
    }

    fn send_directive(&mut self, line: &str) -> Result<(), ScpError> {
        self.ctx.check()?;
        debug!("Sending directive {:?}", line);
        self.transport.write_all(line.as_bytes())?;
        self.transport.flush()?;
        self.expect_ok()
    }

    fn send_payload<R: Read>(&mut self, mut source: R, size: u64) -> Result<(), ScpError> {
        let mut buffer = vec![0u8; chunk_len(size)];
        let mut remaining = size;
        while remaining > 0 {
            self.ctx.check()?;
            let want = remaining.min(buffer.len() as u64) as usize;
            let n = match source.read(&mut buffer[..want]) {
                Ok(0) => {
                    return Err(ScpError::Transport(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!(
                            "payload source ended after {} of {} bytes",
                            size - remaining,
                            size
                        ),
                    )))
                }
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScpError::Transport(e)),
            };
            self.transport.write_all(&buffer[..n])?;
            remaining -= n as u64;
        }
        self.transport.flush()?;
        Ok(())
    }

    fn receive_files<W, F>(&mut self, open_sink: &mut F) -> Result<TransferReport, ScpError>
    where
        W: Write,
        F: FnMut(&FileInfos) -> Result<W, ScpError>,
    {
        let mut report = TransferReport::default();
        let mut pending = FileInfos::default();

        self.ack()?;
        loop {
            self.ctx.check()?;
            let response = match Response::try_parse(&mut self.transport)? {
                Some(response) => response,
                None => break,
            };

            if response.is_failure() {
                let failure = ScpError::RemoteFailure {
                    kind: response.response_type(),
                    message: response.message().to_string(),
                };
                if failure.is_session_fatal() {
                    return Err(failure);
                }
                report.record(&pending.filename, failure);
                pending = FileInfos::default();
                continue;
            }

            match response.protocol_type() {
                ProtocolType::Time => match response.parse_file_time() {
                    Ok(time) => {
                        pending = pending.update(&time);
                        self.ack()?;
                    }
                    Err(e) => {
                        self.reject(&e.to_string())?;
                        report.record(&pending.filename, e.into());
                        pending = FileInfos::default();
                    }
                },
                ProtocolType::Permission => {
                    let infos = match response.parse_file_infos() {
                        Ok(parsed) => pending.update(&parsed),
                        Err(e) => {
                            self.reject(&e.to_string())?;
                            report.record(&pending.filename, e.into());
                            pending = FileInfos::default();
                            continue;
                        }
                    };
                    pending = FileInfos::default();

                    match self.receive_file(&infos, open_sink) {
                        Ok(()) => report.completed.push(infos),
                        Err(e) if !e.is_session_fatal() => report.record(&infos.filename, e),
                        Err(e) => return Err(e),
                    }
                }
                ProtocolType::None => {
                    return Err(ScpError::ProtocolViolation(
                        "expected a permission or time directive".to_string(),
                    ))
                }
            }
        }

        if pending != FileInfos::default() {
            return Err(ScpError::ProtocolViolation(
                "stream ended between a time directive and its file".to_string(),
            ));
        }
        Ok(report)
    }

    fn receive_file<W, F>(&mut self, infos: &FileInfos, open_sink: &mut F) -> Result<(), ScpError>
    where
        W: Write,
        F: FnMut(&FileInfos) -> Result<W, ScpError>,
    {
        let mut sink = match open_sink(infos) {
            Ok(sink) => sink,
            Err(e) => {
                self.reject(&e.to_string())?;
                return Err(e);
            }
        };

        self.ack()?;
        let write_error = self.receive_payload(&mut sink, infos.size)?;

        // Terminator sent by the remote after the payload
        let terminator = self.expect_ok();
        if let Err(e) = &terminator {
            if e.is_session_fatal() {
                return terminator;
            }
        }

        match write_error {
            Some(source) => {
                self.reject(&source.to_string())?;
                Err(ScpError::LocalFile {
                    path: infos.filename.clone(),
                    source,
                })
            }
            None => {
                self.ack()?;
                if terminator.is_ok() {
                    info!("Received {} ({} bytes)", infos.filename, infos.size);
                }
                terminator
            }
        }
    }

    /// Reads exactly `size` payload bytes. A failing sink does not stop the
    /// read, the bytes still have to be drained to stay in step with the remote.
    fn receive_payload<W: Write>(
        &mut self,
        sink: &mut W,
        size: u64,
    ) -> Result<Option<std::io::Error>, ScpError> {
        let mut buffer = vec![0u8; chunk_len(size)];
        let mut remaining = size;
        let mut write_error: Option<std::io::Error> = None;

        while remaining > 0 {
            self.ctx.check()?;
            let want = remaining.min(buffer.len() as u64) as usize;
            self.transport.read_exact(&mut buffer[..want])?;
            if write_error.is_none() {
                if let Err(e) = sink.write_all(&buffer[..want]) {
                    warn!("Local write failed, draining remaining payload: {}", e);
                    write_error = Some(e);
                }
            }
            remaining -= want as u64;
        }

        if write_error.is_none() {
            write_error = sink.flush().err();
        }
        Ok(write_error)
    }

    fn expect_ok(&mut self) -> Result<(), ScpError> {
        self.ctx.check()?;
        let response = Response::parse(&mut self.transport)?.into_result()?;
        if !response.no_standard_protocol_type() {
            return Err(ScpError::ProtocolViolation(format!(
                "expected an acknowledgement, got a '{}' directive",
                response.protocol_type().letter()
            )));
        }
        Ok(())
    }

    fn ack(&mut self) -> Result<(), ScpError> {
        self.ctx.check()?;
        send_ack(&mut self.transport)
    }

    fn reject(&mut self, message: &str) -> Result<(), ScpError> {
        self.ctx.check()?;
        debug!("Rejecting file: {}", message);
        send_failure(&mut self.transport, ResponseType::Warning, message)
    }
}

/// A name the remote cannot take as a single path component. A newline would
/// end the directive early and the rest of the name would be read as the next
/// one.
fn check_filename(filename: &str) -> Result<(), ScpError> {
    if filename.is_empty() || filename == ".." || filename.contains(['\n', '/']) {
        return Err(ScpError::LocalFile {
            path: filename.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "filename cannot be sent in a directive",
            ),
        });
    }
    Ok(())
}

fn chunk_len(size: u64) -> usize {
    usize::try_from(size)
        .unwrap_or(usize::MAX)
        .min(PAYLOAD_CHUNK_SIZE)
}
