// tests/integration/test_utils.rs
use ferric_scp::client::ScpClient;
use ferric_scp::scp::ScpError;
use std::collections::VecDeque;
use std::io::{Read, Write};

/// Scripted remote: plays back `incoming` and records what the client sends.
#[derive(Default)]
pub struct ScriptedRemote {
    pub incoming: VecDeque<u8>,
    pub outgoing: Vec<u8>,
}

impl ScriptedRemote {
    pub fn new(incoming: &[u8]) -> Self {
        Self {
            incoming: incoming.iter().copied().collect(),
            outgoing: Vec::new(),
        }
    }
}

impl Read for ScriptedRemote {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = buf.len().min(self.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(self.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedRemote {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.outgoing.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Remote that sends `payload` as one file named `name`, the way `scp -f` does.
pub fn source_script(name: &str, mode: &str, payload: &[u8], times: Option<(i64, i64)>) -> Vec<u8> {
    let mut script = Vec::new();
    if let Some((atime, mtime)) = times {
        script.extend_from_slice(format!("T{} 0 {} 0\n", atime, mtime).as_bytes());
    }
    script.extend_from_slice(format!("C{} {} {}\n", mode, payload.len(), name).as_bytes());
    script.extend_from_slice(payload);
    script.push(0);
    script
}

pub fn connect_to_test_server() -> Result<ScpClient, ScpError> {
    let host = std::env::var("SCP_TEST_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = std::env::var("SCP_TEST_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(2222);
    let user = std::env::var("SCP_TEST_USER").unwrap_or_else(|_| "scptest".to_string());
    let password = std::env::var("SCP_TEST_PASSWORD").unwrap_or_else(|_| "pass".to_string());
    ScpClient::connect(&host, port, &user, Some(&password))
}
