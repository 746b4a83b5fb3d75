use std::collections::VecDeque;
use std::io::{Read, Write};

/// In-memory remote: reads come from `read_data`, writes pile up in
/// `written_data`.
#[derive(Default)]
pub struct MockChannel {
    pub read_data: VecDeque<u8>,
    pub written_data: Vec<u8>,
    pub should_fail: bool,
    pub fail_writes_after: Option<usize>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        self.read_data = VecDeque::from(data.to_vec());
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    pub fn with_write_limit(mut self, bytes: usize) -> Self {
        self.fail_writes_after = Some(bytes);
        self
    }

    pub fn push_read_data(&mut self, data: &[u8]) {
        self.read_data.extend(data);
    }

    pub fn get_written_data(&self) -> &[u8] {
        &self.written_data
    }
}

impl Read for MockChannel {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.should_fail {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Mock failure",
            ));
        }
        let n = buf.len().min(self.read_data.len());
        for (slot, byte) in buf.iter_mut().zip(self.read_data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockChannel {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.should_fail {
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Mock write failure",
            ));
        }
        if let Some(limit) = self.fail_writes_after {
            if self.written_data.len() + buf.len() > limit {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "Mock storage full",
                ));
            }
        }
        self.written_data.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
