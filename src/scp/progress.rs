use std::io::{Read, Write};

/// Receives byte counts from a [`ProgressStream`].
///
/// `transferred` is the running total through the stream, `delta` the size of
/// the operation that just completed.
pub trait ProgressObserver {
    fn on_progress(&self, transferred: u64, delta: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(u64, usize),
{
    fn on_progress(&self, transferred: u64, delta: usize) {
        self(transferred, delta)
    }
}

/// Pass-through reader/writer that counts bytes for an observer.
///
/// Every call goes straight to the wrapped stream: no buffering, errors come
/// back untouched, and the observer only hears about bytes that actually moved.
/// Wrap a payload source or destination in it to get progress; leave it out and
/// nothing else changes.
pub struct ProgressStream<S, O> {
    inner: S,
    observer: O,
    transferred: u64,
}

impl<S, O: ProgressObserver> ProgressStream<S, O> {
    pub fn new(inner: S, observer: O) -> Self {
        Self {
            inner,
            observer,
            transferred: 0,
        }
    }

    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn record(&mut self, n: usize) {
        if n > 0 {
            self.transferred += n as u64;
            self.observer.on_progress(self.transferred, n);
        }
    }
}

impl<S: Read, O: ProgressObserver> Read for ProgressStream<S, O> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.record(n);
        Ok(n)
    }
}

impl<S: Write, O: ProgressObserver> Write for ProgressStream<S, O> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.record(n);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
