use std::io::Write;
use std::sync::{Arc, Mutex};

/// Injectable sink for the streamed progress protocol
/// ("Executing: X", "Skipping: X (condition not met)", ...).
///
/// The surrounding CLI/UI and the acceptance tests depend on this textual
/// output; diagnostic logging goes through `tracing` instead.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// In-memory sink for tests, paired with a handle to read it back.
    pub fn capture() -> (Self, CapturedOutput) {
        let buffer: Arc<Mutex<Vec<u8>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Self::new(Box::new(SharedBuffer(Arc::clone(&buffer))));
        (sink, CapturedOutput(buffer))
    }

    /// Write one line of protocol text. Write failures are swallowed; the
    /// sink must never abort an execution.
    pub fn line(&self, text: impl AsRef<str>) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = writeln!(writer, "{}", text.as_ref());
            let _ = writer.flush();
        }
    }

    /// Write raw text without a trailing newline.
    pub fn write(&self, text: impl AsRef<str>) {
        if let Ok(mut writer) = self.inner.lock() {
            let _ = write!(writer, "{}", text.as_ref());
            let _ = writer.flush();
        }
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::stdout()
    }
}

/// Read handle over a captured sink's contents.
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_lines_in_order() {
        let (sink, captured) = OutputSink::capture();
        sink.line("Executing: check-nginx");
        sink.line("Executing: check-api");
        assert_eq!(
            captured.contents(),
            "Executing: check-nginx\nExecuting: check-api\n"
        );
    }

    #[test]
    fn clones_share_one_buffer() {
        let (sink, captured) = OutputSink::capture();
        let other = sink.clone();
        sink.line("one");
        other.line("two");
        assert_eq!(captured.contents(), "one\ntwo\n");
    }
}
