//! Console reporting

use std::io::{self, Write};

/// Writes the tagged status lines users read on stdout
pub struct Reporter {
    out: Box<dyn Write + Send>,
}

impl Reporter {
    /// Report to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn success(&mut self, message: &str) {
        self.tagged("SUCCESS", message);
    }

    pub fn fail(&mut self, message: &str) {
        self.tagged("FAIL", message);
    }

    pub fn error(&mut self, message: &str) {
        self.tagged("ERROR", message);
    }

    pub fn info(&mut self, message: &str) {
        self.tagged("INFO", message);
    }

    pub fn debug(&mut self, message: &str) {
        self.tagged("DEBUG", message);
    }

    /// Print a line verbatim
    pub fn plain(&mut self, message: &str) {
        self.line(message);
    }

    fn tagged(&mut self, tag: &str, message: &str) {
        self.line(&format!("[{}] {}", tag, message));
    }

    fn line(&mut self, text: &str) {
        // stdout going away must not abort a check
        let _ = writeln!(self.out, "{}", text).and_then(|_| self.out.flush());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tagged_lines() {
        let capture = Capture::default();
        let mut reporter = Reporter::new(capture.clone());

        reporter.success("Dashboard test");
        reporter.fail("Login test");
        reporter.plain("\t[SUCCESS] Wazuh API auth token obtained");

        let text = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            text,
            "[SUCCESS] Dashboard test\n[FAIL] Login test\n\t[SUCCESS] Wazuh API auth token obtained\n"
        );
    }
}
