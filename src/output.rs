use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Line-oriented advisory surface. The pipeline emits notices through this
/// ("cookbook already installed: ...") but never depends on delivery for
/// correctness, so write errors are dropped.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Output {
    pub fn stdout() -> Self {
        Self::sink(Box::new(std::io::stdout()))
    }

    pub fn sink(writer: Box<dyn Write + Send>) -> Self {
        Self {
            sink: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn say(&self, line: impl AsRef<str>) {
        let mut sink = self.sink.lock();
        let _ = writeln!(sink, "{}", line.as_ref());
        let _ = sink.flush();
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}
