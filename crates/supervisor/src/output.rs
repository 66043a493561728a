//! Draining daemon stdout/stderr.
//!
//! The daemon logs continuously; its pipes must be read or it blocks once
//! they fill. Every line is forwarded to `tracing` under the `daemon` target
//! and the most recent ones are kept for error reports.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Lines retained for error reporting.
pub(crate) const TAIL_LINES: usize = 64;

/// Max time to wait for the drain tasks to hit EOF after the child exited.
const FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// Ring buffer of the last [`TAIL_LINES`] output lines.
#[derive(Debug, Clone, Default)]
pub(crate) struct OutputTail {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl OutputTail {
    pub(crate) fn push(&self, line: String) {
        let mut lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if lines.len() == TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Joined contents, oldest line first.
    pub(crate) fn text(&self) -> String {
        let lines = match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

/// Background readers attached to one child process.
pub(crate) struct OutputDrain {
    tail: OutputTail,
    tasks: Vec<JoinHandle<()>>,
}

impl OutputDrain {
    pub(crate) fn new() -> Self {
        Self {
            tail: OutputTail::default(),
            tasks: Vec::new(),
        }
    }

    /// Spawns a reader for one pipe. `stream` labels the log records.
    pub(crate) fn attach<R>(&mut self, reader: R, stream: &'static str)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let tail = self.tail.clone();
        self.tasks.push(tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        tracing::debug!(target: "daemon", stream, "{line}");
                        tail.push(line);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::debug!(target: "daemon", stream, "read error: {e}");
                        break;
                    }
                }
            }
        }));
    }

    /// Waits briefly for the readers to finish, then returns the tail.
    ///
    /// Only meaningful once the child has exited; readers still blocked
    /// after [`FLUSH_TIMEOUT`] (e.g. a grandchild holding the pipe) are
    /// abandoned.
    pub(crate) async fn finish(self) -> String {
        for task in self.tasks {
            let abort = task.abort_handle();
            if tokio::time::timeout(FLUSH_TIMEOUT, task).await.is_err() {
                abort.abort();
            }
        }
        self.tail.text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_most_recent_lines() {
        let tail = OutputTail::default();
        for i in 0..(TAIL_LINES + 10) {
            tail.push(format!("line {i}"));
        }
        let text = tail.text();
        assert!(!text.contains("line 9\n"));
        assert!(text.starts_with("line 10\n"));
        assert!(text.ends_with(&format!("line {}", TAIL_LINES + 9)));
        assert_eq!(text.lines().count(), TAIL_LINES);
    }

    #[test]
    fn empty_tail_is_empty_text() {
        assert_eq!(OutputTail::default().text(), "");
    }

    #[tokio::test]
    async fn drain_collects_all_streams() {
        let mut drain = OutputDrain::new();
        drain.attach(&b"first\nsecond\n"[..], "stdout");
        let text = drain.finish().await;
        assert_eq!(text, "first\nsecond");
    }
}
