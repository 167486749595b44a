//! A target that formats messages one line per event and writes them to
//! stdout or stderr, guarded by a single lock so concurrent writers never
//! interleave mid-line.

use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use logary_core::{Message, RuntimeInfo, TargetConf, TargetSink, Value};

/// Picks which stream [`ConsoleSink`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

enum Writer {
    Stdout(io::Stdout),
    Stderr(io::Stderr),
}

impl Write for Writer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Writer::Stdout(w) => w.write(buf),
            Writer::Stderr(w) => w.write(buf),
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Writer::Stdout(w) => w.flush(),
            Writer::Stderr(w) => w.flush(),
        }
    }
}

/// Formats a message as `level [name] value {key=value, ...}` and writes it
/// as a single line.
pub struct ConsoleSink {
    writer: Mutex<Writer>,
}

impl ConsoleSink {
    /// Builds a sink writing to `stream`.
    pub fn new(stream: Stream) -> Self {
        let writer = match stream {
            Stream::Stdout => Writer::Stdout(io::stdout()),
            Stream::Stderr => Writer::Stderr(io::stderr()),
        };
        ConsoleSink {
            writer: Mutex::new(writer),
        }
    }

    /// A [`TargetConf`] factory ignoring `RuntimeInfo`, writing to stdout.
    pub fn target(name: impl Into<String>) -> TargetConf {
        TargetConf::new(name, |_: &RuntimeInfo| {
            Ok(Box::new(ConsoleSink::new(Stream::Stdout)) as Box<dyn TargetSink>)
        })
    }

    fn format(message: &Message) -> String {
        let mut line = format!(
            "{} [{}] {}",
            message.level(),
            message.name(),
            message.value()
        );
        if !message.context().is_empty() {
            line.push_str(" {");
            for (i, (key, value)) in message.context().iter().enumerate() {
                if i > 0 {
                    line.push_str(", ");
                }
                line.push_str(key);
                line.push('=');
                line.push_str(&value.to_string());
            }
            line.push('}');
        }
        line
    }
}

#[async_trait]
impl TargetSink for ConsoleSink {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        let line = Self::format(&message);
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", line)?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.writer.lock().unwrap().flush()?;
        Ok(())
    }
}
