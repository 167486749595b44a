//! A target that writes one line per message to a rotating file, in the
//! manner of `tracing-appender`'s `InnerAppender`: the file handle is
//! refreshed lazily, on the next write that crosses a rollover boundary,
//! rather than on a timer.

mod rotation;

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use logary_core::{Message, RuntimeInfo, TargetConf, TargetSink, Timestamp, TICKS_PER_SECOND};
use parking_lot::Mutex;

pub use rotation::Rotation;

fn to_utc(timestamp: Timestamp) -> DateTime<Utc> {
    let ticks = timestamp.ticks();
    let secs = ticks.div_euclid(TICKS_PER_SECOND);
    let subsec_ticks = ticks.rem_euclid(TICKS_PER_SECOND);
    Utc.timestamp_opt(secs, (subsec_ticks * 100) as u32)
        .single()
        .unwrap_or_else(Utc::now)
}

fn format_line(message: &Message, at: DateTime<Utc>) -> String {
    let mut line = format!(
        "{} {} [{}] {}",
        at.to_rfc3339(),
        message.level(),
        message.name(),
        message.value()
    );
    for (key, value) in message.context() {
        line.push_str(&format!(" {key}={value}"));
    }
    line
}

struct Inner {
    directory: PathBuf,
    prefix: String,
    rotation: Rotation,
    file: File,
    next_rollover: DateTime<Utc>,
}

impl Inner {
    fn open(directory: &PathBuf, prefix: &str, rotation: Rotation, now: DateTime<Utc>) -> io::Result<File> {
        fs::create_dir_all(directory)?;
        let path = directory.join(rotation.filename(prefix, &now));
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn new(directory: PathBuf, prefix: String, rotation: Rotation) -> io::Result<Self> {
        let now = Utc::now();
        let file = Self::open(&directory, &prefix, rotation, now)?;
        Ok(Inner {
            next_rollover: rotation.next_date(&now),
            directory,
            prefix,
            rotation,
            file,
        })
    }

    fn ensure_fresh(&mut self, now: DateTime<Utc>) -> io::Result<()> {
        if self.rotation.should_rollover(self.next_rollover, now) {
            self.file = Self::open(&self.directory, &self.prefix, self.rotation, now)?;
            self.next_rollover = self.rotation.next_date(&now);
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str, now: DateTime<Utc>) -> io::Result<()> {
        self.ensure_fresh(now)?;
        writeln!(self.file, "{line}")
    }
}

/// Writes one line per message to `{directory}/{prefix}[.{date}]`, rolling
/// to a new file per [`Rotation`].
///
/// File I/O runs on the blocking thread pool (`tokio::task::spawn_blocking`)
/// so a slow or contended filesystem never stalls the engine's async task.
pub struct FileSink {
    inner: Arc<Mutex<Inner>>,
}

impl FileSink {
    /// Opens (creating if necessary) the target file for writing.
    pub fn new(
        directory: impl Into<PathBuf>,
        prefix: impl Into<String>,
        rotation: Rotation,
    ) -> io::Result<Self> {
        let inner = Inner::new(directory.into(), prefix.into(), rotation)?;
        Ok(FileSink {
            inner: Arc::new(Mutex::new(inner)),
        })
    }

    /// A [`TargetConf`] factory building a [`FileSink`] rooted at
    /// `directory`, rotating per `rotation`. Fails construction (surfaced as
    /// `LogaryError::Configuration` by the registry) if the directory can't
    /// be created or the initial file can't be opened.
    pub fn target(
        name: impl Into<String>,
        directory: impl Into<PathBuf> + Clone + Send + Sync + 'static,
        prefix: impl Into<String> + Clone + Send + Sync + 'static,
        rotation: Rotation,
    ) -> TargetConf {
        TargetConf::new(name, move |_: &RuntimeInfo| {
            let sink = FileSink::new(directory.clone(), prefix.clone(), rotation)?;
            Ok(Box::new(sink) as Box<dyn TargetSink>)
        })
    }
}

#[async_trait]
impl TargetSink for FileSink {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let now = Utc::now();
            let line = format_line(&message, to_utc(message.timestamp()));
            inner.lock().write_line(&line, now)
        })
        .await??;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || inner.lock().file.flush()).await??;
        Ok(())
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logary_core::{LogLevel, PointName, Value};
    use std::io::Read;

    fn scratch_dir(case: &str) -> PathBuf {
        std::env::temp_dir().join(format!("logary-file-target-{case}-{}", std::process::id()))
    }

    fn read_all(path: &std::path::Path) -> String {
        let mut buf = String::new();
        File::open(path).unwrap().read_to_string(&mut buf).unwrap();
        buf
    }

    #[tokio::test]
    async fn send_appends_a_formatted_line() {
        let dir = scratch_dir("append");
        let _ = fs::remove_dir_all(&dir);
        let sink = FileSink::new(dir.clone(), "app.log", Rotation::Never).unwrap();

        let message = Message::event(PointName::new(["app"]), LogLevel::Info, Value::string("hi"))
            .with_context("n", 1i64);
        sink.send(message).await.unwrap();
        sink.flush().await.unwrap();

        let contents = read_all(&dir.join("app.log"));
        assert!(contents.contains("info [app] hi"));
        assert!(contents.contains("n=1"));
    }

    #[tokio::test]
    async fn never_rotation_keeps_a_single_file() {
        let dir = scratch_dir("never-rotation");
        let _ = fs::remove_dir_all(&dir);
        let sink = FileSink::new(dir.clone(), "app.log", Rotation::Never).unwrap();

        for i in 0..3 {
            let message = Message::event(
                PointName::new(["app"]),
                LogLevel::Info,
                Value::string(format!("line {i}")),
            );
            sink.send(message).await.unwrap();
        }
        sink.flush().await.unwrap();

        let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let contents = read_all(&dir.join("app.log"));
        assert_eq!(contents.lines().count(), 3);
    }
}
