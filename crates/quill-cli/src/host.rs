//! Terminal host: console text on stdout, canvas commands as JSON lines,
//! real timers, files and processes through tokio.

use std::cell::Cell;
use std::io::{self, Write};
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use quill_lang::{CanvasCommand, DirEntry, EntryKind, Host};

pub struct TerminalHost {
    /// Print canvas commands instead of just counting them.
    show_canvas: bool,
    canvas_commands: Cell<usize>,
}

impl TerminalHost {
    pub fn new(show_canvas: bool) -> Self {
        Self { show_canvas, canvas_commands: Cell::new(0) }
    }

    pub fn canvas_commands(&self) -> usize {
        self.canvas_commands.get()
    }
}

/// Negative, NaN and out-of-range waits do not sleep.
fn wait_duration(ms: f64) -> Duration {
    Duration::try_from_secs_f64(ms / 1000.0).unwrap_or_default()
}

impl Host for TerminalHost {
    fn output(&self, chunk: &str) {
        let mut out = io::stdout().lock();
        if let Err(e) = out.write_all(chunk.as_bytes()).and_then(|()| out.flush()) {
            log::warn!("stdout: {e}");
        }
    }

    fn canvas(&self, command: CanvasCommand) {
        self.canvas_commands.set(self.canvas_commands.get() + 1);
        if !self.show_canvas {
            return;
        }
        match serde_json::to_string(&command) {
            Ok(line) => self.output(&format!("{line}\n")),
            Err(e) => log::warn!("canvas command: {e}"),
        }
    }

    fn clear_console(&self) {
        self.output("\x1b[2J\x1b[H");
    }

    fn wait(&self, ms: f64) -> LocalBoxFuture<'_, ()> {
        tokio::time::sleep(wait_duration(ms)).boxed_local()
    }

    fn read_file(&self, path: String) -> LocalBoxFuture<'_, io::Result<String>> {
        tokio::fs::read_to_string(path).boxed_local()
    }

    fn write_file(&self, path: String, contents: String) -> LocalBoxFuture<'_, io::Result<()>> {
        tokio::fs::write(path, contents).boxed_local()
    }

    fn read_dir(&self, path: String) -> LocalBoxFuture<'_, io::Result<Vec<DirEntry>>> {
        async move {
            let mut dir = tokio::fs::read_dir(path).await?;
            let mut entries = Vec::new();
            while let Some(entry) = dir.next_entry().await? {
                let kind = if entry.file_type().await?.is_dir() {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                };
                entries.push(DirEntry { entry: entry.file_name().to_string_lossy().into_owned(), kind });
            }
            entries.sort_by(|a, b| a.entry.cmp(&b.entry));
            Ok(entries)
        }
        .boxed_local()
    }

    fn exec(&self, command: String) -> LocalBoxFuture<'_, io::Result<String>> {
        async move {
            log::debug!("exec: {command}");
            let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
            let out = tokio::process::Command::new(shell).arg(flag).arg(&command).output().await?;
            if !out.status.success() {
                let stderr = String::from_utf8_lossy(&out.stderr);
                return Err(io::Error::other(format!("`{command}` failed ({}): {}", out.status, stderr.trim())));
            }
            Ok(String::from_utf8_lossy(&out.stdout).into_owned())
        }
        .boxed_local()
    }
}
