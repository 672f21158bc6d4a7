//! Streaming sink (§4.7): a lazy, append-only line-framed accumulator. No backing buffer or
//! batching timer is allocated until the first write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Default)]
struct Buffer {
    drained_lines: Vec<String>,
    pending: Vec<String>,
    partial: String,
}

/// A single document's streaming sink. Cloning shares the backing buffer (cheap, `Arc`-backed).
#[derive(Clone)]
pub struct Sink {
    buffer: Arc<Mutex<Option<Buffer>>>,
    on_line: Arc<dyn Fn(&str) + Send + Sync>,
    is_visible: Arc<dyn Fn() -> bool + Send + Sync>,
    flush_interval: Duration,
    timer: Arc<Mutex<Option<JoinHandle<()>>>>,
    destroy_requested: Arc<AtomicBool>,
    destroyed: Arc<AtomicBool>,
}

impl Sink {
    /// `on_line` fires once per complete line, synchronously with the write that completed it.
    /// `is_visible` reports whether the backing store is currently shown to a user; `destroy()`
    /// defers until it reports `false`.
    pub fn new(
        on_line: impl Fn(&str) + Send + Sync + 'static,
        is_visible: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(None)),
            on_line: Arc::new(on_line),
            is_visible: Arc::new(is_visible),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            timer: Arc::new(Mutex::new(None)),
            destroy_requested: Arc::new(AtomicBool::new(false)),
            destroyed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    fn is_locked_out(&self) -> bool {
        self.destroy_requested.load(Ordering::Acquire)
    }

    /// Appends raw data, splitting on `\n`. Any trailing partial line is buffered.
    pub fn write(&self, chunk: &str) {
        if self.is_locked_out() {
            return;
        }
        let mut emitted = Vec::new();
        {
            let mut guard = self.buffer.lock().unwrap();
            let buf = guard.get_or_insert_with(Buffer::default);
            let mut rest = chunk;
            while let Some(i) = rest.find('\n') {
                let mut line = std::mem::take(&mut buf.partial);
                line.push_str(&rest[..i]);
                buf.pending.push(line.clone());
                emitted.push(line);
                rest = &rest[i + 1..];
            }
            buf.partial.push_str(rest);
        }
        for line in &emitted {
            (self.on_line)(line);
        }
        self.ensure_timer();
    }

    /// Appends pre-framed lines, first flushing any buffered partial line.
    pub fn write_lines(&self, lines: &[String]) {
        if self.is_locked_out() {
            return;
        }
        let mut emitted = Vec::new();
        {
            let mut guard = self.buffer.lock().unwrap();
            let buf = guard.get_or_insert_with(Buffer::default);
            if !buf.partial.is_empty() {
                let partial = std::mem::take(&mut buf.partial);
                buf.pending.push(partial.clone());
                emitted.push(partial);
            }
            for line in lines {
                buf.pending.push(line.clone());
                emitted.push(line.clone());
            }
        }
        for line in &emitted {
            (self.on_line)(line);
        }
        self.ensure_timer();
    }

    /// Promotes a buffered partial line to a complete line, firing `on_line` for it.
    pub fn flush(&self) {
        if self.is_locked_out() {
            return;
        }
        let mut emitted = None;
        {
            let mut guard = self.buffer.lock().unwrap();
            if let Some(buf) = guard.as_mut() {
                if !buf.partial.is_empty() {
                    let line = std::mem::take(&mut buf.partial);
                    buf.pending.push(line.clone());
                    emitted = Some(line);
                }
            }
        }
        if let Some(line) = emitted {
            (self.on_line)(&line);
        }
    }

    /// Full accumulated content: `drained_lines ++ pending ++ partial`.
    pub fn read(&self) -> String {
        let guard = self.buffer.lock().unwrap();
        let Some(buf) = guard.as_ref() else { return String::new() };
        let mut out = buf.drained_lines.join("\n");
        for line in &buf.pending {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(line);
        }
        if !buf.partial.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&buf.partial);
        }
        out
    }

    /// Like [`Self::read`], but returns complete lines; the partial is included only if
    /// non-empty.
    pub fn read_lines(&self) -> Vec<String> {
        let guard = self.buffer.lock().unwrap();
        let Some(buf) = guard.as_ref() else { return Vec::new() };
        let mut lines: Vec<String> = buf.drained_lines.iter().chain(buf.pending.iter()).cloned().collect();
        if !buf.partial.is_empty() {
            lines.push(buf.partial.clone());
        }
        lines
    }

    fn drain_to_store(&self) {
        let mut guard = self.buffer.lock().unwrap();
        if let Some(buf) = guard.as_mut() {
            buf.drained_lines.append(&mut buf.pending);
        }
    }

    fn ensure_timer(&self) {
        let mut handle_guard = self.timer.lock().unwrap();
        if handle_guard.is_some() {
            return;
        }
        let buffer = self.buffer.clone();
        let destroyed = self.destroyed.clone();
        let interval_dur = self.flush_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval_dur);
            ticker.tick().await; // the first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                if destroyed.load(Ordering::Acquire) {
                    break;
                }
                if let Some(buf) = buffer.lock().unwrap().as_mut() {
                    buf.drained_lines.append(&mut buf.pending);
                }
            }
        });
        *handle_guard = Some(handle);
    }

    /// Flushes, stops the batching timer, and releases the backing buffer. Deferred while
    /// `is_visible` reports true; call [`Self::on_visibility_changed`] once it no longer does.
    /// Double-destroy is a no-op.
    pub fn destroy(&self) {
        if self.destroy_requested.swap(true, Ordering::AcqRel) {
            return;
        }
        if (self.is_visible)() {
            return;
        }
        self.finish_destroy();
    }

    /// Completes a destroy that was deferred because the backing store was visible.
    pub fn on_visibility_changed(&self) {
        if self.destroy_requested.load(Ordering::Acquire)
            && !self.destroyed.load(Ordering::Acquire)
            && !(self.is_visible)()
        {
            self.finish_destroy();
        }
    }

    fn finish_destroy(&self) {
        self.flush();
        self.drain_to_store();
        if let Some(handle) = self.timer.lock().unwrap().take() {
            handle.abort();
        }
        *self.buffer.lock().unwrap() = None;
        self.destroyed.store(true, Ordering::Release);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}
