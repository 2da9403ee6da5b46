//! Directory-backed durable FIFO with manual acknowledgment.
//!
//! Layout under the queue root:
//! ```text
//! {root}/
//! ├── pending/    # published, undelivered messages
//! └── inflight/   # delivered, unacknowledged (at most one per consumer)
//! ```
//!
//! Messages are files named `{millis:013}-{seq:06}-{uuid}.json`, written
//! tmp+rename so a crashed publish never leaves a partial message in
//! `pending/`. Delivery claims the lexicographically first pending file by
//! renaming it into `inflight/`; ack deletes it. A consumer opening the
//! queue returns stale inflight entries to `pending/`, which is where the
//! at-least-once redelivery after a crash comes from.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::{BatchConsumer, BatchPublisher, Delivery, QueueError};

/// Per-process sequence so messages published in the same millisecond
/// keep their order.
static PUBLISH_SEQ: AtomicU64 = AtomicU64::new(0);

pub struct DirQueue {
    pending: PathBuf,
    inflight: PathBuf,
    outstanding: Option<String>,
}

impl DirQueue {
    /// Open (or create) a queue rooted at `root`.
    ///
    /// Stale inflight messages from a crashed consumer are moved back to
    /// pending before this consumer starts receiving.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, QueueError> {
        let root = root.into();
        let pending = root.join("pending");
        let inflight = root.join("inflight");
        fs::create_dir_all(&pending)?;
        fs::create_dir_all(&inflight)?;

        for entry in fs::read_dir(&inflight)? {
            let entry = entry?;
            let name = entry.file_name();
            log::warn!("redelivering unacked message {}", name.to_string_lossy());
            fs::rename(entry.path(), pending.join(&name))?;
        }

        Ok(Self {
            pending,
            inflight,
            outstanding: None,
        })
    }

    fn next_message_name() -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let seq = PUBLISH_SEQ.fetch_add(1, Ordering::Relaxed);
        format!("{millis:013}-{seq:06}-{}.json", Uuid::new_v4())
    }

    /// First pending message in FIFO (lexicographic) order, if any.
    fn oldest_pending(&self) -> io::Result<Option<String>> {
        let mut names: Vec<String> = fs::read_dir(&self.pending)?
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .filter(|n| n.ends_with(".json"))
            .collect();
        names.sort();
        Ok(names.into_iter().next())
    }

    /// Messages currently waiting for delivery.
    pub fn pending_len(&self) -> Result<usize, QueueError> {
        Ok(fs::read_dir(&self.pending)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count())
    }
}

impl BatchPublisher for DirQueue {
    fn publish(&self, body: &[u8]) -> Result<(), QueueError> {
        let name = Self::next_message_name();
        let tmp = self.pending.join(format!("{name}.tmp"));
        let final_path = self.pending.join(&name);
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &final_path)?;
        log::debug!("published {name} ({} bytes)", body.len());
        Ok(())
    }
}

impl BatchConsumer for DirQueue {
    fn receive(&mut self) -> Result<Option<Delivery>, QueueError> {
        if self.outstanding.is_some() {
            return Err(QueueError::DeliveryOutstanding);
        }
        let Some(name) = self.oldest_pending()? else {
            return Ok(None);
        };

        let claimed = self.inflight.join(&name);
        // Another consumer may have claimed it between the listing and the
        // rename; treat that as "currently empty" and let the caller poll.
        match fs::rename(self.pending.join(&name), &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let body = fs::read(&claimed)?;
        self.outstanding = Some(name.clone());
        Ok(Some(Delivery { tag: name, body }))
    }

    fn ack(&mut self, tag: &str) -> Result<(), QueueError> {
        match &self.outstanding {
            Some(current) if current == tag => {
                fs::remove_file(self.inflight.join(tag))?;
                self.outstanding = None;
                Ok(())
            }
            _ => Err(QueueError::UnknownTag(tag.to_string())),
        }
    }
}
