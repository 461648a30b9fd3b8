//! Reading key events from a physical keyboard
//!
//! A [`KeyboardSource`] opens an evdev node, optionally grabs it so the
//! rest of the system stops seeing its events, and yields decoded
//! [`KeyEvent`]s. Every kernel record is turned back into a [`RawEvent`]
//! and passed through [`codec::decode`]; records that do not decode
//! (sync reports, scan codes, repeats) are skipped.
//!
//! The grab is released by the kernel when the source is dropped and its
//! descriptor closes.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use evdev::{Device, EventStream, InputEvent};

use crate::codec::{self, KeyEvent, RawEvent};
use crate::error::SourceError;
use crate::time::SystemTimestamp;

/// A physical keyboard delivering key events.
pub struct KeyboardSource {
    path: PathBuf,
    name: String,
    grabbed: bool,
    stream: EventStream,
}

/// Anything that yields kernel input records.
///
/// [`next_key`](EventSource::next_key) decodes records as they arrive and
/// skips the ones that are not key presses or releases.
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// Next kernel record of any type.
    async fn next_raw(&mut self) -> Result<RawEvent, SourceError>;

    /// Next key press or release, skipping everything else.
    async fn next_key(&mut self) -> Result<KeyEvent, SourceError> {
        loop {
            let raw = self.next_raw().await?;
            if let Some(event) = codec::decode(&raw) {
                return Ok(event);
            }
        }
    }
}

impl KeyboardSource {
    /// Open the evdev device at `path`, grabbing it for exclusive access
    /// when `grab` is set.
    pub fn open(path: &Path, grab: bool) -> Result<Self, SourceError> {
        let mut device = Device::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let name = device.name().unwrap_or("Unknown").to_string();

        if grab {
            device.grab().map_err(|source| SourceError::Grab {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::info!("Grabbed input device '{}' at {}", name, path.display());
        } else {
            tracing::info!("Reading input device '{}' at {}", name, path.display());
        }

        let stream = device
            .into_event_stream()
            .map_err(|source| SourceError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            name,
            grabbed: grab,
            stream,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_grabbed(&self) -> bool {
        self.grabbed
    }
}

impl EventSource for KeyboardSource {
    async fn next_raw(&mut self) -> Result<RawEvent, SourceError> {
        let event = self
            .stream
            .next_event()
            .await
            .map_err(|source| SourceError::Read {
                path: self.path.clone(),
                source,
            })?;
        Ok(raw_from_input(&event))
    }
}

/// Rebuild the kernel record behind an evdev event.
pub fn raw_from_input(event: &InputEvent) -> RawEvent {
    let time = event
        .timestamp()
        .duration_since(UNIX_EPOCH)
        .map(SystemTimestamp::from)
        .unwrap_or(SystemTimestamp::EPOCH);
    RawEvent::new(time, event.event_type().0, event.code(), event.value())
}
