//! Test doubles shared by the crate's unit tests

use std::collections::VecDeque;
use std::io;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use nix::errno::Errno;

use crate::codec::RawEvent;
use crate::error::SourceError;
use crate::ffi::UinputBackend;
use crate::source::EventSource;

pub(crate) const TEST_FD: RawFd = 42;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Open(PathBuf),
    Acquire(String),
    Send(RawEvent),
    Release,
    Close,
}

/// Backend that records every call instead of touching the kernel.
#[derive(Clone, Default)]
pub(crate) struct RecordingBackend {
    pub(crate) calls: Arc<Mutex<Vec<Call>>>,
    pub(crate) fail_open: bool,
    pub(crate) fail_acquire: bool,
    pub(crate) fail_release: bool,
    pub(crate) fail_close: bool,
    pub(crate) fail_send_kind: Option<u16>,
}

impl RecordingBackend {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<RawEvent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send(event) => Some(event),
                _ => None,
            })
            .collect()
    }
}

impl UinputBackend for RecordingBackend {
    fn open(&self, path: &Path) -> nix::Result<RawFd> {
        self.record(Call::Open(path.to_path_buf()));
        if self.fail_open {
            return Err(Errno::EACCES);
        }
        Ok(TEST_FD)
    }

    fn acquire_device(
        &self,
        fd: RawFd,
        name: &str,
        _vendor: u16,
        _product: u16,
        _version: u16,
    ) -> nix::Result<()> {
        assert_eq!(fd, TEST_FD);
        self.record(Call::Acquire(name.to_string()));
        if self.fail_acquire {
            return Err(Errno::EINVAL);
        }
        Ok(())
    }

    fn send_event(&self, fd: RawFd, event: &RawEvent) -> nix::Result<()> {
        assert_eq!(fd, TEST_FD);
        // Give other writers a chance to interleave if the lock is broken.
        std::thread::yield_now();
        self.record(Call::Send(*event));
        if self.fail_send_kind == Some(event.kind) {
            return Err(Errno::EAGAIN);
        }
        Ok(())
    }

    fn release_device(&self, fd: RawFd) -> nix::Result<()> {
        assert_eq!(fd, TEST_FD);
        self.record(Call::Release);
        if self.fail_release {
            return Err(Errno::ENODEV);
        }
        Ok(())
    }

    fn close(&self, fd: RawFd) -> nix::Result<()> {
        assert_eq!(fd, TEST_FD);
        self.record(Call::Close);
        if self.fail_close {
            return Err(Errno::EBADF);
        }
        Ok(())
    }
}

/// Source that replays a fixed list of records. Once they run out, every
/// read fails as an unplugged device would, or never completes when the
/// source is held open.
pub(crate) struct ScriptedSource {
    records: VecDeque<RawEvent>,
    hold_open: bool,
}

impl ScriptedSource {
    pub(crate) fn new(records: Vec<RawEvent>) -> Self {
        Self {
            records: records.into(),
            hold_open: false,
        }
    }

    pub(crate) fn held_open(records: Vec<RawEvent>) -> Self {
        Self {
            records: records.into(),
            hold_open: true,
        }
    }
}

impl EventSource for ScriptedSource {
    async fn next_raw(&mut self) -> Result<RawEvent, SourceError> {
        tokio::task::yield_now().await;
        if self.records.is_empty() && self.hold_open {
            std::future::pending::<()>().await;
        }
        self.records.pop_front().ok_or_else(|| SourceError::Read {
            path: PathBuf::from("/dev/input/scripted"),
            source: io::Error::from_raw_os_error(nix::libc::ENODEV),
        })
    }
}
