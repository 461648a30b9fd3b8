//! Virtual keyboard output via uinput
//!
//! A [`UinputSink`] owns one kernel-level virtual keyboard from registration
//! until [`release`](UinputSink::release). The device descriptor sits behind
//! an async mutex so that writes and the release sequence never interleave
//! their kernel calls: every key record reaches the kernel immediately
//! followed by its `SYN_REPORT`, in the order `write` was called.
//!
//! The [`SharedUinputSink`] alias is the form handed to tasks that inject
//! events concurrently.
//!
//! # Example
//!
//! ```no_run
//! use keybridge_config::UinputConfig;
//! use keybridge_daemon::codec::KeyEvent;
//! use keybridge_daemon::keycodes::Keycode;
//! use keybridge_daemon::sink::UinputSink;
//! use keybridge_daemon::time;
//!
//! # async fn example() -> Result<(), keybridge_daemon::error::SinkError> {
//! let sink = UinputSink::acquire(UinputConfig::default()).await?;
//! sink.write(KeyEvent::press(Keycode(30), time::now())).await?;
//! sink.write(KeyEvent::release(Keycode(30), time::now())).await?;
//! sink.release().await?;
//! # Ok(())
//! # }
//! ```

use std::os::fd::RawFd;
use std::sync::Arc;

use keybridge_config::UinputConfig;
use nix::errno::Errno;
use tokio::sync::Mutex;

use crate::codec::{self, KeyEvent, RawEvent};
use crate::error::SinkError;
use crate::ffi::{LinuxUinput, UinputBackend};
use crate::time;

/// A sink shared between the tasks that inject events.
pub type SharedUinputSink<B = LinuxUinput> = Arc<UinputSink<B>>;

/// One registered virtual keyboard.
pub struct UinputSink<B: UinputBackend = LinuxUinput> {
    config: UinputConfig,
    backend: B,
    /// `None` once released.
    fd: Mutex<Option<RawFd>>,
}

impl UinputSink<LinuxUinput> {
    /// Open `/dev/uinput` (or the configured path) and register a keyboard
    /// described by `config`.
    pub async fn acquire(config: UinputConfig) -> Result<Self, SinkError> {
        Self::acquire_with(LinuxUinput, config).await
    }
}

impl<B: UinputBackend> UinputSink<B> {
    /// Register a virtual keyboard through `backend`.
    ///
    /// Either the device is fully registered and a sink is returned, or no
    /// device exists and the descriptor has been closed. A configured
    /// post-init command is started in the background once registration
    /// succeeds; its outcome is logged and never affects the result.
    pub async fn acquire_with(backend: B, config: UinputConfig) -> Result<Self, SinkError> {
        let fd = backend.open(&config.path).map_err(|source| SinkError::Open {
            path: config.path.clone(),
            source,
        })?;

        tracing::debug!("Opened {} (fd {})", config.path.display(), fd);

        if let Err(source) = backend.acquire_device(
            fd,
            &config.name,
            config.vendor,
            config.product,
            config.version,
        ) {
            if let Err(e) = backend.close(fd) {
                tracing::warn!(
                    "Failed to close {} after failed registration: {}",
                    config.path.display(),
                    e
                );
            }
            return Err(SinkError::Registration {
                device: config.name.clone(),
                source,
            });
        }

        tracing::info!(
            "Registered virtual device '{}' ({:04x}:{:04x} v{})",
            config.name,
            config.vendor,
            config.product,
            config.version
        );

        if let Some(command) = config.post_init.clone() {
            tokio::spawn(run_post_init(config.name.clone(), command));
        }

        Ok(Self {
            config,
            backend,
            fd: Mutex::new(Some(fd)),
        })
    }

    /// Configuration the device was registered with.
    pub fn config(&self) -> &UinputConfig {
        &self.config
    }

    /// Device name shown to the rest of the system.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Whether [`release`](Self::release) has run.
    pub async fn is_released(&self) -> bool {
        self.fd.lock().await.is_none()
    }

    /// Emit one key event followed by a `SYN_REPORT` stamped with the
    /// current time.
    ///
    /// A failed send leaves the device open; the caller may keep writing.
    /// When the key record itself fails no sync is sent.
    pub async fn write(&self, event: KeyEvent) -> Result<(), SinkError> {
        let guard = self.fd.lock().await;
        let fd = (*guard).ok_or_else(|| SinkError::Closed {
            device: self.config.name.clone(),
        })?;

        tracing::trace!("{}: {}", self.config.name, event);

        self.send(fd, &codec::encode(&event))?;
        self.send(fd, &codec::sync_at(time::system_now()))
    }

    /// Unregister the device and close its descriptor.
    ///
    /// The descriptor is closed even when unregistration fails; that failure
    /// is still returned. Later writes fail with [`SinkError::Closed`], and a
    /// second release is a no-op.
    pub async fn release(&self) -> Result<(), SinkError> {
        let mut guard = self.fd.lock().await;
        let Some(fd) = guard.take() else {
            return Ok(());
        };

        let unregistered = self.backend.release_device(fd);
        let closed = self.backend.close(fd);

        match (unregistered, closed) {
            (Ok(()), Ok(())) => {
                tracing::info!("Released virtual device '{}'", self.config.name);
                Ok(())
            }
            (Err(source), closed) => {
                if let Err(e) = closed {
                    tracing::warn!(
                        "Failed to close virtual device '{}': {}",
                        self.config.name,
                        e
                    );
                }
                Err(SinkError::Release {
                    device: self.config.name.clone(),
                    source,
                })
            }
            (Ok(()), Err(source)) => Err(SinkError::Close {
                device: self.config.name.clone(),
                source,
            }),
        }
    }

    fn send(&self, fd: RawFd, event: &RawEvent) -> Result<(), SinkError> {
        self.backend
            .send_event(fd, event)
            .map_err(|source: Errno| SinkError::Send {
                device: self.config.name.clone(),
                event: *event,
                source,
            })
    }
}

impl<B: UinputBackend> Drop for UinputSink<B> {
    fn drop(&mut self) {
        if let Some(fd) = self.fd.get_mut().take() {
            tracing::warn!(
                "Virtual device '{}' dropped without release, cleaning up",
                self.config.name
            );
            if let Err(e) = self.backend.release_device(fd) {
                tracing::warn!("Failed to unregister '{}': {}", self.config.name, e);
            }
            if let Err(e) = self.backend.close(fd) {
                tracing::warn!("Failed to close '{}': {}", self.config.name, e);
            }
        }
    }
}

/// Run the post-init hook detached; only its outcome is logged.
async fn run_post_init(device: String, command: String) {
    tracing::debug!("Running post-init command for '{}': {}", device, command);

    let status = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&command)
        .stdin(std::process::Stdio::null())
        .status()
        .await;

    match status {
        Ok(status) if status.success() => {
            tracing::debug!("Post-init command for '{}' finished", device);
        }
        Ok(status) => {
            tracing::warn!("Post-init command for '{}' exited with {}", device, status);
        }
        Err(e) => {
            tracing::warn!("Failed to run post-init command for '{}': {}", device, e);
        }
    }
}
