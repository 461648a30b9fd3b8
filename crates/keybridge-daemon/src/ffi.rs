//! Kernel calls behind the virtual keyboard
//!
//! [`UinputBackend`] is the seam between [`UinputSink`](crate::sink::UinputSink)
//! and the kernel. Every call reports a plain [`nix::Result`]; the sink owns
//! mapping failures onto [`SinkError`](crate::error::SinkError). Tests swap
//! in a recording backend to observe call order without `/dev/uinput`.

use std::os::fd::{BorrowedFd, RawFd};
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;

use crate::codec::{RawEvent, EV_KEY, EV_SYN};
use crate::keycodes::KEY_MAX_STANDARD;

/// Default path of the uinput control device.
pub const UINPUT_PATH: &str = "/dev/uinput";

/// `UINPUT_MAX_NAME_SIZE`, including the trailing NUL.
pub const UINPUT_MAX_NAME_SIZE: usize = 80;

/// `BUS_USB`
const BUS_USB: u16 = 0x03;

/// Operations the sink needs from the kernel.
pub trait UinputBackend: Send + Sync + 'static {
    /// Open the uinput control file for writing.
    fn open(&self, path: &Path) -> nix::Result<RawFd>;

    /// Describe the device and register it with the kernel.
    fn acquire_device(
        &self,
        fd: RawFd,
        name: &str,
        vendor: u16,
        product: u16,
        version: u16,
    ) -> nix::Result<()>;

    /// Write one record to the device.
    fn send_event(&self, fd: RawFd, event: &RawEvent) -> nix::Result<()>;

    /// Unregister the device.
    fn release_device(&self, fd: RawFd) -> nix::Result<()>;

    /// Close the file descriptor.
    fn close(&self, fd: RawFd) -> nix::Result<()>;
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct InputId {
    bustype: u16,
    vendor: u16,
    product: u16,
    version: u16,
}

/// `struct uinput_setup`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct UinputSetup {
    id: InputId,
    name: [nix::libc::c_char; UINPUT_MAX_NAME_SIZE],
    ff_effects_max: u32,
}

impl UinputSetup {
    /// Fails with `EINVAL` when `name` does not fit or contains a NUL byte.
    pub fn new(name: &str, vendor: u16, product: u16, version: u16) -> nix::Result<Self> {
        let bytes = name.as_bytes();
        if bytes.len() >= UINPUT_MAX_NAME_SIZE || bytes.contains(&0) {
            return Err(Errno::EINVAL);
        }

        let mut setup = Self {
            id: InputId {
                bustype: BUS_USB,
                vendor,
                product,
                version,
            },
            name: [0; UINPUT_MAX_NAME_SIZE],
            ff_effects_max: 0,
        };
        for (dst, src) in setup.name.iter_mut().zip(bytes) {
            *dst = *src as nix::libc::c_char;
        }
        Ok(setup)
    }
}

mod ioctl {
    use super::UinputSetup;

    nix::ioctl_none!(ui_dev_create, b'U', 1);
    nix::ioctl_none!(ui_dev_destroy, b'U', 2);
    nix::ioctl_write_ptr!(ui_dev_setup, b'U', 3, UinputSetup);
    nix::ioctl_write_int!(ui_set_evbit, b'U', 100);
    nix::ioctl_write_int!(ui_set_keybit, b'U', 101);
}

/// The real kernel interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinuxUinput;

impl UinputBackend for LinuxUinput {
    fn open(&self, path: &Path) -> nix::Result<RawFd> {
        // No O_CREAT: the device node must already exist.
        let flags = OFlag::O_WRONLY | OFlag::O_NONBLOCK | OFlag::O_NOCTTY | OFlag::O_CLOEXEC;
        fcntl::open(path, flags, Mode::empty())
    }

    fn acquire_device(
        &self,
        fd: RawFd,
        name: &str,
        vendor: u16,
        product: u16,
        version: u16,
    ) -> nix::Result<()> {
        let setup = UinputSetup::new(name, vendor, product, version)?;

        // SAFETY: fd is an open uinput descriptor owned by the caller, and
        // setup outlives the UI_DEV_SETUP call.
        unsafe {
            ioctl::ui_set_evbit(fd, EV_SYN as nix::sys::ioctl::ioctl_param_type)?;
            ioctl::ui_set_evbit(fd, EV_KEY as nix::sys::ioctl::ioctl_param_type)?;
            for code in 1..=KEY_MAX_STANDARD {
                ioctl::ui_set_keybit(fd, code as nix::sys::ioctl::ioctl_param_type)?;
            }
            ioctl::ui_dev_setup(fd, &setup)?;
            ioctl::ui_dev_create(fd)?;
        }
        Ok(())
    }

    fn send_event(&self, fd: RawFd, event: &RawEvent) -> nix::Result<()> {
        // SAFETY: the sink keeps fd open for as long as it can reach this call.
        let fd = unsafe { BorrowedFd::borrow_raw(fd) };
        let written = unistd::write(fd, &event.to_bytes())?;
        if written != RawEvent::SIZE {
            return Err(Errno::EIO);
        }
        Ok(())
    }

    fn release_device(&self, fd: RawFd) -> nix::Result<()> {
        // SAFETY: fd is an open uinput descriptor owned by the caller.
        unsafe { ioctl::ui_dev_destroy(fd) }.map(drop)
    }

    fn close(&self, fd: RawFd) -> nix::Result<()> {
        unistd::close(fd)
    }
}
