use std::io::{self, Read, Stdin};
use std::os::fd::{AsRawFd, RawFd};

use log::debug;
use nix::fcntl::{fcntl, FcntlArg, OFlag};

/// Standard input switched to non-blocking mode for the lifetime of the value.
///
/// Reads report "nothing ready" as `ErrorKind::WouldBlock` and end of input as
/// `Ok(0)`. The previous descriptor flags are restored on drop.
pub struct NonBlockingStdin {
    inner: Stdin,
    saved: OFlag,
}

impl NonBlockingStdin {
    pub fn new() -> io::Result<Self> {
        let inner = io::stdin();
        let saved = set_nonblocking(inner.as_raw_fd())?;
        Ok(Self { inner, saved })
    }
}

impl Read for NonBlockingStdin {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.lock().read(buf)
    }
}

impl Drop for NonBlockingStdin {
    fn drop(&mut self) {
        if let Err(e) = fcntl(self.inner.as_raw_fd(), FcntlArg::F_SETFL(self.saved)) {
            debug!("restoring stdin flags failed: {e}");
        }
    }
}

/// Adds `O_NONBLOCK` to `fd` and returns the flags it had before.
pub(crate) fn set_nonblocking(fd: RawFd) -> io::Result<OFlag> {
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(flags)
}
