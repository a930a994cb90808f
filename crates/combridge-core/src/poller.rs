//! Bounded wait for inbound data on a file descriptor.

use std::os::fd::AsFd;
use std::time::Duration;

use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use crate::error::ReadinessError;

/// How long the bridge waits on the device per iteration.
///
/// Fixed rather than derived from the line rate, so latency and fairness at
/// high rates are not guaranteed.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Waits at most `timeout` for `fd` to become readable.
///
/// Returns `Ok(true)` only when the kernel reports `POLLIN`. An interrupted
/// wait counts as "not ready". A hangup or error condition with nothing left
/// to read is returned as an error, since `poll` would report it again at
/// once on every later call.
pub fn is_readable<F: AsFd>(fd: F, timeout: Duration) -> Result<bool, ReadinessError> {
    let mut fds = [PollFd::new(fd.as_fd(), PollFlags::POLLIN)];
    match poll(&mut fds, poll_timeout(timeout)) {
        Ok(0) | Err(Errno::EINTR) => Ok(false),
        Ok(_) => {
            let revents = fds[0].revents().unwrap_or(PollFlags::empty());
            if revents.contains(PollFlags::POLLIN) {
                Ok(true)
            } else if revents.contains(PollFlags::POLLNVAL) {
                Err(ReadinessError::Invalid)
            } else if revents.intersects(PollFlags::POLLHUP | PollFlags::POLLERR) {
                Err(ReadinessError::Hangup)
            } else {
                Ok(false)
            }
        }
        Err(e) => Err(e.into()),
    }
}

// Rounds up to whole milliseconds so a non-zero timeout never becomes a spin.
fn poll_timeout(timeout: Duration) -> PollTimeout {
    let mut millis = timeout.as_millis();
    if timeout.subsec_nanos() % 1_000_000 != 0 {
        millis += 1;
    }
    PollTimeout::from(u16::try_from(millis).unwrap_or(u16::MAX))
}
