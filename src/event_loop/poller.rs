//! Level-triggered `epoll` wrapper over raw `libc` calls

use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

const MAX_EVENTS: usize = 16;

#[derive(Debug)]
pub struct Poller {
    epoll_fd: OwnedFd,
}

impl Poller {
    pub fn new() -> io::Result<Self> {
        let fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if fd == -1 {
            return Err(io::Error::last_os_error());
        }
        trace!("Created epoll instance {}", fd);
        Ok(Self {
            epoll_fd: unsafe { OwnedFd::from_raw_fd(fd) },
        })
    }

    /// Watch `fd` for readability, tagging its events with `token`
    pub fn add(&self, fd: RawFd, token: u64) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: (libc::EPOLLIN | libc::EPOLLERR | libc::EPOLLHUP) as u32,
            u64: token,
        };
        if unsafe {
            libc::epoll_ctl(
                self.epoll_fd.as_raw_fd(),
                libc::EPOLL_CTL_ADD,
                fd,
                &mut event,
            )
        } == -1
        {
            return Err(io::Error::last_os_error());
        }
        trace!("Added fd {} with token {}", fd, token);
        Ok(())
    }

    pub fn delete(&self, fd: RawFd) -> io::Result<()> {
        let mut event = libc::epoll_event { events: 0, u64: 0 };
        if unsafe {
            libc::epoll_ctl(
                self.epoll_fd.as_raw_fd(),
                libc::EPOLL_CTL_DEL,
                fd,
                &mut event,
            )
        } == -1
        {
            return Err(io::Error::last_os_error());
        }
        trace!("Deleted fd {}", fd);
        Ok(())
    }

    /// Wait for readiness and return the tokens of the ready descriptors
    ///
    /// `None` waits forever. An interrupted wait returns no tokens.
    pub fn wait(&self, timeout: Option<Duration>) -> io::Result<Vec<u64>> {
        let timeout_ms = match timeout {
            Some(timeout) => timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
            None => -1,
        };
        let mut events = [libc::epoll_event { events: 0, u64: 0 }; MAX_EVENTS];

        let count = unsafe {
            libc::epoll_wait(
                self.epoll_fd.as_raw_fd(),
                events.as_mut_ptr(),
                MAX_EVENTS as libc::c_int,
                timeout_ms,
            )
        };

        if count == -1 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                trace!("epoll_wait interrupted");
                return Ok(Vec::new());
            }
            return Err(err);
        }

        Ok(events[..count as usize].iter().map(|event| event.u64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_wait_reports_readable_token() {
        let poller = Poller::new().unwrap();
        let (reader, mut writer) = UnixStream::pair().unwrap();
        poller.add(reader.as_raw_fd(), 7).unwrap();

        assert!(poller.wait(Some(Duration::ZERO)).unwrap().is_empty());

        writer.write_all(&[1]).unwrap();
        assert_eq!(poller.wait(Some(Duration::from_millis(100))).unwrap(), vec![7]);

        poller.delete(reader.as_raw_fd()).unwrap();
        assert!(poller.wait(Some(Duration::ZERO)).unwrap().is_empty());
    }
}
