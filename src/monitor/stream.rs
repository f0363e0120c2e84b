//! Async variant of the monitor
//!
//! Wraps the event socket in [`AsyncFd`] so a tokio runtime drives readiness
//! instead of [`EventLoop`](crate::event_loop::EventLoop). Dropping the
//! stream releases the socket.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::Stream;
use tokio::io::unix::AsyncFd;

use crate::backend::{DeviceBackend, EventSocket, UDEV_EVENT_SOURCE};
use crate::context::DeviceContext;
use crate::device::{DeviceEvent, decode_event};
use crate::error::{Error, Result};

pub struct MonitorStream<S: EventSocket> {
    socket: AsyncFd<S>,
}

impl<S: EventSocket> MonitorStream<S> {
    /// Subscribe to device changes
    ///
    /// Must be called from inside a tokio runtime with IO enabled.
    pub fn open<B>(context: &DeviceContext<B>) -> Result<Self>
    where
        B: DeviceBackend<Socket = S>,
    {
        let subscription_error = |source| Error::Subscription {
            event_source: UDEV_EVENT_SOURCE.to_string(),
            source,
        };

        let socket = context
            .backend()
            .open_socket(UDEV_EVENT_SOURCE)
            .map_err(subscription_error)?;
        let socket = AsyncFd::new(socket).map_err(subscription_error)?;

        info!("Monitor stream opened on {}", UDEV_EVENT_SOURCE);
        Ok(Self { socket })
    }
}

impl<S: EventSocket + Unpin> Stream for MonitorStream<S> {
    type Item = Result<DeviceEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            let mut guard = match ready!(this.socket.poll_read_ready_mut(cx)) {
                Ok(guard) => guard,
                Err(e) => return Poll::Ready(Some(Err(Error::EventLoop(e)))),
            };

            match guard.get_inner_mut().receive() {
                Some(record) => {
                    let event = decode_event(&record);
                    debug!("Device {}: {}", event.action, event.record.syspath);
                    return Poll::Ready(Some(Ok(event)));
                }
                None => guard.clear_ready(),
            }
        }
    }
}
