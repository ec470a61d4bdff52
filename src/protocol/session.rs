//! Request/response exchanges with the display over a connected link.
//!
//! The display answers every write on the write characteristic with
//! exactly one notification, in order, and carries no request id. The
//! session therefore allows a single exchange in flight (`&mut self`) and
//! bounds every wait with a timeout.
//!
//! Notifications reach the session through a [`NotificationQueue`]: the
//! GATT notification callback pushes into it synchronously, the session
//! consumes from it. Nothing pushed into the queue is dropped without the
//! next exchange reporting [`SessionError::Overrun`].
//!
//! A timed-out exchange still owes a reply. Before the next write the
//! session waits up to one more timeout for that reply and discards it, so
//! a late answer is never returned for a different request.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use super::commands::{ControlCommand, MAX_CONTROL_FRAME_LEN};
use super::frame::{
    encode_frame, encode_frame_with_defaults, encode_text, CommandKind, EncodeError,
    EncodeOptions, FrameParams,
};
use crate::config::{BLE_ATT_MTU, RESPONSE_TIMEOUT_MS};

/// Largest notification payload for the negotiated ATT MTU.
pub const MAX_NOTIFICATION_LEN: usize = BLE_ATT_MTU as usize - 3;

/// Largest frame a single write can carry at the negotiated ATT MTU.
///
/// The session encodes into buffers of this size, so a frame the link
/// cannot carry fails with [`EncodeError::BufferTooSmall`] before any write.
pub const MAX_WRITE_LEN: usize = BLE_ATT_MTU as usize - 3;

/// One notification received from the display.
pub type Notification = Vec<u8, MAX_NOTIFICATION_LEN>;

/// Failure reported by the transport when writing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// The peer or the stack rejected the write.
    Rejected,
    /// The frame does not fit a single write.
    FrameTooLarge,
    /// No link to write to.
    NotConnected,
}

/// Reason a notification could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PushError {
    /// The queue is at capacity.
    Full,
    /// The notification exceeds [`MAX_NOTIFICATION_LEN`].
    TooLong,
}

/// Errors surfaced by [`CommandSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionError {
    /// The request could not be encoded. Nothing was written.
    Encode(EncodeError),
    /// The write failed. No response was awaited.
    Write(TransportError),
    /// No notification arrived within the timeout.
    Timeout,
    /// A notification was lost since the last exchange; responses may no
    /// longer line up with requests. Nothing was written.
    Overrun,
    /// The link was closed. Terminal for this connection.
    Disconnected,
}

impl From<EncodeError> for SessionError {
    fn from(e: EncodeError) -> Self {
        SessionError::Encode(e)
    }
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        SessionError::Write(e)
    }
}

/// Write side of the link: delivers one frame to the write characteristic.
#[allow(async_fn_in_trait)]
pub trait FrameWriter {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

impl<T: FrameWriter + ?Sized> FrameWriter for &mut T {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).write_frame(frame).await
    }
}

/// Bounded FIFO between the notification callback and the session.
///
/// `const`-constructible so it can live in a `static`.
pub struct NotificationQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, Notification, N>,
    closed_signal: Signal<M, ()>,
    closed: AtomicBool,
    lost: AtomicBool,
}

impl<M: RawMutex, const N: usize> Default for NotificationQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> NotificationQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            closed_signal: Signal::new(),
            closed: AtomicBool::new(false),
            lost: AtomicBool::new(false),
        }
    }

    /// Queue one notification. Callable from synchronous callbacks.
    ///
    /// On failure the notification is discarded and the loss is recorded
    /// for the session to report.
    pub fn push(&self, data: &[u8]) -> Result<(), PushError> {
        let result = match Vec::from_slice(data) {
            Ok(notification) => self
                .channel
                .try_send(notification)
                .map_err(|_| PushError::Full),
            Err(()) => Err(PushError::TooLong),
        };
        if result.is_err() {
            self.lost.store(true, Ordering::Release);
        }
        result
    }

    /// Number of notifications waiting.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    /// Mark the link as gone and wake a pending await.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.closed_signal.signal(());
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Start a new connection lifetime: clear the closed and lost state and
    /// discard anything left over from the previous link.
    pub fn reopen(&self) {
        self.discard_pending();
        self.lost.store(false, Ordering::Release);
        self.closed_signal.reset();
        self.closed.store(false, Ordering::Release);
    }

    fn try_next(&self) -> Option<Notification> {
        self.channel.try_receive().ok()
    }

    fn take_lost(&self) -> bool {
        self.lost.swap(false, Ordering::AcqRel)
    }

    fn discard_pending(&self) -> usize {
        let mut discarded = 0;
        while self.channel.try_receive().is_ok() {
            discarded += 1;
        }
        discarded
    }

    async fn next(&self) -> Notification {
        self.channel.receive().await
    }

    async fn wait_closed(&self) {
        if self.is_closed() {
            return;
        }
        self.closed_signal.wait().await
    }
}

/// Sequences "write one frame, await one notification" exchanges.
pub struct CommandSession<'q, W, D, M: RawMutex, const N: usize> {
    writer: W,
    delay: D,
    queue: &'q NotificationQueue<M, N>,
    timeout_ms: u32,
    exchanges: u32,
    // Set when an exchange timed out and its reply has not been seen yet.
    reply_owed: bool,
}

impl<'q, W, D, M, const N: usize> CommandSession<'q, W, D, M, N>
where
    W: FrameWriter,
    D: DelayNs,
    M: RawMutex,
{
    /// Create a session using the default response timeout.
    pub fn new(writer: W, delay: D, queue: &'q NotificationQueue<M, N>) -> Self {
        Self {
            writer,
            delay,
            queue,
            timeout_ms: RESPONSE_TIMEOUT_MS,
            exchanges: 0,
            reply_owed: false,
        }
    }

    /// Replace the default response timeout.
    pub fn with_timeout(mut self, timeout_ms: u32) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Number of frames written so far.
    pub fn exchanges(&self) -> u32 {
        self.exchanges
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Whether a timed-out exchange is still owed a reply.
    pub fn reply_owed(&self) -> bool {
        self.reply_owed
    }

    /// Write `frame` and return the next notification.
    pub async fn send_and_await(&mut self, frame: &[u8]) -> Result<Notification, SessionError> {
        self.send_and_await_within(frame, self.timeout_ms).await
    }

    /// Like [`CommandSession::send_and_await`] with an explicit timeout.
    ///
    /// If the previous exchange timed out, its late reply is awaited for up
    /// to `timeout_ms` and discarded before `frame` is written.
    pub async fn send_and_await_within(
        &mut self,
        frame: &[u8],
        timeout_ms: u32,
    ) -> Result<Notification, SessionError> {
        let queue = self.queue;
        if queue.is_closed() {
            return Err(SessionError::Disconnected);
        }
        if queue.take_lost() {
            return Err(SessionError::Overrun);
        }
        if self.reply_owed {
            self.settle_owed_reply(timeout_ms).await?;
        }

        self.writer.write_frame(frame).await?;
        self.exchanges = self.exchanges.wrapping_add(1);

        match select3(
            queue.next(),
            queue.wait_closed(),
            self.delay.delay_ms(timeout_ms),
        )
        .await
        {
            Either3::First(notification) => Ok(notification),
            Either3::Second(()) => Err(SessionError::Disconnected),
            Either3::Third(()) => {
                self.reply_owed = true;
                Err(SessionError::Timeout)
            }
        }
    }

    /// Consume the reply owed by a timed-out exchange, giving it up after
    /// `timeout_ms`.
    async fn settle_owed_reply(&mut self, timeout_ms: u32) -> Result<(), SessionError> {
        let queue = self.queue;
        if queue.try_next().is_none() {
            match select3(
                queue.next(),
                queue.wait_closed(),
                self.delay.delay_ms(timeout_ms),
            )
            .await
            {
                Either3::First(_late) => {}
                Either3::Second(()) => return Err(SessionError::Disconnected),
                // The display never answered; nothing left to pair wrongly.
                Either3::Third(()) => {}
            }
        }
        self.reply_owed = false;
        Ok(())
    }

    /// Encode and exchange a control command.
    pub async fn send_command(
        &mut self,
        command: &ControlCommand,
    ) -> Result<Notification, SessionError> {
        let mut buf = [0u8; MAX_CONTROL_FRAME_LEN];
        let len = command.encode(&mut buf)?;
        self.send_and_await(&buf[..len]).await
    }

    /// Encode and exchange a command frame.
    pub async fn send_frame(
        &mut self,
        kind: CommandKind,
        primary: &[u8],
        params: &FrameParams<'_>,
    ) -> Result<Notification, SessionError> {
        let mut buf = [0u8; MAX_WRITE_LEN];
        let len = encode_frame(kind, primary, params, &mut buf)?;
        self.send_and_await(&buf[..len]).await
    }

    /// Encode with `options` resolved against `params`, then exchange.
    pub async fn send_frame_with_defaults(
        &mut self,
        kind: CommandKind,
        primary: &[u8],
        params: &FrameParams<'_>,
        options: EncodeOptions,
    ) -> Result<Notification, SessionError> {
        let mut buf = [0u8; MAX_WRITE_LEN];
        let len = encode_frame_with_defaults(kind, primary, params, options, &mut buf)?;
        self.send_and_await(&buf[..len]).await
    }

    /// Exchange a text frame.
    pub async fn send_text(&mut self, text: &str) -> Result<Notification, SessionError> {
        let mut buf = [0u8; MAX_WRITE_LEN];
        let len = encode_text(text, &mut buf)?;
        self.send_and_await(&buf[..len]).await
    }

    /// Drop every queued notification, for example unsolicited ones left
    /// behind after a [`SessionError::Timeout`].
    ///
    /// A reply still owed by a timed-out exchange is settled by the next
    /// send unless it is among the discarded notifications.
    ///
    /// Returns how many notifications were discarded.
    pub fn resync(&mut self) -> usize {
        let discarded = self.queue.discard_pending();
        if discarded > 0 {
            self.reply_owed = false;
        }
        discarded
    }
}
