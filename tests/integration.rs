//! Integration tests for ledlink host-testable logic.

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::delay::DelayNs;
use ledlink::ble::adv_parser::is_target_device;
use ledlink::config::{TARGET_NAME, NOTIFICATION_QUEUE_DEPTH};
use ledlink::protocol::frame::{encode_frame, encode_frame_with_defaults, MAX_FRAME_LEN};
use ledlink::protocol::{
    CommandKind, CommandSession, ControlCommand, EncodeOptions, FrameParams, FrameWriter,
    NotificationQueue, SessionError, TransportError,
};

type Queue = NotificationQueue<NoopRawMutex, NOTIFICATION_QUEUE_DEPTH>;

/// Display stand-in: acknowledges every frame with `[len_lo, len_hi, 0x00]`
/// by echoing the length header of the written frame.
struct AckingDisplay<'q> {
    queue: &'q Queue,
    frames: Vec<Vec<u8>>,
}

impl FrameWriter for AckingDisplay<'_> {
    async fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.frames.push(frame.to_vec());
        self.queue
            .push(&[frame[0], frame[1], 0x00])
            .map_err(|_| TransportError::Rejected)
    }
}

struct NoTimeout;

impl DelayNs for NoTimeout {
    async fn delay_ns(&mut self, _ns: u32) {
        core::future::pending::<()>().await
    }
}

#[test]
fn reference_kind1_frame() {
    let mut buf = [0u8; 32];
    let params = FrameParams {
        flag: 1,
        secondary: Some(&[]),
        frame_size: 0,
        intensity: 100,
    };
    let n = encode_frame(CommandKind::K1, &[1, 9], &params, &mut buf).unwrap();
    assert_eq!(n, 16);
    assert_eq!(&buf[..9], &[16, 0, 0x01, 0x00, 0x01, 0, 0, 0, 0]);
    assert_eq!(&buf[9..14], &[0, 0, 0, 0, 0]);
    assert_eq!(&buf[14..16], &[1, 9]);
}

#[test]
fn raw_kind_values_outside_table_are_rejected() {
    assert!(CommandKind::try_from(7u8).is_err());
    assert_eq!(CommandKind::try_from(4u8), Ok(CommandKind::K4));
}

#[test]
fn text_frame_from_raw_option_bits() {
    // Option bits 60 = 0x04 | 0x08 | 0x10 | 0x20
    let mut buf = [0u8; MAX_FRAME_LEN];
    let params = FrameParams {
        flag: 3,
        secondary: Some(b"erik"),
        frame_size: 0,
        intensity: 60,
    };
    let n = encode_frame_with_defaults(
        CommandKind::K4,
        b"erik",
        &params,
        EncodeOptions::from_bits_truncate(60),
        &mut buf,
    )
    .unwrap();
    assert_eq!(
        &buf[..n],
        &[
            19, 0, 0, 1, 0, 0x00, 0x0C, 0x00, 0x00, 0x00, 0x2D, 0x0C, 0x96, 0x14, 0, b'e', b'r',
            b'i', b'k'
        ]
    );
}

#[test]
fn session_runs_a_command_sequence() {
    let queue = Queue::new();
    let display = AckingDisplay {
        queue: &queue,
        frames: Vec::new(),
    };
    let mut session = CommandSession::new(display, NoTimeout, &queue);

    block_on(async {
        let reply = session.send_command(&ControlCommand::GetLedType).await.unwrap();
        assert_eq!(reply.as_slice(), &[8, 0, 0]);

        let reply = session
            .send_command(&ControlCommand::SetBrightness(10))
            .await
            .unwrap();
        assert_eq!(reply.as_slice(), &[5, 0, 0]);

        let reply = session.send_text("Hi").await.unwrap();
        assert_eq!(reply.as_slice(), &[17, 0, 0]);
    });

    assert_eq!(session.exchanges(), 3);
    let frames = &session.writer().frames;
    assert_eq!(frames[0], [8, 0, 1, 0x80, 15, 54, 0, 1]);
    assert_eq!(frames[1], [5, 0, 4, 0x80, 10]);
    assert_eq!(frames[2].len(), 17);
}

#[test]
fn session_after_link_loss_is_terminal() {
    let queue = Queue::new();
    let display = AckingDisplay {
        queue: &queue,
        frames: Vec::new(),
    };
    let mut session = CommandSession::new(display, NoTimeout, &queue);

    queue.close();
    assert_eq!(
        block_on(session.send_command(&ControlCommand::Exit)),
        Err(SessionError::Disconnected)
    );
    assert!(session.writer().frames.is_empty());
}

#[test]
fn configured_target_is_recognised() {
    let mut ad = vec![TARGET_NAME.len() as u8 + 1, 0x09];
    ad.extend_from_slice(TARGET_NAME.as_bytes());
    let peer_le = [0x84, 0x1C, 0x27, 0x59, 0x40, 0xA2];
    assert!(is_target_device(&peer_le, &ad));
}
