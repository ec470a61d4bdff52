//! Property tests for the command-frame codec.

use ledlink::protocol::frame::{
    checksum, encode_frame, encode_frame_with_defaults, scale_intensity, CommandKind,
    EncodeOptions, FrameParams, DEFAULT_FRAME_SIZE, MAX_FRAME_LEN,
};
use proptest::prelude::*;

fn encode(kind: CommandKind, primary: &[u8], params: &FrameParams<'_>) -> Vec<u8> {
    let mut buf = [0u8; MAX_FRAME_LEN];
    let n = encode_frame(kind, primary, params, &mut buf).unwrap();
    buf[..n].to_vec()
}

fn any_kind() -> impl Strategy<Value = CommandKind> {
    (0u8..=6).prop_map(|raw| CommandKind::try_from(raw).unwrap())
}

proptest! {
    #[test]
    fn payload_length_kinds_ignore_frame_size(
        kind in prop_oneof![Just(CommandKind::K0), Just(CommandKind::K6)],
        primary in prop::collection::vec(any::<u8>(), 0..64),
        frame_size in any::<u32>(),
    ) {
        let params = FrameParams { frame_size, ..FrameParams::default() };
        let frame = encode(kind, &primary, &params);
        prop_assert_eq!(&frame[5..9], &(primary.len() as u32).to_le_bytes());
    }

    #[test]
    fn crc_trailer_precedes_payload(
        raw in 1u8..=4,
        primary in prop::collection::vec(any::<u8>(), 0..64),
        secondary in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let kind = CommandKind::try_from(raw).unwrap();
        let params = FrameParams { secondary: Some(&secondary), ..FrameParams::default() };
        let frame = encode(kind, &primary, &params);

        let source: &[u8] = if raw == 1 || raw == 3 { &secondary } else { &primary };
        let start = frame.len() - primary.len() - 5;
        prop_assert_eq!(&frame[start..start + 4], &checksum(source).to_le_bytes());
        prop_assert_eq!(frame[start + 4], if raw == 3 { 2 } else { 0 });
        prop_assert_eq!(&frame[start + 5..], primary.as_slice());
    }

    #[test]
    fn kind5_is_header_plus_payload(
        primary in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let frame = encode(CommandKind::K5, &primary, &FrameParams::default());
        prop_assert_eq!(frame.len(), 5 + primary.len());
        prop_assert_eq!(&frame[5..], primary.as_slice());
    }

    #[test]
    fn length_field_matches_output(
        kind in any_kind(),
        primary in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let frame = encode(kind, &primary, &FrameParams::default());
        prop_assert_eq!(u16::from_le_bytes([frame[0], frame[1]]) as usize, frame.len());
    }

    #[test]
    fn full_intensity_is_noop(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut scaled = payload.clone();
        scale_intensity(100, &mut scaled);
        prop_assert_eq!(scaled, payload);
    }

    #[test]
    fn frame_size_option_matches_explicit_default(
        kind in any_kind(),
        frame_size in any::<u32>(),
        primary in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let mut with_option = [0u8; MAX_FRAME_LEN];
        let params = FrameParams { frame_size, ..FrameParams::default() };
        let n = encode_frame_with_defaults(
            kind,
            &primary,
            &params,
            EncodeOptions::DEFAULT_FRAME_SIZE,
            &mut with_option,
        )
        .unwrap();

        let explicit = encode(
            kind,
            &primary,
            &FrameParams { frame_size: DEFAULT_FRAME_SIZE, ..FrameParams::default() },
        );
        prop_assert_eq!(&with_option[..n], explicit.as_slice());
    }
}
