//! Command-frame codec for the LED_BLE display.
//!
//! Every command written to the display is a frame laid out as:
//! ```text
//! Header (9 bytes, kinds 0-3 and 6):
//!   Byte 0-1: total frame length (little-endian)
//!   Byte 2-3: data-type tag
//!   Byte 4:   flag byte
//!   Byte 5-8: size field (little-endian u32)
//! Header (10 bytes, kind 4): as above + 1 reserved zero byte
//! Header (5 bytes, kind 5):  bytes 0-4 only, no size field
//!
//! CRC trailer (5 bytes, kinds 1-4 only):
//!   Byte 0-3: CRC-32 (IEEE, zlib-compatible), little-endian
//!   Byte 4:   status (2 for kind 3, otherwise 0)
//!
//! Payload: primary payload bytes, after intensity scaling
//! ```
//!
//! The secondary payload is never transmitted; for kinds 1 and 3 it is
//! the CRC input instead of the primary payload.

use heapless::Vec;

/// Header length for every kind carrying a size field (except kind 4).
pub const HEADER_LEN: usize = 9;

/// Kind 4 header: the regular header plus one reserved zero byte.
pub const EXTENDED_HEADER_LEN: usize = 10;

/// Kind 5 header: no size field.
pub const SHORT_HEADER_LEN: usize = 5;

/// CRC-32 (4 bytes) + status byte.
pub const CRC_TRAILER_LEN: usize = 5;

/// Size field used when [`EncodeOptions::DEFAULT_FRAME_SIZE`] is set.
pub const DEFAULT_FRAME_SIZE: u32 = 3072;

/// Intensity that leaves payload bytes untouched.
pub const FULL_INTENSITY: u16 = 100;

/// Largest frame [`encode_to_vec`] produces, the ATT attribute value limit.
///
/// This bounds the codec only. A single write on the link carries at most
/// the negotiated ATT MTU minus 3 bytes (`session::MAX_WRITE_LEN`).
pub const MAX_FRAME_LEN: usize = 512;

/// Trailer status byte for kind 3.
const KIND3_TRAILER_STATUS: u8 = 2;

/// Errors that can occur while encoding a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// The kind discriminant is outside `0..=6`.
    UnknownKind(u8),
    /// The output buffer cannot hold the encoded frame.
    BufferTooSmall,
    /// The total frame length does not fit the 16-bit length field.
    FrameTooLong,
}

/// Protocol discriminant selecting header layout, data-type tag and
/// whether a CRC trailer is appended. See [`CommandKind::layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommandKind {
    /// Tag (0,0), size field forced to the payload length, no CRC.
    K0 = 0,
    /// Tag (1,0), CRC over the secondary payload.
    K1 = 1,
    /// Tag (2,0), CRC over the primary payload.
    K2 = 2,
    /// Tag (3,0), CRC over the secondary payload, trailer status 2.
    K3 = 3,
    /// Tag (0,1), 10-byte header, CRC over the primary payload. Used for text.
    K4 = 4,
    /// Tag (5,1), 5-byte header without size field, no CRC.
    K5 = 5,
    /// Same layout as [`CommandKind::K0`].
    K6 = 6,
}

/// How the 4-byte size field of the header is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SizeField {
    /// Written with the primary payload length, caller value ignored.
    PayloadLength,
    /// Written with the caller-supplied frame size.
    FrameSize,
    /// Not present in the header.
    Omitted,
}

/// Which payload feeds the CRC trailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CrcSource {
    Primary,
    Secondary,
}

/// Structural description of one [`CommandKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KindLayout {
    pub data_type: [u8; 2],
    pub header_len: usize,
    pub size_field: SizeField,
    /// `None` when the kind carries no CRC trailer.
    pub crc: Option<CrcSource>,
    pub trailer_status: u8,
}

impl KindLayout {
    const fn new(
        data_type: [u8; 2],
        header_len: usize,
        size_field: SizeField,
        crc: Option<CrcSource>,
        trailer_status: u8,
    ) -> Self {
        Self {
            data_type,
            header_len,
            size_field,
            crc,
            trailer_status,
        }
    }

    /// Length of the CRC trailer for this layout (0 or 5).
    pub const fn trailer_len(&self) -> usize {
        if self.crc.is_some() {
            CRC_TRAILER_LEN
        } else {
            0
        }
    }
}

/// Layout table indexed by kind discriminant.
const LAYOUTS: [KindLayout; 7] = [
    KindLayout::new([0, 0], HEADER_LEN, SizeField::PayloadLength, None, 0),
    KindLayout::new([1, 0], HEADER_LEN, SizeField::FrameSize, Some(CrcSource::Secondary), 0),
    KindLayout::new([2, 0], HEADER_LEN, SizeField::FrameSize, Some(CrcSource::Primary), 0),
    KindLayout::new(
        [3, 0],
        HEADER_LEN,
        SizeField::FrameSize,
        Some(CrcSource::Secondary),
        KIND3_TRAILER_STATUS,
    ),
    KindLayout::new(
        [0, 1],
        EXTENDED_HEADER_LEN,
        SizeField::FrameSize,
        Some(CrcSource::Primary),
        0,
    ),
    KindLayout::new([5, 1], SHORT_HEADER_LEN, SizeField::Omitted, None, 0),
    KindLayout::new([0, 0], HEADER_LEN, SizeField::PayloadLength, None, 0),
];

impl CommandKind {
    /// All kinds, in discriminant order.
    pub const ALL: [CommandKind; 7] = [
        CommandKind::K0,
        CommandKind::K1,
        CommandKind::K2,
        CommandKind::K3,
        CommandKind::K4,
        CommandKind::K5,
        CommandKind::K6,
    ];

    /// Raw protocol value.
    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    /// Structural layout of frames of this kind.
    pub const fn layout(self) -> KindLayout {
        LAYOUTS[self as usize]
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = EncodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CommandKind::ALL
            .get(value as usize)
            .copied()
            .ok_or(EncodeError::UnknownKind(value))
    }
}

/// Caller-supplied encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams<'a> {
    /// Header byte 4. Also called the offset.
    pub flag: u8,
    /// CRC input for kinds 1 and 3, never transmitted. `None` hashes as empty.
    pub secondary: Option<&'a [u8]>,
    /// Size field for kinds 1-4.
    pub frame_size: u32,
    /// Per-byte scaling of the primary payload in percent.
    pub intensity: u16,
}

impl Default for FrameParams<'_> {
    fn default() -> Self {
        Self {
            flag: 0,
            secondary: None,
            frame_size: DEFAULT_FRAME_SIZE,
            intensity: FULL_INTENSITY,
        }
    }
}

/// Bit set selecting which [`FrameParams`] fields are replaced by their
/// protocol default before encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncodeOptions(u8);

impl EncodeOptions {
    pub const NONE: Self = Self(0);
    /// Secondary payload becomes empty.
    pub const DEFAULT_SECONDARY: Self = Self(0x04);
    /// Flag byte (offset) becomes 0.
    pub const DEFAULT_OFFSET: Self = Self(0x08);
    /// Size field becomes [`DEFAULT_FRAME_SIZE`].
    pub const DEFAULT_FRAME_SIZE: Self = Self(0x10);
    /// Intensity becomes [`FULL_INTENSITY`].
    pub const FULL_INTENSITY: Self = Self(0x20);
    pub const ALL: Self = Self(0x3C);

    /// Build from raw option bits. Bits outside [`EncodeOptions::ALL`] are ignored.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Substitute defaults for every field whose bit is set.
    pub fn apply<'a>(self, params: FrameParams<'a>) -> FrameParams<'a> {
        FrameParams {
            flag: if self.contains(Self::DEFAULT_OFFSET) {
                0
            } else {
                params.flag
            },
            secondary: if self.contains(Self::DEFAULT_SECONDARY) {
                Some(&[])
            } else {
                params.secondary
            },
            frame_size: if self.contains(Self::DEFAULT_FRAME_SIZE) {
                DEFAULT_FRAME_SIZE
            } else {
                params.frame_size
            },
            intensity: if self.contains(Self::FULL_INTENSITY) {
                FULL_INTENSITY
            } else {
                params.intensity
            },
        }
    }
}

impl core::ops::BitOr for EncodeOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for EncodeOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Scale one payload byte: `(b * intensity / 100) & 0xFF`.
///
/// Values above 100 are not clamped and wrap through the mask.
#[inline]
pub const fn scale_byte(byte: u8, intensity: u16) -> u8 {
    ((byte as u32 * intensity as u32 / 100) & 0xFF) as u8
}

/// Apply the intensity transform to `payload` in place.
///
/// No-op for [`FULL_INTENSITY`].
pub fn scale_intensity(intensity: u16, payload: &mut [u8]) {
    if intensity == FULL_INTENSITY {
        return;
    }
    for b in payload.iter_mut() {
        *b = scale_byte(*b, intensity);
    }
}

/// CRC-32 (IEEE 802.3, reflected, zlib-compatible).
pub fn checksum(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Number of bytes [`encode_frame`] produces for `kind` and a primary
/// payload of `payload_len` bytes.
pub const fn encoded_len(kind: CommandKind, payload_len: usize) -> usize {
    let layout = kind.layout();
    layout.header_len + layout.trailer_len() + payload_len
}

/// Encode one command frame into `buf`.
///
/// The primary payload is copied into the frame after intensity scaling;
/// `primary` itself is left untouched. When a CRC covers the primary
/// payload it is computed over the scaled bytes.
///
/// Returns the number of bytes written.
pub fn encode_frame(
    kind: CommandKind,
    primary: &[u8],
    params: &FrameParams<'_>,
    buf: &mut [u8],
) -> Result<usize, EncodeError> {
    let layout = kind.layout();
    let total = encoded_len(kind, primary.len());
    let total_field = u16::try_from(total).map_err(|_| EncodeError::FrameTooLong)?;
    if buf.len() < total {
        return Err(EncodeError::BufferTooSmall);
    }

    let header = &mut buf[..layout.header_len];
    header.fill(0);
    header[0..2].copy_from_slice(&total_field.to_le_bytes());
    header[2..4].copy_from_slice(&layout.data_type);
    header[4] = params.flag;
    match layout.size_field {
        SizeField::PayloadLength => {
            header[5..9].copy_from_slice(&(primary.len() as u32).to_le_bytes())
        }
        SizeField::FrameSize => header[5..9].copy_from_slice(&params.frame_size.to_le_bytes()),
        SizeField::Omitted => {}
    }

    let payload_start = layout.header_len + layout.trailer_len();
    let payload = &mut buf[payload_start..total];
    payload.copy_from_slice(primary);
    scale_intensity(params.intensity, payload);

    if let Some(source) = layout.crc {
        let crc = match source {
            CrcSource::Primary => checksum(&buf[payload_start..total]),
            CrcSource::Secondary => checksum(params.secondary.unwrap_or(&[])),
        };
        let trailer = &mut buf[layout.header_len..payload_start];
        trailer[0..4].copy_from_slice(&crc.to_le_bytes());
        trailer[4] = layout.trailer_status;
    }

    Ok(total)
}

/// Resolve `options` against `params`, then encode.
///
/// Options are applied first; the kind 0/6 size-field rule still wins
/// afterwards.
pub fn encode_frame_with_defaults(
    kind: CommandKind,
    primary: &[u8],
    params: &FrameParams<'_>,
    options: EncodeOptions,
    buf: &mut [u8],
) -> Result<usize, EncodeError> {
    let resolved = options.apply(*params);
    encode_frame(kind, primary, &resolved, buf)
}

/// Encode a frame into a fixed-capacity vector.
pub fn encode_to_vec(
    kind: CommandKind,
    primary: &[u8],
    params: &FrameParams<'_>,
) -> Result<Vec<u8, MAX_FRAME_LEN>, EncodeError> {
    let mut frame = Vec::new();
    // Clamped so an oversized frame still reports the precise error below.
    let len = encoded_len(kind, primary.len()).min(MAX_FRAME_LEN);
    frame
        .resize_default(len)
        .map_err(|_| EncodeError::BufferTooSmall)?;
    encode_frame(kind, primary, params, &mut frame)?;
    Ok(frame)
}

/// Encode a text frame the way the display expects: kind 4 with every
/// default option set.
pub fn encode_text(text: &str, buf: &mut [u8]) -> Result<usize, EncodeError> {
    encode_frame_with_defaults(
        CommandKind::K4,
        text.as_bytes(),
        &FrameParams::default(),
        EncodeOptions::ALL,
        buf,
    )
}
