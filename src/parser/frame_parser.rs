use ndarray::{Array2, ArrayViewMut2};
use winnow::{Parser, binary::le_u16, error::ContextError, token::take};

use crate::error::{DmcError, Result};
use crate::types::geometry::FrameGeometry;

/// Combines the two trailer words into the camera's 32-bit frame counter.
///
/// The first word on disk is the high half.
pub fn raw_frame_counter(first: u16, second: u16) -> u32 {
    (u32::from(first) << 16) | u32::from(second)
}

/// Parses the 4-byte frame trailer:
/// - 2 bytes: high half of the raw frame counter (u16, little‑endian)
/// - 2 bytes: low half of the raw frame counter (u16, little‑endian)
pub fn parse_frame_trailer(input: &mut &[u8]) -> std::result::Result<u32, ContextError> {
    (le_u16, le_u16)
        .map(|(first, second)| raw_frame_counter(first, second))
        .parse_next(input)
}

/// Parses one frame record into `out`, whose shape fixes the payload size.
/// Returns the raw frame counter from the trailer.
pub fn parse_frame_into(
    input: &mut &[u8],
    mut out: ArrayViewMut2<'_, u16>,
) -> std::result::Result<u32, ContextError> {
    let payload: &[u8] = take::<_, _, ContextError>(out.len() * 2).parse_next(input)?;
    for (pixel, bytes) in out.iter_mut().zip(payload.chunks_exact(2)) {
        *pixel = u16::from_le_bytes([bytes[0], bytes[1]]);
    }
    parse_frame_trailer.parse_next(input)
}

/// Parses one frame record of the given (rows, columns) shape.
pub fn parse_frame(
    input: &mut &[u8],
    shape: (usize, usize),
) -> std::result::Result<(Array2<u16>, u32), ContextError> {
    let mut pixels = Array2::zeros(shape);
    let raw_index = parse_frame_into(input, pixels.view_mut())?;
    Ok((pixels, raw_index))
}

/// Slices the record of frame `index` out of a whole-file buffer.
pub fn frame_record<'a>(data: &'a [u8], geometry: &FrameGeometry, index: usize) -> Result<&'a [u8]> {
    let needed = geometry.bytes_per_frame();
    let offset = geometry.frame_offset(index);
    let start = usize::try_from(offset).unwrap_or(usize::MAX);
    let available = data.len().saturating_sub(start);

    match start.checked_add(needed).and_then(|end| data.get(start..end)) {
        Some(record) => Ok(record),
        None => Err(DmcError::TruncatedFrame {
            index,
            offset,
            needed,
            available,
        }),
    }
}

/// Decodes frame `index` of a whole-file buffer into `out`.
pub fn decode_frame_into(
    data: &[u8],
    geometry: &FrameGeometry,
    index: usize,
    out: ArrayViewMut2<'_, u16>,
) -> Result<u32> {
    let mut record = frame_record(data, geometry, index)?;
    let available = record.len();
    parse_frame_into(&mut record, out).map_err(|_| DmcError::TruncatedFrame {
        index,
        offset: geometry.frame_offset(index),
        needed: geometry.bytes_per_frame(),
        available,
    })
}
