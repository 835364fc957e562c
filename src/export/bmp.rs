// SPDX-License-Identifier: GPL-3.0-or-later
use std::convert::TryFrom;
use std::io::Write;

use bytes::{BufMut, BytesMut};

use crate::image_buffer::Rgb565Image;
use crate::render::rgb565_to_rgb555;

use super::ExportError;

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
pub(crate) const PIXEL_OFFSET: u32 = FILE_HEADER_LEN + INFO_HEADER_LEN;
const BITS_PER_PIXEL: u16 = 16;

/// Bytes in one stored row, including the padding out to a multiple of four bytes.
fn row_stride(width: u32) -> u32 {
    (width * 2 + 3) & !3
}

/// The two bitmap headers for an image of the given size. Everything not set here (compression,
/// resolution, palette sizes) is zero.
fn headers(width: u32, height: u32) -> Result<BytesMut, ExportError> {
    let pixel_bytes = u64::from(row_stride(width)) * u64::from(height);
    let file_size = u32::try_from(pixel_bytes + u64::from(PIXEL_OFFSET))
        .map_err(|_| ExportError::DimensionMismatch { width, height })?;
    let mut header = BytesMut::with_capacity(PIXEL_OFFSET as usize);
    // File header
    header.put_slice(b"BM");
    header.put_u32_le(file_size);
    header.put_u32_le(0);
    header.put_u32_le(PIXEL_OFFSET);
    // Info header
    header.put_u32_le(INFO_HEADER_LEN);
    header.put_u32_le(width);
    header.put_u32_le(height);
    header.put_u16_le(1);
    header.put_u16_le(BITS_PER_PIXEL);
    header.put_bytes(0, 24);
    Ok(header)
}

/// Write `image` as an uncompressed 16-bit bitmap, converting each pixel to X1R5G5B5.
///
/// Rows are written bottom row first, as bitmaps with a positive height expect.
pub(crate) fn write_bmp<W: Write>(mut writer: W, image: &Rgb565Image) -> Result<(), ExportError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || i32::try_from(width).is_err() || i32::try_from(height).is_err()
    {
        return Err(ExportError::DimensionMismatch { width, height });
    }
    writer.write_all(&headers(width, height)?)?;
    let stride = row_stride(width) as usize;
    let mut row_buffer = BytesMut::with_capacity(stride);
    for row in image.as_raw().chunks_exact(width as usize).rev() {
        row_buffer.clear();
        for pixel in row {
            row_buffer.put_u16_le(rgb565_to_rgb555(*pixel));
        }
        row_buffer.put_bytes(0, stride - row_buffer.len());
        writer.write_all(&row_buffer)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use std::convert::TryInto;

    use image::Luma;

    use super::{write_bmp, PIXEL_OFFSET};
    use crate::export::ExportError;
    use crate::image_buffer::Rgb565Image;

    fn u32_at(data: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(data[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(data: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(data[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn header_layout() {
        let image = Rgb565Image::new(320, 240);
        let mut data = Vec::new();
        write_bmp(&mut data, &image).unwrap();
        assert_eq!(&data[0..2], b"BM");
        assert_eq!(u32_at(&data, 2) as usize, data.len());
        assert_eq!(data.len(), 320 * 240 * 2 + 54);
        assert_eq!(u32_at(&data, 6), 0);
        assert_eq!(u32_at(&data, 10), 54);
        assert_eq!(u32_at(&data, 14), 40);
        assert_eq!(u32_at(&data, 18), 320);
        assert_eq!(u32_at(&data, 22), 240);
        assert_eq!(u16_at(&data, 26), 1);
        assert_eq!(u16_at(&data, 28), 16);
        assert!(data[30..54].iter().all(|b| *b == 0));
    }

    #[test]
    fn pure_red() {
        let image = Rgb565Image::from_pixel(2, 1, Luma([0xF800]));
        let mut data = Vec::new();
        write_bmp(&mut data, &image).unwrap();
        let offset = PIXEL_OFFSET as usize;
        // 0xF800 repacks to 0x7C00, stored low byte first.
        assert_eq!(&data[offset..], &[0x00, 0x7C, 0x00, 0x7C]);
    }

    #[test]
    fn bottom_row_first() {
        let mut image = Rgb565Image::new(2, 2);
        image.put_pixel(0, 0, Luma([0x001F]));
        image.put_pixel(1, 0, Luma([0x001E]));
        image.put_pixel(0, 1, Luma([0xFFFF]));
        image.put_pixel(1, 1, Luma([0x07E0]));
        let mut data = Vec::new();
        write_bmp(&mut data, &image).unwrap();
        let offset = PIXEL_OFFSET as usize;
        assert_eq!(
            &data[offset..],
            &[0xFF, 0x7F, 0xE0, 0x03, 0x1F, 0x00, 0x1E, 0x00]
        );
    }

    #[test]
    fn odd_width_rows_padded() {
        let image = Rgb565Image::from_pixel(3, 2, Luma([0x001F]));
        let mut data = Vec::new();
        write_bmp(&mut data, &image).unwrap();
        assert_eq!(data.len(), 54 + 8 * 2);
        assert_eq!(u32_at(&data, 2) as usize, data.len());
        let offset = PIXEL_OFFSET as usize;
        assert_eq!(
            &data[offset..offset + 8],
            &[0x1F, 0x00, 0x1F, 0x00, 0x1F, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn empty_image() {
        let image = Rgb565Image::new(0, 4);
        let result = write_bmp(Vec::new(), &image);
        assert!(matches!(
            result,
            Err(ExportError::DimensionMismatch {
                width: 0,
                height: 4
            })
        ));
    }
}
