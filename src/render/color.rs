// SPDX-License-Identifier: GPL-3.0-or-later

/// Black, as RGB565.
pub(crate) const BLACK: u16 = 0x0000;

/// White, as RGB565.
pub(crate) const WHITE: u16 = 0xFFFF;

/// Repack an RGB565 value into the X1R5G5B5 layout 16-bit bitmaps use.
///
/// Red and blue are kept as is, and the lowest green bit is dropped. The top bit of the result is
/// always clear.
pub(crate) fn rgb565_to_rgb555(packed: u16) -> u16 {
    let [mut low, mut high] = packed.to_le_bytes();
    low = (high << 7) | ((low & 0xC0) >> 1) | (low & 0x1F);
    high >>= 1;
    u16::from_le_bytes([low, high])
}
