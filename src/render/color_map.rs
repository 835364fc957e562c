// SPDX-License-Identifier: GPL-3.0-or-later
use crate::temperature::TemperatureRange;

/// The palette every rendered image uses, as RGB565. Index 0 is mapped to the coldest
/// temperatures (deep violet), index 255 to the hottest (near white).
pub(crate) const COLOR_MAP: [u16; 256] = [
    0x280A, 0x200A, 0x200A, 0x200B, 0x200B, 0x200B, 0x200C, 0x200C,
    0x200D, 0x180D, 0x180D, 0x180E, 0x180E, 0x180E, 0x180F, 0x180F,
    0x1810, 0x1010, 0x1010, 0x1011, 0x1011, 0x1011, 0x1012, 0x1012,
    0x1013, 0x0813, 0x0813, 0x0814, 0x0814, 0x0814, 0x0815, 0x0815,
    0x0816, 0x0016, 0x0016, 0x0017, 0x0017, 0x0017, 0x0018, 0x0018,
    0x0019, 0x0039, 0x0039, 0x0059, 0x0079, 0x0099, 0x00BA, 0x00DA,
    0x00FA, 0x011A, 0x011A, 0x013A, 0x015B, 0x017B, 0x019B, 0x01BB,
    0x01DB, 0x01FB, 0x01FC, 0x021C, 0x023C, 0x025C, 0x027C, 0x029D,
    0x02BD, 0x02DD, 0x02DD, 0x02FD, 0x031D, 0x033E, 0x035E, 0x037E,
    0x039E, 0x03BE, 0x03BE, 0x03DF, 0x03FF, 0x041F, 0x043F, 0x045F,
    0x047F, 0x047F, 0x049F, 0x04BE, 0x04BE, 0x04DE, 0x04DD, 0x04FD,
    0x051D, 0x051C, 0x053C, 0x055C, 0x055B, 0x057B, 0x059B, 0x059A,
    0x05BA, 0x05DA, 0x05D9, 0x05F9, 0x05F9, 0x0618, 0x0638, 0x0638,
    0x0657, 0x0677, 0x0677, 0x0696, 0x06B6, 0x06B6, 0x06D5, 0x06F5,
    0x06F5, 0x0714, 0x0714, 0x0734, 0x0733, 0x0732, 0x0732, 0x0731,
    0x0730, 0x0F30, 0x0F2F, 0x0F0E, 0x0F0E, 0x0F0D, 0x0F0C, 0x170C,
    0x170B, 0x170A, 0x170A, 0x1709, 0x1708, 0x1F08, 0x1F07, 0x1EE6,
    0x1EE6, 0x1EE5, 0x1EE4, 0x26E4, 0x26E3, 0x26E2, 0x26E2, 0x26E1,
    0x26E0, 0x2EE0, 0x2EE0, 0x36E0, 0x3EE0, 0x46E0, 0x4EE0, 0x4EE0,
    0x56E0, 0x5EE0, 0x66E0, 0x66E0, 0x6F00, 0x7700, 0x7F00, 0x8700,
    0x8700, 0x8F00, 0x9700, 0x9F00, 0xA700, 0xA700, 0xAF00, 0xB700,
    0xBF20, 0xC720, 0xC720, 0xCF20, 0xD720, 0xDF20, 0xE720, 0xE720,
    0xE700, 0xEF00, 0xEEE0, 0xEEC0, 0xEEA0, 0xEEA0, 0xEE80, 0xEE60,
    0xEE40, 0xEE40, 0xEE20, 0xF600, 0xF5E0, 0xF5E0, 0xF5C0, 0xF5A0,
    0xF580, 0xF580, 0xF560, 0xF540, 0xFD20, 0xFD20, 0xFD00, 0xFCE0,
    0xFCC0, 0xFCC0, 0xFCA0, 0xFC80, 0xFC60, 0xFC60, 0xFC40, 0xFC20,
    0xFC00, 0xFBE0, 0xFBC0, 0xFBA0, 0xFB80, 0xFB60, 0xFB40, 0xFB20,
    0xFB00, 0xFAE0, 0xFAC0, 0xFAA0, 0xFA80, 0xFA60, 0xFA40, 0xFA20,
    0xFA00, 0xF9E0, 0xF9C0, 0xF9A0, 0xF980, 0xF960, 0xF940, 0xF920,
    0xF900, 0xF8E0, 0xF8C0, 0xF8A0, 0xF8E1, 0xF942, 0xF984, 0xF9E5,
    0xFA26, 0xFA88, 0xFAC9, 0xFB2B, 0xFB6C, 0xFBCD, 0xFC0F, 0xFC70,
    0xFCB1, 0xFD13, 0xFD54, 0xFDB6, 0xFDF7, 0xFE58, 0xFE9A, 0xFEFB,
];

/// Map a temperature onto an index into [`COLOR_MAP`].
///
/// Anything below the range is 0, anything above it is 255, and values inside the range are
/// scaled linearly and rounded down. NaN maps to 0.
pub(crate) fn color_index(value: f32, range: &TemperatureRange) -> u8 {
    let min = range.min() as f32;
    let max = range.max() as f32;
    debug_assert!(min < max, "A temperature range is always increasing");
    if value > max {
        u8::MAX
    } else if value >= min {
        // Go through f64 so the multiplication doesn't lose precision at the top of the range.
        let scaled = ((value - min) as f64 * u8::MAX as f64 / (max - min) as f64).floor();
        scaled.min(u8::MAX as f64) as u8
    } else {
        // Below the range, or NaN
        0
    }
}

/// Look up the color for a temperature.
pub(crate) fn color_for(value: f32, range: &TemperatureRange) -> u16 {
    COLOR_MAP[color_index(value, range) as usize]
}

#[cfg(test)]
mod test {
    use super::{color_for, color_index, COLOR_MAP};
    use crate::temperature::TemperatureRange;

    fn default_range() -> TemperatureRange {
        TemperatureRange::new(25, 37).unwrap()
    }

    #[test]
    fn palette_ends() {
        assert_eq!(COLOR_MAP.len(), 256);
        assert_eq!(COLOR_MAP[0], 0x280A);
        assert_eq!(COLOR_MAP[255], 0xFEFB);
    }

    #[test]
    fn clamped() {
        let range = default_range();
        assert_eq!(color_index(10.0, &range), 0);
        assert_eq!(color_index(24.99, &range), 0);
        assert_eq!(color_index(37.01, &range), 255);
        assert_eq!(color_index(120.0, &range), 255);
    }

    #[test]
    fn bounds() {
        let range = default_range();
        assert_eq!(color_index(25.0, &range), 0);
        assert_eq!(color_index(37.0, &range), 255);
    }

    #[test]
    fn rounds_down() {
        let range = default_range();
        // (30 - 25) * 255 / 12 = 106.25
        assert_eq!(color_index(30.0, &range), 106);
        // (31 - 25) * 255 / 12 = 127.5
        assert_eq!(color_index(31.0, &range), 127);
        assert_eq!(color_for(30.0, &range), 0x0677);
        assert_eq!(color_for(31.0, &range), 0x170C);
    }

    #[test]
    fn not_a_number() {
        assert_eq!(color_index(f32::NAN, &default_range()), 0);
    }

    #[test]
    fn monotonic() {
        let range = TemperatureRange::new(-10, 60).unwrap();
        let mut previous = 0;
        for tenth in -200..800 {
            let index = color_index(tenth as f32 / 10.0, &range);
            assert!(index >= previous);
            previous = index;
        }
    }
}
