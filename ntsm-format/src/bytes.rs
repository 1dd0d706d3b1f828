//! Little-endian field packing at fixed offsets, and NUL-padded name slots.
//!
//! Callers size their buffers up front; every helper indexes within them.

#[inline]
pub(crate) fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn put_i32(buf: &mut [u8], offset: usize, value: i32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub(crate) fn put_f32(buf: &mut [u8], offset: usize, value: f32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub(crate) fn put_f32s(buf: &mut [u8], offset: usize, values: &[f32]) {
    for (i, value) in values.iter().enumerate() {
        put_f32(buf, offset + i * 4, *value);
    }
}

#[inline]
pub(crate) fn get_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[inline]
pub(crate) fn get_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

#[inline]
pub(crate) fn get_f32(buf: &[u8], offset: usize) -> f32 {
    f32::from_bits(get_u32(buf, offset))
}

pub(crate) fn get_f32s<const N: usize>(buf: &[u8], offset: usize) -> [f32; N] {
    let mut out = [0.0; N];
    for (i, value) in out.iter_mut().enumerate() {
        *value = get_f32(buf, offset + i * 4);
    }
    out
}

/// Cut `name` at its first NUL, then to at most `max_len` bytes without
/// splitting a UTF-8 character. The result survives a trip through a name slot.
pub fn truncate_name(name: &str, max_len: usize) -> &str {
    let name = match name.find('\0') {
        Some(end) => &name[..end],
        None => name,
    };
    if name.len() <= max_len {
        return name;
    }
    let mut end = max_len;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Write `name` into a NUL-padded slot, always leaving at least one trailing NUL.
pub(crate) fn put_name(buf: &mut [u8], offset: usize, slot_len: usize, name: &str) {
    let slot = &mut buf[offset..offset + slot_len];
    slot.fill(0);
    let name = truncate_name(name, slot_len - 1);
    slot[..name.len()].copy_from_slice(name.as_bytes());
}

/// Read a NUL-terminated name slot. Invalid UTF-8 is replaced, not rejected.
pub(crate) fn get_name(buf: &[u8], offset: usize, slot_len: usize) -> String {
    let slot = &buf[offset..offset + slot_len];
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot_len);
    String::from_utf8_lossy(&slot[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_roundtrip() {
        let mut buf = [0u8; 12];
        put_u32(&mut buf, 0, 0xDEADBEEF);
        put_i32(&mut buf, 4, -1);
        put_f32(&mut buf, 8, 1.5);

        assert_eq!(&buf[0..4], &[0xEF, 0xBE, 0xAD, 0xDE]);
        assert_eq!(&buf[4..8], &[0xFF; 4]);
        assert_eq!(get_u32(&buf, 0), 0xDEADBEEF);
        assert_eq!(get_i32(&buf, 4), -1);
        assert_eq!(get_f32(&buf, 8), 1.5);
    }

    #[test]
    fn test_f32_arrays() {
        let mut buf = [0u8; 16];
        put_f32s(&mut buf, 4, &[1.0, -2.0, 3.25]);
        assert_eq!(get_f32s::<3>(&buf, 4), [1.0, -2.0, 3.25]);
        assert_eq!(&buf[0..4], &[0; 4]);
    }

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate_name("sword", 127), "sword");
        assert_eq!(truncate_name("abcdef", 3), "abc");
    }

    #[test]
    fn test_truncate_stops_at_nul() {
        assert_eq!(truncate_name("a\0b", 127), "a");
        assert_eq!(truncate_name("\0tail", 127), "");
        assert_eq!(truncate_name("abc\0", 2), "ab");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        // "é" is two bytes; cutting at 2 would split it
        assert_eq!(truncate_name("aé", 2), "a");
        assert_eq!(truncate_name("aé", 3), "aé");
    }

    #[test]
    fn test_name_slot_always_terminated() {
        let mut buf = [0xFFu8; 8];
        put_name(&mut buf, 0, 8, "abcdefghij");
        assert_eq!(&buf, b"abcdefg\0");
        assert_eq!(get_name(&buf, 0, 8), "abcdefg");
    }

    #[test]
    fn test_name_slot_without_terminator() {
        // Written by another producer that filled the slot completely
        let buf = *b"abcd";
        assert_eq!(get_name(&buf, 0, 4), "abcd");
    }
}
