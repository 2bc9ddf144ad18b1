//! Byte-level CSI scanner shared by the decoders.
//!
//! Works over a cursor into the input slice and reports how many bytes a
//! complete sequence spans, so callers can return `(event, consumed)` pairs.

pub(crate) const ESC: u8 = 0x1b;

/// A complete `ESC [` sequence split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Csi<'a> {
    /// Private marker directly after `ESC [` (`<`, `=`, `>` or `?`).
    pub marker: Option<u8>,
    /// Parameter bytes (digits, `;`, `:`).
    pub params: &'a [u8],
    pub intermediates: &'a [u8],
    pub final_byte: u8,
    /// Total length of the sequence including `ESC [`.
    pub len: usize,
}

impl<'a> Csi<'a> {
    /// `;`-separated parameter sections.
    pub fn sections(&self) -> impl Iterator<Item = &'a [u8]> {
        self.params.split(|&b| b == b';')
    }

    /// Parameter `idx` as a number, or `default` when missing or empty.
    pub fn param(&self, idx: usize, default: u32) -> u32 {
        self.sections()
            .nth(idx)
            .and_then(|section| section.split(|&b| b == b':').next())
            .and_then(number)
            .unwrap_or(default)
    }
}

/// Scan one CSI sequence at the start of `input`.
///
/// Returns `None` when `input` does not start with `ESC [`, when a byte
/// outside the CSI grammar appears, or when the sequence is truncated.
pub(crate) fn scan(input: &[u8]) -> Option<Csi<'_>> {
    if input.len() < 3 || input[0] != ESC || input[1] != b'[' {
        return None;
    }

    let mut pos = 2;
    let marker = match input[pos] {
        b'<' | b'=' | b'>' | b'?' => {
            pos += 1;
            Some(input[pos - 1])
        }
        _ => None,
    };

    let params_start = pos;
    while pos < input.len() && matches!(input[pos], b'0'..=b'9' | b';' | b':') {
        pos += 1;
    }
    let params = &input[params_start..pos];

    let inter_start = pos;
    while pos < input.len() && (0x20..=0x2F).contains(&input[pos]) {
        pos += 1;
    }
    let intermediates = &input[inter_start..pos];

    let final_byte = *input.get(pos)?;
    if !(0x40..=0x7E).contains(&final_byte) {
        return None;
    }

    Some(Csi {
        marker,
        params,
        intermediates,
        final_byte,
        len: pos + 1,
    })
}

/// Parse an all-digit field. Empty, non-numeric or overflowing fields are `None`.
pub(crate) fn number(field: &[u8]) -> Option<u32> {
    if field.is_empty() {
        return None;
    }
    field.iter().try_fold(0u32, |acc, &b| {
        if b.is_ascii_digit() {
            acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
        } else {
            None
        }
    })
}

/// Find the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
