pub mod value;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::buffer::ByteBuffer;
use crate::document::Document;
use crate::pattern::CompiledPattern;

pub use value::{encode, ByteOrder, FindMode, FindValue, FloatWidth, IntWidth};

/// Bytes read per step of an exact scan
const SCAN_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindDirection {
    #[default]
    Forward,
    Backward,
    /// Forward, wrapping around once at the end
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    pub mode: FindMode,
    pub direction: FindDirection,
    /// Text mode only; other modes always compare exactly
    pub case_sensitive: bool,
    /// `None` picks the smallest width that fits the value
    pub int_width: Option<IntWidth>,
    pub float_width: FloatWidth,
    pub byte_order: ByteOrder,
}

impl FindOptions {
    pub fn new(mode: FindMode, direction: FindDirection) -> Self {
        Self {
            mode,
            direction,
            ..Default::default()
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn int_width(mut self, width: IntWidth) -> Self {
        self.int_width = Some(width);
        self
    }

    pub fn float_width(mut self, width: FloatWidth) -> Self {
        self.float_width = width;
        self
    }

    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }
}

/// Location and length of a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub offset: usize,
    pub len: usize,
}

/// Cooperative cancellation flag for long scans. Clones share the flag, so
/// another thread can stop a search running on the document's thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

fn cancelled(cancel: Option<&CancelToken>) -> bool {
    cancel.is_some_and(CancelToken::is_cancelled)
}

/// Search `buffer` for `value` starting at `from`.
///
/// Backward searches only report matches starting before `from`. `All`
/// scans to the end, then wraps once and scans up to `from`.
pub fn find(
    buffer: &dyn ByteBuffer,
    value: &FindValue,
    from: usize,
    options: &FindOptions,
    cancel: Option<&CancelToken>,
) -> Option<Match> {
    let found = match (options.mode, value) {
        (FindMode::Hex, FindValue::Text(pattern)) => {
            let pattern = CompiledPattern::compile(pattern);
            if !pattern.is_valid() {
                return None;
            }
            find_pattern(buffer, &pattern, from, options.direction, cancel)
        }
        _ => {
            let needle = encode(value, options);
            if needle.is_empty() || needle.len() > buffer.len() {
                return None;
            }
            let fold = options.mode == FindMode::Text && !options.case_sensitive;
            find_bytes(buffer, &needle, from, options.direction, fold, cancel).map(|offset| {
                Match {
                    offset,
                    len: needle.len(),
                }
            })
        }
    };

    tracing::debug!(
        from,
        mode = ?options.mode,
        direction = ?options.direction,
        found = ?found,
        "find"
    );
    found
}

/// Find `old` and swap it for `new` as a single undo step.
///
/// Returns the match with the replacement's length, or `None` when nothing
/// was found or `new` cannot be encoded.
pub fn replace(
    document: &mut Document,
    old: &FindValue,
    new: &FindValue,
    from: usize,
    options: &FindOptions,
    cancel: Option<&CancelToken>,
) -> Option<Match> {
    let found = find(document.buffer(), old, from, options, cancel)?;
    if found.len == 0 {
        return None;
    }

    let bytes = encode(new, options);
    if bytes.is_empty() {
        return None;
    }

    document.begin_group();
    document.remove(found.offset, found.len);
    let inserted = document.insert(found.offset, &bytes);
    document.end_group();

    inserted.ok().map(|_| Match {
        offset: found.offset,
        len: bytes.len(),
    })
}

fn find_pattern(
    buffer: &dyn ByteBuffer,
    pattern: &CompiledPattern,
    from: usize,
    direction: FindDirection,
    cancel: Option<&CancelToken>,
) -> Option<Match> {
    let len = buffer.len();
    let from = from.min(len);
    let candidates: Box<dyn Iterator<Item = usize>> = match direction {
        FindDirection::Forward => Box::new(from..len),
        FindDirection::Backward => Box::new((0..from).rev()),
        FindDirection::All => Box::new((from..len).chain(0..from)),
    };

    for idx in candidates {
        if cancelled(cancel) {
            return None;
        }
        if let Some(matched) = pattern.match_at(buffer, idx) {
            return Some(Match {
                offset: idx,
                len: matched,
            });
        }
    }
    None
}

fn find_bytes(
    buffer: &dyn ByteBuffer,
    needle: &[u8],
    from: usize,
    direction: FindDirection,
    fold: bool,
    cancel: Option<&CancelToken>,
) -> Option<usize> {
    let len = buffer.len();
    let from = from.min(len);
    match direction {
        FindDirection::Forward => scan_forward(buffer, needle, from, len, fold, cancel),
        FindDirection::Backward => scan_backward(buffer, needle, 0, from, fold, cancel),
        FindDirection::All => scan_forward(buffer, needle, from, len, fold, cancel)
            .or_else(|| scan_forward(buffer, needle, 0, from, fold, cancel)),
    }
}

fn same(window: &[u8], needle: &[u8], fold: bool) -> bool {
    if fold {
        window.eq_ignore_ascii_case(needle)
    } else {
        window == needle
    }
}

/// First match whose start lies in `[lo, hi)`
fn scan_forward(
    buffer: &dyn ByteBuffer,
    needle: &[u8],
    lo: usize,
    hi: usize,
    fold: bool,
    cancel: Option<&CancelToken>,
) -> Option<usize> {
    let mut bottom = lo;
    while bottom < hi {
        if cancelled(cancel) {
            return None;
        }
        let top = (bottom + SCAN_CHUNK).min(hi);
        let chunk = buffer.read(bottom, top - bottom + needle.len() - 1);
        if chunk.len() < needle.len() {
            return None;
        }
        if let Some(pos) = chunk
            .windows(needle.len())
            .take(top - bottom)
            .position(|w| same(w, needle, fold))
        {
            return Some(bottom + pos);
        }
        bottom = top;
    }
    None
}

/// Last match whose start lies in `[lo, hi)`
fn scan_backward(
    buffer: &dyn ByteBuffer,
    needle: &[u8],
    lo: usize,
    hi: usize,
    fold: bool,
    cancel: Option<&CancelToken>,
) -> Option<usize> {
    let mut top = hi;
    while top > lo {
        if cancelled(cancel) {
            return None;
        }
        let bottom = top.saturating_sub(SCAN_CHUNK).max(lo);
        let chunk = buffer.read(bottom, top - bottom + needle.len() - 1);
        if chunk.len() >= needle.len() {
            if let Some(pos) = chunk
                .windows(needle.len())
                .take(top - bottom)
                .rposition(|w| same(w, needle, fold))
            {
                return Some(bottom + pos);
            }
        }
        top = bottom;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;

    fn text(direction: FindDirection) -> FindOptions {
        FindOptions::new(FindMode::Text, direction).case_sensitive(true)
    }

    #[test]
    fn test_forward_scenario() {
        let buffer = MemoryBuffer::from_bytes(b"ABCABC".to_vec());
        let opts = text(FindDirection::Forward);
        let abc = FindValue::from("ABC");
        assert_eq!(find(&buffer, &abc, 0, &opts, None), Some(Match { offset: 0, len: 3 }));
        assert_eq!(find(&buffer, &abc, 1, &opts, None), Some(Match { offset: 3, len: 3 }));
        assert_eq!(find(&buffer, &"XYZ".into(), 0, &opts, None), None);
    }

    #[test]
    fn test_backward_never_at_or_after_start() {
        let buffer = MemoryBuffer::from_bytes(b"ABCABC".to_vec());
        let opts = text(FindDirection::Backward);
        let abc = FindValue::from("ABC");
        assert_eq!(find(&buffer, &abc, 6, &opts, None).map(|m| m.offset), Some(3));
        assert_eq!(find(&buffer, &abc, 3, &opts, None).map(|m| m.offset), Some(0));
        assert_eq!(find(&buffer, &abc, 0, &opts, None), None);
    }

    #[test]
    fn test_all_wraps_once() {
        let buffer = MemoryBuffer::from_bytes(b"xxNEEDLExxxxxxxx".to_vec());
        let needle = FindValue::from("NEEDLE");
        assert_eq!(find(&buffer, &needle, 5, &text(FindDirection::Forward), None), None);
        assert_eq!(
            find(&buffer, &needle, 5, &text(FindDirection::All), None),
            Some(Match { offset: 2, len: 6 })
        );
    }

    #[test]
    fn test_case_insensitive_text() {
        let buffer = MemoryBuffer::from_bytes(b"hello WORLD".to_vec());
        let opts = FindOptions::new(FindMode::Text, FindDirection::Forward);
        assert_eq!(find(&buffer, &"world".into(), 0, &opts, None).map(|m| m.offset), Some(6));
        let opts = opts.case_sensitive(true);
        assert_eq!(find(&buffer, &"world".into(), 0, &opts, None), None);
    }

    #[test]
    fn test_int_mode_is_never_case_folded() {
        let buffer = MemoryBuffer::from_bytes(vec![0x61, 0x00]);
        let opts = FindOptions::new(FindMode::Int, FindDirection::Forward);
        assert_eq!(find(&buffer, &FindValue::Unsigned(0x41), 0, &opts, None), None);
        assert_eq!(
            find(&buffer, &FindValue::Unsigned(0x61), 0, &opts, None),
            Some(Match { offset: 0, len: 1 })
        );
    }

    #[test]
    fn test_hex_pattern_search() {
        let buffer = MemoryBuffer::from_bytes(vec![0x00, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x11]);
        let opts = FindOptions::new(FindMode::Hex, FindDirection::Forward);
        assert_eq!(
            find(&buffer, &"DE ?? BE".into(), 0, &opts, None),
            Some(Match { offset: 1, len: 3 })
        );
        assert_eq!(
            find(&buffer, &"AD .. 11".into(), 0, &opts, None),
            Some(Match { offset: 2, len: 5 })
        );
        assert_eq!(find(&buffer, &"ZZ".into(), 0, &opts, None), None);
    }

    #[test]
    fn test_chunk_boundary_match() {
        let mut data = vec![0u8; SCAN_CHUNK + 10];
        data[SCAN_CHUNK - 2..SCAN_CHUNK + 2].copy_from_slice(b"MARK");
        let buffer = MemoryBuffer::from_bytes(data);
        let mark = FindValue::from("MARK");
        assert_eq!(
            find(&buffer, &mark, 0, &text(FindDirection::Forward), None).map(|m| m.offset),
            Some(SCAN_CHUNK - 2)
        );
        assert_eq!(
            find(&buffer, &mark, SCAN_CHUNK + 10, &text(FindDirection::Backward), None)
                .map(|m| m.offset),
            Some(SCAN_CHUNK - 2)
        );
    }

    #[test]
    fn test_cancelled_search_finds_nothing() {
        let buffer = MemoryBuffer::from_bytes(b"ABCABC".to_vec());
        let token = CancelToken::new();
        token.cancel();
        let opts = text(FindDirection::Forward);
        assert_eq!(find(&buffer, &"ABC".into(), 0, &opts, Some(&token)), None);
        token.reset();
        assert!(find(&buffer, &"ABC".into(), 0, &opts, Some(&token)).is_some());
    }
}
