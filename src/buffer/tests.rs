use std::io::Write;

use tempfile::NamedTempFile;

use super::*;

const CONTENT: &[u8] = b"The quick brown fox jumps over the lazy dog";

fn fixture() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONTENT).unwrap();
    file.flush().unwrap();
    file
}

/// Run `check` against every backend loaded with `CONTENT`.
fn for_each_backend(check: impl Fn(&mut dyn ByteBuffer)) {
    let file = fixture();

    let mut memory = MemoryBuffer::from_bytes(CONTENT.to_vec());
    check(&mut memory);

    let mut mapped = MappedFileBuffer::open(file.path()).unwrap();
    check(&mut mapped);

    // Tiny chunks force reads across cache boundaries.
    let mut streamed = StreamedBuffer::open(file.path(), 7).unwrap();
    check(&mut streamed);
}

#[test]
fn test_read_clamps_past_end() {
    for_each_backend(|buffer| {
        assert_eq!(buffer.len(), CONTENT.len());
        assert_eq!(buffer.read(40, 100), b"dog");
        assert!(buffer.read(100, 5).is_empty());
        assert_eq!(buffer.at(4), Some(b'q'));
        assert_eq!(buffer.at(CONTENT.len()), None);
    });
}

#[test]
fn test_mutations_agree_across_backends() {
    for_each_backend(|buffer| {
        buffer.insert(4, b"very ");
        buffer.remove(0, 4);
        buffer.replace(0, b"VERY");
        assert_eq!(
            buffer.read(0, 20),
            b"VERY quick brown fox",
            "backend {:?}",
            buffer.kind()
        );
        assert_eq!(buffer.len(), CONTENT.len() + 1);
    });
}

#[test]
fn test_replace_at_end_extends() {
    for_each_backend(|buffer| {
        buffer.replace(CONTENT.len() - 3, b"cats!");
        assert_eq!(buffer.len(), CONTENT.len() + 2);
        assert_eq!(buffer.read(CONTENT.len() - 3, 10), b"cats!");
    });
}

#[test]
fn test_index_of_and_last_index_of() {
    for_each_backend(|buffer| {
        assert_eq!(buffer.index_of(b"the", 0), Some(31));
        assert_eq!(buffer.index_of(b"o", 13), Some(17));
        assert_eq!(buffer.index_of(b"cat", 0), None);
        assert_eq!(buffer.last_index_of(b"o", CONTENT.len()), Some(41));
        assert_eq!(buffer.last_index_of(b"o", 40), Some(26));
        assert_eq!(buffer.last_index_of(b"The", 0), Some(0));
    });
}

#[test]
fn test_write_serialises_logical_content() {
    for_each_backend(|buffer| {
        buffer.remove(3, 6);
        let mut out = Vec::new();
        buffer.write(&mut out).unwrap();
        assert_eq!(out, b"The brown fox jumps over the lazy dog");
        assert!(buffer.accept(0));
    });
}

#[test]
fn test_open_missing_file_fails() {
    let err = MappedFileBuffer::open("/nonexistent/hexdoc/file.bin").unwrap_err();
    assert!(matches!(err, crate::error::EngineError::Open { .. }));
    assert!(StreamedBuffer::open("/nonexistent/hexdoc/file.bin", 16).is_err());
}

#[test]
fn test_empty_file_maps() {
    let file = NamedTempFile::new().unwrap();
    let mut buffer = MappedFileBuffer::open(file.path()).unwrap();
    assert!(buffer.is_empty());
    buffer.insert(0, b"abc");
    assert_eq!(buffer.read(0, 3), b"abc");
}
