use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Planted every `MARKER_STRIDE` bytes so searches have something to hit
const MARKER: &[u8] = b"\xDE\xAD\xBE\xEFhexdoc";
const MARKER_STRIDE: usize = 64 * 1024 + 13;

fn generate_fixture(path: &Path, size: usize, seed: u64) -> Result<usize> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    // xorshift; fixtures only need to be reproducible, not random
    let mut state = seed.max(1);
    let mut block = Vec::with_capacity(MARKER_STRIDE);
    let mut written = 0;
    let mut markers = 0;
    let mut blocks = 0usize;

    while written < size {
        block.clear();
        let take = MARKER_STRIDE.min(size - written);
        while block.len() < take {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            block.extend_from_slice(&state.to_le_bytes());
        }
        block.truncate(take);
        if take >= MARKER.len() * 2 {
            let at = take / 2;
            block[at..at + MARKER.len()].copy_from_slice(MARKER);
            markers += 1;
        }
        writer.write_all(&block)?;
        written += take;
        blocks += 1;

        if blocks % 256 == 0 {
            tracing::debug!(written, "progress");
        }
    }

    writer.flush()?;
    Ok(markers)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/fixtures"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let fixtures = [
        ("small.bin", 1024 * 1024),
        ("medium.bin", 32 * 1024 * 1024),
        ("large.bin", 512 * 1024 * 1024),
    ];

    for (seed, (name, size)) in fixtures.into_iter().enumerate() {
        let path = out_dir.join(name);
        tracing::info!(path = %path.display(), size, "generating");
        let markers = generate_fixture(&path, size, seed as u64 + 0x9E37_79B9)?;
        tracing::info!(path = %path.display(), markers, "done");
    }

    Ok(())
}
