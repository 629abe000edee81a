//! HUD text layout helpers

/// Split `text` into chunks of at most `width` characters.
///
/// Not word-aware: chunks are cut at fixed character offsets, so the
/// chunks concatenate back to `text`. A `width` of zero is treated as one.
pub fn wrap_chunks(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}
