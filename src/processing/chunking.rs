//! Fixed-size chunking of the combined corpus text.
//!
//! Chunks are contiguous character windows: no overlap, no gaps, no reordering. Sizes are
//! counted in Unicode scalar values so a chunk never splits a multi-byte character; the last
//! chunk may be shorter than the requested size.

use super::types::ChunkingError;

/// Split `text` into `ceil(len / chunk_size)` contiguous chunks of `chunk_size` characters.
///
/// Returns an empty vector for empty input and [`ChunkingError::InvalidChunkSize`] when
/// `chunk_size` is zero.
pub fn chunk_text(text: &str, chunk_size: usize) -> Result<Vec<String>, ChunkingError> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let mut chunks = Vec::with_capacity(text.len() / chunk_size + 1);
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(text[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_splits_on_exact_boundaries() {
        let chunks = chunk_text("abcdefghij", 4).expect("chunks");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunk_text_handles_empty_input() {
        assert!(chunk_text("", 4).expect("chunks").is_empty());
    }

    #[test]
    fn chunk_text_rejects_zero_chunk_size() {
        let error = chunk_text("hello", 0).unwrap_err();
        assert!(matches!(error, ChunkingError::InvalidChunkSize));
    }

    #[test]
    fn chunk_text_exact_multiple_has_no_trailing_chunk() {
        let chunks = chunk_text("abcdef", 3).expect("chunks");
        assert_eq!(chunks, vec!["abc", "def"]);
    }

    #[test]
    fn chunk_text_counts_characters_not_bytes() {
        let chunks = chunk_text("héllo wörld", 3).expect("chunks");
        assert_eq!(chunks, vec!["hél", "lo ", "wör", "ld"]);
    }

    #[test]
    fn chunks_reassemble_original_text() {
        let samples = [
            "a",
            "\n--- notes.txt ---\nHello world\n",
            "naïve café — déjà vu",
            "exactly8",
        ];
        for sample in samples {
            let length = sample.chars().count();
            for size in 1..=length + 2 {
                let chunks = chunk_text(sample, size).expect("chunks");
                assert_eq!(chunks.concat(), sample);
                assert_eq!(chunks.len(), length.div_ceil(size));
                let (last, full) = chunks.split_last().expect("non-empty");
                assert!(full.iter().all(|chunk| chunk.chars().count() == size));
                assert!((1..=size).contains(&last.chars().count()));
            }
        }
    }
}
