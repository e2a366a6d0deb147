/// Maximum number of characters per emitted line, tag included.
///
/// Downstream sinks like logd have a fixed buffer of 4 KiB. Counting
/// characters instead of bytes keeps the bound independent of the encoding
/// width of the text.
pub const MAX_LINE_CHARS: usize = 2001;

/// Maximum message length of a single chunk for the given tag.
///
/// The tag shares the line budget with the message. The result is never
/// zero, so even an oversized tag makes progress through the message.
pub(crate) fn max_chunk_chars(tag: Option<&str>) -> usize {
    let tag_len = tag.map(|t| t.chars().count()).unwrap_or(0);
    MAX_LINE_CHARS.saturating_sub(tag_len).max(1)
}

/// Chunk iterator over a string slice that splits at a character count.
///
/// Every chunk but the last one contains exactly `max_chars` characters. The
/// last chunk holds the remainder. Splits always happen on character
/// boundaries.
pub(crate) struct CharChunkIterator<'a> {
    data: &'a str,
    max_chars: usize,
}

impl<'a> CharChunkIterator<'a> {
    pub fn new(data: &'a str, max_chars: usize) -> Self {
        Self {
            data,
            max_chars: max_chars.max(1),
        }
    }
}

impl<'a> Iterator for CharChunkIterator<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.is_empty() {
            return None;
        }

        // The byte offset of the character right after the first `max_chars`
        // exists only if the remaining data is above the limit.
        match self.data.char_indices().nth(self.max_chars) {
            Some((split_idx, _)) => {
                let (next_piece, remainder) = self.data.split_at(split_idx);
                self.data = remainder;
                Some(next_piece)
            }
            None => {
                let last_piece = self.data;
                self.data = "";
                Some(last_piece)
            }
        }
    }
}
