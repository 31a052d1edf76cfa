use librarian_core::ChunkPolicy;

use crate::models::ChunkSpan;

/// Characters the chunker treats as sentence or paragraph boundaries.
/// Covers both ASCII and full-width CJK punctuation.
const BOUNDARY_CHARS: &[char] = &[
    '.', '。', ';', '；', '!', '！', '?', '？', '\n',
];

fn is_boundary(c: char) -> bool {
    BOUNDARY_CHARS.contains(&c)
}

/// Split normalized text into overlapping passages.
///
/// Windows are `policy.max_chars` chars long and consecutive windows overlap
/// by `policy.overlap`. When a sentence or paragraph boundary exists within
/// the trailing `overlap` chars of a window the cut moves back to just after
/// it; otherwise the window is cut at the hard length limit. All offsets are
/// char offsets into `text`.
///
/// Identical input and policy always produce the identical sequence, which
/// is what makes re-indexing idempotent.
pub fn chunk_text(text: &str, policy: &ChunkPolicy) -> Vec<ChunkSpan> {
    debug_assert!(policy.is_valid());

    if text.trim().is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();

    // A document shorter than one window is exactly one chunk.
    if total <= policy.max_chars {
        return vec![ChunkSpan {
            index: 0,
            text: text.to_string(),
            start: 0,
            end: total,
        }];
    }

    let mut spans: Vec<ChunkSpan> = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + policy.max_chars).min(total);

        if end < total && policy.overlap > 0 {
            // Prefer a boundary within the last `overlap` chars of the window.
            let floor = end.saturating_sub(policy.overlap).max(start + 1);
            for i in (floor..end).rev() {
                if is_boundary(chars[i]) {
                    end = i + 1;
                    break;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        if chunk.trim().chars().count() >= policy.min_chars {
            spans.push(ChunkSpan {
                index: spans.len(),
                text: chunk,
                start,
                end,
            });
        }

        if end >= total {
            break;
        }

        // Step forward with overlap, always making progress.
        start = if end > policy.overlap && end - policy.overlap > start {
            end - policy.overlap
        } else {
            end
        };
    }

    spans
}
