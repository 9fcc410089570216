/// Discord rejects messages longer than 2000 characters; stay under with
/// headroom for markdown expansion.
const MESSAGE_CAP: usize = 1950;

/// Split `text` into pieces Discord will accept.
///
/// Prefers newline and then space boundaries so words survive intact, counts
/// characters rather than bytes, and never cuts inside a UTF-8 sequence.
pub(crate) fn split_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() {
        // Byte offset of the MESSAGE_CAP-th character, when the remainder is
        // still too long; otherwise the whole remainder fits.
        let window_end = match rest.char_indices().nth(MESSAGE_CAP) {
            Some((offset, _)) => offset,
            None => {
                chunks.push(rest.to_string());
                break;
            }
        };

        let window = &rest[..window_end];
        let cut = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .unwrap_or(window_end);

        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start();
    }

    chunks
}
