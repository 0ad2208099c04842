/*!
 * Entry markers for batch prompts sent to LLM backends.
 *
 * A batch is sent as one prompt in which every text is preceded by an
 * `<<ENTRY_n>>` marker and the whole batch is closed by `<<END>>`. The
 * reply is expected to use the same markers, which lets it be split back
 * into one translation per input.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ProviderError;

static ENTRY_MARKER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<<ENTRY_(\d+)>>").expect("Invalid entry marker regex")
});

/// End marker constant
pub const END_MARKER: &str = "<<END>>";

/// Default system prompt template.
/// Placeholders: {source_language}, {target_language}
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional subtitle translator. Translate each entry from {source_language} to {target_language}. \
Every entry starts with a marker like <<ENTRY_0>>. Reply with the same markers in the same order, each followed by the translation of that entry only, \
and finish with <<END>>. Do not merge, split, skip or explain entries.";

/// Fill the language placeholders of a system prompt template
pub fn render_system_prompt(template: &str, source_language: &str, target_language: &str) -> String {
    template
        .replace("{source_language}", source_language)
        .replace("{target_language}", target_language)
}

/// Build the user prompt for one batch
pub fn build_batch_prompt(texts: &[String]) -> String {
    let mut prompt = String::new();
    for (i, text) in texts.iter().enumerate() {
        prompt.push_str(&format!("<<ENTRY_{}>>\n{}\n", i, text.trim()));
    }
    prompt.push_str(END_MARKER);
    prompt
}

/// Split a marked reply into its entries, ordered by marker index.
///
/// The number of entries returned is the number of markers found, which may
/// differ from what was sent; callers decide what a mismatch means. Gaps or
/// duplicates in the marker sequence cannot be mapped back to inputs and are
/// reported as a parse error.
pub fn split_batch_response(response: &str) -> Result<Vec<String>, ProviderError> {
    let body = match response.find(END_MARKER) {
        Some(end) => &response[..end],
        None => response,
    };

    let markers: Vec<(usize, usize, usize)> = ENTRY_MARKER_REGEX
        .captures_iter(body)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let index = cap.get(1)?.as_str().parse().ok()?;
            Some((index, whole.start(), whole.end()))
        })
        .collect();

    let mut entries: Vec<(usize, String)> = Vec::with_capacity(markers.len());
    for (i, (index, _, content_start)) in markers.iter().enumerate() {
        let content_end = markers.get(i + 1).map_or(body.len(), |(_, start, _)| *start);
        entries.push((*index, body[*content_start..content_end].trim().to_string()));
    }

    entries.sort_by_key(|(index, _)| *index);
    let in_sequence = entries.iter().enumerate().all(|(expected, (index, _))| *index == expected);
    if !in_sequence {
        let found: Vec<usize> = entries.iter().map(|(index, _)| *index).collect();
        return Err(ProviderError::ParseError(format!(
            "Entry markers are not a contiguous sequence: {:?}",
            found
        )));
    }

    debug!("Split batch response into {} entries", entries.len());
    Ok(entries.into_iter().map(|(_, text)| text).collect())
}
