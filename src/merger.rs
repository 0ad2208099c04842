/*!
 * Bilingual caption merging.
 *
 * Turns a translated timeline into numbered caption blocks. Each block keeps
 * its segment's timing; its lines are the source text followed by the target
 * text. Line breaks inside a text are folded to spaces so every language
 * occupies exactly one line of the block.
 */

use serde::{Deserialize, Serialize};

use crate::segment::{Segment, Timeline};
use crate::subtitle_processor::CaptionEntry;

/// Which languages appear in each caption block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionLayout {
    /// Source line, then target line
    #[default]
    Bilingual,
    /// Target line only, falling back to the source when untranslated
    TargetOnly,
}

/// Merge a timeline into bilingual caption entries
pub fn merge(timeline: &Timeline) -> Vec<CaptionEntry> {
    merge_with_layout(timeline, CaptionLayout::Bilingual)
}

/// Merge a timeline into caption entries using the given layout.
///
/// Indices start at 1. A segment without a translation yields a single
/// source line. Blank texts never produce a line.
pub fn merge_with_layout(timeline: &Timeline, layout: CaptionLayout) -> Vec<CaptionEntry> {
    timeline
        .iter()
        .enumerate()
        .map(|(i, segment)| CaptionEntry::new(i + 1, segment.start_ms, segment.end_ms, caption_lines(segment, layout)))
        .collect()
}

fn caption_lines(segment: &Segment, layout: CaptionLayout) -> Vec<String> {
    let source = Some(single_line(&segment.source_text)).filter(|text| !text.is_empty());
    let target = segment
        .target_text
        .as_deref()
        .map(single_line)
        .filter(|text| !text.is_empty());

    match (layout, target) {
        (CaptionLayout::Bilingual, target) => source.into_iter().chain(target).collect(),
        (CaptionLayout::TargetOnly, Some(target)) => vec![target],
        (CaptionLayout::TargetOnly, None) => source.into_iter().collect(),
    }
}

// A blank line would end the SRT block early, so collapse all whitespace runs.
fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
