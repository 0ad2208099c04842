use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context};
use log::{warn, debug};

use crate::errors::SubtitleError;

// @module: SRT caption blocks and their text format

// @const: SRT timing line, hours are unbounded
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+:\d{2}:\d{2},\d{3})\s*-->\s*(\d+:\d{2}:\d{2},\d{3})$").unwrap()
});

// @struct: One numbered subtitle block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionEntry {
    // @field: 1-based block number
    pub index: usize,

    // @field: Start time in ms
    pub start_ms: u64,

    // @field: End time in ms
    pub end_ms: u64,

    // @field: Text lines, source first when bilingual
    pub lines: Vec<String>,
}

impl CaptionEntry {
    pub fn new(index: usize, start_ms: u64, end_ms: u64, lines: Vec<String>) -> Self {
        CaptionEntry {
            index,
            start_ms,
            end_ms,
            lines,
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, SubtitleError> {
        let invalid = || SubtitleError::InvalidTimestamp(timestamp.to_string());

        let (clock, millis) = timestamp.trim().split_once(',').ok_or_else(invalid)?;
        let parts: Vec<&str> = clock.split(':').collect();
        if parts.len() != 3 || millis.len() != 3 {
            return Err(invalid());
        }

        let hours: u64 = parts[0].parse().map_err(|_| invalid())?;
        let minutes: u64 = parts[1].parse().map_err(|_| invalid())?;
        let seconds: u64 = parts[2].parse().map_err(|_| invalid())?;
        let millis: u64 = millis.parse().map_err(|_| invalid())?;

        if minutes >= 60 || seconds >= 60 {
            return Err(invalid());
        }

        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .ok_or_else(invalid)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }

    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_ms)
    }

    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_ms)
    }
}

impl fmt::Display for CaptionEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        writeln!(f)
    }
}

/// Serialize caption entries to SRT text
pub fn to_srt_string(entries: &[CaptionEntry]) -> String {
    entries.iter().map(|entry| entry.to_string()).collect()
}

/// Write caption entries to an SRT file, creating parent directories
pub fn write_srt_file<P: AsRef<Path>>(entries: &[CaptionEntry], path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create subtitle file: {}", path.display()))?;

    for entry in entries {
        write!(file, "{}", entry)
            .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;
    }

    debug!("Wrote {} caption blocks to {}", entries.len(), path.display());
    Ok(())
}

/// Parse SRT text into caption entries.
///
/// Blocks are terminated by blank lines; trailing whitespace on any line and
/// a leading byte-order mark are ignored. Entries keep their file order and
/// their declared index.
pub fn parse_srt_string(content: &str) -> Result<Vec<CaptionEntry>, SubtitleError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut entries = Vec::new();

    let mut current_index: Option<usize> = None;
    let mut current_times: Option<(u64, u64)> = None;
    let mut current_lines: Vec<String> = Vec::new();

    let mut finish_block = |index: &mut Option<usize>, times: &mut Option<(u64, u64)>, lines: &mut Vec<String>, line_no: usize| {
        match (index.take(), times.take()) {
            (Some(idx), Some((start_ms, end_ms))) => {
                entries.push(CaptionEntry::new(idx, start_ms, end_ms, std::mem::take(lines)));
                Ok(())
            }
            (None, None) => Ok(()),
            (Some(idx), None) => Err(SubtitleError::MalformedBlock {
                line: line_no,
                message: format!("block {} has no timing line", idx),
            }),
            (None, Some(_)) => Err(SubtitleError::MalformedBlock {
                line: line_no,
                message: "timing line without block number".to_string(),
            }),
        }
    };

    let mut last_line = 0;
    for (line_idx, raw_line) in content.lines().enumerate() {
        let line_no = line_idx + 1;
        last_line = line_no;
        let line = raw_line.trim_end();

        if line.trim().is_empty() {
            finish_block(&mut current_index, &mut current_times, &mut current_lines, line_no)?;
            continue;
        }

        if current_index.is_none() {
            let index = line.trim().parse::<usize>().map_err(|_| SubtitleError::MalformedBlock {
                line: line_no,
                message: format!("expected block number, found '{}'", line),
            })?;
            current_index = Some(index);
            continue;
        }

        if current_times.is_none() {
            let caps = TIMING_REGEX.captures(line.trim()).ok_or_else(|| SubtitleError::MalformedBlock {
                line: line_no,
                message: format!("expected timing line, found '{}'", line),
            })?;
            let start_ms = CaptionEntry::parse_timestamp(&caps[1])?;
            let end_ms = CaptionEntry::parse_timestamp(&caps[2])?;
            if end_ms < start_ms {
                warn!("Subtitle block at line {} ends before it starts", line_no);
            }
            current_times = Some((start_ms, end_ms));
            continue;
        }

        current_lines.push(line.to_string());
    }

    finish_block(&mut current_index, &mut current_times, &mut current_lines, last_line)?;

    Ok(entries)
}

/// Read and parse an SRT file
pub fn parse_srt_file<P: AsRef<Path>>(path: P) -> Result<Vec<CaptionEntry>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
    parse_srt_string(&content)
        .with_context(|| format!("Failed to parse subtitle file: {}", path.display()))
}
