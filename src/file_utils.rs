use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: Workspace folders, video discovery and output naming

/// Video file extensions picked up from the input folder
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "mkv", "avi", "m4v", "webm"];

/// Suffix marking files this tool produced
pub const BILINGUAL_SUFFIX: &str = "_bilingual";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @checks: Supported video extension, case-insensitive
    pub fn is_supported_video<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }

    // @checks: Output of a previous run, by file stem
    pub fn is_generated_output<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_stem()
            .is_some_and(|stem| stem.to_string_lossy().ends_with(BILINGUAL_SUFFIX))
    }

    /// List the videos directly inside `dir`, sorted by file name.
    ///
    /// Subdirectories are not searched, and files this tool produced are
    /// skipped.
    pub fn collect_videos<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut videos = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && Self::is_supported_video(path) && !Self::is_generated_output(path) {
                videos.push(path.to_path_buf());
            }
        }

        videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(videos)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }
}

// @struct: The three working folders under one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDirs {
    // @field: Videos to process
    pub video_input: PathBuf,

    // @field: Subtitled and dubbed videos
    pub video_output: PathBuf,

    // @field: Bilingual SRT files
    pub srt_output: PathBuf,
}

impl WorkspaceDirs {
    pub fn new<P: AsRef<Path>>(root: P, video_input: &str, video_output: &str, srt_output: &str) -> Self {
        let root = root.as_ref();
        Self {
            video_input: root.join(video_input),
            video_output: root.join(video_output),
            srt_output: root.join(srt_output),
        }
    }

    /// Create the input and output folders if missing
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.video_input, &self.video_output, &self.srt_output] {
            FileManager::ensure_dir(dir)?;
        }
        Ok(())
    }

    /// Discovered input videos
    pub fn input_videos(&self) -> Result<Vec<PathBuf>> {
        FileManager::collect_videos(&self.video_input)
    }

    /// `srt_output/<stem>_bilingual.srt`
    pub fn subtitle_output_path<P: AsRef<Path>>(&self, video: P) -> PathBuf {
        self.srt_output.join(format!("{}{}.srt", file_stem(video.as_ref()), BILINGUAL_SUFFIX))
    }

    /// `video_output/<stem>_bilingual.mp4`
    pub fn video_output_path<P: AsRef<Path>>(&self, video: P) -> PathBuf {
        self.video_output.join(format!("{}{}.mp4", file_stem(video.as_ref()), BILINGUAL_SUFFIX))
    }

    /// `video_output/<stem>_dub.wav`
    pub fn dub_track_path<P: AsRef<Path>>(&self, video: P) -> PathBuf {
        self.video_output.join(format!("{}_dub.wav", file_stem(video.as_ref())))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string())
}
