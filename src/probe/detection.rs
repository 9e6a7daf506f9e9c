use std::path::Path;

/// Extensions offered by the file picker filter
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Check if a file looks like a video based on its extension
///
/// This is only a hint for the picker; any path can still be added.
pub fn is_video_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext = ext.to_string_lossy().to_lowercase();
        VIDEO_EXTENSIONS.contains(&ext.as_str())
    } else {
        false
    }
}
