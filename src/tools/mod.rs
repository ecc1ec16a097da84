mod ffprobe_info;
mod format;
mod output_path;
mod path_validator;
mod tool_locator;
mod video_scanner;

pub use ffprobe_info::{VideoMetadata, get_video_info};
pub use format::{format_duration, format_size};
pub use output_path::{
    MAX_INDEX_ATTEMPTS, ResolvedOutput, contact_sheet_path_for, resolve_output_path,
};
pub use path_validator::validate_directory_exists;
pub use tool_locator::{ExternalTool, SystemToolLocator, ToolLocator, Toolchain};
pub use video_scanner::{ScanTarget, VideoFileInfo, scan_video_files};
