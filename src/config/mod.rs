pub mod load;
pub mod types;

pub use load::{MAX_GRID_CELLS, MAX_SPACING, MAX_THUMB_WIDTH, SETTINGS_FILE_NAME};
pub use types::{Config, DEFAULT_VIDEO_EXTENSIONS, OverwritePolicy, ScreenlistSettings};
