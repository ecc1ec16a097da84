//! 影片預覽圖（screenlist）生成元件
//!
//! 五階段流程：
//! A. 取得影片資訊（ffprobe）
//! B. 依覆寫策略決定輸出路徑
//! C. 選取等距時間點
//! D. 逐一擷取縮圖
//! E. 合併為帶標頭的預覽圖

mod contact_sheet_merger;
mod main;
mod text_renderer;
mod thumbnail_extractor;
mod timestamp_selector;

pub use contact_sheet_merger::{
    BACKGROUND_COLOR, SheetHeader, SheetLayout, create_contact_sheet, save_contact_sheet,
};
pub use main::{ContactSheetGenerator, GenerationResult, SkipReason, VideoOutcome};
pub use text_renderer::{TEXT_COLOR, TextRenderer};
pub use thumbnail_extractor::{
    ExtractedFrame, ExtractorOptions, ScratchDir, ThumbnailResult, ThumbnailTask,
    create_thumbnail_tasks, extract_thumbnail, extract_thumbnails, resize_to_width,
};
pub use timestamp_selector::select_timestamps;
