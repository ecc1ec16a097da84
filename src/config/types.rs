use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 預設支援的影片副檔名（不分大小寫）
pub const DEFAULT_VIDEO_EXTENSIONS: [&str; 7] =
    [".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm"];

/// 已存在預覽圖時的處理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverwritePolicy {
    /// 一律覆寫舊檔
    #[serde(rename = "replace")]
    ReplaceExisting,
    /// 檔名被占用時加上索引（_1, _2, ...）
    #[default]
    #[serde(rename = "append_index")]
    AppendIndexIfExists,
    /// 檔案已存在則跳過該影片
    #[serde(rename = "skip")]
    SkipIfExists,
}

impl OverwritePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReplaceExisting => "replace",
            Self::AppendIndexIfExists => "append_index",
            Self::SkipIfExists => "skip",
        }
    }
}

/// 預覽圖設定
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenlistSettings {
    pub rows: u32,
    pub columns: u32,
    pub thumb_width: u32,
    pub padding: u32,
    pub header_height: u32,
    pub font_size: f32,
    pub label_font_size: f32,
    pub jpeg_quality: u8,
    pub overwrite: OverwritePolicy,
    /// 優先使用的 TrueType 字型
    pub font_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// 暫存資料夾的上層目錄，未設定時使用系統暫存目錄
    pub scratch_root: Option<PathBuf>,
    pub video_extensions: Vec<String>,
}

impl Default for ScreenlistSettings {
    fn default() -> Self {
        Self {
            rows: 4,
            columns: 4,
            thumb_width: 320,
            padding: 10,
            header_height: 60,
            font_size: 20.0,
            label_font_size: 16.0,
            jpeg_quality: 90,
            overwrite: OverwritePolicy::default(),
            font_path: None,
            ffmpeg_path: None,
            ffprobe_path: None,
            scratch_root: None,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl ScreenlistSettings {
    #[must_use]
    pub const fn thumbnail_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    #[must_use]
    pub fn scratch_root(&self) -> PathBuf {
        self.scratch_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let dotted = format!(".{}", ext.to_lowercase());
                self.video_extensions
                    .iter()
                    .any(|allowed| allowed.to_lowercase() == dotted)
            })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: ScreenlistSettings,
}
