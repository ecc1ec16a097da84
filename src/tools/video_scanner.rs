use super::path_validator::validate_directory_exists;
use crate::config::ScreenlistSettings;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 要處理的影片來源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// 單一影片檔
    File(PathBuf),
    /// 資料夾（可選擇是否遞迴）
    Directory { path: PathBuf, recursive: bool },
}

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 依來源列出所有支援的影片檔，依路徑排序
///
/// 單一檔案模式下檔案不存在或副檔名不支援為錯誤。
pub fn scan_video_files(
    target: &ScanTarget,
    settings: &ScreenlistSettings,
) -> Result<Vec<VideoFileInfo>> {
    match target {
        ScanTarget::File(path) => {
            if !path.is_file() {
                bail!("找不到檔案: {}", path.display());
            }
            if !settings.is_video_file(path) {
                bail!("不是支援的影片檔: {}", path.display());
            }
            let size = fs::metadata(path)
                .with_context(|| format!("無法讀取檔案資訊: {}", path.display()))?
                .len();
            Ok(vec![VideoFileInfo {
                path: path.clone(),
                size,
            }])
        }
        ScanTarget::Directory { path, recursive } => scan_directory(path, *recursive, settings),
    }
}

fn scan_directory(
    directory: &Path,
    recursive: bool,
    settings: &ScreenlistSettings,
) -> Result<Vec<VideoFileInfo>> {
    validate_directory_exists(directory)?;
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(directory)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("無法讀取目錄項目: {e}");
                None
            }
        })
        .filter(|entry| settings.is_video_file(entry.path()))
        // 以 fs::metadata 跟隨符號連結，與單一檔案模式一致
        .filter_map(|entry| match fs::metadata(entry.path()) {
            Ok(metadata) if metadata.is_file() => Some(VideoFileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            }),
            Ok(_) => None,
            Err(e) => {
                warn!("無法讀取檔案資訊 {}: {e}", entry.path().display());
                None
            }
        })
        .collect();

    video_files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!("{} 中找到 {} 個影片檔", directory.display(), video_files.len());
    Ok(video_files)
}
