use crate::config::OverwritePolicy;
use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

/// 加索引時最多嘗試的次數，避免在異常檔案系統上無限迴圈
pub const MAX_INDEX_ATTEMPTS: u32 = 9_999;

/// 輸出路徑決策結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedOutput {
    Write(PathBuf),
    Skip,
}

/// 影片對應的預覽圖路徑：同資料夾、副檔名換成 `.jpg`
#[must_use]
pub fn contact_sheet_path_for(video_path: &Path) -> PathBuf {
    video_path.with_extension("jpg")
}

/// 依覆寫策略決定實際寫入路徑
///
/// 只做存在性檢查，不建立或修改任何檔案。
pub fn resolve_output_path(base_path: &Path, policy: OverwritePolicy) -> Result<ResolvedOutput> {
    match policy {
        OverwritePolicy::ReplaceExisting => Ok(ResolvedOutput::Write(base_path.to_path_buf())),
        OverwritePolicy::SkipIfExists => {
            if base_path.exists() {
                debug!("預覽圖已存在: {}", base_path.display());
                Ok(ResolvedOutput::Skip)
            } else {
                Ok(ResolvedOutput::Write(base_path.to_path_buf()))
            }
        }
        OverwritePolicy::AppendIndexIfExists => {
            if !base_path.exists() {
                return Ok(ResolvedOutput::Write(base_path.to_path_buf()));
            }
            for index in 1..=MAX_INDEX_ATTEMPTS {
                let candidate = indexed_path(base_path, index);
                if !candidate.exists() {
                    debug!("使用加索引的檔名: {}", candidate.display());
                    return Ok(ResolvedOutput::Write(candidate));
                }
            }
            bail!(
                "已嘗試 {MAX_INDEX_ATTEMPTS} 個索引仍找不到可用檔名: {}",
                base_path.display()
            )
        }
    }
}

/// `dir/video.jpg` + 2 → `dir/video_2.jpg`
fn indexed_path(base_path: &Path, index: u32) -> PathBuf {
    let stem = base_path
        .file_stem()
        .map_or_else(String::new, |s| s.to_string_lossy().to_string());
    let file_name = match base_path.extension() {
        Some(ext) => format!("{stem}_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{index}"),
    };
    base_path.with_file_name(file_name)
}
