use super::text_renderer::TextRenderer;
use crate::tools::format_duration;
use anyhow::{Context, Result, bail};
use image::RgbImage;
use image::imageops::{self, FilterType};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 時間標籤距離縮圖左上角的位移
pub const LABEL_OFFSET: i32 = 5;

/// 單支影片專用的暫存資料夾
///
/// 名稱可預測（`.screenlist_<stem>`），
/// 開始處理前會先移除前次中斷留下的殘骸；
/// 第一次需要時才建立，drop 時整個刪除。
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
    created: bool,
}

impl ScratchDir {
    pub fn prepare(root: &Path, video_path: &Path) -> Result<Self> {
        let stem = video_path
            .file_stem()
            .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string());
        let path = root.join(format!(".screenlist_{stem}"));

        if path.exists() {
            debug!("移除殘留的暫存目錄: {}", path.display());
            fs::remove_dir_all(&path)
                .with_context(|| format!("無法清理殘留的暫存目錄: {}", path.display()))?;
        }

        Ok(Self {
            path,
            created: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 取得第 `index` 張截圖的暫存檔路徑，必要時建立資料夾
    pub fn frame_path(&mut self, index: usize) -> Result<PathBuf> {
        if !self.created {
            fs::create_dir_all(&self.path)
                .with_context(|| format!("無法建立暫存目錄: {}", self.path.display()))?;
            self.created = true;
        }
        Ok(self.path.join(format!("shot_{index:03}.jpg")))
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if self.path.exists() && fs::remove_dir_all(&self.path).is_err() {
            warn!("無法清理暫存目錄: {}", self.path.display());
        }
    }
}

/// 縮圖擷取任務
#[derive(Debug, Clone)]
pub struct ThumbnailTask {
    pub video_path: PathBuf,
    pub timestamp: f64,
    pub index: usize,
}

/// 已縮放並燒上時間標籤的截圖
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    pub image: RgbImage,
    pub label: String,
}

/// 縮圖擷取結果，失敗時帶有原因
#[derive(Debug)]
pub struct ThumbnailResult {
    pub index: usize,
    pub timestamp: f64,
    pub outcome: Result<ExtractedFrame, String>,
}

impl ThumbnailResult {
    #[must_use]
    pub fn frame(&self) -> Option<&ExtractedFrame> {
        self.outcome.as_ref().ok()
    }
}

/// 擷取縮圖所需的參數
pub struct ExtractorOptions<'a> {
    pub ffmpeg: &'a Path,
    pub thumb_width: u32,
    pub label_font_size: f32,
    pub text: &'a TextRenderer,
}

/// 建立縮圖任務列表
#[must_use]
pub fn create_thumbnail_tasks(video_path: &Path, timestamps: &[f64]) -> Vec<ThumbnailTask> {
    timestamps
        .iter()
        .enumerate()
        .map(|(index, &timestamp)| ThumbnailTask {
            video_path: video_path.to_path_buf(),
            timestamp,
            index,
        })
        .collect()
}

/// 擷取單一縮圖；任何失敗都只影響這一格，不會中止整支影片
///
/// 失敗原因放在 `outcome` 中，由呼叫端負責回報。
pub fn extract_thumbnail(
    task: &ThumbnailTask,
    scratch: &mut ScratchDir,
    options: &ExtractorOptions<'_>,
) -> ThumbnailResult {
    let outcome = extract_thumbnail_inner(task, scratch, options).map_err(|e| format!("{e:#}"));

    ThumbnailResult {
        index: task.index,
        timestamp: task.timestamp,
        outcome,
    }
}

fn extract_thumbnail_inner(
    task: &ThumbnailTask,
    scratch: &mut ScratchDir,
    options: &ExtractorOptions<'_>,
) -> Result<ExtractedFrame> {
    let output_path = scratch.frame_path(task.index)?;

    debug!(
        "擷取縮圖 {}: timestamp={:.3}s -> {}",
        task.index,
        task.timestamp,
        output_path.display()
    );

    let output = Command::new(options.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-ss"])
        .arg(format!("{:.3}", task.timestamp))
        .arg("-i")
        .arg(&task.video_path)
        .args(["-frames:v", "1", "-an", "-sn", "-dn", "-q:v", "2", "-y"])
        .arg(&output_path)
        .output()
        .with_context(|| {
            format!(
                "無法執行 ffmpeg 擷取縮圖: {}",
                task.video_path.display()
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffmpeg 擷取縮圖失敗: {}", stderr.trim());
    }

    if !output_path.exists() {
        bail!("縮圖檔案未建立: {}", output_path.display());
    }

    let image = image::open(&output_path)
        .with_context(|| format!("無法讀取縮圖: {}", output_path.display()))?
        .to_rgb8();

    let label = format_duration(task.timestamp);
    let mut thumbnail = resize_to_width(&image, options.thumb_width);
    options.text.draw(
        &mut thumbnail,
        LABEL_OFFSET,
        LABEL_OFFSET,
        options.label_font_size,
        &label,
    );

    Ok(ExtractedFrame {
        image: thumbnail,
        label,
    })
}

/// 縮放到指定寬度並維持長寬比
#[must_use]
pub fn resize_to_width(image: &RgbImage, width: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    let height = if src_w == 0 {
        1
    } else {
        ((u64::from(width) * u64::from(src_h) / u64::from(src_w)) as u32).max(1)
    };
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// 依序擷取所有縮圖，同一支影片同時只會有一個 ffmpeg 程序
pub fn extract_thumbnails(
    tasks: &[ThumbnailTask],
    scratch: &mut ScratchDir,
    options: &ExtractorOptions<'_>,
    mut on_progress: impl FnMut(&ThumbnailResult),
) -> Vec<ThumbnailResult> {
    tasks
        .iter()
        .map(|task| {
            let result = extract_thumbnail(task, scratch, options);
            on_progress(&result);
            result
        })
        .collect()
}
