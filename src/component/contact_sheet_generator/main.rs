use super::contact_sheet_merger::{SheetHeader, create_contact_sheet, save_contact_sheet};
use super::text_renderer::TextRenderer;
use super::thumbnail_extractor::{
    ExtractorOptions, ScratchDir, create_thumbnail_tasks, extract_thumbnails,
};
use super::timestamp_selector::select_timestamps;
use crate::config::Config;
use crate::tools::{
    ResolvedOutput, ScanTarget, Toolchain, VideoFileInfo, contact_sheet_path_for,
    get_video_info, resolve_output_path, scan_video_files,
};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const FRAME_BAR_TEMPLATE: &str =
    "  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// 影片被跳過的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 覆寫策略為跳過且預覽圖已存在
    OutputExists(PathBuf),
    /// 無法取得影片長度
    MetadataUnavailable(String),
    /// 收到中斷訊號，尚未開始處理
    Interrupted,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutputExists(path) => write!(f, "預覽圖已存在: {}", path.display()),
            Self::MetadataUnavailable(reason) => write!(f, "無法取得影片資訊: {reason}"),
            Self::Interrupted => f.write_str("操作已中斷"),
        }
    }
}

/// 單支影片的最終狀態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoOutcome {
    Persisted(PathBuf),
    Skipped(SkipReason),
    Failed(String),
}

/// 預覽圖生成結果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub total_videos: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl GenerationResult {
    fn record(&mut self, outcome: &VideoOutcome) {
        match outcome {
            VideoOutcome::Persisted(_) => self.successful += 1,
            VideoOutcome::Skipped(_) => self.skipped += 1,
            VideoOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// 預覽圖生成器
///
/// 每支影片依序經過：
/// A. 取得影片資訊（ffprobe）
/// B. 決定輸出路徑
/// C. 選取等距時間點
/// D. 逐一擷取縮圖
/// E. 合併並寫出預覽圖
///
/// 單支影片的失敗或跳過不會中止整批處理。
pub struct ContactSheetGenerator {
    config: Config,
    toolchain: Toolchain,
    text: TextRenderer,
    shutdown_signal: Arc<AtomicBool>,
}

impl ContactSheetGenerator {
    #[must_use]
    pub fn new(config: Config, toolchain: Toolchain, shutdown_signal: Arc<AtomicBool>) -> Self {
        let text = TextRenderer::load(config.settings.font_path.as_deref());
        Self::with_text_renderer(config, toolchain, text, shutdown_signal)
    }

    #[must_use]
    pub const fn with_text_renderer(
        config: Config,
        toolchain: Toolchain,
        text: TextRenderer,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            toolchain,
            text,
            shutdown_signal,
        }
    }

    pub fn run(&self, target: &ScanTarget) -> Result<GenerationResult> {
        println!("{}", style("=== 影片預覽圖生成 ===").cyan().bold());

        println!("{}", style("掃描影片檔案中...").dim());
        let video_files = scan_video_files(target, &self.config.settings)?;

        if video_files.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(GenerationResult::default());
        }

        println!(
            "{}",
            style(format!(
                "找到 {} 個影片檔案，網格 {}x{}，覆寫模式: {}",
                video_files.len(),
                self.config.settings.columns,
                self.config.settings.rows,
                self.config.settings.overwrite.as_str()
            ))
            .green()
        );

        let result = self.process_videos(&video_files);
        self.print_summary(&result);

        Ok(result)
    }

    fn process_videos(&self, videos: &[VideoFileInfo]) -> GenerationResult {
        let mut result = GenerationResult {
            total_videos: videos.len(),
            ..GenerationResult::default()
        };

        for (index, video) in videos.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止處理");
                result.skipped += videos.len() - index;
                break;
            }

            println!(
                "\n{} [{}/{}] {}",
                style("處理中").cyan(),
                index + 1,
                videos.len(),
                style(video.path.display()).bold()
            );

            let outcome = self.process_video(video);
            match &outcome {
                VideoOutcome::Persisted(path) => {
                    println!("  {} 預覽圖已建立: {}", style("✓").green(), path.display());
                }
                VideoOutcome::Skipped(reason) => {
                    warn!("跳過 {}: {reason}", video.path.display());
                    println!("  {} 跳過: {reason}", style("⤳").yellow());
                }
                VideoOutcome::Failed(reason) => {
                    error!("處理影片失敗 {}: {reason}", video.path.display());
                    println!("  {} 處理失敗: {reason}", style("✗").red());
                }
            }
            result.record(&outcome);
        }

        result
    }

    /// 處理單支影片直到寫出、跳過或失敗
    pub fn process_video(&self, video: &VideoFileInfo) -> VideoOutcome {
        if self.shutdown_signal.load(Ordering::SeqCst) {
            return VideoOutcome::Skipped(SkipReason::Interrupted);
        }

        let settings = &self.config.settings;

        // Stage A: 取得影片資訊
        let metadata = match get_video_info(&self.toolchain.ffprobe, &video.path) {
            Ok(metadata) => metadata,
            Err(e) => {
                return VideoOutcome::Skipped(SkipReason::MetadataUnavailable(format!("{e:#}")));
            }
        };
        let Some(duration) = metadata.usable_duration() else {
            return VideoOutcome::Skipped(SkipReason::MetadataUnavailable(
                "ffprobe 沒有回報影片長度".to_string(),
            ));
        };
        println!(
            "  {} 影片資訊: {:.1}s, {}x{}",
            style("A").dim(),
            duration,
            metadata.width.unwrap_or(0),
            metadata.height.unwrap_or(0)
        );

        // Stage B: 決定輸出路徑
        let base_path = contact_sheet_path_for(&video.path);
        let output_path = match resolve_output_path(&base_path, settings.overwrite) {
            Ok(ResolvedOutput::Write(path)) => path,
            Ok(ResolvedOutput::Skip) => {
                return VideoOutcome::Skipped(SkipReason::OutputExists(base_path));
            }
            Err(e) => return VideoOutcome::Failed(format!("{e:#}")),
        };

        // Stage C: 選取時間點
        let timestamps = select_timestamps(duration, settings.thumbnail_count());
        println!(
            "  {} 選取 {} 個時間點 → {}",
            style("C").dim(),
            timestamps.len(),
            output_path.display()
        );

        let header = SheetHeader {
            file_name: video
                .path
                .file_name()
                .map_or_else(String::new, |s| s.to_string_lossy().to_string()),
            metadata,
            file_size: video.size,
        };

        match self.build_sheet(&video.path, &timestamps, &header, &output_path) {
            Ok(()) => {
                info!("預覽圖已建立: {}", output_path.display());
                VideoOutcome::Persisted(output_path)
            }
            Err(e) => VideoOutcome::Failed(format!("{e:#}")),
        }
    }

    /// Stage D + E：暫存目錄在此函式結束時一定會被清除
    fn build_sheet(
        &self,
        video_path: &Path,
        timestamps: &[f64],
        header: &SheetHeader,
        output_path: &Path,
    ) -> Result<()> {
        let settings = &self.config.settings;
        let mut scratch = ScratchDir::prepare(&settings.scratch_root(), video_path)?;

        let options = ExtractorOptions {
            ffmpeg: &self.toolchain.ffmpeg,
            thumb_width: settings.thumb_width,
            label_font_size: settings.label_font_size,
            text: &self.text,
        };

        let tasks = create_thumbnail_tasks(video_path, timestamps);
        let progress_bar = self.frame_progress_bar(tasks.len());
        let results = extract_thumbnails(&tasks, &mut scratch, &options, |result| {
            if let Err(msg) = &result.outcome {
                progress_bar.suspend(|| {
                    warn!(
                        "縮圖擷取失敗 {} [{}] @ {:.2}s: {msg}",
                        video_path.display(),
                        result.index,
                        result.timestamp
                    );
                });
            }
            progress_bar.inc(1);
        });
        progress_bar.finish_and_clear();

        let success_count = results.iter().filter(|r| r.outcome.is_ok()).count();
        println!(
            "  {} 擷取縮圖: 成功 {success_count}, 失敗 {}",
            style("D").dim(),
            results.len() - success_count
        );

        let sheet = create_contact_sheet(&results, header, settings, &self.text)?;
        save_contact_sheet(&sheet, output_path, settings.jpeg_quality)
            .with_context(|| format!("無法寫出預覽圖: {}", output_path.display()))?;
        println!("  {} 合併預覽圖 {}x{}", style("E").dim(), sheet.width(), sheet.height());

        Ok(())
    }

    fn frame_progress_bar(&self, len: usize) -> ProgressBar {
        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(bar_style) = ProgressStyle::default_bar().template(FRAME_BAR_TEMPLATE) {
            progress_bar.set_style(bar_style.progress_chars("#>-"));
        }
        progress_bar.set_message("擷取縮圖中...");
        progress_bar
    }

    fn print_summary(&self, result: &GenerationResult) {
        println!();
        println!("{}", style("=== 預覽圖生成摘要 ===").cyan().bold());
        println!("  總計: {} 個影片", result.total_videos);
        println!("  成功: {} 個", style(result.successful).green());

        if result.skipped > 0 {
            println!("  跳過: {} 個", style(result.skipped).yellow());
        }

        if result.failed > 0 {
            println!("  失敗: {} 個", style(result.failed).red());
        }

        info!(
            "預覽圖生成完成 - 成功: {}, 跳過: {}, 失敗: {}",
            result.successful, result.skipped, result.failed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverwritePolicy;
    use std::fs;
    use tempfile::TempDir;

    fn generator(config: Config) -> ContactSheetGenerator {
        let toolchain = Toolchain {
            ffmpeg: PathBuf::from("/nonexistent/bin/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/bin/ffprobe"),
        };
        ContactSheetGenerator::with_text_renderer(
            config,
            toolchain,
            TextRenderer::Bitmap,
            Arc::new(AtomicBool::new(false)),
        )
    }

    fn video_in(dir: &Path, name: &str) -> VideoFileInfo {
        let path = dir.join(name);
        fs::write(&path, b"not really a video").unwrap();
        VideoFileInfo { path, size: 18 }
    }

    #[test]
    fn test_probe_failure_skips_video() {
        let temp_dir = TempDir::new().unwrap();
        let video = video_in(temp_dir.path(), "clip.mp4");

        let outcome = generator(Config::default()).process_video(&video);
        assert!(matches!(
            outcome,
            VideoOutcome::Skipped(SkipReason::MetadataUnavailable(_))
        ));
        assert!(!temp_dir.path().join("clip.jpg").exists());
    }

    /// 寫出可執行的 shell 腳本
    #[cfg(unix)]
    fn write_script(path: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_frames_fails_without_output() {
        let tools_dir = TempDir::new().unwrap();
        let work_dir = TempDir::new().unwrap();
        let scratch_root = TempDir::new().unwrap();

        let ffprobe = tools_dir.path().join("ffprobe");
        let ffmpeg = tools_dir.path().join("ffmpeg");
        write_script(&ffprobe, "printf '320\\n240\\n40.0\\n'");
        write_script(&ffmpeg, "exit 1");

        let mut config = Config::default();
        config.settings.scratch_root = Some(scratch_root.path().to_path_buf());
        let generator = ContactSheetGenerator::with_text_renderer(
            config,
            Toolchain { ffmpeg, ffprobe },
            TextRenderer::Bitmap,
            Arc::new(AtomicBool::new(false)),
        );

        let video = video_in(work_dir.path(), "v.mp4");
        let outcome = generator.process_video(&video);

        let VideoOutcome::Failed(message) = &outcome else {
            panic!("應該失敗: {outcome:?}");
        };
        assert!(message.contains("v.mp4"), "錯誤訊息: {message}");
        assert!(!work_dir.path().join("v.jpg").exists());
        assert!(
            fs::read_dir(scratch_root.path()).unwrap().next().is_none(),
            "暫存目錄應該已刪除"
        );
    }

    #[test]
    fn test_interrupted_before_start() {
        let temp_dir = TempDir::new().unwrap();
        let video = video_in(temp_dir.path(), "clip.mp4");
        let generator = generator(Config::default());
        generator.shutdown_signal.store(true, Ordering::SeqCst);

        assert_eq!(
            generator.process_video(&video),
            VideoOutcome::Skipped(SkipReason::Interrupted)
        );
    }

    #[test]
    fn test_batch_continues_after_failures() {
        let temp_dir = TempDir::new().unwrap();
        let videos = vec![
            video_in(temp_dir.path(), "a.mp4"),
            video_in(temp_dir.path(), "b.mkv"),
        ];

        let mut config = Config::default();
        config.settings.overwrite = OverwritePolicy::ReplaceExisting;
        let result = generator(config).process_videos(&videos);

        assert_eq!(result.total_videos, 2);
        assert_eq!(result.skipped, 2);
        assert_eq!(result.successful, 0);
    }

    #[test]
    fn test_generation_result_record() {
        let mut result = GenerationResult::default();
        result.record(&VideoOutcome::Persisted(PathBuf::from("a.jpg")));
        result.record(&VideoOutcome::Failed("boom".to_string()));
        result.record(&VideoOutcome::Skipped(SkipReason::Interrupted));
        assert_eq!((result.successful, result.failed, result.skipped), (1, 1, 1));
    }
}
