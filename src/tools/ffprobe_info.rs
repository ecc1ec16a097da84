use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::path::Path;
use std::process::Command;

/// ffprobe 取得的影片資訊，每個欄位都可能缺少
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VideoMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<f64>,
}

impl VideoMetadata {
    /// 可用於取樣的長度（大於 0 且為有限值）
    #[must_use]
    pub fn usable_duration(&self) -> Option<f64> {
        self.duration_seconds
            .filter(|d| d.is_finite() && *d > 0.0)
    }
}

/// 使用 ffprobe 取得影片寬高與長度
///
/// 第一次呼叫讀取視訊串流的 width/height/duration；若取不到長度，
/// 再從容器層級（format）讀取一次。第一次呼叫本身失敗時回傳錯誤。
pub fn get_video_info(ffprobe: &Path, path: &Path) -> Result<VideoMetadata> {
    let stream_output = run_ffprobe(
        ffprobe,
        &[
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration",
        ],
        path,
    )?;

    let mut metadata = parse_stream_output(&stream_output);

    if metadata.usable_duration().is_none() {
        debug!("串流層級沒有長度資訊，改讀容器長度: {}", path.display());
        let format_entries = ["-show_entries", "format=duration"];
        metadata.duration_seconds = match run_ffprobe(ffprobe, &format_entries, path) {
            Ok(output) => parse_format_duration(&output),
            Err(e) => {
                warn!("ffprobe 讀取容器長度失敗 {}: {e:#}", path.display());
                None
            }
        };
    }

    Ok(metadata)
}

fn run_ffprobe(ffprobe: &Path, entries: &[&str], path: &Path) -> Result<String> {
    let output = Command::new(ffprobe)
        .args(["-v", "error"])
        .args(entries)
        .args(["-of", "default=noprint_wrappers=1:nokey=1"])
        .arg(path)
        .output()
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        bail!("ffprobe 沒有輸出: {}", path.display());
    }
    Ok(stdout)
}

/// 解析 `width\nheight\nduration` 三行輸出，任一欄位解析失敗則留空
fn parse_stream_output(output: &str) -> VideoMetadata {
    let mut lines = output.lines().map(str::trim);
    let width = lines.next().and_then(|s| s.parse::<u32>().ok());
    let height = lines.next().and_then(|s| s.parse::<u32>().ok());
    let duration_seconds = lines.next().and_then(parse_seconds);

    VideoMetadata {
        width,
        height,
        duration_seconds,
    }
}

fn parse_format_duration(output: &str) -> Option<f64> {
    output.lines().next().and_then(|line| parse_seconds(line.trim()))
}

/// ffprobe 取不到值時會輸出 `N/A`
fn parse_seconds(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
}
