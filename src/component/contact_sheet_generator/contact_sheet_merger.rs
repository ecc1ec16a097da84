use super::text_renderer::TextRenderer;
use super::thumbnail_extractor::ThumbnailResult;
use crate::config::ScreenlistSettings;
use crate::tools::{VideoMetadata, format_duration, format_size};
use anyhow::{Context, Result, bail};
use image::codecs::jpeg::JpegEncoder;
use image::imageops;
use image::{Rgb, RgbImage};
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// 預覽圖版面
///
/// 網格大小一律依設定的列數與欄數計算，缺少的截圖只會留下空格。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub columns: u32,
    pub rows: u32,
    pub thumb_width: u32,
    pub thumb_height: u32,
    pub padding: u32,
    pub header_height: u32,
}

impl SheetLayout {
    #[must_use]
    pub const fn new(settings: &ScreenlistSettings, thumb_height: u32) -> Self {
        Self {
            columns: settings.columns,
            rows: settings.rows,
            thumb_width: settings.thumb_width,
            thumb_height,
            padding: settings.padding,
            header_height: settings.header_height,
        }
    }

    /// 畫布尺寸；超出 `u32` 範圍時回傳 `None`
    #[must_use]
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        let width = self
            .columns
            .checked_mul(self.thumb_width)?
            .checked_add(self.columns.checked_add(1)?.checked_mul(self.padding)?)?;
        let height = self
            .rows
            .checked_mul(self.thumb_height)?
            .checked_add(self.rows.checked_add(1)?.checked_mul(self.padding)?)?
            .checked_add(self.header_height)?;
        Some((width, height))
    }

    /// 第 `slot` 格左上角座標；超出網格時回傳 `None`
    #[must_use]
    pub fn cell_origin(&self, slot: usize) -> Option<(u32, u32)> {
        let columns = self.columns as usize;
        let row = slot / columns;
        let col = slot % columns;
        if row >= self.rows as usize {
            return None;
        }
        let x = u32::try_from(col)
            .ok()?
            .checked_mul(self.thumb_width.checked_add(self.padding)?)?
            .checked_add(self.padding)?;
        let y = u32::try_from(row)
            .ok()?
            .checked_mul(self.thumb_height.checked_add(self.padding)?)?
            .checked_add(self.header_height.checked_add(self.padding)?)?;
        Some((x, y))
    }
}

/// 標頭資訊
#[derive(Debug, Clone)]
pub struct SheetHeader {
    pub file_name: String,
    pub metadata: VideoMetadata,
    pub file_size: u64,
}

impl SheetHeader {
    /// `名稱 | WxH | 大小 | H:MM:SS`
    #[must_use]
    pub fn text(&self) -> String {
        let dimension = |v: Option<u32>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
        format!(
            "{} | {}x{} | {} | {}",
            self.file_name,
            dimension(self.metadata.width),
            dimension(self.metadata.height),
            format_size(self.file_size),
            format_duration(self.metadata.duration_seconds.unwrap_or(0.0))
        )
    }
}

/// 將截圖合併為帶標頭的預覽圖
///
/// 縮圖高度取自第一張成功的截圖；沒有任何成功的截圖時回傳錯誤。
pub fn create_contact_sheet(
    frames: &[ThumbnailResult],
    header: &SheetHeader,
    settings: &ScreenlistSettings,
    text: &TextRenderer,
) -> Result<RgbImage> {
    let Some(first) = frames.iter().find_map(ThumbnailResult::frame) else {
        bail!("沒有成功擷取任何截圖: {}", header.file_name);
    };

    let layout = SheetLayout::new(settings, first.image.height());
    let Some((width, height)) = layout.canvas_size() else {
        bail!(
            "預覽圖尺寸超出範圍: {}x{} 格，縮圖 {}x{}",
            layout.columns,
            layout.rows,
            layout.thumb_width,
            layout.thumb_height
        );
    };
    debug!(
        "合併 {}x{} 預覽圖，畫布 {width}x{height}",
        layout.columns, layout.rows
    );

    let mut sheet = RgbImage::from_pixel(width, height, BACKGROUND_COLOR);
    let offset = settings.padding as i32;
    text.draw(&mut sheet, offset, offset, settings.font_size, &header.text());

    for result in frames {
        let Some(frame) = result.frame() else {
            continue;
        };
        let Some((x, y)) = layout.cell_origin(result.index) else {
            debug!("略過超出網格的截圖 [{}]", result.index);
            continue;
        };
        imageops::replace(&mut sheet, &frame.image, i64::from(x), i64::from(y));
    }

    Ok(sheet)
}

/// 以 JPEG 寫出預覽圖
pub fn save_contact_sheet(sheet: &RgbImage, output_path: &Path, quality: u8) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("無法建立預覽圖檔案: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    JpegEncoder::new_with_quality(&mut writer, quality)
        .encode_image(sheet)
        .with_context(|| format!("無法寫入預覽圖: {}", output_path.display()))?;
    writer
        .flush()
        .with_context(|| format!("無法寫入預覽圖: {}", output_path.display()))?;

    debug!("預覽圖已寫出: {}", output_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::contact_sheet_generator::thumbnail_extractor::ExtractedFrame;
    use tempfile::TempDir;

    const RED: Rgb<u8> = Rgb([200, 0, 0]);

    fn frame_result(index: usize, width: u32, height: u32) -> ThumbnailResult {
        ThumbnailResult {
            index,
            timestamp: index as f64 + 1.0,
            outcome: Ok(ExtractedFrame {
                image: RgbImage::from_pixel(width, height, RED),
                label: format_duration(index as f64 + 1.0),
            }),
        }
    }

    fn failed_result(index: usize) -> ThumbnailResult {
        ThumbnailResult {
            index,
            timestamp: index as f64 + 1.0,
            outcome: Err("ffmpeg 擷取縮圖失敗".to_string()),
        }
    }

    fn header() -> SheetHeader {
        SheetHeader {
            file_name: "clip.mp4".to_string(),
            metadata: VideoMetadata {
                width: Some(1280),
                height: Some(720),
                duration_seconds: Some(40.0),
            },
            file_size: 1536,
        }
    }

    #[test]
    fn test_layout_canvas_size() {
        let settings = ScreenlistSettings::default();
        let layout = SheetLayout::new(&settings, 180);
        assert_eq!(
            layout.canvas_size(),
            Some((4 * 320 + 5 * 10, 60 + 4 * 180 + 5 * 10))
        );
    }

    #[test]
    fn test_layout_cell_origin() {
        let settings = ScreenlistSettings::default();
        let layout = SheetLayout::new(&settings, 180);
        assert_eq!(layout.cell_origin(0), Some((10, 70)));
        assert_eq!(layout.cell_origin(5), Some((10 + 330, 70 + 190)));
        assert_eq!(layout.cell_origin(15), Some((10 + 3 * 330, 70 + 3 * 190)));
        assert_eq!(layout.cell_origin(16), None);
    }

    #[test]
    fn test_oversized_layout_is_error() {
        let mut settings = ScreenlistSettings::default();
        settings.padding = u32::MAX / 2;
        let layout = SheetLayout::new(&settings, 180);
        assert_eq!(layout.canvas_size(), None);
        assert_eq!(layout.cell_origin(5), None);

        let frames = vec![frame_result(0, 320, 180)];
        let result = create_contact_sheet(&frames, &header(), &settings, &TextRenderer::Bitmap);
        assert!(result.is_err());
    }

    #[test]
    fn test_header_text() {
        assert_eq!(header().text(), "clip.mp4 | 1280x720 | 1.5 KB | 0:00:40");

        let mut unknown = header();
        unknown.metadata.width = None;
        assert!(unknown.text().contains("?x720"));
    }

    #[test]
    fn test_no_frames_is_error() {
        let settings = ScreenlistSettings::default();
        let frames: Vec<_> = (0..16).map(failed_result).collect();
        let result = create_contact_sheet(&frames, &header(), &settings, &TextRenderer::Bitmap);
        assert!(result.is_err());
        assert!(create_contact_sheet(&[], &header(), &settings, &TextRenderer::Bitmap).is_err());
    }

    #[test]
    fn test_partial_frames_keep_full_grid() {
        let settings = ScreenlistSettings::default();
        let frames: Vec<_> = (0..16)
            .map(|i| {
                if i < 10 {
                    frame_result(i, 320, 180)
                } else {
                    failed_result(i)
                }
            })
            .collect();

        let sheet =
            create_contact_sheet(&frames, &header(), &settings, &TextRenderer::Bitmap).unwrap();
        assert_eq!(sheet.dimensions(), (1330, 830));

        let layout = SheetLayout::new(&settings, 180);
        let (x9, y9) = layout.cell_origin(9).unwrap();
        assert_eq!(*sheet.get_pixel(x9 + 100, y9 + 100), RED);
        let (x12, y12) = layout.cell_origin(12).unwrap();
        assert_eq!(*sheet.get_pixel(x12 + 100, y12 + 100), BACKGROUND_COLOR);
    }

    #[test]
    fn test_thumb_height_from_first_success() {
        let settings = ScreenlistSettings::default();
        let frames = vec![failed_result(0), frame_result(1, 320, 240), frame_result(2, 320, 180)];
        let sheet =
            create_contact_sheet(&frames, &header(), &settings, &TextRenderer::Bitmap).unwrap();
        assert_eq!(sheet.height(), 60 + 4 * 240 + 5 * 10);
    }

    #[test]
    fn test_save_contact_sheet_writes_jpeg() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("sheet.jpg");
        let sheet = RgbImage::from_pixel(64, 48, RED);

        save_contact_sheet(&sheet, &output, 90).unwrap();

        let reloaded = image::open(&output).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (64, 48));
    }
}
