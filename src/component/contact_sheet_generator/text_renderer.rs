use ab_glyph::{FontVec, PxScale};
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// 內建點陣字型的原始字高
const BITMAP_GLYPH_SIZE: u32 = 8;

/// 未指定字型時依序嘗試的系統字型
const FALLBACK_FONT_PATHS: [&str; 7] = [
    "arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
];

/// 文字繪製器：優先使用 TrueType 字型，找不到時退回內建點陣字型
pub enum TextRenderer {
    Scalable(FontVec),
    Bitmap,
}

impl TextRenderer {
    /// 載入字型；任何失敗都只會退回內建字型，不會中止處理
    #[must_use]
    pub fn load(preferred: Option<&Path>) -> Self {
        let candidates = preferred
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FALLBACK_FONT_PATHS.iter().map(PathBuf::from));

        for path in candidates {
            if let Some(font) = Self::load_font(&path) {
                info!("使用字型: {}", path.display());
                return Self::Scalable(font);
            }
        }

        if let Some(path) = preferred {
            warn!("無法使用字型 {}，改用內建點陣字型", path.display());
        } else {
            info!("找不到可用的 TrueType 字型，改用內建點陣字型");
        }
        Self::Bitmap
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let data = fs::read(path).ok()?;
        match FontVec::try_from_vec(data) {
            Ok(font) => Some(font),
            Err(e) => {
                debug!("字型解析失敗 {}: {e}", path.display());
                None
            }
        }
    }

    /// 在 `(x, y)` 以左上角為基準繪製一行文字，超出畫布的部分會被裁掉
    pub fn draw(&self, image: &mut RgbImage, x: i32, y: i32, size: f32, text: &str) {
        match self {
            Self::Scalable(font) => {
                draw_text_mut(image, TEXT_COLOR, x, y, PxScale::from(size), font, text);
            }
            Self::Bitmap => draw_bitmap_text(image, x, y, size, text),
        }
    }
}

fn draw_bitmap_text(image: &mut RgbImage, x: i32, y: i32, size: f32, text: &str) {
    let scale = ((size / BITMAP_GLYPH_SIZE as f32).round() as i32).max(1);
    let advance = BITMAP_GLYPH_SIZE as i32 * scale;

    for (i, ch) in text.chars().enumerate() {
        let glyph = BASIC_FONTS
            .get(ch)
            .or_else(|| BASIC_FONTS.get('?'))
            .unwrap_or([0; 8]);
        let origin_x = x + i as i32 * advance;

        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..BITMAP_GLYPH_SIZE as i32 {
                if (*bits >> col) & 1 == 0 {
                    continue;
                }
                let px = origin_x + col * scale;
                let py = y + row as i32 * scale;
                fill_block(image, px, py, scale);
            }
        }
    }
}

fn fill_block(image: &mut RgbImage, x: i32, y: i32, scale: i32) {
    let (width, height) = image.dimensions();
    for dy in 0..scale {
        for dx in 0..scale {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && (px as u32) < width && (py as u32) < height {
                image.put_pixel(px as u32, py as u32, TEXT_COLOR);
            }
        }
    }
}
