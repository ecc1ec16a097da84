use crate::config::types::{Config, ScreenlistSettings};
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// 預設設定檔名稱（位於目前工作目錄）
pub const SETTINGS_FILE_NAME: &str = "screenlist.json";

/// 網格每邊最多格數
pub const MAX_GRID_CELLS: u32 = 64;
/// 縮圖寬度上限（像素）
pub const MAX_THUMB_WIDTH: u32 = 3840;
/// 間距與標頭高度上限（像素）
pub const MAX_SPACING: u32 = 1000;

impl Config {
    /// 指定設定檔時該檔案必須存在
    ///
    /// 未指定時讀取目前工作目錄的 `screenlist.json`，不存在則使用預設值。
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => Self::load_settings(path)?,
            None => {
                let default_path = Path::new(SETTINGS_FILE_NAME);
                if default_path.exists() {
                    Self::load_settings(default_path)?
                } else {
                    ScreenlistSettings::default()
                }
            }
        };

        let config = Self { settings };
        config.validate()?;
        Ok(config)
    }

    fn load_settings(path: &Path) -> Result<ScreenlistSettings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// 檢查設定值是否可用於版面計算
    pub fn validate(&self) -> Result<()> {
        let s = &self.settings;
        if !(1..=MAX_GRID_CELLS).contains(&s.rows) || !(1..=MAX_GRID_CELLS).contains(&s.columns) {
            bail!(
                "網格列數與欄數必須介於 1 到 {MAX_GRID_CELLS}（目前 {}x{}）",
                s.columns,
                s.rows
            );
        }
        if !(1..=MAX_THUMB_WIDTH).contains(&s.thumb_width) {
            bail!(
                "縮圖寬度必須介於 1 到 {MAX_THUMB_WIDTH}（目前 {}）",
                s.thumb_width
            );
        }
        if s.padding > MAX_SPACING || s.header_height > MAX_SPACING {
            bail!(
                "間距與標頭高度不可超過 {MAX_SPACING}（目前 {} / {}）",
                s.padding,
                s.header_height
            );
        }
        if !(s.font_size > 0.0 && s.label_font_size > 0.0) {
            bail!("字型大小必須大於 0");
        }
        if s.jpeg_quality == 0 || s.jpeg_quality > 100 {
            bail!("JPEG 品質必須介於 1 到 100（目前 {}）", s.jpeg_quality);
        }
        if s.video_extensions.is_empty() {
            bail!("至少需要一個影片副檔名");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverwritePolicy;
    use tempfile::TempDir;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        fs::write(&path, r#"{ "rows": 3, "overwrite": "replace" }"#).unwrap();

        let config = Config::from_optional_path(Some(&path)).unwrap();
        assert_eq!(config.settings.rows, 3);
        assert_eq!(config.settings.columns, 4);
        assert_eq!(config.settings.overwrite, OverwritePolicy::ReplaceExisting);
        assert_eq!(config.settings.thumb_width, 320);
    }

    #[test]
    fn test_missing_explicit_settings_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.json");
        assert!(Config::from_optional_path(Some(&path)).is_err());
    }

    #[test]
    fn test_malformed_settings_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ rows: ").unwrap();
        assert!(Config::from_optional_path(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_grid() {
        let mut config = Config::default();
        config.settings.columns = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.settings.jpeg_quality = 0;
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_layout() {
        let mut config = Config::default();
        config.settings.padding = u32::MAX / 2;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.settings.rows = MAX_GRID_CELLS + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.settings.thumb_width = MAX_THUMB_WIDTH + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.settings.header_height = MAX_SPACING;
        config.settings.columns = MAX_GRID_CELLS;
        assert!(config.validate().is_ok());
    }
}
