//! 外部工具（ffmpeg / ffprobe）定位
//!
//! 核心流程只依賴 [`ToolLocator`]，實際的搜尋方式由呼叫端注入。

use anyhow::{Result, bail};
use log::{debug, info};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalTool {
    Ffmpeg,
    Ffprobe,
}

impl ExternalTool {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ffmpeg => "ffmpeg",
            Self::Ffprobe => "ffprobe",
        }
    }

    #[must_use]
    pub fn executable_name(self) -> String {
        if cfg!(windows) {
            format!("{}.exe", self.name())
        } else {
            self.name().to_string()
        }
    }
}

impl fmt::Display for ExternalTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait ToolLocator {
    fn locate(&self, tool: ExternalTool) -> Option<PathBuf>;
}

/// 依序搜尋：設定檔指定路徑 → `PATH` → 執行檔所在資料夾
#[derive(Debug, Clone, Default)]
pub struct SystemToolLocator {
    ffmpeg_override: Option<PathBuf>,
    ffprobe_override: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
}

impl SystemToolLocator {
    #[must_use]
    pub fn new(ffmpeg_override: Option<PathBuf>, ffprobe_override: Option<PathBuf>) -> Self {
        let mut search_dirs: Vec<PathBuf> = env::var_os("PATH")
            .map(|paths| env::split_paths(&paths).collect())
            .unwrap_or_default();

        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            search_dirs.push(exe_dir);
        }

        Self {
            ffmpeg_override,
            ffprobe_override,
            search_dirs,
        }
    }

    /// 只在指定資料夾中搜尋（測試用）
    #[must_use]
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            ffmpeg_override: None,
            ffprobe_override: None,
            search_dirs,
        }
    }

    const fn override_for(&self, tool: ExternalTool) -> Option<&PathBuf> {
        match tool {
            ExternalTool::Ffmpeg => self.ffmpeg_override.as_ref(),
            ExternalTool::Ffprobe => self.ffprobe_override.as_ref(),
        }
    }
}

impl ToolLocator for SystemToolLocator {
    fn locate(&self, tool: ExternalTool) -> Option<PathBuf> {
        if let Some(path) = self.override_for(tool) {
            return path.is_file().then(|| path.clone());
        }

        let exe_name = tool.executable_name();
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&exe_name))
            .find(|candidate| candidate.is_file())
    }
}

/// 已確認存在的外部工具路徑
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

impl Toolchain {
    /// 任一工具找不到即為致命錯誤，須在處理任何影片前呼叫
    pub fn resolve(locator: &dyn ToolLocator) -> Result<Self> {
        let ffmpeg = Self::require(locator, ExternalTool::Ffmpeg)?;
        let ffprobe = Self::require(locator, ExternalTool::Ffprobe)?;
        info!("ffmpeg: {}, ffprobe: {}", ffmpeg.display(), ffprobe.display());
        Ok(Self { ffmpeg, ffprobe })
    }

    fn require(locator: &dyn ToolLocator, tool: ExternalTool) -> Result<PathBuf> {
        match locator.locate(tool) {
            Some(path) => {
                debug!("找到 {tool}: {}", path.display());
                Ok(path)
            }
            None => bail!(
                "需要 {tool}：請將 {} 加入 PATH、放在程式旁，或在設定檔指定路徑",
                tool.executable_name()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct FixedLocator(Option<PathBuf>);

    impl ToolLocator for FixedLocator {
        fn locate(&self, _tool: ExternalTool) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    #[test]
    fn test_locate_in_search_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let probe = temp_dir.path().join(ExternalTool::Ffprobe.executable_name());
        fs::write(&probe, b"").unwrap();

        let locator = SystemToolLocator::with_search_dirs(vec![temp_dir.path().to_path_buf()]);
        assert_eq!(locator.locate(ExternalTool::Ffprobe), Some(probe));
        assert_eq!(locator.locate(ExternalTool::Ffmpeg), None);
    }

    #[test]
    fn test_override_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let locator = SystemToolLocator {
            ffmpeg_override: Some(missing),
            ffprobe_override: None,
            search_dirs: Vec::new(),
        };
        assert_eq!(locator.locate(ExternalTool::Ffmpeg), None);
    }

    #[test]
    fn test_toolchain_missing_tool_is_fatal() {
        let err = Toolchain::resolve(&FixedLocator(None)).unwrap_err();
        assert!(err.to_string().contains("ffmpeg"));

        let locator = FixedLocator(Some(PathBuf::from("/bin/tool")));
        let toolchain = Toolchain::resolve(&locator).unwrap();
        assert_eq!(toolchain.ffprobe, PathBuf::from("/bin/tool"));
    }
}
