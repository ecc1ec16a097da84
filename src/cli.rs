use crate::config::{Config, OverwritePolicy};
use crate::tools::ScanTarget;
use clap::{Parser, ValueEnum};
use log::warn;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OverwriteArg {
    /// 一律覆寫舊的預覽圖
    Replace,
    /// 檔名被占用時加上 _1, _2, ...
    AppendIndex,
    /// 預覽圖已存在則跳過該影片
    Skip,
}

impl From<OverwriteArg> for OverwritePolicy {
    fn from(arg: OverwriteArg) -> Self {
        match arg {
            OverwriteArg::Replace => Self::ReplaceExisting,
            OverwriteArg::AppendIndex => Self::AppendIndexIfExists,
            OverwriteArg::Skip => Self::SkipIfExists,
        }
    }
}

/// 為影片產生縮圖網格預覽圖（screenlist）
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 要處理的影片檔；省略時處理目前資料夾
    pub path: Option<PathBuf>,

    /// 處理資料夾時包含所有子資料夾
    #[arg(short, long)]
    pub recursive: bool,

    /// 設定檔路徑（預設為目前資料夾的 screenlist.json）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 網格列數
    #[arg(long)]
    pub rows: Option<u32>,

    /// 網格欄數
    #[arg(long)]
    pub columns: Option<u32>,

    /// 已存在預覽圖時的處理方式
    #[arg(long, value_enum)]
    pub overwrite: Option<OverwriteArg>,

    /// 顯示除錯訊息
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 命令列參數覆寫設定檔中的值
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(rows) = self.rows {
            config.settings.rows = rows;
        }
        if let Some(columns) = self.columns {
            config.settings.columns = columns;
        }
        if let Some(overwrite) = self.overwrite {
            config.settings.overwrite = overwrite.into();
        }
    }

    #[must_use]
    pub fn scan_target(&self) -> ScanTarget {
        match &self.path {
            Some(path) if path.is_dir() => ScanTarget::Directory {
                path: path.clone(),
                recursive: self.recursive,
            },
            Some(path) => {
                if self.recursive {
                    warn!("處理單一檔案時忽略 --recursive");
                }
                ScanTarget::File(path.clone())
            }
            None => ScanTarget::Directory {
                path: PathBuf::from("."),
                recursive: self.recursive,
            },
        }
    }
}
