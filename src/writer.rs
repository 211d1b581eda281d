//! レコード一覧を日付付きJSONファイルとして保存

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::crd::ClimateRecord;
use crate::error::ScraperError;

/// `<dir>/<YYYYMMDD>_<fname>` を返す
pub fn report_path(dir: &Path, date: NaiveDate, fname: &str) -> PathBuf {
    dir.join(format!("{}_{}", date.format("%Y%m%d"), fname))
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    fname: String,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, fname: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            fname: fname.into(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        report_path(&self.dir, date, &self.fname)
    }

    /// JSON配列として書き出す
    ///
    /// 一時ファイルに書いてからリネームするので、途中で失敗しても既存のファイルは壊れない。
    pub fn write(&self, records: &[ClimateRecord], date: NaiveDate) -> Result<PathBuf, ScraperError> {
        std::fs::create_dir_all(&self.dir)?;

        let path = self.path_for(date);
        let tmp_path = path.with_file_name(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));

        let json = serde_json::to_vec(records)?;
        std::fs::write(&tmp_path, json)?;

        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!("Saved {} records to {:?}", records.len(), path);
        Ok(path)
    }
}
