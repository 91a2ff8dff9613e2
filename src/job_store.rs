//! 直近ジョブIDの保存
//!
//! アップロードで得たジョブIDを保存し、別プロセスの
//! `generate` / `download` でID省略時に使う。
//! 読み込み失敗・破損時は「ジョブなし」として扱う。

use crate::config::Config;
use crate::error::Result;
use photo_scope_common::JobId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

const JOB_FILE_NAME: &str = "last-job.json";

/// 保存レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// バージョン（互換性チェック用）
    version: u32,
    pub job_id: JobId,
    /// 保存日時（RFC 3339）
    pub saved_at: String,
}

#[derive(Debug, Clone)]
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    const CURRENT_VERSION: u32 = 1;

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.config/photo-scope/`
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::config_dir()?))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(JOB_FILE_NAME)
    }

    /// 保存済みレコードを読み込み
    pub fn load(&self) -> Option<JobRecord> {
        let file = File::open(self.path()).ok()?;
        let record: JobRecord = match serde_json::from_reader(BufReader::new(file)) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %self.path().display(), "ジョブ記録の読み込みに失敗: {}", e);
                return None;
            }
        };

        // バージョンチェック
        if record.version != Self::CURRENT_VERSION {
            tracing::warn!(version = record.version, "ジョブ記録のバージョン不一致、無視します");
            return None;
        }
        Some(record)
    }

    pub fn last_job_id(&self) -> Option<JobId> {
        self.load().map(|r| r.job_id)
    }

    /// ジョブIDを保存
    pub fn save(&self, job_id: &JobId) -> Result<JobRecord> {
        std::fs::create_dir_all(&self.dir)?;

        let record = JobRecord {
            version: Self::CURRENT_VERSION,
            job_id: job_id.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };

        let mut writer = BufWriter::new(File::create(self.path())?);
        serde_json::to_writer_pretty(&mut writer, &record)?;
        writer.flush()?;
        Ok(record)
    }

    /// 保存を試みる（失敗は警告ログのみでNone）
    pub fn try_save(&self, job_id: &JobId) -> Option<JobRecord> {
        match self.save(job_id) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(
                    path = %self.path().display(),
                    job_id = %job_id,
                    "ジョブ記録の保存に失敗: {}",
                    e
                );
                None
            }
        }
    }

    /// 保存ファイルを削除（存在しなければfalse）
    pub fn clear(&self) -> Result<bool> {
        let path = self.path();
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }
}
