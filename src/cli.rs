use clap::{Parser, Subcommand, ValueEnum};
use photo_scope_common::{JobId, PhotoFieldName, UploadTarget};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photo-scope")]
#[command(about = "写真をアップロードしてスコープ見積レポートを取得するクライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// ログをJSON形式で出力
    #[arg(long, global = true)]
    pub log_json: bool,

    /// バックエンドのベースURL（設定・環境変数より優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// デプロイ先ホスト（ベースURL未設定時の推定に使用）
    #[arg(long, global = true)]
    pub host: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 写真をアップロードして見積を取得
    Upload {
        /// 写真ファイルまたはフォルダ
        paths: Vec<PathBuf>,

        /// 点検メモ
        #[arg(long)]
        notes: Option<String>,

        /// 作業範囲（スコープ）
        #[arg(long)]
        scope: Option<String>,

        /// スケッチ画像
        #[arg(long)]
        sketch: Option<PathBuf>,

        /// 送信先 (upload/inspection)
        #[arg(long, value_enum, default_value = "upload")]
        target: TargetKind,

        /// 既存ジョブに作業写真を追加（upload-work）
        #[arg(long, conflicts_with = "target")]
        work: Option<JobId>,

        /// 写真フィールド名 (files/file)。省略時は設定値
        #[arg(long)]
        field: Option<PhotoFieldName>,

        /// 成功後にレポートPDFをダウンロード
        #[arg(short, long)]
        download: bool,

        /// ダウンロード先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 見積をJSONで保存
        #[arg(long)]
        json: Option<PathBuf>,

        /// 見積をExcelで保存
        #[arg(long)]
        excel: Option<PathBuf>,

        /// Excelのタイトル
        #[arg(short, long, default_value = "スコープ見積")]
        title: String,
    },

    /// ジョブのレポートを生成
    Generate {
        /// ジョブID（省略時は直近のジョブ）
        job_id: Option<JobId>,

        /// 生成後にダウンロード
        #[arg(short, long)]
        download: bool,

        /// ダウンロード先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// ジョブのレポートPDFをダウンロード
    Download {
        /// ジョブID（省略時は直近のジョブ）
        job_id: Option<JobId>,

        /// ダウンロード先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 保存済み見積JSONからExcelを生成
    Export {
        /// 入力JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力Excelファイル
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ドキュメントタイトル
        #[arg(short, long, default_value = "スコープ見積")]
        title: String,
    },

    /// 設定を表示/編集
    Config {
        /// ベースURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// デプロイ先ホストを設定
        #[arg(long)]
        set_host: Option<String>,

        /// 写真フィールド名を設定 (files/file)
        #[arg(long)]
        set_field: Option<PhotoFieldName>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// 解決されたバックエンドURLを表示
    Endpoint,

    /// 直近のジョブIDを表示/削除
    Job {
        /// 保存されたジョブIDを削除
        #[arg(long)]
        clear: bool,
    },
}

/// 送信先エンドポイント
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum TargetKind {
    /// POST /upload（写真1枚以上）
    #[default]
    Upload,
    /// POST /upload-inspection（写真0枚以上 + メモ・スコープ・スケッチ）
    Inspection,
}

impl TargetKind {
    pub fn into_target(self, work: Option<JobId>) -> UploadTarget {
        match (work, self) {
            (Some(job_id), _) => UploadTarget::Work(job_id),
            (None, TargetKind::Upload) => UploadTarget::Upload,
            (None, TargetKind::Inspection) => UploadTarget::Inspection,
        }
    }
}
