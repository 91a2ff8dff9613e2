use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use photo_scope::client::ReqwestTransport;
use photo_scope::session::{RequestOutcome, UploadSession};
use photo_scope::{cli, config, export, job_store, scanner};
use cli::{Cli, Commands};
use config::Config;
use job_store::JobStore;
use photo_scope_common::export::text::render_estimate;
use photo_scope_common::{
    resolve_endpoint, AuxiliaryField, JobId, PhotoFieldName, ReportResult, ResolvedEndpoint,
    WorkflowState,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

type Session = UploadSession<ReqwestTransport>;

/// 全コマンド共通のオプション
struct Globals {
    base_url: Option<String>,
    host: Option<String>,
}

fn init_tracing(verbose: bool, log_json: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 標準出力はユーザー向け表示に使うのでログは標準エラーへ
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn resolve(config: &Config, globals: &Globals) -> ResolvedEndpoint {
    let env = config.endpoint_env(globals.base_url.as_deref());
    let host = config.current_host(globals.host.as_deref());
    resolve_endpoint(&env, host.as_deref())
}

fn build_session(config: &Config, globals: &Globals, field: PhotoFieldName) -> anyhow::Result<Session> {
    let resolved = resolve(config, globals);
    tracing::debug!(base_url = %resolved.base_url, source = %resolved.source, "エンドポイント解決");

    let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_seconds))?;
    Ok(UploadSession::new(transport, &resolved.base_url, field))
}

fn download_dir(output: Option<PathBuf>, config: &Config) -> PathBuf {
    output
        .or_else(|| config.download_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn download_and_save(session: &Session, job_id: Option<JobId>, dir: &Path) -> anyhow::Result<()> {
    let pb = spinner("レポートをダウンロード中");
    let report = session.download_report(job_id).await;
    pb.finish_and_clear();

    let report = report?;
    let path = report
        .save_into(dir)
        .with_context(|| format!("保存に失敗しました: {}", dir.display()))?;
    println!("✔ レポートを保存: {}", path.display());
    Ok(())
}

/// 直近ジョブIDを保存（失敗しても結果処理は続ける）
fn remember_job(job_id: &JobId) {
    let saved = match JobStore::default_location() {
        Ok(store) => store.try_save(job_id).is_some(),
        Err(e) => {
            tracing::warn!("ジョブ記録の保存先がありません: {}", e);
            false
        }
    };
    if !saved {
        println!("⚠ ジョブIDを保存できませんでした（以降は `{}` を明示してください）", job_id);
    }
}

struct UploadExports<'a> {
    download: bool,
    dir: &'a Path,
    json: Option<&'a Path>,
    excel: Option<&'a Path>,
    title: &'a str,
}

async fn handle_upload_state(
    session: &Session,
    state: WorkflowState,
    exports: UploadExports<'_>,
) -> anyhow::Result<()> {
    match state {
        WorkflowState::Succeeded(ReportResult::Inline(estimate)) => {
            println!("\n{}\n", render_estimate(&estimate));
            println!("✔ {}枚 / 明細{}件", estimate.results.len(), estimate.line_item_count());
            export::export_estimate(&estimate, exports.json, exports.excel, exports.title)?;

            if exports.download {
                match session.job_id() {
                    Some(job_id) => download_and_save(session, Some(job_id), exports.dir).await?,
                    None => println!("ジョブIDがないためレポートをダウンロードできません"),
                }
            }
        }
        WorkflowState::Succeeded(ReportResult::Artifact(artifact)) => {
            println!("✔ レポート: {}", artifact.location);

            if exports.download {
                let pb = spinner("レポートをダウンロード中");
                let report = session.fetch_artifact(&artifact).await;
                pb.finish_and_clear();
                let path = report?.save_into(exports.dir)?;
                println!("✔ レポートを保存: {}", path.display());
            }
        }
        WorkflowState::Accepted(job_id) => {
            println!("✔ 受付済み ジョブID: {}", job_id);

            if exports.download {
                let pb = spinner("レポートを生成中");
                let generated = session.generate_report(Some(job_id.clone())).await;
                pb.finish_and_clear();
                match generated {
                    RequestOutcome::Completed(WorkflowState::Succeeded(_)) => {
                        download_and_save(session, Some(job_id), exports.dir).await?
                    }
                    RequestOutcome::Completed(WorkflowState::Failed(info)) => bail!("{}", info),
                    other => bail!("レポート生成が完了しませんでした: {:?}", other),
                }
            } else {
                println!("  `photo-scope generate {}` でレポートを生成できます", job_id);
            }
        }
        WorkflowState::Failed(info) => bail!("{}", info),
        other => bail!("想定外の状態です: {}", other.name()),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { command, verbose, log_json, base_url, host } = Cli::parse();
    init_tracing(verbose, log_json);

    let globals = Globals { base_url, host };
    let config = Config::load()?;

    match command {
        Commands::Upload {
            paths,
            notes,
            scope,
            sketch,
            target,
            work,
            field,
            download,
            output,
            json,
            excel,
            title,
        } => {
            println!("📸 photo-scope - アップロード\n");

            let field = field.unwrap_or(config.photo_field);
            let session = build_session(&config, &globals, field)?;
            let target = target.into_target(work);

            // 1. 写真読み込み
            println!("[1/3] 写真を読み込み中...");
            let photo_paths = scanner::collect_photo_paths(&paths)?;
            let files = scanner::load_file_handles(&photo_paths)?;
            let count = files.len();
            session.select_files(files);
            session.set_auxiliary_field(AuxiliaryField::Notes(notes));
            session.set_auxiliary_field(AuxiliaryField::Scope(scope));
            if let Some(sketch_path) = sketch {
                let sketch = scanner::load_file_handle(&sketch_path)?;
                session.set_auxiliary_field(AuxiliaryField::Sketch(Some(sketch)));
            }
            for (index, label) in session.preview_labels().iter().enumerate() {
                println!("  {}. {}", index + 1, label);
            }
            println!("✔ {}枚の写真を選択\n", count);

            // 2. 送信
            println!("[2/3] 送信中... ({} / {})", session.base_url(), target.path());
            let pb = spinner("サーバーの応答を待っています");
            let outcome = session.submit(target).await;
            pb.finish_and_clear();

            if let Some(job_id) = session.job_id() {
                remember_job(&job_id);
            }

            // 3. 結果処理
            println!("[3/3] 結果を処理中...");
            let dir = download_dir(output, &config);
            match outcome {
                RequestOutcome::Completed(state) => {
                    let exports = UploadExports {
                        download,
                        dir: &dir,
                        json: json.as_deref(),
                        excel: excel.as_deref(),
                        title: &title,
                    };
                    handle_upload_state(&session, state, exports).await?;
                }
                other => bail!("送信が完了しませんでした: {:?}", other),
            }

            println!("\n✅ 完了");
        }

        Commands::Generate { job_id, download, output } => {
            println!("📄 photo-scope - レポート生成\n");

            let session = build_session(&config, &globals, config.photo_field)?;
            let job_id = job_id.or_else(|| JobStore::default_location().ok()?.last_job_id());

            let pb = spinner("レポートを生成中");
            let outcome = session.generate_report(job_id.clone()).await;
            pb.finish_and_clear();

            match outcome {
                RequestOutcome::Completed(WorkflowState::Succeeded(ReportResult::Artifact(artifact))) => {
                    println!("✔ レポート生成: {}", artifact.location);
                    if download {
                        download_and_save(&session, job_id, &download_dir(output, &config)).await?;
                    }
                }
                RequestOutcome::Completed(WorkflowState::Failed(info)) => bail!("{}", info),
                other => bail!("レポート生成が完了しませんでした: {:?}", other),
            }

            println!("\n✅ 完了");
        }

        Commands::Download { job_id, output } => {
            println!("⬇ photo-scope - ダウンロード\n");

            let session = build_session(&config, &globals, config.photo_field)?;
            let job_id = job_id.or_else(|| JobStore::default_location().ok()?.last_job_id());
            download_and_save(&session, job_id, &download_dir(output, &config)).await?;

            println!("\n✅ 完了");
        }

        Commands::Export { input, output, title } => {
            println!("📊 photo-scope - エクスポート\n");

            let estimate = export::read_estimate_json(&input)
                .with_context(|| format!("見積JSONを読み込めません: {}", input.display()))?;
            let output = output.unwrap_or_else(|| input.with_extension("xlsx"));
            export::export_estimate(&estimate, None, Some(&output), &title)?;

            println!("\n✅ エクスポート完了");
        }

        Commands::Config { set_base_url, set_host, set_field, show } => {
            let mut config = config;

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ ベースURLを設定しました");
            }

            if let Some(host) = set_host {
                config.set_deployment_host(host)?;
                println!("✔ デプロイ先ホストを設定しました");
            }

            if let Some(field) = set_field {
                config.set_photo_field(field)?;
                println!("✔ 写真フィールド名を設定しました: {}", field);
            }

            if show {
                println!("設定:");
                println!("  ベースURL: {}", config.base_url.as_deref().unwrap_or("未設定"));
                println!("  デプロイ先ホスト: {}", config.deployment_host.as_deref().unwrap_or("未設定"));
                println!("  写真フィールド名: {}", config.photo_field);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  ダウンロード先: {}",
                    config
                        .download_dir
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "カレントディレクトリ".to_string())
                );
            }
        }

        Commands::Endpoint => {
            let resolved = resolve(&config, &globals);
            println!("{}", resolved.base_url);
            println!("  決定方法: {}", resolved.source);
        }

        Commands::Job { clear } => {
            let store = JobStore::default_location()?;

            if clear {
                match store.clear() {
                    Ok(true) => println!("✔ ジョブ記録を削除しました: {}", store.path().display()),
                    Ok(false) => println!("ジョブ記録が存在しません"),
                    Err(e) => println!("ジョブ記録削除エラー: {}", e),
                }
            } else {
                match store.load() {
                    Some(record) => {
                        println!("直近のジョブ:");
                        println!("  ジョブID: {}", record.job_id);
                        println!("  保存日時: {}", record.saved_at);
                        println!("  レポート名: {}", record.job_id.report_file_name());
                    }
                    None => println!("ジョブ記録が存在しません: {}", store.path().display()),
                }
            }
        }
    }

    Ok(())
}
