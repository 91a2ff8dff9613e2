//! バックエンドURLの解決
//!
//! 優先順位:
//! 1. 明示的な設定（ビルド時・設定ファイル・環境変数・CLI引数）
//! 2. 実行中のデプロイ先ホストからの推定
//! 3. 固定のフォールバック
//!
//! 環境の読み取りは呼び出し側で行い、ここでは純粋関数として扱う。

use crate::payload::UploadTarget;
use crate::types::{ArtifactRef, JobId};

/// フォールバックのベースURL（uvicornのデフォルトポート）
pub const FALLBACK_BASE_URL: &str = "http://127.0.0.1:8000";

/// ローカル開発時のバックエンドポート
pub const LOCAL_BACKEND_PORT: u16 = 8000;

const LOCAL_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0", "[::1]", "::1"];

/// 解決の入力
#[derive(Debug, Clone, Default)]
pub struct EndpointEnv {
    /// 明示的に設定されたベースURL
    pub configured: Option<String>,
}

/// どの段階で決まったか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSource {
    Configured,
    HostHeuristic,
    Fallback,
}

impl std::fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointSource::Configured => write!(f, "設定値"),
            EndpointSource::HostHeuristic => write!(f, "ホスト推定"),
            EndpointSource::Fallback => write!(f, "フォールバック"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub base_url: String,
    pub source: EndpointSource,
}

/// ベースURLを解決
pub fn resolve_endpoint(env: &EndpointEnv, current_host: Option<&str>) -> ResolvedEndpoint {
    if let Some(url) = env.configured.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        return ResolvedEndpoint {
            base_url: normalize_base(url),
            source: EndpointSource::Configured,
        };
    }

    if let Some(base_url) = current_host.and_then(base_url_for_host) {
        return ResolvedEndpoint {
            base_url,
            source: EndpointSource::HostHeuristic,
        };
    }

    ResolvedEndpoint {
        base_url: FALLBACK_BASE_URL.to_string(),
        source: EndpointSource::Fallback,
    }
}

/// ホスト名からの推定
///
/// - ローカルホスト → `http://localhost:8000`
/// - それ以外 → 同一オリジン `https://{host}`
fn base_url_for_host(host: &str) -> Option<String> {
    let host = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    if host.is_empty() {
        return None;
    }

    let hostname = strip_port(host);
    if LOCAL_HOSTS.contains(&hostname) {
        return Some(format!("http://localhost:{}", LOCAL_BACKEND_PORT));
    }
    Some(format!("https://{}", host))
}

fn strip_port(host: &str) -> &str {
    // IPv6リテラルはそのまま比較
    if host.starts_with('[') {
        return host.split_inclusive(']').next().unwrap_or(host);
    }
    host.split(':').next().unwrap_or(host)
}

fn normalize_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

/// 各APIのURL組み立て
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        Self {
            base: normalize_base(base_url.trim()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn upload_url(&self, target: &UploadTarget) -> String {
        format!("{}/{}", self.base, target.path())
    }

    pub fn generate_report_url(&self, job_id: &JobId) -> String {
        format!("{}/generate-report/{}", self.base, job_id)
    }

    pub fn download_url(&self, job_id: &JobId) -> String {
        format!("{}/download/{}", self.base, job_id)
    }

    /// 相対参照はベースURLに結合
    pub fn resolve_artifact(&self, artifact: &ArtifactRef) -> String {
        if artifact.is_absolute() {
            return artifact.location.clone();
        }
        let relative = artifact.location.replace('\\', "/");
        format!("{}/{}", self.base, relative.trim_start_matches("./").trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactKind;

    #[test]
    fn test_configured_wins() {
        let env = EndpointEnv {
            configured: Some("https://api.example.com/".into()),
        };
        let resolved = resolve_endpoint(&env, Some("localhost"));
        assert_eq!(resolved.base_url, "https://api.example.com");
        assert_eq!(resolved.source, EndpointSource::Configured);
    }

    #[test]
    fn test_blank_configuration_is_ignored() {
        let env = EndpointEnv {
            configured: Some("   ".into()),
        };
        let resolved = resolve_endpoint(&env, None);
        assert_eq!(resolved.source, EndpointSource::Fallback);
        assert_eq!(resolved.base_url, FALLBACK_BASE_URL);
    }

    #[test]
    fn test_local_host_heuristic() {
        let env = EndpointEnv::default();
        for host in ["localhost", "localhost:3000", "127.0.0.1:5173", "http://localhost:3000/"] {
            let resolved = resolve_endpoint(&env, Some(host));
            assert_eq!(resolved.base_url, "http://localhost:8000", "host: {}", host);
            assert_eq!(resolved.source, EndpointSource::HostHeuristic);
        }
    }

    #[test]
    fn test_deployed_host_heuristic() {
        let resolved = resolve_endpoint(&EndpointEnv::default(), Some("scope.example.com"));
        assert_eq!(resolved.base_url, "https://scope.example.com");
        assert_eq!(resolved.source, EndpointSource::HostHeuristic);
    }

    #[test]
    fn test_fallback() {
        let resolved = resolve_endpoint(&EndpointEnv::default(), Some("  "));
        assert_eq!(resolved.source, EndpointSource::Fallback);
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = Endpoints::new("http://localhost:8000/");
        let job = JobId::new("abc123").unwrap();
        assert_eq!(endpoints.upload_url(&UploadTarget::Upload), "http://localhost:8000/upload");
        assert_eq!(
            endpoints.upload_url(&UploadTarget::Work(job.clone())),
            "http://localhost:8000/upload-work/abc123"
        );
        assert_eq!(endpoints.generate_report_url(&job), "http://localhost:8000/generate-report/abc123");
        assert_eq!(endpoints.download_url(&job), "http://localhost:8000/download/abc123");
    }

    #[test]
    fn test_resolve_artifact() {
        let endpoints = Endpoints::new("http://localhost:8000");
        let relative = ArtifactRef::new(ArtifactKind::FilePath, "reports/abc_scope_report.pdf");
        assert_eq!(
            endpoints.resolve_artifact(&relative),
            "http://localhost:8000/reports/abc_scope_report.pdf"
        );
        let rooted = ArtifactRef::new(ArtifactKind::PdfUrl, "/static/r.pdf");
        assert_eq!(endpoints.resolve_artifact(&rooted), "http://localhost:8000/static/r.pdf");
        let absolute = ArtifactRef::new(ArtifactKind::PdfUrl, "https://cdn.test/r.pdf");
        assert_eq!(endpoints.resolve_artifact(&absolute), "https://cdn.test/r.pdf");
    }
}
