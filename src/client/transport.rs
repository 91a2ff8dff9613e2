//! HTTPトランスポート
//!
//! ワークフローはこのトレイト越しに通信する。テストではメモリ上の実装に差し替える。

use async_trait::async_trait;
use photo_scope_common::{Error, MultipartPayload, PartBody, Result};
use reqwest::multipart::{Form, Part};
use std::time::Duration;

/// HTTPレスポンス（ステータスとボディのみ）
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// 1回のリクエスト・レスポンス交換
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_multipart(&self, url: &str, payload: MultipartPayload) -> Result<HttpReply>;

    async fn get(&self, url: &str) -> Result<HttpReply>;
}

/// reqwestによる実装
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTPクライアント初期化エラー: {}", e)))?;
        Ok(Self { client })
    }
}

fn network_error(error: reqwest::Error) -> Error {
    if error.is_timeout() {
        Error::Network(format!("タイムアウトしました: {}", error))
    } else {
        Error::Network(error.to_string())
    }
}

fn to_form(payload: MultipartPayload) -> Result<Form> {
    let mut form = Form::new();

    for part in payload.into_parts() {
        form = match part.body {
            PartBody::Text(text) => form.text(part.name, text),
            PartBody::File(file) => {
                let file_part = Part::bytes(file.bytes().to_vec())
                    .file_name(file.file_name().to_string())
                    .mime_str(file.mime_type())
                    .map_err(|e| {
                        Error::Network(format!("MIMEタイプが不正です ({}): {}", file.mime_type(), e))
                    })?;
                form.part(part.name, file_part)
            }
        };
    }

    Ok(form)
}

async fn read_reply(response: reqwest::Response) -> Result<HttpReply> {
    let status = response.status().as_u16();
    let body = response.bytes().await.map_err(network_error)?;
    Ok(HttpReply::new(status, body.to_vec()))
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_multipart(&self, url: &str, payload: MultipartPayload) -> Result<HttpReply> {
        let form = to_form(payload)?;
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(network_error)?;
        read_reply(response).await
    }

    async fn get(&self, url: &str) -> Result<HttpReply> {
        let response = self.client.get(url).send().await.map_err(network_error)?;
        read_reply(response).await
    }
}
