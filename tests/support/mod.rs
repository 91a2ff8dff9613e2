//! テスト用のメモリ上トランスポート
//!
//! 応答をキューで台本化し、発行されたリクエストを記録する。
//! `gated` で作ると最初のリクエストを `release` まで保留する。

#![allow(dead_code)]

use async_trait::async_trait;
use photo_scope::client::{HttpReply, Transport};
use photo_scope_common::{Error, FileHandle, MultipartPayload, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: &'static str,
    pub url: String,
    pub payload: Option<MultipartPayload>,
}

#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Result<HttpReply>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn reply_json(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpReply::new(status, body.as_bytes().to_vec())))
    }

    pub fn reply_bytes(self, status: u16, body: &[u8]) -> Self {
        self.push(Ok(HttpReply::new(status, body.to_vec())))
    }

    pub fn reply_network_error(self, message: &str) -> Self {
        self.push(Err(Error::Network(message.to_string())))
    }

    fn push(self, reply: Result<HttpReply>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 保留中のリクエストに到達するまで待つ
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// 保留中のリクエストを再開
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    async fn respond(&self, method: &'static str, url: &str, payload: Option<MultipartPayload>) -> Result<HttpReply> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            url: url.to_string(),
            payload,
        });
        self.started.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network(format!("台本にない呼び出し: {} {}", method, url))))
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn post_multipart(&self, url: &str, payload: MultipartPayload) -> Result<HttpReply> {
        self.respond("POST", url, Some(payload)).await
    }

    async fn get(&self, url: &str) -> Result<HttpReply> {
        self.respond("GET", url, None).await
    }
}

pub fn photo(name: &str) -> FileHandle {
    FileHandle::with_guessed_mime(name, format!("bytes of {}", name).into_bytes())
}

pub const BASE_URL: &str = "http://localhost:8000";

pub const INLINE_BODY: &str = r#"{
    "total_estimate": 150.5,
    "results": [
        {
            "image": "kitchen.jpg",
            "scope": "Replace damaged drywall",
            "line_items": [
                {"code": "DRY-01", "desc": "Drywall patch", "qty": 2, "price": 40.0, "total": 80.0}
            ],
            "subtotal": 80.0
        },
        {
            "image": "bath.jpg",
            "scope": "Re-caulk tub",
            "line_items": [
                {"code": "CAU-02", "desc": "Caulking", "qty": 1, "price": 70.5, "total": 70.5}
            ],
            "subtotal": 70.5
        }
    ]
}"#;
