//! Photo Scope client
//!
//! 写真をバックエンドにアップロードし、見積レポートを取得する。
//! 状態機械と型は `photo_scope_common`、HTTP通信とCLIはこのクレート。

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod job_store;
pub mod scanner;
pub mod session;
