//! NCM 日次気候レポートスクレイパー
//!
//! - ヘッドレスブラウザで日次気候レポートのテーブルを取得
//! - 見出し行ごとに観測所種別を付与してレコードに変換
//! - `<出力先>/<YYYYMMDD>_<ファイル名>` にJSON配列として保存
//!
//! # 使用例
//!
//! ```rust,ignore
//! use ncm_climate_scraper::{run, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ReportConfig::new()
//!         .with_crd(true)
//!         .with_outer_fpath("./reports");
//!
//!     let summary = run(&config).await.unwrap();
//!     println!("saved: {:?}", summary.report_path);
//! }
//! ```
//!
//! # tower::Service 使用例
//!
//! ```rust,ignore
//! use ncm_climate_scraper::{ReportRequest, ReportService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ReportService::new();
//!     let request = ReportRequest::new()
//!         .with_crd(true)
//!         .with_proxy("127.0.0.1:8080");
//!
//!     let summary = service.call(request).await.unwrap();
//!     println!("records: {}", summary.record_count);
//! }
//! ```

pub mod browser;
pub mod config;
pub mod crd;
pub mod error;
pub mod service;
pub mod traits;
pub mod writer;

// 主要な型をリエクスポート
pub use browser::BrowserSession;
pub use config::{ReportConfig, RetryPolicy, RowErrorPolicy};
pub use crd::{ClimateRecord, Humidity, TableParser, TableRow, Temperature};
pub use error::{FetchError, NetError, RowParseError, RowParseErrorKind, ScraperError};
pub use service::{run, run_with_fetcher, ReportRequest, ReportService, RunSummary};
pub use traits::PageFetcher;
pub use writer::{report_path, ReportWriter};
