//! 日次気候レポート取得テスト
//!
//! 実行方法:
//! ```
//! NCM_OUTER_FPATH=./reports cargo run --example crd_test
//! ```
//!
//! 設定は環境変数から読み込む (`NCM_PROXY`, `NCM_HEADLESS`, `NCM_DEBUG` など)

use ncm_climate_scraper::{run, ReportConfig, ScraperError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // ログ設定
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ReportConfig::from_env();

    match run(&config).await {
        Ok(summary) => match summary.report_path {
            Some(path) => info!("Saved {} records to {:?}", summary.record_count, path),
            None => info!("Nothing to save"),
        },
        Err(ScraperError::ProxyConnection(e)) => {
            error!("Can't connect to proxy {:?}: {}", config.proxy, e);
        }
        Err(ScraperError::ReportUnavailable { attempts }) => {
            error!("Report table did not appear after {} attempts", attempts);
        }
        Err(ScraperError::RowParse(e)) => {
            error!("Malformed report table: {}", e);
        }
        Err(e) => {
            error!("Unexpected error: {}", e);
        }
    }
}
