use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{Local, NaiveDate};
use tower::Service;
use tracing::{info, warn};

use crate::browser::BrowserSession;
use crate::config::{ReportConfig, RowErrorPolicy};
use crate::crd::{fetch_table_rows, TableParser, CRD_TABLE_SELECTOR, CRD_URL};
use crate::error::ScraperError;
use crate::traits::PageFetcher;
use crate::writer::ReportWriter;

const AWS_URL: &str = "https://www.ncm.ae/maps-aws-stations/dry-temperature?lang=en";

/// 実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 保存したレポートのパス（日次レポートを実行した場合）
    pub report_path: Option<PathBuf>,
    pub record_count: usize,
}

/// ブラウザを起動して有効な処理を実行する
///
/// ブラウザは日次レポートを取得する場合のみ起動し、成功・失敗にかかわらず必ず終了させる。
pub async fn run(config: &ReportConfig) -> Result<RunSummary, ScraperError> {
    info!(
        "Started with parameters: is_crd={}, is_aws={}, proxy={:?}, outer_fpath={:?}, fname_crd={}",
        config.is_crd, config.is_aws, config.proxy, config.outer_fpath, config.fname_crd
    );

    let mut summary = RunSummary::default();

    if config.is_crd {
        let session = BrowserSession::launch(config).await?;
        let result = scrape_crd(config, &session, Local::now().date_naive()).await;

        if config.debug {
            if let Err(ScraperError::ReportUnavailable { .. }) = &result {
                session.debug_screenshot("Report unavailable").await;
            }
        }

        session.close().await;
        summary = result?;
    }

    if config.is_aws {
        warn_aws_unimplemented();
    }

    Ok(summary)
}

/// 任意の `PageFetcher` で処理を実行する（`date` は出力ファイル名に使用）
pub async fn run_with_fetcher<F>(
    config: &ReportConfig,
    fetcher: &F,
    date: NaiveDate,
) -> Result<RunSummary, ScraperError>
where
    F: PageFetcher + ?Sized,
{
    let mut summary = RunSummary::default();

    if config.is_crd {
        summary = scrape_crd(config, fetcher, date).await?;
    }

    if config.is_aws {
        warn_aws_unimplemented();
    }

    Ok(summary)
}

/// 日次レポート: ページを開き、テーブルを待って解析し、JSONに保存する
pub async fn scrape_crd<F>(
    config: &ReportConfig,
    fetcher: &F,
    date: NaiveDate,
) -> Result<RunSummary, ScraperError>
where
    F: PageFetcher + ?Sized,
{
    info!("Working at {}", CRD_URL);
    fetcher.open(CRD_URL).await?;

    let rows = fetch_table_rows(fetcher, CRD_TABLE_SELECTOR, &config.retry).await?;

    let parser = TableParser::new();
    let records = match config.row_errors {
        RowErrorPolicy::Abort => parser.parse(&rows)?,
        RowErrorPolicy::Skip => parser.parse_lenient(&rows),
    };
    info!("Got {} records", records.len());

    let writer = ReportWriter::new(&config.outer_fpath, &config.fname_crd);
    let path = writer.write(&records, date)?;

    Ok(RunSummary {
        report_path: Some(path),
        record_count: records.len(),
    })
}

/// AWS観測所マップは未実装（警告のみ）
fn warn_aws_unimplemented() {
    warn!("{} parsing is not implemented yet", AWS_URL);
}

/// スクレイピングリクエスト
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub is_crd: bool,
    pub is_aws: bool,
    pub proxy: Option<String>,
    pub outer_fpath: PathBuf,
    pub fname_crd: String,
    pub headless: bool,
    pub debug: bool,
}

/// デフォルト値は `ReportConfig::default()` と同じ
impl Default for ReportRequest {
    fn default() -> Self {
        let config = ReportConfig::default();
        Self {
            is_crd: config.is_crd,
            is_aws: config.is_aws,
            proxy: config.proxy,
            outer_fpath: config.outer_fpath,
            fname_crd: config.fname_crd,
            headless: config.headless,
            debug: config.debug,
        }
    }
}

impl ReportRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crd(mut self, is_crd: bool) -> Self {
        self.is_crd = is_crd;
        self
    }

    pub fn with_aws(mut self, is_aws: bool) -> Self {
        self.is_aws = is_aws;
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn with_outer_fpath(mut self, path: impl Into<PathBuf>) -> Self {
        self.outer_fpath = path.into();
        self
    }

    pub fn with_fname_crd(mut self, fname: impl Into<String>) -> Self {
        self.fname_crd = fname.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl From<ReportRequest> for ReportConfig {
    fn from(req: ReportRequest) -> Self {
        ReportConfig {
            is_crd: req.is_crd,
            is_aws: req.is_aws,
            proxy: req.proxy,
            outer_fpath: req.outer_fpath,
            fname_crd: req.fname_crd,
            headless: req.headless,
            debug: req.debug,
            ..Default::default()
        }
    }
}

/// tower::Serviceを実装したレポートサービス
#[derive(Debug, Clone, Default)]
pub struct ReportService {}

impl ReportService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<ReportRequest> for ReportService {
    type Response = RunSummary;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ReportRequest) -> Self::Future {
        info!("Report request received: outer_fpath={:?}", req.outer_fpath);

        Box::pin(async move {
            let config: ReportConfig = req.into();
            let summary = run(&config).await?;

            if let Some(path) = &summary.report_path {
                info!("Report complete: path={:?}, records={}", path, summary.record_count);
            }

            Ok(summary)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::TableRow;
    use crate::error::FetchError;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// 固定の行を返すスタブ
    struct StaticFetcher {
        rows: Option<Vec<TableRow>>,
        opened: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        fn new(rows: Vec<TableRow>) -> Self {
            Self {
                rows: Some(rows),
                opened: Mutex::new(Vec::new()),
            }
        }

        fn never_renders() -> Self {
            Self {
                rows: None,
                opened: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn open(&self, url: &str) -> Result<(), ScraperError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }

        async fn find_rows(&self, _table_selector: &str) -> Result<Vec<TableRow>, FetchError> {
            self.rows
                .clone()
                .ok_or_else(|| FetchError::NotFound("table".to_string()))
        }
    }

    fn unique_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "ncm-service-{}-{}-{}",
            name,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    fn sample_rows() -> Vec<TableRow> {
        vec![
            TableRow::new(r#"<td colspan="10">Coastal</td>"#),
            TableRow::new(
                "<td>1</td><td>Abu Dhabi</td><td>0</td><td>10</td><td>80</td>\
                 <td>45</td><td>20.1</td><td>35.6</td><td>27.8</td><td>12.3</td>",
            ),
            TableRow::new(r#"<td colspan="10">Internal</td>"#),
            TableRow::new(
                "<td>2</td><td>Al Ain</td><td>0</td><td>12</td><td>75</td>\
                 <td>40</td><td>19.0</td><td>38.2</td><td>28.46</td><td>9.1</td>",
            ),
        ]
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_report() {
        let dir = unique_dir("e2e");
        let config = ReportConfig::new().with_crd(true).with_outer_fpath(&dir);
        let fetcher = StaticFetcher::new(sample_rows());

        let summary = run_with_fetcher(&config, &fetcher, date()).await.unwrap();

        assert_eq!(fetcher.opened.lock().unwrap().as_slice(), [CRD_URL.to_string()]);
        assert_eq!(summary.record_count, 2);

        let path = summary.report_path.unwrap();
        assert_eq!(path, dir.join("20240305_climate_reports_daily.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 2);

        assert_eq!(array[0]["N"], 1);
        assert_eq!(array[0]["type"], "Coastal");
        assert_eq!(array[0]["station"], "Abu Dhabi");
        assert_eq!(array[0]["precipitation"], 0);
        assert_eq!(array[0]["humidity"]["min_p"], 10);
        assert_eq!(array[0]["humidity"]["max_p"], 80);
        assert_eq!(array[0]["humidity"]["avg_p"], 45);
        assert_eq!(array[0]["temperature"]["min_c"], 20.1);
        assert_eq!(array[0]["temperature"]["max_c"], 35.6);
        assert_eq!(array[0]["temperature"]["avg_c"], 27.8);
        assert_eq!(array[0]["wind_speed"], 12.3);

        assert_eq!(array[1]["N"], 2);
        assert_eq!(array[1]["type"], "Internal");
        assert_eq!(array[1]["station"], "Al Ain");
        assert_eq!(array[1]["temperature"]["avg_c"], 28.5);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_report_writes_nothing() {
        let dir = unique_dir("unavailable");
        let config = ReportConfig::new().with_crd(true).with_outer_fpath(&dir);
        let fetcher = StaticFetcher::never_renders();

        let err = run_with_fetcher(&config, &fetcher, date()).await.unwrap_err();

        assert!(matches!(err, ScraperError::ReportUnavailable { attempts: 10 }));
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_malformed_row_aborts_by_default() {
        let dir = unique_dir("abort");
        let mut rows = sample_rows();
        rows.push(TableRow::new("<td>3</td><td>Dubai</td><td>0</td>"));

        let config = ReportConfig::new().with_crd(true).with_outer_fpath(&dir);
        let err = run_with_fetcher(&config, &StaticFetcher::new(rows), date())
            .await
            .unwrap_err();

        match err {
            ScraperError::RowParse(e) => assert_eq!(e.row_index, 4),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_malformed_row_skipped_when_configured() {
        let dir = unique_dir("skip");
        let mut rows = sample_rows();
        rows.insert(1, TableRow::new("<td>x</td><td>y</td><td>z</td>"));

        let config = ReportConfig::new()
            .with_crd(true)
            .with_outer_fpath(&dir)
            .with_row_errors(RowErrorPolicy::Skip);
        let summary = run_with_fetcher(&config, &StaticFetcher::new(rows), date())
            .await
            .unwrap();

        assert_eq!(summary.record_count, 2);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_aws_only_does_not_fetch() {
        let config = ReportConfig::new().with_aws(true);
        let fetcher = StaticFetcher::new(sample_rows());

        let summary = run_with_fetcher(&config, &fetcher, date()).await.unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(fetcher.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_without_crd_skips_browser() {
        let config = ReportConfig::new().with_aws(true);
        let summary = run(&config).await.unwrap();
        assert!(summary.report_path.is_none());
    }

    #[test]
    fn test_report_request_builder() {
        let req = ReportRequest::new()
            .with_crd(true)
            .with_proxy("127.0.0.1:8080")
            .with_outer_fpath("/tmp/reports")
            .with_fname_crd("crd.json")
            .with_headless(false)
            .with_debug(true);

        assert!(req.is_crd);
        assert_eq!(req.proxy.as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(req.outer_fpath, PathBuf::from("/tmp/reports"));
        assert_eq!(req.fname_crd, "crd.json");
        assert!(!req.headless);
        assert!(req.debug);
    }

    #[test]
    fn test_report_request_defaults_match_config() {
        let req = ReportRequest::default();
        let config = ReportConfig::default();

        assert_eq!(req.is_crd, config.is_crd);
        assert_eq!(req.is_aws, config.is_aws);
        assert_eq!(req.proxy, config.proxy);
        assert_eq!(req.outer_fpath, config.outer_fpath);
        assert_eq!(req.fname_crd, config.fname_crd);
        assert_eq!(req.headless, config.headless);
        assert_eq!(req.debug, config.debug);
    }

    #[test]
    fn test_report_request_to_config() {
        let req = ReportRequest::new()
            .with_crd(true)
            .with_aws(true)
            .with_fname_crd("crd.json")
            .with_debug(true);
        let config: ReportConfig = req.into();

        assert!(config.is_crd);
        assert!(config.is_aws);
        assert_eq!(config.fname_crd, "crd.json");
        assert!(config.debug);
        assert_eq!(config.retry.max_attempts, 10);
    }
}
