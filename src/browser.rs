//! chromiumoxide によるブラウザセッションとページ取得

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ReportConfig;
use crate::crd::TableRow;
use crate::error::{FetchError, ScraperError};
use crate::traits::PageFetcher;

/// ブラウザプロセス・イベントハンドラ・ページをまとめて所有するセッション
///
/// `close` で明示的に終了する。`close` を経由せずに破棄された場合も
/// ハンドラタスクは中断され、ブラウザプロセスは chromiumoxide 側で kill され、
/// ユーザーデータディレクトリは削除される。
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    // ブラウザより後に破棄される
    user_data_dir: UserDataDir,
}

/// 一時ユーザーデータディレクトリ（破棄時に削除）
#[derive(Debug)]
struct UserDataDir(PathBuf);

impl UserDataDir {
    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for UserDataDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0) {
            debug!("Failed to remove user data dir {:?}: {}", self.0, e);
        }
    }
}

impl BrowserSession {
    /// ブラウザを起動して空ページを開く
    pub async fn launch(config: &ReportConfig) -> Result<Self, ScraperError> {
        info!("Initializing browser...");

        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = UserDataDir(std::env::temp_dir().join(format!("ncm-crd-{}", unique_id)));

        let mut builder = BrowserConfig::builder()
            .user_data_dir(user_data_dir.path())
            .window_size(1280, 800)
            .no_sandbox()
            .request_timeout(config.request_timeout)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        // Chrome パスが指定されていれば使用（未指定なら chromiumoxide が検出）
        if let Ok(chrome_path) =
            std::env::var("CHROME_PATH").or_else(|_| std::env::var("CHROMIUM_PATH"))
        {
            builder = builder.chrome_executable(chrome_path);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(proxy) = &config.proxy {
            info!("Using proxy: {}", proxy);
            builder = builder.arg(format!("--proxy-server=http://{}", proxy));
        }

        if config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(format!("ブラウザ設定エラー: {}", e)))?;

        let (mut browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                // ページ作成に失敗してもブラウザは終了させる
                let _ = browser.close().await;
                handler.abort();
                return Err(ScraperError::BrowserInit(e.to_string()));
            }
        };

        info!("Browser initialized successfully");
        Ok(Self {
            browser,
            page,
            handler,
            user_data_dir,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 全画面スクリーンショットを base64 でデバッグログに出力
    pub async fn debug_screenshot(&self, label: &str) {
        match self
            .page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            Ok(screenshot) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
                debug!("{} screenshot: data:image/png;base64,{}", label, encoded);
            }
            Err(e) => debug!("Failed to take screenshot: {}", e),
        }
    }

    /// ブラウザを終了する（エラーはログのみ）
    pub async fn close(mut self) {
        info!("Closing browser...");

        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        } else if let Err(e) = self.browser.wait().await {
            debug!("Failed to wait for browser exit: {}", e);
        }
        self.handler.abort();

        info!("Browser closed");
        // ユーザーデータディレクトリは破棄時に削除される
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// ナビゲーション失敗を変換（Chromeのエラーテキストのみネットワークエラーとして分類）
fn navigation_error(e: CdpError) -> ScraperError {
    match e {
        CdpError::ChromeMessage(text) => ScraperError::from_navigation(text),
        other => ScraperError::Navigation(other.to_string()),
    }
}

fn browser_error(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// 最初に一致した要素、なければ `NotFound`
fn first_match(elements: Vec<Element>, what: &str) -> Result<Element, FetchError> {
    elements
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NotFound(what.to_string()))
}

#[async_trait]
impl PageFetcher for BrowserSession {
    async fn open(&self, url: &str) -> Result<(), ScraperError> {
        info!("Navigating to {}", url);

        self.page.goto(url).await.map_err(navigation_error)?;
        self.page.wait_for_navigation().await.map_err(navigation_error)?;

        debug!("Navigation complete");
        Ok(())
    }

    async fn find_rows(&self, table_selector: &str) -> Result<Vec<TableRow>, FetchError> {
        let table = first_match(
            self.page
                .find_elements(table_selector)
                .await
                .map_err(browser_error)?,
            table_selector,
        )?;

        let tbody = first_match(
            table.find_elements("tbody").await.map_err(browser_error)?,
            "tbody",
        )?;

        let mut rows = Vec::new();
        for tr in tbody.find_elements("tr").await.map_err(browser_error)? {
            let inner_html = tr.inner_html().await.map_err(browser_error)?;
            rows.push(TableRow::new(inner_html.unwrap_or_default()));
        }

        Ok(rows)
    }
}
