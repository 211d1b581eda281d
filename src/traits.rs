use async_trait::async_trait;

use crate::crd::TableRow;
use crate::error::{FetchError, ScraperError};

/// 描画済みDOMからテーブル行を取得するページ取得サービス
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// URLへナビゲート（1回のみ）
    async fn open(&self, url: &str) -> Result<(), ScraperError>;

    /// セレクタに一致するテーブルの `tbody` 配下の行を取得
    ///
    /// テーブルがまだ描画されていない場合は `FetchError::NotFound`
    async fn find_rows(&self, table_selector: &str) -> Result<Vec<TableRow>, FetchError>;
}
