//! テーブル描画待機（線形バックオフ付きリトライ）

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::RetryPolicy;
use crate::error::{FetchError, ScraperError};
use crate::traits::PageFetcher;

use super::types::TableRow;

pub const CRD_URL: &str = "https://www.ncm.ae/services/climate-reports-daily?lang=en";

pub const CRD_TABLE_SELECTOR: &str =
    "#pageContainer > div > div > div.table-wrapper.bg-light.shadow-sm.p-4 > div > table";

/// テーブルが描画されるまで `find_rows` を繰り返す
///
/// - 試行 i (>0) の前に `policy.delay_for(i)` だけ待機
/// - `NotFound` はリトライ、それ以外の取得エラーは即座に `Fetch` として返す
/// - 上限に達したら `ReportUnavailable`
pub async fn fetch_table_rows<F>(
    fetcher: &F,
    table_selector: &str,
    policy: &RetryPolicy,
) -> Result<Vec<TableRow>, ScraperError>
where
    F: PageFetcher + ?Sized,
{
    for attempt in 0..policy.max_attempts {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            warn!(
                "Table not rendered yet, waiting {:?} (retry {}/{})",
                delay,
                attempt,
                policy.max_attempts - 1
            );
            sleep(delay).await;
        }

        match fetcher.find_rows(table_selector).await {
            Ok(rows) => {
                info!("Table found with {} rows (attempt {})", rows.len(), attempt + 1);
                return Ok(rows);
            }
            Err(FetchError::NotFound(what)) => {
                debug!("Attempt {} failed: {} not found", attempt + 1, what);
            }
            Err(FetchError::Browser(cause)) => {
                error!("Unexpected error while fetching table: {}", cause);
                return Err(ScraperError::Fetch(cause));
            }
        }
    }

    Err(ScraperError::ReportUnavailable {
        attempts: policy.max_attempts,
    })
}
