//! 日次気候レポート関連の型定義

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// 湿度 (%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Humidity {
    pub min_p: i64,
    pub max_p: i64,
    pub avg_p: i64,
}

/// 気温 (℃、小数1桁に丸め)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub min_c: f64,
    pub max_c: f64,
    pub avg_c: f64,
}

/// レポートの1行（観測所1件分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateRecord {
    #[serde(rename = "N")]
    pub n: i64,
    /// 直前の見出し行の観測所種別（見出しがなければ空文字）
    #[serde(rename = "type")]
    pub station_type: String,
    pub station: String,
    pub precipitation: i64,
    pub humidity: Humidity,
    pub temperature: Temperature,
    pub wind_speed: f64,
}

/// 描画済みの `<tr>` 要素（innerHTML を保持）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    inner_html: String,
}

impl TableRow {
    pub fn new(inner_html: impl Into<String>) -> Self {
        Self {
            inner_html: inner_html.into(),
        }
    }

    pub fn inner_html(&self) -> &str {
        &self.inner_html
    }

    /// `<td` 開始タグと `</td` 終了タグの合計数
    ///
    /// 見出し行は `<td>…</td>` が1つなので 2 になる。
    pub fn cell_tag_count(&self) -> usize {
        let lower = self.inner_html.to_ascii_lowercase();
        count_tags(&lower, "<td") + count_tags(&lower, "</td")
    }

    /// 各 `td` の innerHTML（前後の空白を除去、文書順）
    pub fn cells(&self) -> Vec<String> {
        let Ok(td) = Selector::parse("td") else {
            return Vec::new();
        };

        let fragment = Html::parse_fragment(&format!(
            "<table><tbody><tr>{}</tr></tbody></table>",
            self.inner_html
        ));

        fragment
            .select(&td)
            .map(|cell| cell.inner_html().trim().to_string())
            .collect()
    }
}

/// タグ名の直後が区切り文字の場合のみ数える（`<tdx>` などを除外）
fn count_tags(html: &str, tag: &str) -> usize {
    html.match_indices(tag)
        .filter(|(pos, _)| {
            html[pos + tag.len()..]
                .chars()
                .next()
                .map(|c| c == '>' || c == '/' || c.is_ascii_whitespace())
                .unwrap_or(false)
        })
        .count()
}
