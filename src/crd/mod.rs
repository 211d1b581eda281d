//! 日次気候レポート (Climate Reports Daily) モジュール
//!
//! テーブルの描画を待機して行を取得し、観測所ごとのレコードに変換する

mod fetch;
mod parser;
mod types;

pub use fetch::{fetch_table_rows, CRD_TABLE_SELECTOR, CRD_URL};
pub use parser::TableParser;
pub use types::{ClimateRecord, Humidity, TableRow, Temperature};
