//! テーブル行 → ClimateRecord 変換

use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{RowParseError, RowParseErrorKind};

use super::types::{ClimateRecord, Humidity, TableRow, Temperature};

/// 見出し行のセルタグ数（`<td>` と `</td>`）
const HEADER_TAG_COUNT: usize = 2;
/// 見出し行のセル数（ラベルと空セル）
const HEADER_CELL_COUNT: usize = 2;
/// データ行のセル数
const DATA_CELL_COUNT: usize = 10;

/// 見出し行で区切られたテーブルをレコードに変換するパーサー
///
/// 状態は1回の解析の中だけで保持するため、同じ入力には常に同じ結果を返す。
#[derive(Debug, Clone, Copy, Default)]
pub struct TableParser;

impl TableParser {
    pub fn new() -> Self {
        Self
    }

    /// 全行を変換。不正な行があればその時点で失敗する
    pub fn parse<'a, I>(&self, rows: I) -> Result<Vec<ClimateRecord>, RowParseError>
    where
        I: IntoIterator<Item = &'a TableRow>,
    {
        let mut records = Vec::new();
        let mut current_type = String::new();

        for (row_index, row) in rows.into_iter().enumerate() {
            if let Some(record) = Self::parse_row(row_index, row, &mut current_type)? {
                records.push(record);
            }
        }

        debug!("Parsed {} records", records.len());
        Ok(records)
    }

    /// 全行を変換。不正な行は警告を出してスキップする
    pub fn parse_lenient<'a, I>(&self, rows: I) -> Vec<ClimateRecord>
    where
        I: IntoIterator<Item = &'a TableRow>,
    {
        let mut records = Vec::new();
        let mut current_type = String::new();

        for (row_index, row) in rows.into_iter().enumerate() {
            match Self::parse_row(row_index, row, &mut current_type) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Skipping malformed row: {}", e),
            }
        }

        debug!("Parsed {} records (lenient)", records.len());
        records
    }

    /// 見出し行なら `current_type` を更新して `None`、データ行ならレコードを返す
    fn parse_row(
        row_index: usize,
        row: &TableRow,
        current_type: &mut String,
    ) -> Result<Option<ClimateRecord>, RowParseError> {
        let cells = row.cells();

        if row.cell_tag_count() == HEADER_TAG_COUNT || cells.len() == HEADER_CELL_COUNT {
            *current_type = cells.into_iter().next().unwrap_or_default();
            debug!("Station type: {:?}", current_type);
            return Ok(None);
        }

        if cells.len() != DATA_CELL_COUNT {
            return Err(RowParseError {
                row_index,
                kind: RowParseErrorKind::CellCount {
                    expected: DATA_CELL_COUNT,
                    found: cells.len(),
                },
            });
        }

        let int = |i: usize| parse_cell::<i64>(row_index, i, &cells[i]);
        let float = |i: usize| parse_cell::<f64>(row_index, i, &cells[i]).map(round1);

        Ok(Some(ClimateRecord {
            n: int(0)?,
            station_type: current_type.clone(),
            station: cells[1].clone(),
            precipitation: int(2)?,
            humidity: Humidity {
                min_p: int(3)?,
                max_p: int(4)?,
                avg_p: int(5)?,
            },
            temperature: Temperature {
                min_c: float(6)?,
                max_c: float(7)?,
                avg_c: float(8)?,
            },
            wind_speed: float(9)?,
        }))
    }
}

fn parse_cell<T: FromStr>(row_index: usize, cell_index: usize, value: &str) -> Result<T, RowParseError> {
    value.trim().parse::<T>().map_err(|_| RowParseError {
        row_index,
        kind: RowParseErrorKind::InvalidNumber {
            cell_index,
            value: value.to_string(),
        },
    })
}

/// 小数1桁に丸める
///
/// 2進表現の値を10進で正しく丸めるため、`23.45` (実際は 23.4499…) は 23.4 になる。
fn round1(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}
