use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("ブラウザ初期化エラー: {0}")]
    BrowserInit(String),

    #[error("ナビゲーションエラー: {0}")]
    Navigation(String),

    #[error("プロキシに接続できません: {0}")]
    ProxyConnection(String),

    #[error("{attempts}回試行してもレポートのテーブルが見つかりません")]
    ReportUnavailable { attempts: u32 },

    #[error("テーブル取得エラー: {0}")]
    Fetch(String),

    #[error(transparent)]
    RowParse(#[from] RowParseError),

    #[error("JSONエラー: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ファイル操作エラー: {0}")]
    FileIO(#[from] std::io::Error),
}

/// 1回の取得試行の失敗
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// 要素がまだ描画されていない（リトライ対象）
    #[error("要素が見つかりません: {0}")]
    NotFound(String),

    #[error("ブラウザエラー: {0}")]
    Browser(String),
}

/// 行の解析エラー（行番号はテーブル内の0始まりの位置）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("行{row_index}の解析エラー: {kind}")]
pub struct RowParseError {
    pub row_index: usize,
    pub kind: RowParseErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowParseErrorKind {
    #[error("セル数が不正です (期待値 {expected}, 実際 {found})")]
    CellCount { expected: usize, found: usize },

    #[error("セル{cell_index}が数値ではありません: {value:?}")]
    InvalidNumber { cell_index: usize, value: String },
}

/// Chromiumのネットワークエラー分類
///
/// ナビゲーション失敗時の `net::ERR_*` コードから一度だけ判定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetError {
    Proxy,
    NameNotResolved,
    ConnectionRefused,
    TimedOut,
    Other,
}

impl NetError {
    /// エラーテキスト中の `net::ERR_*` コードを分類する
    pub fn from_error_text(text: &str) -> Self {
        let code = text
            .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            .find_map(|token| token.strip_prefix("net::"))
            .unwrap_or_default();

        match code {
            "ERR_PROXY_CONNECTION_FAILED"
            | "ERR_TUNNEL_CONNECTION_FAILED"
            | "ERR_NO_SUPPORTED_PROXIES"
            | "ERR_PROXY_AUTH_UNSUPPORTED" => NetError::Proxy,
            "ERR_NAME_NOT_RESOLVED" => NetError::NameNotResolved,
            "ERR_CONNECTION_REFUSED" => NetError::ConnectionRefused,
            "ERR_TIMED_OUT" | "ERR_CONNECTION_TIMED_OUT" => NetError::TimedOut,
            _ => NetError::Other,
        }
    }
}

impl ScraperError {
    /// ナビゲーション失敗をネットワークエラー分類に従って変換
    pub fn from_navigation(text: impl Into<String>) -> Self {
        let text = text.into();
        match NetError::from_error_text(&text) {
            NetError::Proxy => ScraperError::ProxyConnection(text),
            _ => ScraperError::Navigation(text),
        }
    }
}
