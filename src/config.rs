use std::path::PathBuf;
use std::time::Duration;

/// テーブル待機のリトライ設定（線形バックオフ）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最大試行回数
    pub max_attempts: u32,
    /// 試行ごとに増える待機時間
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            step: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// 試行 `attempt` (0始まり) の前に待機する時間
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step * attempt
    }
}

/// 不正な行の扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowErrorPolicy {
    /// 実行全体を失敗にする
    #[default]
    Abort,
    /// 警告を出して行をスキップ
    Skip,
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub is_crd: bool,
    /// AWS観測所（未実装、警告のみ）
    pub is_aws: bool,
    pub proxy: Option<String>,
    pub outer_fpath: PathBuf,
    pub fname_crd: String,
    pub headless: bool,
    pub debug: bool,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub row_errors: RowErrorPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            is_crd: false,
            is_aws: false,
            proxy: None,
            outer_fpath: PathBuf::from("."),
            fname_crd: "climate_reports_daily.json".to_string(),
            headless: true,
            debug: false,
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            row_errors: RowErrorPolicy::default(),
        }
    }
}

impl ReportConfig {
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

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_row_errors(mut self, policy: RowErrorPolicy) -> Self {
        self.row_errors = policy;
        self
    }

    /// 環境変数から設定を読み込む（未設定の項目はデフォルト値）
    ///
    /// `NCM_IS_CRD`, `NCM_IS_AWS`, `NCM_PROXY`, `NCM_OUTER_FPATH`,
    /// `NCM_FNAME_CRD`, `NCM_HEADLESS`, `NCM_DEBUG`, `NCM_SKIP_BAD_ROWS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(default)
        };

        let mut config = Self::default()
            .with_crd(flag("NCM_IS_CRD", true))
            .with_aws(flag("NCM_IS_AWS", false))
            .with_headless(flag("NCM_HEADLESS", true))
            .with_debug(flag("NCM_DEBUG", false));

        if flag("NCM_SKIP_BAD_ROWS", false) {
            config.row_errors = RowErrorPolicy::Skip;
        }
        if let Some(proxy) = lookup("NCM_PROXY").filter(|p| !p.is_empty()) {
            config.proxy = Some(proxy);
        }
        if let Some(path) = lookup("NCM_OUTER_FPATH") {
            config.outer_fpath = PathBuf::from(path);
        }
        if let Some(fname) = lookup("NCM_FNAME_CRD") {
            config.fname_crd = fname;
        }

        config
    }
}
