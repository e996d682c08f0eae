//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → 설정 파일(선택) → `STOCKSIM__` 환경 변수 순으로 덮어씁니다.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::{Balance, Price};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 시뮬레이션 설정
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// 스냅샷 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// `host:port` 형식의 바인딩 주소.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 시뮬레이션 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// 세션 시작 시 현금 잔고
    pub starting_balance: Balance,
    /// 틱당 최대 가격 변동폭 (가격 += volatility * U[-1, 1])
    pub tick_volatility: Decimal,
    /// 틱 이후 가격 하한
    pub price_floor: Price,
    /// 세션이 열릴 때마다 저장소에서 가격을 다시 읽을지 여부
    pub reload_prices_on_open: bool,
    /// 거절된 거래를 클라이언트에게 알릴지 여부
    pub notify_rejected_trades: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::new(10000, 0),
            tick_volatility: Decimal::new(5, 0),
            price_floor: Decimal::ZERO,
            reload_prices_on_open: false,
            notify_rejected_trades: false,
        }
    }
}

/// 스냅샷 저장소 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 스냅샷 파일 디렉토리
    pub data_dir: String,
    /// 가격 스냅샷 파일명
    pub prices_file: String,
    /// 원장 스냅샷 파일명
    pub ledger_file: String,
    /// 저장 실패 시 재시도 횟수
    pub save_retries: u32,
    /// 재시도 간격 (밀리초)
    pub retry_backoff_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            prices_file: "stocks.json".to_string(),
            ledger_file: "globalStocks.json".to_string(),
            save_retries: 2,
            retry_backoff_ms: 50,
        }
    }
}

impl StorageConfig {
    /// 가격 스냅샷 경로.
    pub fn prices_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.prices_file)
    }

    /// 원장 스냅샷 경로.
    pub fn ledger_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(&self.ledger_file)
    }

    /// 재시도 간격.
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("STOCKSIM")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    ///
    /// `STOCKSIM_CONFIG` 가 있으면 그 경로를 사용합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path = std::env::var("STOCKSIM_CONFIG")
            .unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load(path)
    }
}
