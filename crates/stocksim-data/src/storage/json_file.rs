//! JSON 파일 스냅샷 저장소.
//!
//! 가격과 원장을 각각 하나의 JSON 파일로 저장합니다. 쓰기는 같은 디렉토리의
//! `.tmp` 파일에 먼저 쓴 뒤 이름을 바꾸므로, 읽는 쪽은 항상 완전한 파일만 봅니다.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stocksim_core::{HoldingTable, PriceTable, SimResult, SnapshotStore, StorageConfig};
use tracing::{debug, info};

use crate::error::{DataError, Result};
use crate::storage::format::{LedgerFile, PriceFile};

/// JSON 파일 저장소.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    prices_path: PathBuf,
    ledger_path: PathBuf,
}

impl JsonFileStore {
    /// 파일 경로를 지정해 생성합니다.
    pub fn new(prices_path: impl Into<PathBuf>, ledger_path: impl Into<PathBuf>) -> Self {
        Self {
            prices_path: prices_path.into(),
            ledger_path: ledger_path.into(),
        }
    }

    /// 저장소 설정에서 생성합니다.
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.prices_path(), config.ledger_path())
    }

    /// 가격 파일 경로.
    pub fn prices_path(&self) -> &Path {
        &self.prices_path
    }

    /// 원장 파일 경로.
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// 가격 파일을 읽습니다. 파일이 없으면 에러입니다.
    pub async fn read_prices(&self) -> Result<PriceTable> {
        let file: PriceFile = read_json(&self.prices_path)
            .await?
            .ok_or_else(|| DataError::NotFound(self.prices_path.display().to_string()))?;
        file.into_table()
    }

    /// 원장 파일을 읽습니다. 파일이 없으면 빈 원장입니다.
    pub async fn read_ledger(&self) -> Result<HoldingTable> {
        match read_json::<LedgerFile>(&self.ledger_path).await? {
            Some(file) => file.into_table(),
            None => {
                info!(path = %self.ledger_path.display(), "No ledger file, starting empty");
                Ok(HoldingTable::new())
            }
        }
    }

    /// 가격 파일을 씁니다.
    pub async fn write_prices(&self, prices: &PriceTable) -> Result<()> {
        write_json(&self.prices_path, &PriceFile::from_table(prices)).await
    }

    /// 원장 파일을 씁니다.
    pub async fn write_ledger(&self, holdings: &HoldingTable) -> Result<()> {
        write_json(&self.ledger_path, &LedgerFile::from_table(holdings)).await
    }
}

#[async_trait]
impl SnapshotStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn load_prices(&self) -> SimResult<PriceTable> {
        Ok(self.read_prices().await?)
    }

    async fn save_prices(&self, prices: &PriceTable) -> SimResult<()> {
        Ok(self.write_prices(prices).await?)
    }

    async fn load_ledger(&self) -> SimResult<HoldingTable> {
        Ok(self.read_ledger().await?)
    }

    async fn save_ledger(&self, holdings: &HoldingTable) -> SimResult<()> {
        Ok(self.write_ledger(holdings).await?)
    }
}

/// JSON 파일을 읽습니다. 파일이 없으면 `None` 입니다.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DataError::io(path, e)),
    };
    Ok(Some(serde_json::from_slice(&raw)?))
}

/// 임시 파일에 쓴 뒤 이름을 바꿉니다.
async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DataError::io(parent, e))?;
    }

    let tmp = path.with_extension("tmp");
    let body = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(&tmp, body)
        .await
        .map_err(|e| DataError::io(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| DataError::io(path, e))?;

    debug!(path = %path.display(), "Snapshot file written");
    Ok(())
}
