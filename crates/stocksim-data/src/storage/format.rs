//! 스냅샷 파일 형식.
//!
//! ```json
//! {"stocks": [{"symbol": "AAPL", "price": "100.00"}]}
//! {"stocks": [{"symbol": "AAPL", "held": 5}]}
//! ```
//!
//! 가격은 문자열과 숫자 모두 읽을 수 있으며 항상 문자열로 씁니다.
//! REST 응답도 같은 형식을 사용합니다.

use serde::{Deserialize, Serialize};
use stocksim_core::{HoldingTable, Price, PriceTable, ShareCount, Symbol};
use tracing::warn;

use crate::error::{DataError, Result};

/// 가격 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub symbol: Symbol,
    pub price: Price,
}

/// `stocks.json` 파일.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFile {
    pub stocks: Vec<PriceEntry>,
}

impl PriceFile {
    /// 가격 테이블에서 생성합니다 (심볼 오름차순).
    pub fn from_table(prices: &PriceTable) -> Self {
        Self {
            stocks: prices
                .iter()
                .map(|(symbol, price)| PriceEntry {
                    symbol: symbol.clone(),
                    price: *price,
                })
                .collect(),
        }
    }

    /// 검증 후 가격 테이블로 변환합니다.
    ///
    /// 빈 심볼이나 음수 가격은 [`DataError::InvalidData`] 입니다.
    /// 같은 심볼이 여러 번 나오면 마지막 값이 남습니다.
    pub fn into_table(self) -> Result<PriceTable> {
        let mut prices = PriceTable::new();
        for entry in self.stocks {
            if entry.symbol.as_str().is_empty() {
                return Err(DataError::InvalidData("empty symbol in price file".to_string()));
            }
            if entry.price.is_sign_negative() {
                return Err(DataError::InvalidData(format!(
                    "negative price for {}: {}",
                    entry.symbol, entry.price
                )));
            }
            if let Some(previous) = prices.insert(entry.symbol.clone(), entry.price) {
                warn!(symbol = %entry.symbol, %previous, "Duplicate symbol in price file");
            }
        }
        Ok(prices)
    }
}

/// 원장 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub symbol: Symbol,
    pub held: ShareCount,
}

/// `globalStocks.json` 파일.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    pub stocks: Vec<LedgerEntry>,
}

impl LedgerFile {
    /// 원장 테이블에서 생성합니다 (심볼 오름차순).
    pub fn from_table(holdings: &HoldingTable) -> Self {
        Self {
            stocks: holdings
                .iter()
                .map(|(symbol, held)| LedgerEntry {
                    symbol: symbol.clone(),
                    held: *held,
                })
                .collect(),
        }
    }

    /// 검증 후 원장 테이블로 변환합니다.
    pub fn into_table(self) -> Result<HoldingTable> {
        let mut holdings = HoldingTable::new();
        for entry in self.stocks {
            if entry.symbol.as_str().is_empty() {
                return Err(DataError::InvalidData("empty symbol in ledger file".to_string()));
            }
            if let Some(previous) = holdings.insert(entry.symbol.clone(), entry.held) {
                warn!(symbol = %entry.symbol, previous, "Duplicate symbol in ledger file");
            }
        }
        Ok(holdings)
    }
}
