//! 스냅샷 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - 가격표/원장 스냅샷 파일 형식 (`stocks.json`, `globalStocks.json`)
//! - JSON 파일 기반 [`SnapshotStore`](stocksim_core::SnapshotStore) 구현

pub mod error;
pub mod storage;

pub use error::{DataError, Result};

// 저장소 타입 재내보내기
pub use storage::format::{LedgerEntry, LedgerFile, PriceEntry, PriceFile};
pub use storage::json_file::JsonFileStore;
