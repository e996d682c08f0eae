//! 금액 계산을 위한 Decimal 타입.
//!
//! 가격과 잔고는 부동소수점 대신 `Decimal` 로 다룹니다.
//! 거래 검증의 `잔고 > 비용` 경계가 정확히 판정되어야 하기 때문입니다.

use rust_decimal::Decimal;

/// 주당 가격.
pub type Price = Decimal;

/// 현금 잔고.
pub type Balance = Decimal;

/// 보유/거래 주식 수 (양수 = 매수, 음수 = 매도).
pub type ShareCount = i64;

/// 가격 변동분 계산에 사용하는 소수점 자릿수.
pub const PRICE_SCALE: u32 = 4;

/// 수량과 가격의 곱 (거래 금액).
///
/// `Decimal` 표현 범위를 넘으면 `None`.
pub fn notional(quantity: ShareCount, price: Price) -> Option<Decimal> {
    Decimal::from(quantity).checked_mul(price)
}
