//! 자산 키 정규화 및 거래 페어 타입.
//!
//! 같은 상품이 소스마다 다른 표기로 들어오기 때문에
//! ("BINANCE:BTC-USDT", "btcusdt", "BTC/USDT") 모든 자산 매칭은
//! 정규화된 키를 기준으로 수행합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 원시 티커 문자열을 정규화된 자산 키로 변환합니다.
///
/// 규칙:
/// 1. 거래소/벤더 접두사 제거 (마지막 `:` 앞부분)
/// 2. 대문자 변환
/// 3. 영숫자 외 문자 제거
///
/// # 예제
///
/// ```
/// use pulse_core::types::canonical_asset_key;
///
/// assert_eq!(canonical_asset_key("BINANCE:BTC-USDT"), "BTCUSDT");
/// assert_eq!(canonical_asset_key("btc/usdt"), "BTCUSDT");
/// assert_eq!(canonical_asset_key("^VIX"), "VIX");
/// ```
pub fn canonical_asset_key(raw: &str) -> String {
    let stripped = match raw.rfind(':') {
        Some(idx) => &raw[idx + 1..],
        None => raw,
    };

    stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// 거래 가능한 페어.
///
/// 기준 자산과 호가 자산으로 구성됩니다. 예: BTC/USDT, ETH/USD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    /// 기준 자산 (예: BTC, ETH)
    pub base: String,
    /// 호가 자산 (예: USDT, USD)
    pub quote: String,
}

impl TradingPair {
    /// 새 페어를 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// "BASE/QUOTE" 또는 "BASE-QUOTE" 형식 문자열에서 페어를 파싱합니다.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.splitn(2, ['/', '-']).collect();
        match parts.as_slice() {
            [base, quote] if !base.is_empty() && !quote.is_empty() => {
                Some(Self::new(*base, *quote))
            }
            _ => None,
        }
    }

    /// 기준 자산의 정규화된 키를 반환합니다.
    pub fn canonical_base(&self) -> String {
        canonical_asset_key(&self.base)
    }

    /// 거래소 주문용 결합 심볼 (예: "BTCUSDT").
    pub fn exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_asset_key_strips_venue_prefix() {
        assert_eq!(canonical_asset_key("BINANCE:BTCUSDT"), "BTCUSDT");
        assert_eq!(canonical_asset_key("NASDAQ:AAPL"), "AAPL");
    }

    #[test]
    fn test_canonical_asset_key_removes_non_alphanumerics() {
        assert_eq!(canonical_asset_key("BTC-USDT"), "BTCUSDT");
        assert_eq!(canonical_asset_key("btc/usdt"), "BTCUSDT");
        assert_eq!(canonical_asset_key("^TNX"), "TNX");
        assert_eq!(canonical_asset_key("BRK.B"), "BRKB");
    }

    #[test]
    fn test_trading_pair_parse() {
        let pair = TradingPair::parse("btc/usdt").unwrap();
        assert_eq!(pair.base, "BTC");
        assert_eq!(pair.quote, "USDT");
        assert_eq!(pair.to_string(), "BTC/USDT");
        assert_eq!(pair.exchange_symbol(), "BTCUSDT");

        assert!(TradingPair::parse("BTCUSDT").is_none());
        assert!(TradingPair::parse("/USDT").is_none());
    }
}
