//! Market data port trait.

use crate::domain::decision::Quote;
use crate::domain::error::NewstraderError;
use crate::domain::ohlcv::OhlcvBar;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(Timeframe::M1),
            "M5" => Ok(Timeframe::M5),
            "M15" => Ok(Timeframe::M15),
            "M30" => Ok(Timeframe::M30),
            "H1" => Ok(Timeframe::H1),
            "H4" => Ok(Timeframe::H4),
            "D1" => Ok(Timeframe::D1),
            other => Err(format!("unknown timeframe '{other}'")),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        };
        write!(f, "{s}")
    }
}

pub trait MarketDataPort {
    /// The most recent `count` bars, oldest first. May return fewer.
    fn fetch_bars(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<OhlcvBar>, NewstraderError>;

    fn quote(&self, symbol: &str) -> Result<Quote, NewstraderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_parse_and_display() {
        for tf in ["M1", "M5", "M15", "M30", "H1", "H4", "D1"] {
            let parsed: Timeframe = tf.parse().unwrap();
            assert_eq!(parsed.to_string(), tf);
        }
        assert_eq!("h4".parse::<Timeframe>().unwrap(), Timeframe::H4);
        assert!("W1".parse::<Timeframe>().is_err());
    }
}
