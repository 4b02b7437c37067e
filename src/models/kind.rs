use crate::error::{Error, Result};
use std::fmt;

/// Cache/fetch granularity for a symbol's series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Full daily history
    Daily,
    /// Recent rows only, refreshed intraday for latest-price lookups
    Intraday,
}

impl DataKind {
    /// File name component used by the cache store
    pub fn to_filename(&self) -> &'static str {
        match self {
            DataKind::Daily => "daily",
            DataKind::Intraday => "intraday",
        }
    }

    /// Rows requested from a vendor when no lower bound is given
    pub fn fetch_depth(&self) -> usize {
        match self {
            DataKind::Daily => 800,
            DataKind::Intraday => 10,
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(DataKind::Daily),
            "intraday" => Ok(DataKind::Intraday),
            other => Err(Error::InvalidInput(format!(
                "Unknown data kind: {} (expected daily or intraday)",
                other
            ))),
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_filename())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(DataKind::parse("daily").unwrap(), DataKind::Daily);
        assert_eq!(DataKind::parse("Intraday").unwrap(), DataKind::Intraday);
        assert!(DataKind::parse("hourly").is_err());
    }
}
