use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HarnessError;

/// A link or application data rate, stored in bits per second.
///
/// Parses the unit suffixes understood by ns-3 (`448kb/s`, `11Mbps`, `1kbps`, `2MBps`, ...).
/// Lowercase `b` counts bits, uppercase `B` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataRate {
    bps: u64,
}

impl DataRate {
    pub const fn from_bps(bps: u64) -> Self {
        Self { bps }
    }

    /// Saturates at `u64::MAX` bps. Use [`DataRate::try_from_kbps`] for untrusted input.
    pub const fn from_kbps(kbps: u64) -> Self {
        Self {
            bps: kbps.saturating_mul(1_000),
        }
    }

    /// Saturates at `u64::MAX` bps.
    pub const fn from_mbps(mbps: u64) -> Self {
        Self {
            bps: mbps.saturating_mul(1_000_000),
        }
    }

    pub fn try_from_kbps(kbps: u64) -> Result<Self, HarnessError> {
        kbps.checked_mul(1_000)
            .map(Self::from_bps)
            .ok_or_else(|| HarnessError::InvalidRate(format!("{kbps}kbps")))
    }

    pub fn bps(&self) -> u64 {
        self.bps
    }

    pub fn kbps(&self) -> f64 {
        self.bps as f64 / 1_000.0
    }

    pub fn mbps(&self) -> f64 {
        self.bps as f64 / 1_000_000.0
    }
}

fn unit_multiplier(unit: &str) -> Option<f64> {
    let multiplier = match unit {
        "bps" | "b/s" => 1.0,
        "Bps" | "B/s" => 8.0,
        "kbps" | "kb/s" | "Kbps" | "Kb/s" => 1e3,
        "kBps" | "kB/s" | "KBps" | "KB/s" => 8e3,
        "Mbps" | "Mb/s" => 1e6,
        "MBps" | "MB/s" => 8e6,
        "Gbps" | "Gb/s" => 1e9,
        "GBps" | "GB/s" => 8e9,
        _ => return None,
    };
    Some(multiplier)
}

impl FromStr for DataRate {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || HarnessError::InvalidRate(s.to_string());
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        let (number, unit) = trimmed.split_at(split);
        let value: f64 = number.parse().map_err(|_| invalid())?;
        let bps = value * unit_multiplier(unit.trim()).ok_or_else(invalid)?;
        if !bps.is_finite() || bps > u64::MAX as f64 {
            return Err(invalid());
        }
        Ok(Self::from_bps(bps.round() as u64))
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bps {
            0 => write!(f, "0bps"),
            bps if bps % 1_000_000_000 == 0 => write!(f, "{}Gbps", bps / 1_000_000_000),
            bps if bps % 1_000_000 == 0 => write!(f, "{}Mbps", bps / 1_000_000),
            bps if bps % 1_000 == 0 => write!(f, "{}kbps", bps / 1_000),
            bps => write!(f, "{bps}bps"),
        }
    }
}

impl TryFrom<String> for DataRate {
    type Error = HarnessError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataRate> for String {
    fn from(rate: DataRate) -> Self {
        rate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::DataRate;
    use crate::error::HarnessError;

    #[test]
    fn parses_ns3_rate_strings() {
        let cases = [
            ("448kb/s", 448_000),
            ("5Mb/s", 5_000_000),
            ("11Mbps", 11_000_000),
            ("1kbps", 1_000),
            ("1901kbps", 1_901_000),
            ("2MBps", 16_000_000),
            ("1.5Mbps", 1_500_000),
            ("64bps", 64),
        ];
        for (text, bps) in cases {
            let rate: DataRate = text.parse().unwrap();
            assert_eq!(rate.bps(), bps, "parsing {text}");
        }
    }

    #[test]
    fn rejects_missing_or_unknown_units() {
        for text in ["", "5000", "5 parsecs", "Mbps", "1..2Mbps"] {
            let err = text.parse::<DataRate>().unwrap_err();
            assert!(matches!(err, HarnessError::InvalidRate(_)), "{text}: {err}");
        }
    }

    #[test]
    fn displays_with_largest_exact_unit() {
        assert_eq!(DataRate::from_bps(448_000).to_string(), "448kbps");
        assert_eq!(DataRate::from_mbps(11).to_string(), "11Mbps");
        assert_eq!(DataRate::from_bps(1_500).to_string(), "1500bps");
    }

    #[test]
    fn kbps_overflow_is_an_invalid_rate() {
        assert_eq!(
            DataRate::try_from_kbps(1_901).unwrap(),
            DataRate::from_bps(1_901_000)
        );
        assert!(matches!(
            DataRate::try_from_kbps(u64::MAX / 10),
            Err(HarnessError::InvalidRate(_))
        ));
        assert_eq!(DataRate::from_kbps(u64::MAX).bps(), u64::MAX);
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&DataRate::from_kbps(101)).unwrap();
        assert_eq!(json, "\"101kbps\"");
        let back: DataRate = serde_json::from_str("\"5Mb/s\"").unwrap();
        assert_eq!(back, DataRate::from_mbps(5));
    }
}
