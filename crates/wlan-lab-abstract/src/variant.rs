use serde::Serialize;

use crate::error::HarnessError;
use crate::rate::DataRate;

/// RTS/CTS threshold in bytes that precedes every data frame with a handshake.
pub const RTS_CTS_ENABLED_THRESHOLD: u32 = 100;
/// RTS/CTS threshold in bytes above every packet size the harness generates.
pub const RTS_CTS_DISABLED_THRESHOLD: u32 = 2200;

/// Offered load of stations that are neither saturating nor streaming.
pub const LOW_RATE: DataRate = DataRate::from_kbps(448);
/// Offered load that saturates the shared 802.11b channel.
pub const SATURATING_RATE: DataRate = DataRate::from_mbps(5);

/// Trial archetype. Fixes the RTS/CTS threshold and how offered rates are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Code 1: RTS/CTS on, every station at the low rate.
    LowRate,
    /// Code 2: RTS/CTS on, every station saturating.
    SaturatedRtsCts,
    /// Code 3: RTS/CTS off, every station saturating.
    Saturated,
    /// Code 4: RTS/CTS on, station 0 streams.
    StreamerRtsCts,
    /// Code 5: RTS/CTS off, station 0 streams.
    Streamer,
}

impl Variant {
    pub fn from_code(code: u8) -> Result<Self, HarnessError> {
        match code {
            1 => Ok(Variant::LowRate),
            2 => Ok(Variant::SaturatedRtsCts),
            3 => Ok(Variant::Saturated),
            4 => Ok(Variant::StreamerRtsCts),
            5 => Ok(Variant::Streamer),
            other => Err(HarnessError::InvalidVariant(other)),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Variant::LowRate => 1,
            Variant::SaturatedRtsCts => 2,
            Variant::Saturated => 3,
            Variant::StreamerRtsCts => 4,
            Variant::Streamer => 5,
        }
    }

    pub fn rts_cts_enabled(&self) -> bool {
        !matches!(self, Variant::Saturated | Variant::Streamer)
    }

    pub fn rts_cts_threshold(&self) -> u32 {
        if self.rts_cts_enabled() {
            RTS_CTS_ENABLED_THRESHOLD
        } else {
            RTS_CTS_DISABLED_THRESHOLD
        }
    }

    pub fn is_streamer(&self) -> bool {
        matches!(self, Variant::StreamerRtsCts | Variant::Streamer)
    }

    /// Offered rate of station `index`. Streamer variants give station 0 the streaming rate.
    pub fn rate_for_station(
        &self,
        index: usize,
        streaming_rate: Option<DataRate>,
    ) -> Result<DataRate, HarnessError> {
        match self {
            Variant::LowRate => Ok(LOW_RATE),
            Variant::SaturatedRtsCts | Variant::Saturated => Ok(SATURATING_RATE),
            Variant::StreamerRtsCts | Variant::Streamer if index == 0 => {
                streaming_rate.ok_or(HarnessError::MissingStreamingRate(self.code()))
            }
            Variant::StreamerRtsCts | Variant::Streamer => Ok(LOW_RATE),
        }
    }
}
