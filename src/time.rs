use std::time::{SystemTime, UNIX_EPOCH};

/// Source of local time for the cluster handshake.
pub trait Clock: Send {
    /// Seconds since the Unix epoch.
    fn now_secs(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
            Err(e) => -i64::try_from(e.duration().as_secs()).unwrap_or(i64::MAX),
        }
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.0
    }
}

/// Render a timestamp as the 8 lowercase hex characters of its low 32 bits.
pub(crate) fn time_to_hex(now: i64) -> String {
    hex::encode((now as u32).to_be_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_to_hex_is_always_eight_characters() {
        assert_eq!(time_to_hex(0), "00000000");
        assert_eq!(time_to_hex(0x5F5E_1000), "5f5e1000");
        assert_eq!(time_to_hex(1_700_000_000), "6553f100");
    }

    #[test]
    fn time_to_hex_keeps_low_32_bits() {
        assert_eq!(time_to_hex(0x1_0000_00FF), "000000ff");
        assert_eq!(time_to_hex(-1), "ffffffff");
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_secs() > 1_577_836_800);
    }
}
