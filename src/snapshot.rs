use crate::error::AppResult;
use ethers::types::Address;

/// The collection mints out at a fixed supply.
pub const MAX_SUPPLY: u64 = 20;

/// Point-in-time read of on-chain contract state.
///
/// Snapshots are immutable values: each poll produces a fresh one and the
/// previous one is replaced wholesale, never mutated. The four fields come
/// from four independent read calls, so they may land at slightly different
/// block heights; consumers tolerate that window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContractSnapshot {
    pub presale_started: bool,
    /// Unix timestamp at which the presale window closes.
    pub presale_end_time: u64,
    pub owner: Address,
    pub tokens_minted: u64,
}

impl ContractSnapshot {
    /// Computed locally from the fixed end timestamp, not re-queried.
    /// Strict comparison: a presale ending exactly now is still active,
    /// matching the contract's own check.
    pub fn has_presale_ended(&self, now: u64) -> bool {
        self.presale_end_time < now
    }

    pub fn is_sold_out(&self) -> bool {
        self.tokens_minted >= MAX_SUPPLY
    }

    pub fn tokens_remaining(&self) -> u64 {
        MAX_SUPPLY.saturating_sub(self.tokens_minted)
    }
}

/// Anything that can produce a fresh [`ContractSnapshot`]. Implemented by the
/// ethers-backed client and by the in-memory fake used in tests.
pub trait SnapshotSource {
    fn read_snapshot(&self) -> impl Future<Output = AppResult<ContractSnapshot>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(presale_end_time: u64, tokens_minted: u64) -> ContractSnapshot {
        ContractSnapshot {
            presale_started: true,
            presale_end_time,
            owner: Address::zero(),
            tokens_minted,
        }
    }

    #[test]
    fn has_presale_ended__is_strict_at_the_boundary() {
        let s = snapshot(1_000, 0);

        assert!(!s.has_presale_ended(999));
        assert!(!s.has_presale_ended(1_000));
        assert!(s.has_presale_ended(1_001));
    }

    #[test]
    fn has_presale_ended__is_monotonic_in_wall_clock() {
        let s = snapshot(1_000, 0);
        let mut ended = false;
        for now in 0..2_000 {
            let current = s.has_presale_ended(now);
            // once true it must stay true for any later read
            assert!(current || !ended);
            ended = current;
        }
        assert!(ended);
    }

    #[test]
    fn tokens_remaining__saturates_at_zero() {
        assert_eq!(snapshot(0, 5).tokens_remaining(), 15);
        assert_eq!(snapshot(0, MAX_SUPPLY).tokens_remaining(), 0);
        assert!(snapshot(0, MAX_SUPPLY).is_sold_out());
        assert!(!snapshot(0, MAX_SUPPLY - 1).is_sold_out());
    }
}
