use crate::{
    gateway::WalletSession,
    snapshot::ContractSnapshot,
};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected(WalletSession),
}

/// Closed set of states the rendering layer can be in. Derived, never stored:
/// always a pure function of the latest session, snapshot and in-flight flag.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PresentationState {
    Disconnected,
    Connecting,
    OwnerCanStart,
    PresaleNotStarted,
    PresaleActiveEligible,
    PresaleEnded,
    SoldOut,
    ActionInFlight,
}

impl PresentationState {
    /// Whether the rendering layer may offer a mint button in this state.
    pub fn offers_mint(&self) -> bool {
        matches!(self, Self::PresaleActiveEligible | Self::PresaleEnded)
    }
}

impl fmt::Display for PresentationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Disconnected => "wallet not connected",
            Self::Connecting => "connecting...",
            Self::OwnerCanStart => "presale not started; you own this contract and may start it",
            Self::PresaleNotStarted => "presale has not started yet",
            Self::PresaleActiveEligible => "presale live: whitelisted addresses may mint",
            Self::PresaleEnded => "presale ended: public mint open",
            Self::SoldOut => "collection sold out",
            Self::ActionInFlight => "transaction in progress...",
        };
        f.write_str(text)
    }
}

/// Derives the presentation state, in precedence order:
///
/// 1. no session wins over everything,
/// 2. an in-flight transaction blocks all further affordances,
/// 3. the owner sees the start-presale affordance before the generic
///    not-started message,
/// 4. a minted-out collection offers no mint regardless of the presale phase.
pub fn derive(
    status: ConnectionStatus,
    snapshot: Option<&ContractSnapshot>,
    action_in_flight: bool,
    now: u64,
) -> PresentationState {
    let session = match status {
        ConnectionStatus::Disconnected => return PresentationState::Disconnected,
        ConnectionStatus::Connecting => return PresentationState::Connecting,
        ConnectionStatus::Connected(session) => session,
    };
    if action_in_flight {
        return PresentationState::ActionInFlight;
    }
    // connected but no completed poll yet
    let Some(snapshot) = snapshot else {
        return PresentationState::Connecting;
    };
    if !snapshot.presale_started {
        if session.address == snapshot.owner {
            return PresentationState::OwnerCanStart;
        }
        return PresentationState::PresaleNotStarted;
    }
    if snapshot.is_sold_out() {
        return PresentationState::SoldOut;
    }
    if snapshot.has_presale_ended(now) {
        PresentationState::PresaleEnded
    } else {
        PresentationState::PresaleActiveEligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MAX_SUPPLY;
    use ethers::types::Address;
    use proptest::prelude::*;

    fn connected(address: Address) -> ConnectionStatus {
        ConnectionStatus::Connected(WalletSession {
            address,
            chain_id: 5,
        })
    }

    fn snapshot(
        presale_started: bool,
        presale_end_time: u64,
        owner: Address,
        tokens_minted: u64,
    ) -> ContractSnapshot {
        ContractSnapshot {
            presale_started,
            presale_end_time,
            owner,
            tokens_minted,
        }
    }

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn derive__owner_sees_start_affordance_before_not_started() {
        let owner = Address::from_low_u64_be(0xA);
        let s = snapshot(false, 0, owner, 0);

        assert_eq!(
            derive(connected(owner), Some(&s), false, NOW),
            PresentationState::OwnerCanStart
        );
        assert_eq!(
            derive(connected(Address::from_low_u64_be(0xB)), Some(&s), false, NOW),
            PresentationState::PresaleNotStarted
        );
    }

    #[test]
    fn derive__active_presale_offers_mint_to_non_owner() {
        let owner = Address::from_low_u64_be(0xA);
        let s = snapshot(true, NOW + 3_600, owner, 5);

        let state = derive(connected(Address::from_low_u64_be(0xB)), Some(&s), false, NOW);

        assert_eq!(state, PresentationState::PresaleActiveEligible);
        assert!(state.offers_mint());
    }

    #[test]
    fn derive__ended_presale_offers_public_mint() {
        let owner = Address::from_low_u64_be(0xA);
        let s = snapshot(true, NOW - 1, owner, 19);

        assert_eq!(
            derive(connected(Address::from_low_u64_be(0xB)), Some(&s), false, NOW),
            PresentationState::PresaleEnded
        );
    }

    #[test]
    fn derive__sold_out_collection_offers_no_mint() {
        let owner = Address::from_low_u64_be(0xA);
        // both during and after the presale window
        for end in [NOW + 3_600, NOW - 1] {
            let s = snapshot(true, end, owner, MAX_SUPPLY);
            let state = derive(connected(Address::from_low_u64_be(0xB)), Some(&s), false, NOW);

            assert_eq!(state, PresentationState::SoldOut);
            assert!(!state.offers_mint());
        }
    }

    #[test]
    fn derive__no_snapshot_yet_reads_as_connecting() {
        assert_eq!(
            derive(connected(Address::zero()), None, false, NOW),
            PresentationState::Connecting
        );
    }

    #[test]
    fn derive__disconnected_wins_over_everything() {
        let s = snapshot(true, NOW + 1, Address::zero(), 0);

        assert_eq!(
            derive(ConnectionStatus::Disconnected, Some(&s), true, NOW),
            PresentationState::Disconnected
        );
    }

    proptest! {
        #[test]
        fn derive__not_started_depends_only_on_ownership(
            owner in any::<[u8; 20]>(),
            viewer in any::<[u8; 20]>(),
            tokens_minted in 0..MAX_SUPPLY,
            presale_end_time in any::<u64>(),
            now in any::<u64>(),
        ) {
            let owner = Address::from(owner);
            let viewer = Address::from(viewer);
            let s = snapshot(false, presale_end_time, owner, tokens_minted);

            let state = derive(connected(viewer), Some(&s), false, now);

            if viewer == owner {
                prop_assert_eq!(state, PresentationState::OwnerCanStart);
            } else {
                prop_assert_eq!(state, PresentationState::PresaleNotStarted);
            }
        }

        #[test]
        fn derive__in_flight_action_takes_precedence(
            owner in any::<[u8; 20]>(),
            viewer in any::<[u8; 20]>(),
            presale_started in any::<bool>(),
            tokens_minted in 0..=MAX_SUPPLY,
            presale_end_time in any::<u64>(),
            now in any::<u64>(),
            have_snapshot in any::<bool>(),
        ) {
            let s = snapshot(
                presale_started,
                presale_end_time,
                Address::from(owner),
                tokens_minted,
            );
            let snapshot = have_snapshot.then_some(&s);

            let state = derive(connected(Address::from(viewer)), snapshot, true, now);

            prop_assert_eq!(state, PresentationState::ActionInFlight);
        }
    }
}
