//! Property tests for the registry invariants.

use super::*;
use crate::chain::MockTreasury;
use crate::codec::MockCodec;
use proptest::prelude::*;

fn address(n: u8) -> Address {
    Address::parse(&format!("0x{:040x}", u64::from(n) + 1)).unwrap()
}

fn choice_strategy() -> impl Strategy<Value = VoteChoice> {
    prop_oneof![Just(VoteChoice::Approve), Just(VoteChoice::Reject)]
}

proptest! {
    /// Tally counting is determined by the choice multiset alone, and
    /// a proposal passes exactly on a strict approve majority.
    #[test]
    fn tally_matches_manual_count(choices in proptest::collection::vec(choice_strategy(), 0..32)) {
        let revealed: Vec<RevealedVote> = choices
            .iter()
            .enumerate()
            .map(|(i, &choice)| RevealedVote {
                vote_id: i as u64 + 1,
                signer: address(i as u8),
                choice,
            })
            .collect();

        let tally = Tally::count(&revealed);
        let approve = choices.iter().filter(|c| **c == VoteChoice::Approve).count() as u32;
        let reject = choices.len() as u32 - approve;

        prop_assert_eq!(tally.approve, approve);
        prop_assert_eq!(tally.reject, reject);
        prop_assert_eq!(tally.passes(), approve > reject);
    }

    /// Amount parsing accepts exactly positive decimal strings.
    #[test]
    fn amount_accepts_positive_decimals(int_part in 0u64..=u64::MAX / 2, frac in proptest::option::of(0u32..=999_999u32)) {
        let text = match frac {
            Some(frac) => format!("{int_part}.{frac:06}"),
            None => int_part.to_string(),
        };
        let positive = int_part > 0 || frac.map(|f| f > 0).unwrap_or(false);
        prop_assert_eq!(Amount::parse(&text).is_ok(), positive);
    }

    /// Address parsing never panics and accepts exactly the
    /// `0x` + 40-hex shape.
    #[test]
    fn address_parse_total(text in "\\PC*") {
        let digits = text.strip_prefix("0x");
        let well_formed = digits
            .map(|d| d.len() == 40 && d.bytes().all(|b| b.is_ascii_hexdigit()))
            .unwrap_or(false);
        prop_assert_eq!(Address::parse(&text).is_ok(), well_formed);
    }

    /// Addresses round-trip from raw bytes.
    #[test]
    fn address_roundtrip(bytes in proptest::array::uniform20(any::<u8>())) {
        let text = format!("0x{}", hex::encode(bytes));
        let parsed = Address::parse(&text).unwrap();
        prop_assert_eq!(parsed.as_str(), text.as_str());
    }

    /// Across any vote sequence: the vote list only grows, every signer
    /// appears at most once, and a repeated signer is always refused
    /// with `AlreadyVoted` leaving the votes unchanged.
    #[test]
    fn vote_sequences_preserve_invariants(
        votes in proptest::collection::vec((0u8..6, choice_strategy()), 1..24),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();

        runtime.block_on(async move {
            let chain = MockTreasury::new(u32::MAX); // never quorate, stays active
            let codec = MockCodec::new();
            let mut registry = ProposalRegistry::new(chain, codec, u32::MAX);

            let draft = ProposalDraft {
                title: "Treasury Diversification".to_string(),
                description: "Allocate 50 ETH to DeFi yield farming protocols".to_string(),
                amount: "10".to_string(),
                currency: Currency::Eth,
                recipient: format!("0x{}", "a".repeat(40)),
                category: Category::Treasury,
                deadline: unix_now() + 3600,
                urgency: Urgency::Low,
            };
            let id = registry
                .submit_proposal(&WalletSession::connected(address(200)), draft)
                .await
                .unwrap();

            let mut seen = std::collections::HashSet::new();
            let mut last_len = 0usize;

            for (signer, choice) in votes {
                let session = WalletSession::connected(address(signer));
                let result = registry.cast_vote(&session, id, choice).await;

                if seen.insert(signer) {
                    prop_assert!(result.is_ok());
                } else {
                    prop_assert!(matches!(result, Err(RegistryError::AlreadyVoted(_, _))));
                }

                let len = registry.snapshot().proposals[0].votes.len();
                prop_assert!(len >= last_len, "vote count decreased");
                prop_assert_eq!(len, seen.len());
                last_len = len;
            }

            let proposal = &registry.snapshot().proposals[0];
            let mut signers: Vec<_> = proposal.votes.iter().map(|v| v.signer.clone()).collect();
            let total = signers.len();
            signers.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            signers.dedup();
            prop_assert_eq!(signers.len(), total, "duplicate signer recorded");
            Ok(())
        })?;
    }
}
