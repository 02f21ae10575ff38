//! Settlement Tests — offer lifecycle end to end
//!
//! Covers, through submitted transactions:
//! - Offer creation: locked funds, record contents, deposits, events
//! - Rejected creations: malformed arguments, duplicates, short funding
//! - Settlement: both legs, on-demand holdings, deposits, events
//! - Exactly-once: same-slot races, replays, id reuse after settlement
//! - Fuzz conservation across full lifecycles (proptest)

use escrow::address::{offer_address, vault_address};
use escrow::client::{ClientError, EscrowClient};
use escrow::error::EscrowError;
use escrow::events::EscrowEvent;
use escrow::instruction;
use escrow::processor::EscrowProgram;
use ledger::errors::{LedgerError, ProgramError};
use ledger::instruction::Instruction;
use ledger::runtime::{Ledger, TransactionStatus};
use ledger::signing::Keypair;
use ledger::token::{self, Holding};
use ledger::transaction::{Message, Transaction};
use types::keys::Address;

// ═══════════════════════════════════════════════════════════════════
// Offer Creation
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_make_offer_locks_funds_and_writes_record() {
    let mut swap = setup_swap();
    let maker_lamports = swap.ledger.store().lamports(&swap.maker.address());

    let client = EscrowClient::new();
    let offer = client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();

    let (expected_offer, bump) = offer_address(&swap.maker.address(), 1);
    assert_eq!(offer, expected_offer);

    // The offered amount left the maker and sits in the vault.
    assert_eq!(
        holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_a),
        9_000_000
    );
    let vault = vault_address(&offer, &swap.asset_a);
    let vault_account = swap.ledger.account(&vault).unwrap();
    assert_eq!(vault_account.owner, token::id());
    let vault_holding = Holding::unpack(&vault_account.data).unwrap();
    assert_eq!(vault_holding.amount, 1_000_000);
    assert_eq!(vault_holding.owner, offer);

    // The record carries everything a taker needs.
    let record = client.fetch_offer(&swap.ledger, swap.maker.address(), 1).unwrap();
    assert_eq!(record.id, 1);
    assert_eq!(record.maker, swap.maker.address());
    assert_eq!(record.asset_a, swap.asset_a);
    assert_eq!(record.asset_b, swap.asset_b);
    assert_eq!(record.wanted_amount_b, 2_000_000);
    assert_eq!(record.bump, bump);
    let record_account = swap.ledger.account(&offer).unwrap();
    assert_eq!(record_account.owner, escrow::id());

    // The maker funded both storage deposits.
    let rent = &swap.ledger.config().rent;
    let deposits =
        rent.minimum_balance(escrow::state::Offer::LEN) + rent.minimum_balance(Holding::LEN);
    assert_eq!(
        swap.ledger.store().lamports(&swap.maker.address()),
        maker_lamports - deposits
    );
}

#[test]
fn test_make_offer_emits_creation_event() {
    let mut swap = setup_swap();
    let status = run(
        &mut swap.ledger,
        vec![instruction::make_offer(
            swap.maker.address(),
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )],
        &[&swap.maker],
    );
    assert!(status.is_ok());
    assert_eq!(status.events.len(), 1);
    assert_eq!(status.events[0].program, escrow::id());
    let event = EscrowEvent::from_bytes(&status.events[0].payload).unwrap();
    match event {
        EscrowEvent::OfferCreated(created) => {
            assert_eq!(created.id, 1);
            assert_eq!(created.maker, swap.maker.address());
            assert_eq!(created.offered_amount_a, 1_000_000);
            assert_eq!(created.wanted_amount_b, 2_000_000);
        }
        other => panic!("Expected OfferCreated, got: {:?}", other),
    }
}

#[test]
fn test_zero_amounts_rejected() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    for (offered, wanted) in [(0, 2_000_000), (1_000_000, 0), (0, 0)] {
        let error = client
            .create_offer(
                &mut swap.ledger,
                &swap.maker,
                1,
                swap.asset_a,
                swap.asset_b,
                offered,
                wanted,
            )
            .unwrap_err();
        assert_eq!(error.escrow_reason(), Some(EscrowError::MalformedArguments));
    }
    assert_eq!(
        client.fetch_offer(&swap.ledger, swap.maker.address(), 1),
        Err(ClientError::OfferNotFound {
            maker: swap.maker.address(),
            id: 1
        })
    );
}

#[test]
fn test_same_asset_offer_rejected() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    let error = client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_a,
            1_000_000,
            2_000_000,
        )
        .unwrap_err();
    assert_eq!(error.escrow_reason(), Some(EscrowError::MalformedArguments));
}

#[test]
fn test_duplicate_live_id_rejected() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();

    let error = client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            500,
            500,
        )
        .unwrap_err();
    assert_eq!(error.escrow_reason(), Some(EscrowError::AddressAlreadyInUse));

    // The live offer kept its original terms.
    let record = client.fetch_offer(&swap.ledger, swap.maker.address(), 1).unwrap();
    assert_eq!(record.wanted_amount_b, 2_000_000);
    let vault = vault_address(&offer_address(&swap.maker.address(), 1).0, &swap.asset_a);
    assert_eq!(vault_balance(&swap.ledger, &vault), 1_000_000);
}

#[test]
fn test_underfunded_offer_rolls_back_everything() {
    let mut swap = setup_swap_funded(500_000, 10_000_000);
    let maker_lamports = swap.ledger.store().lamports(&swap.maker.address());

    let client = EscrowClient::new();
    let error = client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap_err();
    assert_eq!(error.escrow_reason(), Some(EscrowError::InsufficientFunds));

    // No record, no vault, no deposit movement, no debit.
    let (offer, _) = offer_address(&swap.maker.address(), 1);
    assert!(swap.ledger.account(&offer).is_none());
    assert!(swap
        .ledger
        .account(&vault_address(&offer, &swap.asset_a))
        .is_none());
    assert_eq!(
        holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_a),
        500_000
    );
    assert_eq!(
        swap.ledger.store().lamports(&swap.maker.address()),
        maker_lamports
    );
}

#[test]
fn test_multiple_live_offers_are_independent() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            3,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            4,
            swap.asset_a,
            swap.asset_b,
            3_000_000,
            5_000_000,
        )
        .unwrap();

    let open = client.open_offers(&swap.ledger, swap.maker.address(), &[1, 2, 3, 4, 5]);
    assert_eq!(open.len(), 2);
    assert_eq!(open[0].id, 3);
    assert_eq!(open[1].id, 4);
    assert_eq!(open[1].wanted_amount_b, 5_000_000);

    // Settling one leaves the other untouched.
    let status = client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 3)
        .unwrap();
    assert!(status.is_ok());
    let open = client.open_offers(&swap.ledger, swap.maker.address(), &[3, 4]);
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, 4);
    let (offer4, _) = offer_address(&swap.maker.address(), 4);
    assert_eq!(
        vault_balance(&swap.ledger, &vault_address(&offer4, &swap.asset_a)),
        3_000_000
    );
}

// ═══════════════════════════════════════════════════════════════════
// Settlement
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_take_offer_settles_both_legs_atomically() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    let offer = client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    let maker_lamports = swap.ledger.store().lamports(&swap.maker.address());
    let taker_lamports = swap.ledger.store().lamports(&swap.taker.address());

    let status = client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap();
    assert!(status.is_ok());

    // Asset A: vault drained to the taker, maker balance untouched.
    assert_eq!(
        holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_a),
        9_000_000
    );
    assert_eq!(
        holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_a),
        1_000_000
    );
    // Asset B: the wanted amount moved taker to maker.
    assert_eq!(
        holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_b),
        8_000_000
    );
    assert_eq!(
        holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_b),
        2_000_000
    );

    // Record and vault are gone; deposits went home.
    assert!(swap.ledger.account(&offer).is_none());
    assert!(swap
        .ledger
        .account(&vault_address(&offer, &swap.asset_a))
        .is_none());
    let rent = &swap.ledger.config().rent;
    let holding_deposit = rent.minimum_balance(Holding::LEN);
    let record_deposit = rent.minimum_balance(escrow::state::Offer::LEN);
    // Taker paid for two new holdings and got the vault deposit back.
    assert_eq!(
        swap.ledger.store().lamports(&swap.taker.address()),
        taker_lamports - holding_deposit
    );
    assert_eq!(
        swap.ledger.store().lamports(&swap.maker.address()),
        maker_lamports + record_deposit
    );

    // Settlement event carries the full outcome.
    assert_eq!(status.events.len(), 1);
    let event = EscrowEvent::from_bytes(&status.events[0].payload).unwrap();
    match event {
        EscrowEvent::OfferSettled(settled) => {
            assert_eq!(settled.offer, offer);
            assert_eq!(settled.maker, swap.maker.address());
            assert_eq!(settled.taker, swap.taker.address());
            assert_eq!(settled.settled_amount_a, 1_000_000);
            assert_eq!(settled.paid_amount_b, 2_000_000);
        }
        other => panic!("Expected OfferSettled, got: {:?}", other),
    }
}

#[test]
fn test_take_offer_reuses_existing_taker_holding() {
    let mut swap = setup_swap();
    // Taker already holds some asset A.
    run(
        &mut swap.ledger,
        vec![token::create_holding(
            swap.taker.address(),
            swap.asset_a,
            swap.taker.address(),
        )],
        &[&swap.taker],
    );
    mint_into(&mut swap.ledger, &swap.authority, swap.asset_a, &swap.taker, 500);

    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap();
    assert_eq!(
        holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_a),
        1_000_500
    );
}

#[test]
fn test_take_offer_pays_into_existing_maker_holding() {
    let mut swap = setup_swap();
    run(
        &mut swap.ledger,
        vec![token::create_holding(
            swap.maker.address(),
            swap.asset_b,
            swap.maker.address(),
        )],
        &[&swap.maker],
    );
    mint_into(&mut swap.ledger, &swap.authority, swap.asset_b, &swap.maker, 250);

    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap();
    assert_eq!(
        holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_b),
        2_000_250
    );
}

#[test]
fn test_accept_unknown_offer_fails_before_submission() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    let error = client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 42)
        .unwrap_err();
    assert_eq!(
        error,
        ClientError::OfferNotFound {
            maker: swap.maker.address(),
            id: 42
        }
    );
}

#[test]
fn test_take_with_swapped_assets_rejected() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();

    // Correct record address, but the asset accounts are crossed.
    let status = run(
        &mut swap.ledger,
        vec![instruction::take_offer(
            swap.taker.address(),
            swap.maker.address(),
            1,
            swap.asset_b,
            swap.asset_a,
        )],
        &[&swap.taker],
    );
    assert_eq!(escrow_failure(&status), EscrowError::AssetMismatch);
    assert!(client
        .fetch_offer(&swap.ledger, swap.maker.address(), 1)
        .is_ok());
}

#[test]
fn test_taker_short_of_asset_b_leaves_offer_live() {
    let mut swap = setup_swap_funded(10_000_000, 1_999_999);
    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();

    let error = client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap_err();
    assert_eq!(error.escrow_reason(), Some(EscrowError::InsufficientFunds));

    // Nothing moved; the offer is still takeable.
    let (offer, _) = offer_address(&swap.maker.address(), 1);
    assert_eq!(
        vault_balance(&swap.ledger, &vault_address(&offer, &swap.asset_a)),
        1_000_000
    );
    assert_eq!(
        holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_b),
        1_999_999
    );
    assert!(client
        .fetch_offer(&swap.ledger, swap.maker.address(), 1)
        .is_ok());
}

#[test]
fn test_taker_without_asset_b_holding_rejected() {
    let mut swap = setup_swap();
    // A second taker who never held asset B at all.
    let stranger = Keypair::from_seed([0x03; 32]);
    swap.ledger.airdrop(stranger.address(), 100_000_000);

    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    let error = client
        .accept_offer(&mut swap.ledger, &stranger, swap.maker.address(), 1)
        .unwrap_err();
    assert_eq!(error.escrow_reason(), Some(EscrowError::InsufficientFunds));
}

// ═══════════════════════════════════════════════════════════════════
// Exactly-Once Settlement
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_same_slot_race_settles_exactly_once() {
    let mut swap = setup_swap();
    let rival = Keypair::from_seed([0x03; 32]);
    swap.ledger.airdrop(rival.address(), 100_000_000);
    create_funded_holding(&mut swap.ledger, &swap.authority, swap.asset_b, &rival, 10_000_000);

    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();

    // Both takers submit against the same live record; arrival order
    // decides the winner inside one slot.
    let blockhash = swap.ledger.latest_blockhash();
    let first = Transaction::new(
        Message::new(
            blockhash,
            vec![instruction::take_offer(
                swap.taker.address(),
                swap.maker.address(),
                1,
                swap.asset_a,
                swap.asset_b,
            )],
        ),
        &[&swap.taker],
    );
    let second = Transaction::new(
        Message::new(
            blockhash,
            vec![instruction::take_offer(
                rival.address(),
                swap.maker.address(),
                1,
                swap.asset_a,
                swap.asset_b,
            )],
        ),
        &[&rival],
    );
    let first_hash = swap.ledger.submit(first).unwrap();
    let second_hash = swap.ledger.submit(second).unwrap();
    swap.ledger.advance_slot();

    assert!(swap.ledger.status(&first_hash).unwrap().is_ok());
    let second_status = swap.ledger.status(&second_hash).unwrap().clone();
    assert_eq!(escrow_failure(&second_status), EscrowError::RecordNotFound);

    // The winner got the vault; the loser paid nothing.
    assert_eq!(
        holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_a),
        1_000_000
    );
    assert_eq!(
        holding_amount(&swap.ledger, &rival.address(), &swap.asset_b),
        10_000_000
    );
    assert_eq!(
        holding_amount(&swap.ledger, &rival.address(), &swap.asset_a),
        0
    );
}

#[test]
fn test_settled_offer_cannot_be_taken_again() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap();

    // The client sees the record is gone before it even submits.
    let error = client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap_err();
    assert_eq!(
        error,
        ClientError::OfferNotFound {
            maker: swap.maker.address(),
            id: 1
        }
    );
}

#[test]
fn test_id_reusable_after_settlement() {
    let mut swap = setup_swap();
    let client = EscrowClient::new();
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            1_000_000,
            2_000_000,
        )
        .unwrap();
    client
        .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
        .unwrap();

    // Same id, new terms: a fresh offer at the same derived address.
    client
        .create_offer(
            &mut swap.ledger,
            &swap.maker,
            1,
            swap.asset_a,
            swap.asset_b,
            2_500_000,
            7_000_000,
        )
        .unwrap();
    let record = client.fetch_offer(&swap.ledger, swap.maker.address(), 1).unwrap();
    assert_eq!(record.wanted_amount_b, 7_000_000);
    let (offer, _) = offer_address(&swap.maker.address(), 1);
    assert_eq!(
        vault_balance(&swap.ledger, &vault_address(&offer, &swap.asset_a)),
        2_500_000
    );
}

// ═══════════════════════════════════════════════════════════════════
// Fuzz Tests (Proptest)
// ═══════════════════════════════════════════════════════════════════

mod fuzz {
    use super::*;
    use proptest::prelude::*;

    fn swap_amount() -> impl Strategy<Value = u64> {
        1u64..=1_000_000_000_000
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Invariant: a full create-then-settle lifecycle moves exactly the
        /// offered and wanted amounts, conserves both supplies and native
        /// lamports, and leaves neither record nor vault behind.
        #[test]
        fn fuzz_lifecycle_conserves_both_assets(
            offered in swap_amount(),
            wanted in swap_amount(),
        ) {
            let mut swap = setup_swap_funded(offered, wanted);
            let lamports_baseline = swap.ledger.store().total_lamports();

            let client = EscrowClient::new();
            let offer = client
                .create_offer(
                    &mut swap.ledger,
                    &swap.maker,
                    1,
                    swap.asset_a,
                    swap.asset_b,
                    offered,
                    wanted,
                )
                .unwrap();
            client
                .accept_offer(&mut swap.ledger, &swap.taker, swap.maker.address(), 1)
                .unwrap();

            prop_assert_eq!(
                holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_a),
                offered
            );
            prop_assert_eq!(
                holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_a),
                0
            );
            prop_assert_eq!(
                holding_amount(&swap.ledger, &swap.maker.address(), &swap.asset_b),
                wanted
            );
            prop_assert_eq!(
                holding_amount(&swap.ledger, &swap.taker.address(), &swap.asset_b),
                0
            );
            prop_assert!(swap.ledger.account(&offer).is_none());
            prop_assert!(swap
                .ledger
                .account(&vault_address(&offer, &swap.asset_a))
                .is_none());
            prop_assert_eq!(swap.ledger.store().total_lamports(), lamports_baseline);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

struct Swap {
    ledger: Ledger,
    authority: Keypair,
    maker: Keypair,
    taker: Keypair,
    asset_a: Address,
    asset_b: Address,
}

/// Ledger with the escrow registered, a maker holding 10M of asset A and
/// a taker holding 10M of asset B.
fn setup_swap() -> Swap {
    setup_swap_funded(10_000_000, 10_000_000)
}

fn setup_swap_funded(maker_a: u64, taker_b: u64) -> Swap {
    let mut ledger = Ledger::default();
    ledger.register_program(escrow::id(), EscrowProgram);
    let authority = Keypair::from_seed([0xA0; 32]);
    let maker = Keypair::from_seed([0x01; 32]);
    let taker = Keypair::from_seed([0x02; 32]);
    for address in [authority.address(), maker.address(), taker.address()] {
        ledger.airdrop(address, 100_000_000);
    }
    let asset_a = create_asset(&mut ledger, &authority, [0x0A]);
    let asset_b = create_asset(&mut ledger, &authority, [0x0B]);
    create_funded_holding(&mut ledger, &authority, asset_a, &maker, maker_a);
    create_funded_holding(&mut ledger, &authority, asset_b, &taker, taker_b);
    Swap {
        ledger,
        authority,
        maker,
        taker,
        asset_a,
        asset_b,
    }
}

fn create_asset(ledger: &mut Ledger, authority: &Keypair, seed: [u8; 1]) -> Address {
    let mint_keypair = Keypair::from_seed([seed[0]; 32]);
    let mint = mint_keypair.address();
    let status = run(
        ledger,
        vec![token::create_mint(mint, authority.address(), authority.address(), 6)],
        &[&mint_keypair, authority],
    );
    assert!(status.is_ok(), "mint creation failed: {:?}", status.result);
    mint
}

fn create_funded_holding(
    ledger: &mut Ledger,
    authority: &Keypair,
    mint: Address,
    holder: &Keypair,
    amount: u64,
) {
    let status = run(
        ledger,
        vec![token::create_holding(holder.address(), mint, holder.address())],
        &[holder],
    );
    assert!(status.is_ok(), "holding creation failed: {:?}", status.result);
    if amount > 0 {
        mint_into(ledger, authority, mint, holder, amount);
    }
}

fn mint_into(ledger: &mut Ledger, authority: &Keypair, mint: Address, holder: &Keypair, amount: u64) {
    let (holding, _) = token::holding_address(&holder.address(), &mint);
    let status = run(
        ledger,
        vec![token::mint_to(mint, holding, authority.address(), amount)],
        &[authority],
    );
    assert!(status.is_ok(), "mint_to failed: {:?}", status.result);
}

/// Submit one transaction and drive the slot forward until it lands.
fn run(
    ledger: &mut Ledger,
    instructions: Vec<Instruction>,
    signers: &[&Keypair],
) -> TransactionStatus {
    let message = Message::new(ledger.latest_blockhash(), instructions);
    let tx = Transaction::new(message, signers);
    let hash = ledger.submit(tx).expect("submission should pass checks");
    ledger.advance_slot();
    ledger
        .status(&hash)
        .expect("processed in the advanced slot")
        .clone()
}

fn holding_amount(ledger: &Ledger, owner: &Address, mint: &Address) -> u64 {
    let (holding, _) = token::holding_address(owner, mint);
    vault_balance(ledger, &holding)
}

fn vault_balance(ledger: &Ledger, holding: &Address) -> u64 {
    ledger
        .account(holding)
        .and_then(|account| Holding::unpack(&account.data).ok())
        .map(|holding| holding.amount)
        .unwrap_or(0)
}

fn escrow_failure(status: &TransactionStatus) -> EscrowError {
    match &status.result {
        Err(LedgerError::Instruction {
            source: ProgramError::Custom { code, .. },
            ..
        }) => EscrowError::from_code(*code).expect("escrow error code"),
        other => panic!("Expected an escrow rejection, got: {:?}", other),
    }
}
