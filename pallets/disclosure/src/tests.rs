use crate::{mock::*, pallet::Entered, Error, Event, PendingRequests};
use confidential_disclosure_primitives::{
    CiphertextBackend, DisclosureCoordinator, Handle, RequestStatus,
};
use confidential_disclosure_test_utils::{
    cleartext, disclosure_proof, sign_disclosure, MockCoprocessor, MockLedger,
};
use frame_support::{assert_noop, assert_ok};
use sp_runtime::DispatchError;

type Coordinator = ConfidentialDisclosure;

// helpers
fn last_event() -> RuntimeEvent {
    frame_system::Pallet::<Runtime>::events()
        .pop()
        .expect("event")
        .event
}

fn handle_of(value: u64) -> Handle {
    MockCoprocessor::trivial_encrypt(value)
}

fn request(beneficiary: AccountId, value: u64) -> Handle {
    let h = handle_of(value);
    assert_ok!(<Coordinator as DisclosureCoordinator<_, _>>::request_disclosure(
        &beneficiary,
        ASSET,
        h
    ));
    h
}

fn settle(h: &Handle, clear: &[u8], proof: &[u8]) -> Result<u64, DispatchError> {
    <Coordinator as DisclosureCoordinator<AccountId, AssetId>>::settle_disclosure(h, clear, proof)
        .map(|s| s.amount)
}

#[test]
fn request_records_pending_and_marks_handle_public() {
    new_test_ext().execute_with(|| {
        let h = handle_of(500);
        assert!(!MockCoprocessor::is_publicly_decryptable(&h));

        let returned =
            <Coordinator as DisclosureCoordinator<_, _>>::request_disclosure(&ALICE, ASSET, h)
                .unwrap();
        assert_eq!(returned, h);
        assert!(MockCoprocessor::is_publicly_decryptable(&h));

        let rec = ConfidentialDisclosure::pending_request(&h).expect("recorded");
        assert_eq!(rec.beneficiary, ALICE);
        assert_eq!(rec.asset, ASSET);
        assert_eq!(rec.requested_at, 1);
        assert_eq!(rec.status, RequestStatus::Pending);
        assert!(<Coordinator as DisclosureCoordinator<AccountId, AssetId>>::is_pending(&h));

        match last_event() {
            RuntimeEvent::ConfidentialDisclosure(Event::DisclosureRequested {
                handle,
                beneficiary,
                asset,
            }) => {
                assert_eq!(handle, h);
                assert_eq!(beneficiary, ALICE);
                assert_eq!(asset, ASSET);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    });
}

#[test]
fn request_twice_for_same_handle_fails() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 5);
        assert_noop!(
            <Coordinator as DisclosureCoordinator<_, _>>::request_disclosure(&BOB, ASSET, h),
            Error::<Runtime>::AlreadyRequested
        );
        assert_eq!(ConfidentialDisclosure::pending_request(&h).unwrap().beneficiary, ALICE);
    });
}

#[test]
fn settle_returns_amount_and_beneficiary_and_tombstones_request() {
    new_test_ext().execute_with(|| {
        let h = request(BOB, 10_000);
        let (clear, proof) = sign_disclosure(&h, 10_000);

        let settled =
            <Coordinator as DisclosureCoordinator<AccountId, AssetId>>::settle_disclosure(
                &h, &clear, &proof,
            )
            .unwrap();
        assert_eq!(settled.beneficiary, BOB);
        assert_eq!(settled.asset, ASSET);
        assert_eq!(settled.amount, 10_000);

        assert_eq!(
            PendingRequests::<Runtime>::get(h).unwrap().status,
            RequestStatus::Settled
        );
        assert!(!<Coordinator as DisclosureCoordinator<AccountId, AssetId>>::is_pending(&h));

        match last_event() {
            RuntimeEvent::ConfidentialDisclosure(Event::DisclosureSettled {
                handle,
                beneficiary,
                amount,
                ..
            }) => {
                assert_eq!(handle, h);
                assert_eq!(beneficiary, BOB);
                assert_eq!(amount, 10_000);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    });
}

#[test]
fn settle_succeeds_at_most_once() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 77);
        let (clear, proof) = sign_disclosure(&h, 77);
        assert_eq!(settle(&h, &clear, &proof), Ok(77));

        // Same valid proof again.
        assert_noop!(
            settle(&h, &clear, &proof),
            Error::<Runtime>::UnknownOrSettledRequest
        );
        // A settled handle cannot be requested again either.
        assert_noop!(
            <Coordinator as DisclosureCoordinator<_, _>>::request_disclosure(&ALICE, ASSET, h),
            Error::<Runtime>::AlreadyRequested
        );
    });
}

#[test]
fn settle_unknown_handle_fails() {
    new_test_ext().execute_with(|| {
        let h = handle_of(1);
        let (clear, proof) = sign_disclosure(&h, 1);
        assert_noop!(
            settle(&h, &clear, &proof),
            Error::<Runtime>::UnknownOrSettledRequest
        );
    });
}

#[test]
fn tampered_cleartext_is_rejected_and_request_survives() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 42);
        let (clear, proof) = sign_disclosure(&h, 42);

        assert_noop!(
            settle(&h, &cleartext(43), &proof),
            Error::<Runtime>::InvalidProof
        );
        assert!(ConfidentialDisclosure::pending_request(&h).unwrap().is_pending());

        assert_eq!(settle(&h, &clear, &proof), Ok(42));
    });
}

#[test]
fn proof_for_another_handle_is_rejected() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 42);
        let other = request(BOB, 42 + 1);
        let (clear, proof_for_other) = sign_disclosure(&other, 42);

        assert_noop!(
            settle(&h, &clear, &proof_for_other),
            Error::<Runtime>::InvalidProof
        );
    });
}

#[test]
fn malformed_cleartext_keeps_request_pending() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 9);
        let short = [9u8, 0, 0];
        let proof = disclosure_proof(&[h], &short);

        assert_noop!(
            settle(&h, &short, &proof),
            Error::<Runtime>::MalformedCleartext
        );
        assert!(ConfidentialDisclosure::pending_request(&h).unwrap().is_pending());
    });
}

#[test]
fn nested_settlement_is_rejected() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 3);
        let (clear, proof) = sign_disclosure(&h, 3);

        Entered::<Runtime>::put(true);
        assert_noop!(settle(&h, &clear, &proof), Error::<Runtime>::Reentrancy);
        Entered::<Runtime>::kill();

        assert_eq!(settle(&h, &clear, &proof), Ok(3));
    });
}

#[test]
fn own_balance_disclosure_creates_no_pending_request() {
    new_test_ext().execute_with(|| {
        MockLedger::set_balance(ASSET, ALICE, 250);

        assert_ok!(ConfidentialDisclosure::make_own_balance_publicly_disclosable(
            RuntimeOrigin::signed(ALICE),
            ASSET
        ));

        let handle = match last_event() {
            RuntimeEvent::ConfidentialDisclosure(Event::BalanceDisclosable {
                who,
                asset,
                handle,
            }) => {
                assert_eq!(who, ALICE);
                assert_eq!(asset, ASSET);
                handle
            }
            other => panic!("unexpected event: {other:?}"),
        };
        assert!(MockCoprocessor::is_publicly_decryptable(&handle));
        assert_eq!(MockCoprocessor::value_of(&handle), Some(250));
        assert_eq!(PendingRequests::<Runtime>::iter().count(), 0);
    });
}

#[test]
fn balance_disclosure_for_others_requires_admin() {
    new_test_ext().execute_with(|| {
        assert_noop!(
            ConfidentialDisclosure::make_balance_publicly_disclosable_for(
                RuntimeOrigin::signed(ALICE),
                ASSET,
                BOB
            ),
            DispatchError::BadOrigin
        );

        assert_ok!(ConfidentialDisclosure::make_balance_publicly_disclosable_for(
            RuntimeOrigin::root(),
            ASSET,
            BOB
        ));
        match last_event() {
            RuntimeEvent::ConfidentialDisclosure(Event::BalanceDisclosable { who, .. }) => {
                assert_eq!(who, BOB)
            }
            other => panic!("unexpected event: {other:?}"),
        }
    });
}

#[test]
fn request_stays_pending_across_blocks() {
    new_test_ext().execute_with(|| {
        let h = request(ALICE, 12);
        for n in 2..20u64 {
            System::set_block_number(n);
        }
        let rec = ConfidentialDisclosure::pending_request(&h).unwrap();
        assert!(rec.is_pending());
        assert_eq!(rec.requested_at, 1);
    });
}

#[test]
fn balance_disclosure_requires_known_asset() {
    new_test_ext().execute_with(|| {
        assert_noop!(
            ConfidentialDisclosure::make_own_balance_publicly_disclosable(
                RuntimeOrigin::signed(ALICE),
                ASSET + 1
            ),
            Error::<Runtime>::UnknownAsset
        );
        assert_noop!(
            ConfidentialDisclosure::make_balance_publicly_disclosable_for(
                RuntimeOrigin::root(),
                ASSET + 1,
                BOB
            ),
            Error::<Runtime>::UnknownAsset
        );
    });
}
