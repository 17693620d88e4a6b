//! **pallet-confidential-disclosure**
//!
//! Bridges an on-chain encrypted value to an off-chain cleartext consumer.
//!
//! Flow:
//! 1. An executor pallet calls [`DisclosureCoordinator::request_disclosure`] with a
//!    handle it controls (e.g. a freshly burned amount). The handle is marked
//!    publicly decryptable and a [`DisclosureRequest`] is recorded for the
//!    beneficiary. `DisclosureRequested` carries the handle to off-chain relays.
//! 2. A relay obtains `(cleartext, proof)` from the disclosure service, and the
//!    executor passes them to [`DisclosureCoordinator::settle_disclosure`].
//! 3. The proof is verified, the cleartext decoded as `u64`, and the request is
//!    marked `Settled` before the executor gets the amount back. A settled
//!    request stays in storage as a tombstone; the same handle can never be
//!    requested or settled again.
//!
//! A failed verification leaves the request pending so a correct submission can
//! follow. There is no expiry: a request whose cleartext never arrives stays
//! pending forever.
//!
//! Two extrinsics let balances be disclosed for auditing without creating any
//! pending state: one for the caller's own balance and one for `AdminOrigin`.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;
#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

const LOG_TARGET: &str = "runtime::confidential-disclosure";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AssetId> {
    /// An asset known to the ledger.
    fn asset() -> AssetId;
}

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use confidential_disclosure_primitives::{
        with_entry_lock, CiphertextBackend, ConfidentialLedger, DisclosureCoordinator,
        DisclosureRequest, DisclosureVerifier, Handle, RequestStatus, SettledDisclosure,
    };
    use frame_support::pallet_prelude::*;
    use frame_system::pallet_prelude::*;
    use parity_scale_codec::DecodeAll;

    pub type RequestOf<T> = DisclosureRequest<
        <T as frame_system::Config>::AccountId,
        <T as Config>::AssetId,
        BlockNumberFor<T>,
    >;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + MaxEncodedLen + TypeInfo;

        /// Coprocessor that marks handles publicly decryptable.
        type Backend: CiphertextBackend<Self::AccountId, Self::AssetId>;

        /// Ledger queried for balance handles.
        type Ledger: ConfidentialLedger<Self::AccountId, Self::AssetId>;

        /// Checks cleartexts signed by the disclosure service.
        type Verifier: DisclosureVerifier;

        /// Origin allowed to disclose any account's balance.
        type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        type WeightInfo: WeightInfo;

        #[cfg(feature = "runtime-benchmarks")]
        type BenchmarkHelper: crate::BenchmarkHelper<Self::AssetId>;
    }

    pub trait WeightInfo {
        fn make_own_balance_publicly_disclosable() -> Weight;
        fn make_balance_publicly_disclosable_for() -> Weight;
    }
    impl WeightInfo for () {
        fn make_own_balance_publicly_disclosable() -> Weight {
            Weight::from_parts(20_000, 0)
        }
        fn make_balance_publicly_disclosable_for() -> Weight {
            Weight::from_parts(20_000, 0)
        }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// handle -> disclosure request (pending or settled tombstone)
    #[pallet::storage]
    pub type PendingRequests<T: Config> =
        StorageMap<_, Blake2_128Concat, Handle, RequestOf<T>, OptionQuery>;

    /// Raised while a state-mutating entry point runs.
    #[pallet::storage]
    pub(super) type Entered<T: Config> = StorageValue<_, bool, ValueQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// `handle` is publicly decryptable and awaits settlement for `beneficiary`.
        DisclosureRequested {
            handle: Handle,
            beneficiary: T::AccountId,
            asset: T::AssetId,
        },
        /// A verified cleartext consumed the request for `handle`.
        DisclosureSettled {
            handle: Handle,
            beneficiary: T::AccountId,
            asset: T::AssetId,
            amount: u64,
        },
        /// The balance handle of `who` is publicly decryptable.
        BalanceDisclosable {
            who: T::AccountId,
            asset: T::AssetId,
            handle: Handle,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// A request (pending or settled) already exists for this handle.
        AlreadyRequested,
        /// No pending request for this handle.
        UnknownOrSettledRequest,
        /// The disclosure proof does not match the handle and cleartext.
        InvalidProof,
        /// The cleartext is not a SCALE-encoded `u64`.
        MalformedCleartext,
        /// The ledger does not know this asset.
        UnknownAsset,
        /// Entry point re-entered while already running.
        Reentrancy,
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Make the caller's own balance of `asset` publicly decryptable.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::make_own_balance_publicly_disclosable())]
        pub fn make_own_balance_publicly_disclosable(
            origin: OriginFor<T>,
            asset: T::AssetId,
        ) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::guarded(|| Self::disclose_balance(asset, who))
        }

        /// Make `who`'s balance of `asset` publicly decryptable.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::make_balance_publicly_disclosable_for())]
        pub fn make_balance_publicly_disclosable_for(
            origin: OriginFor<T>,
            asset: T::AssetId,
            who: T::AccountId,
        ) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            Self::guarded(|| Self::disclose_balance(asset, who))
        }
    }

    impl<T: Config> Pallet<T> {
        pub fn pending_request(handle: &Handle) -> Option<RequestOf<T>> {
            PendingRequests::<T>::get(handle)
        }

        fn guarded<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
            with_entry_lock::<Entered<T>, R>(Error::<T>::Reentrancy.into(), f)
        }

        fn disclose_balance(asset: T::AssetId, who: T::AccountId) -> DispatchResult {
            ensure!(T::Ledger::asset_exists(asset), Error::<T>::UnknownAsset);
            let handle = T::Ledger::balance_of(asset, &who);
            T::Backend::make_publicly_decryptable(&handle);
            Self::deposit_event(Event::BalanceDisclosable { who, asset, handle });
            Ok(())
        }
    }

    impl<T: Config> DisclosureCoordinator<T::AccountId, T::AssetId> for Pallet<T> {
        fn request_disclosure(
            beneficiary: &T::AccountId,
            asset: T::AssetId,
            handle: Handle,
        ) -> Result<Handle, DispatchError> {
            Self::guarded(|| {
                ensure!(
                    !PendingRequests::<T>::contains_key(handle),
                    Error::<T>::AlreadyRequested
                );

                T::Backend::make_publicly_decryptable(&handle);
                PendingRequests::<T>::insert(
                    handle,
                    DisclosureRequest {
                        beneficiary: beneficiary.clone(),
                        asset,
                        requested_at: frame_system::Pallet::<T>::block_number(),
                        status: RequestStatus::Pending,
                    },
                );

                log::debug!(target: LOG_TARGET, "disclosure requested for {:?}", handle);
                Self::deposit_event(Event::DisclosureRequested {
                    handle,
                    beneficiary: beneficiary.clone(),
                    asset,
                });
                Ok(handle)
            })
        }

        fn settle_disclosure(
            handle: &Handle,
            cleartext: &[u8],
            proof: &[u8],
        ) -> Result<SettledDisclosure<T::AccountId, T::AssetId>, DispatchError> {
            Self::guarded(|| {
                let mut request = PendingRequests::<T>::get(handle)
                    .filter(|r| r.is_pending())
                    .ok_or(Error::<T>::UnknownOrSettledRequest)?;

                if !T::Verifier::verify_disclosure(&[*handle], cleartext, proof) {
                    log::warn!(target: LOG_TARGET, "rejected disclosure proof for {:?}", handle);
                    return Err(Error::<T>::InvalidProof.into());
                }
                let amount = u64::decode_all(&mut &cleartext[..])
                    .map_err(|_| Error::<T>::MalformedCleartext)?;

                // Flip before the executor performs any external effect.
                request.status = RequestStatus::Settled;
                PendingRequests::<T>::insert(handle, &request);

                Self::deposit_event(Event::DisclosureSettled {
                    handle: *handle,
                    beneficiary: request.beneficiary.clone(),
                    asset: request.asset,
                    amount,
                });
                Ok(SettledDisclosure {
                    beneficiary: request.beneficiary,
                    asset: request.asset,
                    amount,
                })
            })
        }

        fn is_pending(handle: &Handle) -> bool {
            PendingRequests::<T>::get(handle).is_some_and(|r| r.is_pending())
        }
    }
}
