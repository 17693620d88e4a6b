//! **pallet-confidential-disperser**
//!
//! Sends encrypted amounts from one sender to many recipients in a single
//! extrinsic. Either every recipient is credited or the whole call reverts.
//!
//! - `send_same_amount`: one ciphertext, ingested once, transferred to every
//!   recipient through the same handle.
//! - `send_different_amounts`: one ciphertext per recipient, all validated
//!   under a shared input proof before the first transfer.
//!
//! Transfers are executed by the ledger as `transfer_from` with this pallet's
//! account as spender, so senders must have approved it as an operator.
//!
//! The recipient count is bounded by `MinBatchSize` and the admin-tunable
//! `MaxBatchSize` (itself capped by `MaxBatchSizeCap`). Duplicate recipients
//! are allowed and each occurrence gets its own transfer.
//!
//! `rescue` lets `AdminOrigin` move tokens that were sent to the pallet's own
//! account by mistake.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;
#[cfg(test)]
mod mock;

const LOG_TARGET: &str = "runtime::confidential-disperser";

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use confidential_disclosure_primitives::{
        is_zero_account, with_entry_lock, CiphertextBackend, ConfidentialLedger, EncryptedAmount,
        Handle, InputProof,
    };
    use frame_support::{pallet_prelude::*, PalletId};
    use frame_system::pallet_prelude::*;
    use sp_runtime::traits::AccountIdConversion;
    use sp_std::prelude::*;

    pub type RecipientsOf<T> =
        BoundedVec<<T as frame_system::Config>::AccountId, <T as Config>::MaxBatchSizeCap>;
    pub type AmountsOf<T> = BoundedVec<EncryptedAmount, <T as Config>::MaxBatchSizeCap>;

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        type AssetId: Parameter + Member + Copy + MaxEncodedLen + TypeInfo;

        /// Coprocessor that ingests ciphertexts and grants handle usage.
        type Backend: CiphertextBackend<Self::AccountId, Self::AssetId>;

        /// Confidential ledger executing the transfers.
        type Ledger: ConfidentialLedger<Self::AccountId, Self::AssetId>;

        /// Derives the pallet account used as spender and custody.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Origin allowed to tune the batch size and rescue custody.
        type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        /// Smallest accepted recipient list.
        #[pallet::constant]
        type MinBatchSize: Get<u32>;

        /// Hard upper bound for `MaxBatchSize`; also bounds call arguments.
        #[pallet::constant]
        type MaxBatchSizeCap: Get<u32>;

        /// `MaxBatchSize` until the admin changes it.
        #[pallet::constant]
        type DefaultMaxBatchSize: Get<u32>;

        type WeightInfo: WeightInfo;
    }

    pub trait WeightInfo {
        fn send_same_amount(n: u32) -> Weight;
        fn send_different_amounts(n: u32) -> Weight;
        fn set_max_batch_size() -> Weight;
        fn rescue() -> Weight;
    }
    impl WeightInfo for () {
        fn send_same_amount(n: u32) -> Weight {
            Weight::from_parts(30_000, 0)
                .saturating_add(Weight::from_parts(25_000, 0).saturating_mul(n.into()))
        }
        fn send_different_amounts(n: u32) -> Weight {
            Weight::from_parts(30_000, 0)
                .saturating_add(Weight::from_parts(40_000, 0).saturating_mul(n.into()))
        }
        fn set_max_batch_size() -> Weight {
            Weight::from_parts(10_000, 0)
        }
        fn rescue() -> Weight {
            Weight::from_parts(40_000, 0)
        }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    #[pallet::type_value]
    pub fn DefaultMaxBatch<T: Config>() -> u32 {
        T::DefaultMaxBatchSize::get()
    }

    /// Largest accepted recipient list.
    #[pallet::storage]
    pub type MaxBatchSize<T: Config> = StorageValue<_, u32, ValueQuery, DefaultMaxBatch<T>>;

    /// Raised while a state-mutating entry point runs.
    #[pallet::storage]
    pub(super) type Entered<T: Config> = StorageValue<_, bool, ValueQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        /// `sender` paid every entry of `recipients` (duplicates included).
        BatchTransferred {
            asset: T::AssetId,
            sender: T::AccountId,
            recipients: RecipientsOf<T>,
        },
        MaxBatchSizeUpdated { old: u32, new: u32 },
        /// Custody of this pallet was moved to `to`.
        Rescued {
            asset: T::AssetId,
            to: T::AccountId,
            handle: Handle,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// The ledger does not know this asset.
        UnknownAsset,
        /// Fewer recipients than `MinBatchSize`.
        BatchTooSmall,
        /// More recipients than `MaxBatchSize`.
        BatchTooLarge,
        /// A recipient is the zero account.
        InvalidRecipient,
        /// Recipient and amount lists differ in length.
        LengthMismatch,
        /// The input proof does not validate the ciphertext(s).
        InvalidCiphertextProof,
        /// New max batch size outside `MinBatchSize..=MaxBatchSizeCap`.
        InvalidMaxBatchSize,
        /// Entry point re-entered while already running.
        Reentrancy,
    }

    #[pallet::hooks]
    impl<T: Config> Hooks<BlockNumberFor<T>> for Pallet<T> {
        fn integrity_test() {
            let min = T::MinBatchSize::get();
            assert!(min >= 1, "MinBatchSize must be at least 1");
            assert!(
                (min..=T::MaxBatchSizeCap::get()).contains(&T::DefaultMaxBatchSize::get()),
                "DefaultMaxBatchSize must lie within MinBatchSize..=MaxBatchSizeCap"
            );
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Transfer the same encrypted amount to every entry of `recipients`.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::send_same_amount(recipients.len() as u32))]
        pub fn send_same_amount(
            origin: OriginFor<T>,
            asset: T::AssetId,
            recipients: RecipientsOf<T>,
            encrypted_amount: EncryptedAmount,
            proof: InputProof,
        ) -> DispatchResult {
            let sender = ensure_signed(origin)?;
            Self::guarded(|| {
                Self::validate_batch(asset, &recipients)?;

                let handle = Self::ingest(asset, &sender, &encrypted_amount, &proof)?;
                let spender = Self::account_id();
                for to in recipients.iter() {
                    T::Ledger::transfer_from(asset, &spender, &sender, to, &handle)?;
                }

                log::debug!(
                    target: LOG_TARGET,
                    "batch of {} same-amount transfers from {:?}",
                    recipients.len(),
                    sender
                );
                Self::deposit_event(Event::BatchTransferred { asset, sender, recipients });
                Ok(())
            })
        }

        /// Transfer `amounts[i]` to `recipients[i]`, all amounts validated by `proof`.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::send_different_amounts(recipients.len() as u32))]
        pub fn send_different_amounts(
            origin: OriginFor<T>,
            asset: T::AssetId,
            recipients: RecipientsOf<T>,
            amounts: AmountsOf<T>,
            proof: InputProof,
        ) -> DispatchResult {
            let sender = ensure_signed(origin)?;
            Self::guarded(|| {
                Self::validate_batch(asset, &recipients)?;
                ensure!(recipients.len() == amounts.len(), Error::<T>::LengthMismatch);

                let handles = amounts
                    .iter()
                    .map(|ct| Self::ingest(asset, &sender, ct, &proof))
                    .collect::<Result<Vec<_>, _>>()?;

                let spender = Self::account_id();
                for (to, handle) in recipients.iter().zip(handles.iter()) {
                    T::Ledger::transfer_from(asset, &spender, &sender, to, handle)?;
                }

                log::debug!(
                    target: LOG_TARGET,
                    "batch of {} transfers from {:?}",
                    recipients.len(),
                    sender
                );
                Self::deposit_event(Event::BatchTransferred { asset, sender, recipients });
                Ok(())
            })
        }

        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::set_max_batch_size())]
        pub fn set_max_batch_size(origin: OriginFor<T>, new: u32) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            Self::guarded(|| {
                ensure!(
                    (T::MinBatchSize::get()..=T::MaxBatchSizeCap::get()).contains(&new),
                    Error::<T>::InvalidMaxBatchSize
                );
                let old = MaxBatchSize::<T>::get();
                MaxBatchSize::<T>::put(new);
                Self::deposit_event(Event::MaxBatchSizeUpdated { old, new });
                Ok(())
            })
        }

        /// Move `encrypted_amount` of `asset` held by this pallet's account to `to`.
        /// The ciphertext proof must be bound to the pallet account.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::rescue())]
        pub fn rescue(
            origin: OriginFor<T>,
            asset: T::AssetId,
            to: T::AccountId,
            encrypted_amount: EncryptedAmount,
            proof: InputProof,
        ) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            Self::guarded(|| {
                ensure!(T::Ledger::asset_exists(asset), Error::<T>::UnknownAsset);
                ensure!(!is_zero_account(&to), Error::<T>::InvalidRecipient);

                let custody = Self::account_id();
                let handle = Self::ingest(asset, &custody, &encrypted_amount, &proof)?;
                T::Ledger::transfer(asset, &custody, &to, &handle)?;

                log::info!(target: LOG_TARGET, "rescued custody to {:?}", to);
                Self::deposit_event(Event::Rescued { asset, to, handle });
                Ok(())
            })
        }
    }

    impl<T: Config> Pallet<T> {
        #[inline]
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }

        fn guarded<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
            with_entry_lock::<Entered<T>, R>(Error::<T>::Reentrancy.into(), f)
        }

        /// All checks that must pass before the first transfer.
        fn validate_batch(asset: T::AssetId, recipients: &RecipientsOf<T>) -> DispatchResult {
            ensure!(T::Ledger::asset_exists(asset), Error::<T>::UnknownAsset);
            let n = recipients.len() as u32;
            ensure!(n >= T::MinBatchSize::get(), Error::<T>::BatchTooSmall);
            ensure!(n <= MaxBatchSize::<T>::get(), Error::<T>::BatchTooLarge);
            ensure!(
                !recipients.iter().any(|who| is_zero_account(who)),
                Error::<T>::InvalidRecipient
            );
            Ok(())
        }

        /// Ingest `ciphertext` for `owner` and let the ledger of `asset` use it.
        fn ingest(
            asset: T::AssetId,
            owner: &T::AccountId,
            ciphertext: &EncryptedAmount,
            proof: &InputProof,
        ) -> Result<Handle, DispatchError> {
            let handle = T::Backend::ingest(owner, ciphertext, proof)
                .map_err(|_| Error::<T>::InvalidCiphertextProof)?;
            T::Backend::allow_for_asset(&handle, asset);
            Ok(handle)
        }
    }
}
