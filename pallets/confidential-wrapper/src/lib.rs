//! **pallet-confidential-wrapper**
//!
//! Wraps a public asset into a confidential one and redeems it again.
//!
//! - `deposit` pulls a public amount into this pallet's custody account and
//!   mints `amount / rate` confidential units. The remainder below one unit is
//!   kept by custody and reported as `dust`.
//! - `request_withdrawal` burns an encrypted amount immediately and hands the
//!   burned handle to the [`DisclosureCoordinator`]. Nothing is paid yet.
//! - `finalize_withdrawal` is called by any relay once the disclosure service
//!   returned the cleartext of the burned handle. Only handles this pallet
//!   requested are accepted, so requests of other coordinator consumers cannot
//!   draw on its custody. The coordinator verifies and consumes the request,
//!   then `units * rate` of the public asset is pushed to the beneficiary.
//!
//! The push runs in its own storage transaction. When it fails, the request
//! stays settled and the payout is credited to `UnclaimedPayouts` instead; the
//! beneficiary collects it with `claim_payout`.
//!
//! The conversion rate is fixed per wrapper at registration as
//! `10^(underlying decimals - ConfidentialDecimals)`, or 1 when the underlying
//! asset is not finer.

#![cfg_attr(not(feature = "std"), no_std)]

pub use pallet::*;

#[cfg(feature = "runtime-benchmarks")]
mod benchmarking;
#[cfg(test)]
mod mock;

const LOG_TARGET: &str = "runtime::confidential-wrapper";

#[cfg(feature = "runtime-benchmarks")]
pub trait BenchmarkHelper<AssetId> {
    /// A confidential asset known to the ledger and not yet wrapped.
    fn confidential_asset() -> AssetId;
    /// A public asset with metadata.
    fn underlying_asset() -> AssetId;
}

#[frame_support::pallet]
pub mod pallet {
    use super::LOG_TARGET;
    use confidential_disclosure_primitives::{
        conversion_rate, is_zero_account, to_confidential, to_underlying, with_entry_lock,
        AssetMetadataProvider, CiphertextBackend, Cleartext, ConfidentialLedger,
        DisclosureCoordinator, DisclosureProof, EncryptedAmount, Handle, InputProof,
        PublicAssets, ScaleError,
    };
    use frame_support::{
        pallet_prelude::*,
        storage::{with_transaction, TransactionOutcome},
        PalletId,
    };
    use frame_system::pallet_prelude::*;
    use sp_runtime::traits::{AccountIdConversion, Saturating, Zero};

    /// Conversion parameters of one confidential asset.
    #[derive(Clone, Copy, Encode, Decode, TypeInfo, MaxEncodedLen, PartialEq, Eq, RuntimeDebug)]
    pub struct WrapperInfo<AssetId> {
        /// Public asset held in custody.
        pub underlying: AssetId,
        /// Smallest underlying amounts per confidential unit.
        pub rate: u128,
    }

    #[pallet::config]
    pub trait Config: frame_system::Config {
        type RuntimeEvent: From<Event<Self>> + IsType<<Self as frame_system::Config>::RuntimeEvent>;

        /// Identifies both confidential and underlying assets.
        type AssetId: Parameter + Member + Copy + MaxEncodedLen + TypeInfo;

        /// Public balance type of the underlying assets.
        type Balance: Parameter
            + Member
            + Copy
            + Default
            + Zero
            + Saturating
            + MaxEncodedLen
            + TypeInfo
            + Into<u128>
            + TryFrom<u128>;

        type Backend: CiphertextBackend<Self::AccountId, Self::AssetId>;

        type Ledger: ConfidentialLedger<Self::AccountId, Self::AssetId>;

        /// Request/settle state machine for burned handles.
        type Disclosure: DisclosureCoordinator<Self::AccountId, Self::AssetId>;

        type PublicAssets: PublicAssets<Self::AccountId, Self::AssetId, Self::Balance>;

        type Metadata: AssetMetadataProvider<Self::AssetId>;

        /// Decimals of every confidential unit.
        #[pallet::constant]
        type ConfidentialDecimals: Get<u8>;

        /// Derives the custody account holding the underlying assets.
        #[pallet::constant]
        type PalletId: Get<PalletId>;

        /// Origin allowed to register wrappers.
        type AdminOrigin: EnsureOrigin<Self::RuntimeOrigin>;

        type WeightInfo: WeightInfo;

        #[cfg(feature = "runtime-benchmarks")]
        type BenchmarkHelper: crate::BenchmarkHelper<Self::AssetId>;
    }

    pub trait WeightInfo {
        fn register_wrapper() -> Weight;
        fn deposit() -> Weight;
        fn request_withdrawal() -> Weight;
        fn finalize_withdrawal() -> Weight;
        fn claim_payout() -> Weight;
    }
    impl WeightInfo for () {
        fn register_wrapper() -> Weight {
            Weight::from_parts(15_000, 0)
        }
        fn deposit() -> Weight {
            Weight::from_parts(60_000, 0)
        }
        fn request_withdrawal() -> Weight {
            Weight::from_parts(80_000, 0)
        }
        fn finalize_withdrawal() -> Weight {
            Weight::from_parts(70_000, 0)
        }
        fn claim_payout() -> Weight {
            Weight::from_parts(30_000, 0)
        }
    }

    #[pallet::pallet]
    pub struct Pallet<T>(_);

    /// confidential asset -> wrapped public asset and rate
    #[pallet::storage]
    pub type Wrappers<T: Config> =
        StorageMap<_, Blake2_128Concat, T::AssetId, WrapperInfo<T::AssetId>, OptionQuery>;

    /// (underlying, beneficiary) -> payout whose push transfer failed
    #[pallet::storage]
    pub type UnclaimedPayouts<T: Config> = StorageDoubleMap<
        _,
        Blake2_128Concat,
        T::AssetId,
        Blake2_128Concat,
        T::AccountId,
        T::Balance,
        ValueQuery,
    >;

    /// burned handle -> confidential asset, for withdrawals requested here
    #[pallet::storage]
    pub type Withdrawals<T: Config> =
        StorageMap<_, Blake2_128Concat, Handle, T::AssetId, OptionQuery>;

    /// Raised while a state-mutating entry point runs.
    #[pallet::storage]
    pub(super) type Entered<T: Config> = StorageValue<_, bool, ValueQuery>;

    #[pallet::event]
    #[pallet::generate_deposit(pub(super) fn deposit_event)]
    pub enum Event<T: Config> {
        WrapperRegistered {
            asset: T::AssetId,
            underlying: T::AssetId,
            rate: u128,
        },
        /// `amount` of the underlying was taken from `from`; `units` were minted
        /// to `to` and `dust` stays in custody.
        Deposited {
            asset: T::AssetId,
            from: T::AccountId,
            to: T::AccountId,
            amount: T::Balance,
            units: u64,
            dust: T::Balance,
        },
        /// `handle` was burned from `from` and awaits disclosure.
        WithdrawalRequested {
            asset: T::AssetId,
            from: T::AccountId,
            to: T::AccountId,
            handle: Handle,
        },
        WithdrawalFinalized {
            asset: T::AssetId,
            beneficiary: T::AccountId,
            handle: Handle,
            amount: T::Balance,
        },
        /// The payout for `handle` could not be pushed and is claimable.
        PayoutDeferred {
            underlying: T::AssetId,
            beneficiary: T::AccountId,
            handle: Handle,
            amount: T::Balance,
        },
        PayoutClaimed {
            underlying: T::AssetId,
            who: T::AccountId,
            amount: T::Balance,
        },
    }

    #[pallet::error]
    pub enum Error<T> {
        /// The confidential asset has no wrapper.
        NotRegistered,
        AlreadyRegistered,
        /// The ledger does not know this confidential asset.
        UnknownAsset,
        /// The recipient is the zero account.
        InvalidRecipient,
        /// Deposit converts to zero confidential units.
        AmountTooSmall,
        /// Deposit converts to more than `u64::MAX` confidential units.
        AmountTooLarge,
        /// Rate or payout out of range.
        Overflow,
        /// The input proof does not validate the ciphertext.
        InvalidCiphertextProof,
        /// The handle is not a withdrawal awaiting finalization here.
        UnknownWithdrawal,
        /// No deferred payout for this asset and caller.
        NothingToClaim,
        /// Entry point re-entered while already running.
        Reentrancy,
    }

    impl<T> From<ScaleError> for Error<T> {
        fn from(e: ScaleError) -> Self {
            match e {
                ScaleError::TooSmall => Error::AmountTooSmall,
                ScaleError::TooLarge => Error::AmountTooLarge,
                ScaleError::Overflow => Error::Overflow,
            }
        }
    }

    #[pallet::call]
    impl<T: Config> Pallet<T> {
        /// Let `asset` wrap the public asset `underlying`.
        #[pallet::call_index(0)]
        #[pallet::weight(T::WeightInfo::register_wrapper())]
        pub fn register_wrapper(
            origin: OriginFor<T>,
            asset: T::AssetId,
            underlying: T::AssetId,
        ) -> DispatchResult {
            T::AdminOrigin::ensure_origin(origin)?;
            Self::guarded(|| {
                ensure!(T::Ledger::asset_exists(asset), Error::<T>::UnknownAsset);
                ensure!(!Wrappers::<T>::contains_key(asset), Error::<T>::AlreadyRegistered);

                let rate = conversion_rate(
                    T::Metadata::decimals(underlying),
                    T::ConfidentialDecimals::get(),
                )
                .map_err(Error::<T>::from)?;
                Wrappers::<T>::insert(asset, WrapperInfo { underlying, rate });

                Self::deposit_event(Event::WrapperRegistered { asset, underlying, rate });
                Ok(())
            })
        }

        /// Exchange `amount` of the underlying for confidential units credited to `to`.
        #[pallet::call_index(1)]
        #[pallet::weight(T::WeightInfo::deposit())]
        pub fn deposit(
            origin: OriginFor<T>,
            asset: T::AssetId,
            amount: T::Balance,
            to: T::AccountId,
        ) -> DispatchResult {
            let from = ensure_signed(origin)?;
            Self::guarded(|| {
                let info = Self::wrapper(asset)?;
                ensure!(!is_zero_account(&to), Error::<T>::InvalidRecipient);

                let converted =
                    to_confidential(amount.into(), info.rate).map_err(Error::<T>::from)?;
                let dust = Self::balance(converted.dust)?;

                T::PublicAssets::transfer(info.underlying, &from, &Self::account_id(), amount)?;

                let handle = T::Backend::trivial_encrypt(converted.units);
                T::Backend::allow_for_asset(&handle, asset);
                T::Ledger::mint(asset, &to, &handle)?;

                Self::deposit_event(Event::Deposited {
                    asset,
                    from,
                    to,
                    amount,
                    units: converted.units,
                    dust,
                });
                Ok(())
            })
        }

        /// Burn `encrypted_amount` from the caller and request its disclosure.
        /// The payout goes to `to` once finalized.
        #[pallet::call_index(2)]
        #[pallet::weight(T::WeightInfo::request_withdrawal())]
        pub fn request_withdrawal(
            origin: OriginFor<T>,
            asset: T::AssetId,
            encrypted_amount: EncryptedAmount,
            proof: InputProof,
            to: T::AccountId,
        ) -> DispatchResult {
            let from = ensure_signed(origin)?;
            Self::guarded(|| {
                Self::wrapper(asset)?;
                ensure!(!is_zero_account(&to), Error::<T>::InvalidRecipient);

                let handle = T::Backend::ingest(&from, &encrypted_amount, &proof)
                    .map_err(|_| Error::<T>::InvalidCiphertextProof)?;
                T::Backend::allow_for_asset(&handle, asset);

                let burned = T::Ledger::burn(asset, &from, &handle)?;
                let handle = T::Disclosure::request_disclosure(&to, asset, burned)?;
                Withdrawals::<T>::insert(handle, asset);

                log::debug!(target: LOG_TARGET, "withdrawal {:?} requested by {:?}", handle, from);
                Self::deposit_event(Event::WithdrawalRequested { asset, from, to, handle });
                Ok(())
            })
        }

        /// Settle the withdrawal of `handle` with the disclosed `cleartext` and pay out.
        #[pallet::call_index(3)]
        #[pallet::weight(T::WeightInfo::finalize_withdrawal())]
        pub fn finalize_withdrawal(
            origin: OriginFor<T>,
            handle: Handle,
            cleartext: Cleartext,
            proof: DisclosureProof,
        ) -> DispatchResult {
            ensure_signed(origin)?;
            Self::guarded(|| {
                let asset =
                    Withdrawals::<T>::take(handle).ok_or(Error::<T>::UnknownWithdrawal)?;
                let settled = T::Disclosure::settle_disclosure(&handle, &cleartext, &proof)?;
                let info = Self::wrapper(asset)?;
                let amount = to_underlying(settled.amount, info.rate)
                    .map_err(Error::<T>::from)
                    .and_then(|p| Self::balance(p).map_err(|_| Error::<T>::Overflow))?;

                let custody = Self::account_id();
                let pushed = with_transaction(|| {
                    match T::PublicAssets::transfer(
                        info.underlying,
                        &custody,
                        &settled.beneficiary,
                        amount,
                    ) {
                        Ok(()) => TransactionOutcome::Commit(Ok(())),
                        Err(e) => TransactionOutcome::Rollback(Err(e)),
                    }
                });

                match pushed {
                    Ok(()) => Self::deposit_event(Event::WithdrawalFinalized {
                        asset,
                        beneficiary: settled.beneficiary,
                        handle,
                        amount,
                    }),
                    Err(e) => {
                        log::warn!(
                            target: LOG_TARGET,
                            "payout for {:?} deferred: {:?}",
                            handle,
                            e
                        );
                        UnclaimedPayouts::<T>::mutate(info.underlying, &settled.beneficiary, |c| {
                            *c = c.saturating_add(amount)
                        });
                        Self::deposit_event(Event::PayoutDeferred {
                            underlying: info.underlying,
                            beneficiary: settled.beneficiary,
                            handle,
                            amount,
                        });
                    },
                }
                Ok(())
            })
        }

        /// Collect every deferred payout of `underlying` owed to the caller.
        #[pallet::call_index(4)]
        #[pallet::weight(T::WeightInfo::claim_payout())]
        pub fn claim_payout(origin: OriginFor<T>, underlying: T::AssetId) -> DispatchResult {
            let who = ensure_signed(origin)?;
            Self::guarded(|| {
                let amount = UnclaimedPayouts::<T>::take(underlying, &who);
                ensure!(!amount.is_zero(), Error::<T>::NothingToClaim);

                T::PublicAssets::transfer(underlying, &Self::account_id(), &who, amount)?;

                Self::deposit_event(Event::PayoutClaimed { underlying, who, amount });
                Ok(())
            })
        }
    }

    impl<T: Config> Pallet<T> {
        /// Custody account of the underlying assets.
        #[inline]
        pub fn account_id() -> T::AccountId {
            T::PalletId::get().into_account_truncating()
        }

        pub fn wrapper_info(asset: T::AssetId) -> Option<WrapperInfo<T::AssetId>> {
            Wrappers::<T>::get(asset)
        }

        fn wrapper(asset: T::AssetId) -> Result<WrapperInfo<T::AssetId>, Error<T>> {
            Wrappers::<T>::get(asset).ok_or(Error::<T>::NotRegistered)
        }

        fn balance(raw: u128) -> Result<T::Balance, Error<T>> {
            T::Balance::try_from(raw).map_err(|_| Error::<T>::AmountTooLarge)
        }

        fn guarded<R>(f: impl FnOnce() -> Result<R, DispatchError>) -> Result<R, DispatchError> {
            with_entry_lock::<Entered<T>, R>(Error::<T>::Reentrancy.into(), f)
        }
    }
}
