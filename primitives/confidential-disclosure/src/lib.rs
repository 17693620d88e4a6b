//! Types and traits shared by the confidential disclosure, settlement and
//! batch-transfer pallets.
//!
//! The homomorphic backend, the confidential ledger, the disclosure key service
//! and the public asset side are all external to these pallets. They are reached
//! through the traits below and supplied by the runtime.
#![cfg_attr(not(feature = "std"), no_std)]

use frame_support::{pallet_prelude::*, storage::StorageValue, BoundedVec};
use sp_runtime::traits::TrailingZeroInput;

pub mod scale;

pub use scale::{conversion_rate, to_confidential, to_underlying, ScaleError, Truncated};

/// External ciphertext as submitted by a client, before ingestion.
pub type EncryptedAmount = [u8; 64];

/// Opaque reference to an ingested ciphertext. Derived upstream; used as the
/// join key between on-chain requests and the off-chain disclosure service.
pub type Handle = [u8; 32];

/// Validity proof accompanying an external ciphertext.
pub type MaxProofLen = ConstU32<8192>;
pub type InputProof = BoundedVec<u8, MaxProofLen>;

/// Cleartext returned by the disclosure service (SCALE-encoded `u64`).
pub type MaxCleartextLen = ConstU32<256>;
pub type Cleartext = BoundedVec<u8, MaxCleartextLen>;

/// Signature material proving that a cleartext belongs to a handle.
pub type MaxDisclosureProofLen = ConstU32<8192>;
pub type DisclosureProof = BoundedVec<u8, MaxDisclosureProofLen>;

/// Coprocessor that owns ciphertexts and their access lists.
pub trait CiphertextBackend<AccountId, AssetId> {
    /// Validate `proof` for `ciphertext` in the context of `owner` and return the
    /// handle of the ingested value.
    fn ingest(
        owner: &AccountId,
        ciphertext: &EncryptedAmount,
        proof: &InputProof,
    ) -> Result<Handle, DispatchError>;

    /// Encrypt a public value without a proof (used for deposits).
    fn trivial_encrypt(value: u64) -> Handle;

    /// Let the ledger of `asset` operate on `handle`. Must be called before the
    /// ledger touches a handle it did not produce itself.
    fn allow_for_asset(handle: &Handle, asset: AssetId);

    /// Make `handle` eligible for off-chain decryption by anyone. Idempotent.
    fn make_publicly_decryptable(handle: &Handle);

    fn is_publicly_decryptable(handle: &Handle) -> bool;
}

/// Encrypted per-account balances and the confidential transfer primitives.
pub trait ConfidentialLedger<AccountId, AssetId> {
    fn asset_exists(asset: AssetId) -> bool;

    fn balance_of(asset: AssetId, who: &AccountId) -> Handle;

    /// Move `amount` from `from` to `to`. Returns the handle actually transferred.
    fn transfer(
        asset: AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: &Handle,
    ) -> Result<Handle, DispatchError>;

    /// Move `amount` out of `owner` on behalf of `spender`.
    fn transfer_from(
        asset: AssetId,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: &Handle,
    ) -> Result<Handle, DispatchError>;

    fn mint(asset: AssetId, to: &AccountId, amount: &Handle) -> Result<Handle, DispatchError>;

    /// Burn `amount` from `from`. Returns the handle of the burned amount.
    fn burn(asset: AssetId, from: &AccountId, amount: &Handle) -> Result<Handle, DispatchError>;
}

/// Verifier for cleartexts signed by the disclosure service.
pub trait DisclosureVerifier {
    /// True iff `cleartext` is the genuine plaintext of `handles` under `proof`.
    fn verify_disclosure(handles: &[Handle], cleartext: &[u8], proof: &[u8]) -> bool;
}

/// Public side of an asset that confidential units are redeemed for.
pub trait PublicAssets<AccountId, AssetId, Balance> {
    fn transfer(
        asset: AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> DispatchResult;
}

/// Metadata provider per asset.
pub trait AssetMetadataProvider<AssetId> {
    fn decimals(asset: AssetId) -> u8;
}

/// Lifecycle of a disclosure request.
#[derive(Clone, Copy, Encode, Decode, TypeInfo, MaxEncodedLen, PartialEq, Eq, RuntimeDebug)]
pub enum RequestStatus {
    /// Waiting for the off-chain cleartext and proof.
    Pending,
    /// Consumed by a successful settlement. Kept so the handle cannot be replayed.
    Settled,
}

/// Pending disclosure bookkeeping, keyed by handle.
#[derive(Clone, Encode, Decode, TypeInfo, MaxEncodedLen, PartialEq, Eq, RuntimeDebug)]
pub struct DisclosureRequest<AccountId, AssetId, BlockNumber> {
    pub beneficiary: AccountId,
    pub asset: AssetId,
    pub requested_at: BlockNumber,
    pub status: RequestStatus,
}

impl<AccountId, AssetId, BlockNumber> DisclosureRequest<AccountId, AssetId, BlockNumber> {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Result of a verified settlement, handed to the executor that pays out.
#[derive(Clone, Encode, Decode, TypeInfo, PartialEq, Eq, RuntimeDebug)]
pub struct SettledDisclosure<AccountId, AssetId> {
    pub beneficiary: AccountId,
    pub asset: AssetId,
    pub amount: u64,
}

/// Trait so executor pallets can drive the disclosure state machine without
/// extrinsics.
pub trait DisclosureCoordinator<AccountId, AssetId> {
    /// Mark `handle` publicly decryptable and record a pending request for
    /// `beneficiary`. Returns the handle to correlate off-chain.
    fn request_disclosure(
        beneficiary: &AccountId,
        asset: AssetId,
        handle: Handle,
    ) -> Result<Handle, DispatchError>;

    /// Verify `(handle, cleartext, proof)` and consume the pending request.
    /// The request is marked settled before this returns, so any payout the
    /// caller performs afterwards cannot settle it a second time.
    fn settle_disclosure(
        handle: &Handle,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<SettledDisclosure<AccountId, AssetId>, DispatchError>;

    fn is_pending(handle: &Handle) -> bool;
}

/// Run `f` with the entry flag `Lock` raised. A nested entry while the flag is
/// up fails with `locked`.
pub fn with_entry_lock<Lock, R>(
    locked: DispatchError,
    f: impl FnOnce() -> Result<R, DispatchError>,
) -> Result<R, DispatchError>
where
    Lock: StorageValue<bool, Query = bool>,
{
    if Lock::get() {
        return Err(locked);
    }
    Lock::put(true);
    let out = f();
    Lock::kill();
    out
}

/// The all-zero account, treated as the null recipient.
pub fn is_zero_account<AccountId: Decode + PartialEq>(who: &AccountId) -> bool {
    AccountId::decode(&mut TrailingZeroInput::zeroes())
        .map(|zero| &zero == who)
        .unwrap_or(false)
}
