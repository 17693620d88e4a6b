//! Mock collaborators for the pallet test runtimes.
//!
//! Ciphertexts are not encrypted: the first eight bytes of an
//! [`EncryptedAmount`] hold the value little-endian. All state lives in
//! unhashed runtime storage so it is rolled back together with the pallet
//! storage when an extrinsic fails.

use std::cell::RefCell;

use confidential_disclosure_primitives::{
    AssetMetadataProvider, CiphertextBackend, Cleartext, ConfidentialLedger, DisclosureProof,
    DisclosureVerifier, EncryptedAmount, Handle, InputProof, PublicAssets,
};
use frame_support::{pallet_prelude::*, storage::unhashed};
use sp_io::hashing::blake2_256;

pub type AccountId = u64;
pub type AssetId = u32;
pub type Balance = u128;

pub const INVALID_CIPHERTEXT_PROOF: DispatchError = DispatchError::Other("InvalidCiphertextProof");
pub const UNKNOWN_HANDLE: DispatchError = DispatchError::Other("UnknownHandle");
pub const HANDLE_NOT_ALLOWED: DispatchError = DispatchError::Other("HandleNotAllowed");
pub const NOT_OPERATOR: DispatchError = DispatchError::Other("NotOperator");
pub const INSUFFICIENT_BALANCE: DispatchError = DispatchError::Other("InsufficientBalance");
pub const INSUFFICIENT_PUBLIC_BALANCE: DispatchError =
    DispatchError::Other("InsufficientPublicBalance");
pub const RECIPIENT_REJECTED: DispatchError = DispatchError::Other("RecipientRejected");

fn key(prefix: &[u8], k: impl Encode) -> Vec<u8> {
    (prefix, k).encode()
}

/// Build a mock ciphertext for `value`. `nonce` makes otherwise equal values
/// produce different handles.
pub fn encrypt(value: u64, nonce: u8) -> EncryptedAmount {
    let mut ct = [0u8; 64];
    ct[..8].copy_from_slice(&value.to_le_bytes());
    ct[8] = nonce;
    ct
}

/// The only proof [`MockCoprocessor::ingest`] accepts for ciphertexts owned by `owner`.
pub fn input_proof(owner: AccountId) -> InputProof {
    blake2_256(&(b"input", owner).encode())
        .to_vec()
        .try_into()
        .expect("32 bytes fit")
}

/// SCALE-encoded cleartext, as returned by the disclosure service.
pub fn cleartext(value: u64) -> Cleartext {
    value.encode().try_into().expect("8 bytes fit")
}

/// Proof the mock disclosure service would attach to `cleartext` for `handles`.
pub fn disclosure_proof(handles: &[Handle], cleartext: &[u8]) -> DisclosureProof {
    blake2_256(&(b"kms", handles.to_vec(), cleartext.to_vec()).encode())
        .to_vec()
        .try_into()
        .expect("32 bytes fit")
}

/// Cleartext and proof for a single handle.
pub fn sign_disclosure(handle: &Handle, value: u64) -> (Cleartext, DisclosureProof) {
    let clear = cleartext(value);
    let proof = disclosure_proof(&[*handle], &clear);
    (clear, proof)
}

// --- Coprocessor ------------------------------------------------------------

pub struct MockCoprocessor;

impl MockCoprocessor {
    pub fn value_of(handle: &Handle) -> Option<u64> {
        unhashed::get(&key(b"mock/ct", handle))
    }

    pub fn is_allowed_for_asset(handle: &Handle, asset: AssetId) -> bool {
        unhashed::get_or_default(&key(b"mock/acl", (handle, asset)))
    }

    fn register(handle: Handle, value: u64) -> Handle {
        unhashed::put(&key(b"mock/ct", handle), &value);
        handle
    }

    fn derive(tag: &[u8], payload: impl Encode) -> Handle {
        blake2_256(&(tag, payload).encode())
    }
}

impl CiphertextBackend<AccountId, AssetId> for MockCoprocessor {
    fn ingest(
        owner: &AccountId,
        ciphertext: &EncryptedAmount,
        proof: &InputProof,
    ) -> Result<Handle, DispatchError> {
        if *proof != input_proof(*owner) {
            return Err(INVALID_CIPHERTEXT_PROOF);
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&ciphertext[..8]);
        Ok(Self::register(blake2_256(ciphertext), u64::from_le_bytes(raw)))
    }

    fn trivial_encrypt(value: u64) -> Handle {
        Self::register(Self::derive(b"trivial", value), value)
    }

    fn allow_for_asset(handle: &Handle, asset: AssetId) {
        unhashed::put(&key(b"mock/acl", (handle, asset)), &true);
    }

    fn make_publicly_decryptable(handle: &Handle) {
        unhashed::put(&key(b"mock/public", handle), &true);
    }

    fn is_publicly_decryptable(handle: &Handle) -> bool {
        unhashed::get_or_default(&key(b"mock/public", handle))
    }
}

// --- Confidential ledger ----------------------------------------------------

pub struct MockLedger;

impl MockLedger {
    pub fn create_asset(asset: AssetId) {
        unhashed::put(&key(b"mock/assets", asset), &true);
    }

    pub fn balance(asset: AssetId, who: AccountId) -> u64 {
        unhashed::get_or_default(&key(b"mock/bal", (asset, who)))
    }

    pub fn set_balance(asset: AssetId, who: AccountId, value: u64) {
        unhashed::put(&key(b"mock/bal", (asset, who)), &value);
    }

    pub fn set_operator(owner: AccountId, operator: AccountId) {
        unhashed::put(&key(b"mock/operator", (owner, operator)), &true);
    }

    fn is_operator(owner: &AccountId, operator: &AccountId) -> bool {
        unhashed::get_or_default(&key(b"mock/operator", (owner, operator)))
    }

    /// Every successful transfer as `(asset, from, to, value)`, in order.
    pub fn transfers() -> Vec<(AssetId, AccountId, AccountId, u64)> {
        unhashed::get_or_default(b"mock/transfers")
    }

    pub fn transfer_count() -> usize {
        Self::transfers().len()
    }

    fn usable_value(asset: AssetId, handle: &Handle) -> Result<u64, DispatchError> {
        let value = MockCoprocessor::value_of(handle).ok_or(UNKNOWN_HANDLE)?;
        ensure!(
            MockCoprocessor::is_allowed_for_asset(handle, asset),
            HANDLE_NOT_ALLOWED
        );
        Ok(value)
    }

    fn debit(asset: AssetId, who: AccountId, value: u64) -> DispatchResult {
        let bal = Self::balance(asset, who);
        let rest = bal.checked_sub(value).ok_or(INSUFFICIENT_BALANCE)?;
        Self::set_balance(asset, who, rest);
        Ok(())
    }

    fn credit(asset: AssetId, who: AccountId, value: u64) {
        Self::set_balance(asset, who, Self::balance(asset, who).saturating_add(value));
    }
}

impl ConfidentialLedger<AccountId, AssetId> for MockLedger {
    fn asset_exists(asset: AssetId) -> bool {
        unhashed::get_or_default(&key(b"mock/assets", asset))
    }

    fn balance_of(asset: AssetId, who: &AccountId) -> Handle {
        let value = Self::balance(asset, *who);
        MockCoprocessor::register(
            MockCoprocessor::derive(b"balance", (asset, who, value)),
            value,
        )
    }

    fn transfer(
        asset: AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: &Handle,
    ) -> Result<Handle, DispatchError> {
        let value = Self::usable_value(asset, amount)?;
        Self::debit(asset, *from, value)?;
        Self::credit(asset, *to, value);
        let mut log = Self::transfers();
        log.push((asset, *from, *to, value));
        unhashed::put(b"mock/transfers", &log);
        Ok(*amount)
    }

    fn transfer_from(
        asset: AssetId,
        spender: &AccountId,
        owner: &AccountId,
        to: &AccountId,
        amount: &Handle,
    ) -> Result<Handle, DispatchError> {
        ensure!(
            spender == owner || Self::is_operator(owner, spender),
            NOT_OPERATOR
        );
        Self::transfer(asset, owner, to, amount)
    }

    fn mint(asset: AssetId, to: &AccountId, amount: &Handle) -> Result<Handle, DispatchError> {
        let value = Self::usable_value(asset, amount)?;
        Self::credit(asset, *to, value);
        Ok(*amount)
    }

    fn burn(asset: AssetId, from: &AccountId, amount: &Handle) -> Result<Handle, DispatchError> {
        let value = Self::usable_value(asset, amount)?;
        Self::debit(asset, *from, value)?;
        Ok(MockCoprocessor::register(
            MockCoprocessor::derive(b"burned", amount),
            value,
        ))
    }
}

// --- Disclosure service -----------------------------------------------------

pub struct MockVerifier;

impl DisclosureVerifier for MockVerifier {
    fn verify_disclosure(handles: &[Handle], cleartext: &[u8], proof: &[u8]) -> bool {
        handles
            .iter()
            .all(MockCoprocessor::is_publicly_decryptable)
            && disclosure_proof(handles, cleartext).as_slice() == proof
    }
}

// --- Public assets ----------------------------------------------------------

thread_local! {
    static ON_TRANSFER: RefCell<Option<Box<dyn FnOnce(AccountId)>>> = RefCell::new(None);
}

pub struct MockPublicAssets;

impl MockPublicAssets {
    pub fn balance(asset: AssetId, who: AccountId) -> Balance {
        unhashed::get_or_default(&key(b"mock/pub", (asset, who)))
    }

    pub fn set_balance(asset: AssetId, who: AccountId, amount: Balance) {
        unhashed::put(&key(b"mock/pub", (asset, who)), &amount);
    }

    /// Make every incoming transfer to `who` fail.
    pub fn reject_incoming(who: AccountId, reject: bool) {
        unhashed::put(&key(b"mock/reject", who), &reject);
    }

    /// Run `hook` with the recipient once, right after the next successful transfer.
    pub fn on_next_transfer(hook: impl FnOnce(AccountId) + 'static) {
        ON_TRANSFER.with(|h| *h.borrow_mut() = Some(Box::new(hook)));
    }

    fn rejects(who: AccountId) -> bool {
        unhashed::get_or_default(&key(b"mock/reject", who))
    }
}

impl PublicAssets<AccountId, AssetId, Balance> for MockPublicAssets {
    fn transfer(
        asset: AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
    ) -> DispatchResult {
        ensure!(!Self::rejects(*to), RECIPIENT_REJECTED);
        let rest = Self::balance(asset, *from)
            .checked_sub(amount)
            .ok_or(INSUFFICIENT_PUBLIC_BALANCE)?;
        Self::set_balance(asset, *from, rest);
        Self::set_balance(asset, *to, Self::balance(asset, *to).saturating_add(amount));

        if let Some(hook) = ON_TRANSFER.with(|h| h.borrow_mut().take()) {
            hook(*to);
        }
        Ok(())
    }
}

// --- Metadata ---------------------------------------------------------------

pub struct MockMetadata;

impl MockMetadata {
    pub fn set_decimals(asset: AssetId, decimals: u8) {
        unhashed::put(&key(b"mock/decimals", asset), &decimals);
    }
}

impl AssetMetadataProvider<AssetId> for MockMetadata {
    fn decimals(asset: AssetId) -> u8 {
        unhashed::get_or_default(&key(b"mock/decimals", asset))
    }
}

/// Clear the transfer hook between tests that share a thread.
pub fn reset_hooks() {
    ON_TRANSFER.with(|h| *h.borrow_mut() = None);
}
