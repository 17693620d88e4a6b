use crate::pallet as pallet_confidential_disperser;
use confidential_disclosure_test_utils::{MockCoprocessor, MockLedger};
use frame_support::{
    construct_runtime, derive_impl, parameter_types,
    traits::{ConstU32, Hooks},
    PalletId,
};
use sp_runtime::BuildStorage;

pub use confidential_disclosure_test_utils::{AccountId, AssetId};

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const CHARLIE: AccountId = 3;
pub const DAVE: AccountId = 4;
pub const ASSET: AssetId = 7;
pub const UNKNOWN_ASSET: AssetId = 99;

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Runtime {
    type Block = frame_system::mocking::MockBlock<Runtime>;
}

parameter_types! {
    pub const DisperserPalletId: PalletId = PalletId(*b"CaDisper");
}
impl pallet_confidential_disperser::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = AssetId;
    type Backend = MockCoprocessor;
    type Ledger = MockLedger;
    type PalletId = DisperserPalletId;
    type AdminOrigin = frame_system::EnsureRoot<AccountId>;
    type MinBatchSize = ConstU32<2>;
    type MaxBatchSizeCap = ConstU32<50>;
    type DefaultMaxBatchSize = ConstU32<50>;
    type WeightInfo = ();
}

construct_runtime!(
    pub enum Runtime {
        System: frame_system,
        ConfidentialDisperser: pallet_confidential_disperser,
    }
);

// Build a fresh externalities for each test.
pub fn new_test_ext() -> sp_io::TestExternalities {
    let t = frame_system::GenesisConfig::<Runtime>::default()
        .build_storage()
        .unwrap();
    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| {
        System::set_block_number(1);
        ConfidentialDisperser::integrity_test();
        MockLedger::create_asset(ASSET);
    });
    ext
}

/// Fund `who` and approve the disperser as its operator.
pub fn fund_sender(who: AccountId, value: u64) {
    MockLedger::set_balance(ASSET, who, value);
    MockLedger::set_operator(who, ConfidentialDisperser::account_id());
}
