use crate::pallet as pallet_confidential_disclosure;
use confidential_disclosure_test_utils::{MockCoprocessor, MockLedger, MockVerifier};
use frame_support::{construct_runtime, derive_impl};
use sp_runtime::BuildStorage;

pub use confidential_disclosure_test_utils::{AccountId, AssetId};

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const ASSET: AssetId = 7;

#[derive_impl(frame_system::config_preludes::TestDefaultConfig)]
impl frame_system::Config for Runtime {
    type Block = frame_system::mocking::MockBlock<Runtime>;
}

impl pallet_confidential_disclosure::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = AssetId;
    type Backend = MockCoprocessor;
    type Ledger = MockLedger;
    type Verifier = MockVerifier;
    type AdminOrigin = frame_system::EnsureRoot<AccountId>;
    type WeightInfo = ();
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper = BenchHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct BenchHelper;
#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AssetId> for BenchHelper {
    fn asset() -> AssetId {
        MockLedger::create_asset(ASSET);
        ASSET
    }
}

construct_runtime!(
    pub enum Runtime {
        System: frame_system,
        ConfidentialDisclosure: pallet_confidential_disclosure,
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
        MockLedger::create_asset(ASSET);
    });
    ext
}
