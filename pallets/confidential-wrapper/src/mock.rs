use crate::pallet as pallet_confidential_wrapper;
use confidential_disclosure_test_utils::{
    reset_hooks, MockCoprocessor, MockLedger, MockMetadata, MockPublicAssets, MockVerifier,
};
use frame_support::{
    assert_ok, construct_runtime, derive_impl, parameter_types, traits::ConstU8, PalletId,
};
use sp_runtime::BuildStorage;

pub use confidential_disclosure_test_utils::{AccountId, AssetId, Balance};

pub const ALICE: AccountId = 1;
pub const BOB: AccountId = 2;
pub const RELAYER: AccountId = 9;

/// Confidential asset, 6 decimals.
pub const CUSD: AssetId = 7;
/// Public asset wrapped by `CUSD`, 18 decimals.
pub const USD: AssetId = 1_000;
/// Smallest `USD` amounts per `CUSD` unit.
pub const RATE: Balance = 1_000_000_000_000;

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

parameter_types! {
    pub const WrapperPalletId: PalletId = PalletId(*b"CaWrappr");
}
impl pallet_confidential_wrapper::Config for Runtime {
    type RuntimeEvent = RuntimeEvent;
    type AssetId = AssetId;
    type Balance = Balance;
    type Backend = MockCoprocessor;
    type Ledger = MockLedger;
    type Disclosure = ConfidentialDisclosure;
    type PublicAssets = MockPublicAssets;
    type Metadata = MockMetadata;
    type ConfidentialDecimals = ConstU8<6>;
    type PalletId = WrapperPalletId;
    type AdminOrigin = frame_system::EnsureRoot<AccountId>;
    type WeightInfo = ();
    #[cfg(feature = "runtime-benchmarks")]
    type BenchmarkHelper = BenchHelper;
}

#[cfg(feature = "runtime-benchmarks")]
pub struct BenchHelper;
#[cfg(feature = "runtime-benchmarks")]
impl pallet_confidential_disclosure::BenchmarkHelper<AssetId> for BenchHelper {
    fn asset() -> AssetId {
        CUSD
    }
}
#[cfg(feature = "runtime-benchmarks")]
impl crate::BenchmarkHelper<AssetId> for BenchHelper {
    fn confidential_asset() -> AssetId {
        MockLedger::create_asset(70);
        70
    }
    fn underlying_asset() -> AssetId {
        MockMetadata::set_decimals(700, 12);
        700
    }
}

construct_runtime!(
    pub enum Runtime {
        System: frame_system,
        ConfidentialDisclosure: pallet_confidential_disclosure,
        ConfidentialWrapper: pallet_confidential_wrapper,
    }
);

// Build a fresh externalities for each test, with `CUSD` wrapping `USD`.
pub fn new_test_ext() -> sp_io::TestExternalities {
    let t = frame_system::GenesisConfig::<Runtime>::default()
        .build_storage()
        .unwrap();
    let mut ext = sp_io::TestExternalities::new(t);
    ext.execute_with(|| {
        System::set_block_number(1);
        reset_hooks();
        MockLedger::create_asset(CUSD);
        MockMetadata::set_decimals(USD, 18);
        assert_ok!(ConfidentialWrapper::register_wrapper(
            RuntimeOrigin::root(),
            CUSD,
            USD
        ));
    });
    ext
}
