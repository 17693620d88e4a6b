//! Benchmarking for `pallet-confidential-disclosure`.
//!
//! Both extrinsics are a ledger read plus one coprocessor call; the
//! settlement path is only reachable through `DisclosureCoordinator` and is
//! accounted for in the executor pallet's weights.

use crate::*;
use frame_benchmarking::v2::*;
use frame_support::traits::EnsureOrigin;
use frame_system::RawOrigin;

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn make_own_balance_publicly_disclosable() {
        let who: T::AccountId = whitelisted_caller();
        let asset = <T::BenchmarkHelper as BenchmarkHelper<T::AssetId>>::asset();

        #[extrinsic_call]
        _(RawOrigin::Signed(who), asset);
    }

    #[benchmark]
    fn make_balance_publicly_disclosable_for() -> Result<(), BenchmarkError> {
        let origin =
            T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let who: T::AccountId = account("holder", 0, 0);
        let asset = <T::BenchmarkHelper as BenchmarkHelper<T::AssetId>>::asset();

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, asset, who);

        Ok(())
    }

    impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Runtime);
}
