//! Benchmarking for `pallet-confidential-wrapper`.
//!
//! Only registration is measured here. The other calls are bounded by the
//! ledger, coprocessor and public asset implementations the runtime plugs in.

use crate::*;
use frame_benchmarking::v2::*;
use frame_support::traits::EnsureOrigin;

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn register_wrapper() -> Result<(), BenchmarkError> {
        let origin =
            T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let asset = <T::BenchmarkHelper as BenchmarkHelper<T::AssetId>>::confidential_asset();
        let underlying = <T::BenchmarkHelper as BenchmarkHelper<T::AssetId>>::underlying_asset();

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, asset, underlying);

        assert!(Wrappers::<T>::contains_key(asset));
        Ok(())
    }

    impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Runtime);
}
