//! Benchmarking for `pallet-confidential-disperser`.
//!
//! The batch calls are dominated by the ledger's `transfer_from`, which the
//! runtime's ledger benchmarks cover; their weights are that cost times `n`
//! plus the single ingestion.

use crate::*;
use frame_benchmarking::v2::*;
use frame_support::traits::{EnsureOrigin, Get};

#[benchmarks]
mod benchmarks {
    use super::*;

    #[benchmark]
    fn set_max_batch_size() -> Result<(), BenchmarkError> {
        let origin =
            T::AdminOrigin::try_successful_origin().map_err(|_| BenchmarkError::Weightless)?;
        let new = T::MinBatchSize::get();

        #[extrinsic_call]
        _(origin as T::RuntimeOrigin, new);

        assert_eq!(MaxBatchSize::<T>::get(), new);
        Ok(())
    }

    impl_benchmark_test_suite!(Pallet, crate::mock::new_test_ext(), crate::mock::Runtime);
}
