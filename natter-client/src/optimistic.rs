use std::{cell::RefCell, future::Future};

use crate::api::Error;

/// Runs one optimistic mutation over `state`.
///
/// `snapshot` and `apply` run back-to-back under a single borrow, before the
/// remote call is awaited. Then exactly one of `reconcile` (on success) or
/// `revert` (on failure, with the snapshot) runs, and the value `reconcile`
/// returns is handed back. No borrow is held across the await, so other
/// mutations may interleave while this one is in flight.
pub async fn optimistic<St, Snap, R, T, Fut>(
    state: &RefCell<St>,
    what: &'static str,
    snapshot: impl FnOnce(&St) -> Snap,
    apply: impl FnOnce(&mut St),
    remote: Fut,
    reconcile: impl FnOnce(&mut St, R) -> T,
    revert: impl FnOnce(&mut St, Snap),
) -> Result<T, Error>
where
    Fut: Future<Output = Result<R, Error>>,
{
    let snap = {
        let mut st = state.borrow_mut();
        let snap = snapshot(&st);
        apply(&mut st);
        snap
    };
    tracing::debug!(what, "optimistic mutation applied");
    match remote.await {
        Ok(res) => {
            let out = reconcile(&mut state.borrow_mut(), res);
            tracing::debug!(what, "optimistic mutation committed");
            Ok(out)
        }
        Err(err) => {
            revert(&mut state.borrow_mut(), snap);
            tracing::warn!(what, %err, "optimistic mutation rolled back");
            Err(err)
        }
    }
}
