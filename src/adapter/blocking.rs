//! Blocking bridge over the asynchronous adapter operations.

use core::future::Future;

use crate::errors::Error;

/// Drives `future` to completion on a fresh current-thread runtime.
///
/// # Errors
///
/// * `BlockingInAsyncContext` - If the calling thread already drives a tokio
///   runtime, which cannot be blocked; `future` is dropped unpolled.
/// * `Runtime` - If the runtime cannot be built.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, Error> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Error::BlockingInAsyncContext);
    }
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    Ok(runtime.block_on(future))
}
