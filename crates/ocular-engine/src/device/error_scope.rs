//! Error-scope helpers.
//!
//! wgpu reports resource and pipeline validation failures asynchronously
//! through error scopes. Every GPU allocation that must fail loudly is wrapped
//! here so the failure reaches the component that requested the resource.

/// Runs `f` inside out-of-memory and validation error scopes.
///
/// Returns the closure output together with the first captured error, if any.
/// The closure output must not be used when an error is returned.
pub(crate) fn capture<T>(device: &wgpu::Device, f: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    let oom_scope = device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let validation_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let out = f();

    // Scopes nest; pop innermost first.
    let validation = pollster::block_on(validation_scope.pop());
    let oom = pollster::block_on(oom_scope.pop());

    if let Some(err) = &validation {
        log::debug!("validation scope captured: {err}");
    }
    if let Some(err) = &oom {
        log::debug!("out-of-memory scope captured: {err}");
    }

    (out, validation.or(oom))
}
