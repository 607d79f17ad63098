//! Contract for platform interception hooks.

/// Routes outgoing HTTP requests into the engine while loaded.
///
/// Implementations are platform glue (protocol handler registration,
/// transport test doubles, client middleware) and live outside this
/// crate: they capture a reference to an engine and feed every
/// intercepted request into its dispatch entry point, translating the
/// resulting response or failure back into transport-layer effects.
/// Cookie handling and redirect interpretation (3xx with a `Location`
/// header, excluding 304/305) are hook responsibilities.
pub trait HttpClientHook: Send + Sync {
    /// Installs the hook so that subsequently issued requests are routed
    /// to the engine instead of the real transport.
    ///
    /// The engine calls this once per stopped-to-running transition;
    /// implementations should tolerate redundant calls without
    /// corrupting state.
    fn load(&self);

    /// Reverses [`load`](HttpClientHook::load), restoring default
    /// transport behavior.
    fn unload(&self);

    /// The hook kind. Registration de-duplicates on this value, so of
    /// two hooks of the same kind only the first stays registered.
    fn name(&self) -> &str;
}
