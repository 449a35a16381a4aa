/// Config for a container
/// ## Fields
/// - `defer_acyclic_verification`:
///   If `true`, registration doesn't verify that the new provider keeps the dependency graph acyclic.
///
///   Cycles are still detected, but only when a value taking part in the cycle is resolved,
///   which makes registration of large graphs cheaper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub defer_acyclic_verification: bool,
}
