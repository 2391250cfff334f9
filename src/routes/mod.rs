/// Router Module Index
///
/// Splits the routing table by access level. The gate is applied once, as a layer over the
/// whole authenticated router, so a protected route cannot be registered without it.

/// Routes reachable without a session (health, login, refresh).
pub mod public;

/// Routes behind the `AuthAdmin` gate.
pub mod authenticated;
