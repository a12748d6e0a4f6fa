/// Router Module Index
///
/// Organizes the portal's routing into access-segregated modules. Access
/// control is applied at the module level with Axum route layers, so a
/// protected endpoint can never be mounted without its gate.

/// Routes accessible without a session: entry, auth flows, language.
pub mod public;

/// Routes available to any established session regardless of role.
pub mod authenticated;

/// The user dashboard. Requires a session whose resolved role is `user`;
/// administrators are redirected to their own console.
pub mod user;

/// The admin console. Requires a session whose resolved role is `admin`.
pub mod admin;
