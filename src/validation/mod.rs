/*!
 * Validation of extracted scene results.
 *
 * - `service`: the `ResultValidator` and its `ValidationReport`
 */

pub mod service;

// Re-export main types
pub use service::{ResultValidator, ValidationConfig, ValidationReport};
