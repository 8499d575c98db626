/*!
 * Import of extracted scenes into the relational store.
 */

pub mod importer;

pub use importer::{ImportContext, ImportSummary, Importer};
