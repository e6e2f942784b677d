//! Canonical data model for caseport exports.
//!
//! Every migrator converts into these types, and the downstream importer
//! parses them by field name. Field names and enum strings are part of the
//! contract: do not rename them.

pub mod attribute;
pub mod item;
pub mod root;
pub mod section;
pub mod step;

pub use attribute::{Attribute, AttributeType, AttributeValue, CaseAttribute};
pub use item::{Iteration, Link, Parameter, Priority, SharedStep, State, TestCase};
pub use root::Root;
pub use section::Section;
pub use step::Step;
