//! Domain types shared by the form, the service client and the front ends.
//!
//! This module defines:
//!
//! - the ten input fields and their static metadata (`FieldKey`, `FieldSpec`)
//! - raw and validated form records (`FormState`, `FeatureVector`)
//! - submission state (`SubmissionResult`, `Failure`, `Generation`)

pub mod fields;
pub mod result;

pub use fields::*;
pub use result::*;
