/// Annotation bundle directories.
pub mod bundle;
