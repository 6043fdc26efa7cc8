//! Background drain: serialization and block reclamation.

pub(crate) mod flatten;
pub(crate) mod worker;
