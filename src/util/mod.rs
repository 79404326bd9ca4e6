//! Small helpers shared by the loader and the namespace registrar.

pub mod qname;
