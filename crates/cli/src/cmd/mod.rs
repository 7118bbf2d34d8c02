pub mod fmt;
pub mod gen_driftignore;
pub mod scan;
