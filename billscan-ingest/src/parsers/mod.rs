pub mod sections;
pub mod tables;
