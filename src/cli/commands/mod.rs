pub mod init;
pub mod lineage;
pub mod taxtable;
