pub mod hibernation;
pub mod ingest_worker;
pub mod udp;

pub use hibernation::*;
pub use ingest_worker::*;
pub use udp::*;
