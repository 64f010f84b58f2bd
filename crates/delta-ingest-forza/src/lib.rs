//! Forza "Data Out" UDP source.

mod decode;
mod udp;

pub use decode::{decode, DecodeError};
pub use udp::{ForzaConfig, ForzaSource, MAX_DATAGRAM, RECV_TIMEOUT};
