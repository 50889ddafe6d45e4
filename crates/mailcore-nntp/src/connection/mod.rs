//! NNTP connection management.

mod client;
mod stream;

pub use client::{Client, Credentials};
pub use stream::NntpStream;
