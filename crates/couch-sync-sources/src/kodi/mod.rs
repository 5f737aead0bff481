mod client;
mod convert;

pub use client::KodiClient;
