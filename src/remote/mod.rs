//! Outbound connections to remote console viewers.
pub mod client;
pub mod message;

pub use client::{
    ClientCredentials, RemoteClient, CLIENT_ID_HEADER, CLIENT_NAME_HEADER, PASSWORD_HEADER,
};
pub use message::RemoteMessage;
