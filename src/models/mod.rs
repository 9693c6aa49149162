pub mod events;
pub mod scores;
pub mod server;
pub mod votes;
