mod game_client;

pub use game_client::{DynNotifier, DynTransport, GameClient};
