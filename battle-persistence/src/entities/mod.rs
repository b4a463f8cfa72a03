pub mod players;
pub mod prelude;
pub mod results;
pub mod rooms;
pub mod rounds;
pub mod submissions;
