pub use super::players::Entity as Players;
pub use super::results::Entity as Results;
pub use super::rooms::Entity as Rooms;
pub use super::rounds::Entity as Rounds;
pub use super::submissions::Entity as Submissions;
