pub mod room_repository;
pub mod round_repository;

pub use room_repository::RoomRepository;
pub use round_repository::RoundRepository;
