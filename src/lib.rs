pub mod codec;
pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;
pub mod system;

pub use engine::{BookingAuthority, Calendar, EngineError, Hotel};
pub use model::{BookingNumber, Reservation, Room, RoomType, Stay};
pub use system::BookingSystem;
