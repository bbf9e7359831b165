// ── Input limits ─────────────────────────────────────────────────

/// Longest guest name accepted on a reservation.
pub const MAX_GUEST_NAME_LEN: usize = 256;

/// Longest hotel display name.
pub const MAX_HOTEL_NAME_LEN: usize = 256;

/// Rooms a single roster may declare.
pub const MAX_ROOMS_PER_HOTEL: usize = 10_000;

/// Hotels a single data directory may hold.
pub const MAX_HOTELS: usize = 1_000;

/// Booking numbers accepted by one receipt request.
pub const MAX_RECEIPT_NUMBERS: usize = 1_000;

/// Calendar years a single stay may touch.
pub const MAX_STAY_YEARS: usize = 5;
