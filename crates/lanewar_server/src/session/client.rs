//! Client registry entries.

use lanewar_core::SeatId;

/// Transport-assigned client handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

impl ClientId {
    /// Null client (invalid).
    pub const NULL: Self = Self(0);

    /// True unless this is [`Self::NULL`].
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client{}", self.0)
    }
}

/// A connected client: a seated player or an observer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSlot {
    /// Seat held, `None` for observers.
    pub seat: Option<SeatId>,
    /// Identity from the auth collaborator.
    pub user_id: String,
    /// Display name.
    pub username: String,
}

impl ClientSlot {
    /// True if this client holds no seat.
    #[inline]
    #[must_use]
    pub const fn is_observer(&self) -> bool {
        self.seat.is_none()
    }
}
