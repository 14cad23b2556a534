use crate::db::BookingStore;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};

/// How an actor relates to a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Provider,
}

impl Role {
    pub fn of(booking: &Booking, actor_id: &str) -> Option<Role> {
        if booking.provider_id == actor_id {
            Some(Role::Provider)
        } else if booking.client_id == actor_id {
            Some(Role::Client)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Transition {
    pub from: BookingStatus,
    pub to: BookingStatus,
    pub roles: &'static [Role],
}

const PROVIDER_ONLY: &[Role] = &[Role::Provider];
const EITHER_PARTY: &[Role] = &[Role::Client, Role::Provider];

/// Every legal move. Statuses with no outgoing entry are terminal.
pub const TRANSITIONS: &[Transition] = &[
    Transition { from: BookingStatus::Pending, to: BookingStatus::Accepted, roles: PROVIDER_ONLY },
    Transition { from: BookingStatus::Pending, to: BookingStatus::Rejected, roles: PROVIDER_ONLY },
    Transition { from: BookingStatus::Pending, to: BookingStatus::Cancelled, roles: EITHER_PARTY },
    Transition { from: BookingStatus::Accepted, to: BookingStatus::Completed, roles: PROVIDER_ONLY },
    Transition { from: BookingStatus::Accepted, to: BookingStatus::Cancelled, roles: EITHER_PARTY },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("Invalid status. Valid values: accepted, rejected, cancelled, completed")]
    InvalidTarget,

    #[error("You don't have permission to mark this booking as {0}")]
    NotPermitted(&'static str),

    #[error("Cannot move a {from} booking to {to}")]
    Unreachable { from: &'static str, to: &'static str },
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotPermitted(_) => AppError::Unauthorized(err.to_string()),
            TransitionError::InvalidTarget | TransitionError::Unreachable { .. } => {
                AppError::BadRequest(err.to_string())
            }
        }
    }
}

/// Checks the actor rule first, then reachability from `current`.
pub fn check_transition(
    current: BookingStatus,
    target: BookingStatus,
    role: Option<Role>,
) -> Result<(), TransitionError> {
    let mut into_target = TRANSITIONS.iter().filter(|t| t.to == target).peekable();
    if into_target.peek().is_none() {
        return Err(TransitionError::InvalidTarget);
    }

    let permitted = role.is_some_and(|r| {
        TRANSITIONS
            .iter()
            .any(|t| t.to == target && t.roles.contains(&r))
    });
    if !permitted {
        return Err(TransitionError::NotPermitted(target.as_str()));
    }

    if !into_target.any(|t| t.from == current) {
        return Err(TransitionError::Unreachable {
            from: current.as_str(),
            to: target.as_str(),
        });
    }
    Ok(())
}

/// Applies a status change requested by `actor_id`.
///
/// The write is conditioned on the actor and on the status validated here,
/// so a concurrent change in between surfaces as `NotFound` rather than a
/// lost update.
pub fn update_booking_status(
    bookings: &dyn BookingStore,
    booking_id: &str,
    new_status: &str,
    actor_id: &str,
) -> Result<BookingStatus, AppError> {
    let booking = bookings
        .get_booking(booking_id)
        .map_err(|e| AppError::internal("Failed to get booking", e))?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let target = BookingStatus::parse(new_status).ok_or(TransitionError::InvalidTarget)?;
    check_transition(booking.status, target, Role::of(&booking, actor_id))?;

    let rows = bookings
        .set_booking_status(&booking.id, booking.status, target, actor_id)
        .map_err(|e| AppError::internal("Failed to update booking status", e))?;
    if rows == 0 {
        return Err(AppError::NotFound(
            "Booking not found or you don't have permission".to_string(),
        ));
    }

    tracing::info!(
        booking_id = %booking.id,
        from = booking.status.as_str(),
        to = target.as_str(),
        actor_id,
        "booking status updated"
    );
    Ok(target)
}
