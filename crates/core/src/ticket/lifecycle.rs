//! The ticket state machine.
//!
//! Legal transitions (initial state on purchase is PENDING/PURCHASE):
//!
//! ```text
//! (PENDING, PURCHASE) --confirm--------> (CONFIRMED, PURCHASE)   staff
//! (PENDING, *)        --cancel---------> (CANCELLED, *)          staff
//! (PENDING, *)        --request_return-> (PENDING, RETURN)       owner
//! (*, RETURN)         --approve_return-> (RETURNED, RETURN)      staff
//! ```
//!
//! Everything else is `InvalidTransition`. The functions here are pure;
//! persistence happens in the coordinator after a transition is accepted.

use crate::error::BookingError;
use crate::ticket::{RequestType, Ticket, TicketAction, TicketStatus};

/// Apply a staff action to a ticket, returning the resulting
/// (status, request type) pair.
pub fn apply_staff_action(
    ticket: &Ticket,
    action: TicketAction,
) -> Result<(TicketStatus, RequestType), BookingError> {
    match (action, ticket.status, ticket.request_type) {
        (TicketAction::Confirm, TicketStatus::Pending, RequestType::Purchase) => {
            Ok((TicketStatus::Confirmed, RequestType::Purchase))
        }
        (TicketAction::Cancel, TicketStatus::Pending, request_type) => {
            Ok((TicketStatus::Cancelled, request_type))
        }
        (TicketAction::ApproveReturn, _, RequestType::Return) => {
            Ok((TicketStatus::Returned, RequestType::Return))
        }
        (action, status, request_type) => Err(BookingError::InvalidTransition {
            action: action.to_string(),
            status,
            request_type,
        }),
    }
}

/// Apply a customer return request.
///
/// Returns `None` when the ticket is already awaiting return approval: the
/// repeated request is an idempotent no-op, not an error.
pub fn request_return(
    ticket: &Ticket,
) -> Result<Option<(TicketStatus, RequestType)>, BookingError> {
    match (ticket.status, ticket.request_type) {
        (TicketStatus::Pending, RequestType::Purchase) => {
            Ok(Some((TicketStatus::Pending, RequestType::Return)))
        }
        (TicketStatus::Pending, RequestType::Return) => Ok(None),
        (status, request_type) => Err(BookingError::InvalidTransition {
            action: "return".to_string(),
            status,
            request_type,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(status: TicketStatus, request_type: RequestType) -> Ticket {
        Ticket {
            id: 1,
            user_id: 7,
            session_id: 3,
            seat_number: 5,
            status,
            request_type,
            purchased_at: Utc::now(),
        }
    }

    const ALL_STATUSES: [TicketStatus; 4] = [
        TicketStatus::Pending,
        TicketStatus::Confirmed,
        TicketStatus::Returned,
        TicketStatus::Cancelled,
    ];

    const ALL_REQUEST_TYPES: [RequestType; 2] = [RequestType::Purchase, RequestType::Return];

    #[test]
    fn confirm_requires_pending_purchase() {
        let result = apply_staff_action(
            &ticket(TicketStatus::Pending, RequestType::Purchase),
            TicketAction::Confirm,
        );
        assert_eq!(
            result.unwrap(),
            (TicketStatus::Confirmed, RequestType::Purchase)
        );

        for status in ALL_STATUSES {
            for request_type in ALL_REQUEST_TYPES {
                if status == TicketStatus::Pending && request_type == RequestType::Purchase {
                    continue;
                }
                let result =
                    apply_staff_action(&ticket(status, request_type), TicketAction::Confirm);
                assert!(
                    matches!(result, Err(BookingError::InvalidTransition { .. })),
                    "confirm should fail for {}/{}",
                    status,
                    request_type
                );
            }
        }
    }

    #[test]
    fn cancel_requires_pending_any_request_type() {
        for request_type in ALL_REQUEST_TYPES {
            let result = apply_staff_action(
                &ticket(TicketStatus::Pending, request_type),
                TicketAction::Cancel,
            );
            assert_eq!(result.unwrap(), (TicketStatus::Cancelled, request_type));
        }

        for status in [
            TicketStatus::Confirmed,
            TicketStatus::Returned,
            TicketStatus::Cancelled,
        ] {
            for request_type in ALL_REQUEST_TYPES {
                let result =
                    apply_staff_action(&ticket(status, request_type), TicketAction::Cancel);
                assert!(matches!(
                    result,
                    Err(BookingError::InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn approve_return_requires_return_request() {
        for status in ALL_STATUSES {
            let result = apply_staff_action(
                &ticket(status, RequestType::Return),
                TicketAction::ApproveReturn,
            );
            assert_eq!(result.unwrap(), (TicketStatus::Returned, RequestType::Return));

            let result = apply_staff_action(
                &ticket(status, RequestType::Purchase),
                TicketAction::ApproveReturn,
            );
            assert!(matches!(
                result,
                Err(BookingError::InvalidTransition { .. })
            ));
        }
    }

    #[test]
    fn confirm_cancelled_ticket_is_invalid() {
        let result = apply_staff_action(
            &ticket(TicketStatus::Cancelled, RequestType::Purchase),
            TicketAction::Confirm,
        );
        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn request_return_on_pending_purchase() {
        let result = request_return(&ticket(TicketStatus::Pending, RequestType::Purchase));
        assert_eq!(
            result.unwrap(),
            Some((TicketStatus::Pending, RequestType::Return))
        );
    }

    #[test]
    fn repeated_request_return_is_noop() {
        let result = request_return(&ticket(TicketStatus::Pending, RequestType::Return));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn request_return_outside_pending_is_invalid() {
        for status in [
            TicketStatus::Confirmed,
            TicketStatus::Returned,
            TicketStatus::Cancelled,
        ] {
            for request_type in ALL_REQUEST_TYPES {
                let result = request_return(&ticket(status, request_type));
                assert!(
                    matches!(result, Err(BookingError::InvalidTransition { .. })),
                    "return request should fail for {}/{}",
                    status,
                    request_type
                );
            }
        }
    }
}
