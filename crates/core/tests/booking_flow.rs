//! End-to-end booking flows through the coordinator, including the
//! concurrent-purchase race.

use std::sync::{Arc, Barrier};
use std::thread;

use marquee_core::{
    BookingCoordinator, BookingError, NewShowing, NewUser, Role, SessionCatalog, SessionStore,
    SqliteSessionStore, SqliteTicketStore, SqliteUserDirectory, TicketAction, TicketStatus,
    TicketStore, UserDirectory,
};

struct Fixture {
    coordinator: Arc<BookingCoordinator>,
    catalog: SessionCatalog,
    users: Arc<SqliteUserDirectory>,
    sessions: Arc<SqliteSessionStore>,
    user_id: i64,
}

fn setup() -> Fixture {
    let users = Arc::new(SqliteUserDirectory::in_memory().unwrap());
    let sessions = Arc::new(SqliteSessionStore::in_memory().unwrap());
    let tickets = Arc::new(SqliteTicketStore::in_memory().unwrap());

    let user_id = users
        .create(NewUser {
            username: "neo".to_string(),
            role: Role::Customer,
        })
        .unwrap()
        .id;

    let coordinator = Arc::new(BookingCoordinator::new(
        Arc::clone(&users) as Arc<dyn UserDirectory>,
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        Arc::clone(&tickets) as Arc<dyn TicketStore>,
    ));
    let catalog = SessionCatalog::new(
        Arc::clone(&sessions) as Arc<dyn SessionStore>,
        Arc::clone(&tickets) as Arc<dyn TicketStore>,
        None,
    );

    Fixture {
        coordinator,
        catalog,
        users,
        sessions,
        user_id,
    }
}

fn matinee() -> NewShowing {
    NewShowing {
        movie_title: "The Matrix".to_string(),
        date: "2030-06-01".parse().unwrap(),
        starts_at: "10:00:00".parse().unwrap(),
        ends_at: "12:00:00".parse().unwrap(),
        capacity: 20,
        price: 12.5,
    }
}

#[test]
fn concurrent_purchases_of_one_seat_sell_exactly_once() {
    let f = setup();
    let session_id = f.sessions.insert_if_no_overlap(matinee()).unwrap().id;

    let buyer_ids: Vec<i64> = (0..8)
        .map(|i| {
            f.users
                .create(NewUser {
                    username: format!("buyer-{}", i),
                    role: Role::Customer,
                })
                .unwrap()
                .id
        })
        .collect();

    let handles: Vec<_> = buyer_ids
        .into_iter()
        .map(|user_id| {
            let coordinator = Arc::clone(&f.coordinator);
            thread::spawn(move || coordinator.purchase(user_id, session_id, 5))
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(_) => successes += 1,
            Err(BookingError::Conflict(_)) => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(
        f.coordinator
            .list_by_session(session_id)
            .unwrap()
            .iter()
            .filter(|t| t.status.holds_seat())
            .count(),
        1
    );
}

#[test]
fn concurrent_purchases_of_distinct_seats_all_succeed() {
    let f = setup();
    let session_id = f.sessions.insert_if_no_overlap(matinee()).unwrap().id;
    let user_id = f.user_id;

    let handles: Vec<_> = (1..=8u32)
        .map(|seat| {
            let coordinator = Arc::clone(&f.coordinator);
            thread::spawn(move || coordinator.purchase(user_id, session_id, seat))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    assert_eq!(f.coordinator.list_by_session(session_id).unwrap().len(), 8);
}

#[test]
fn concurrent_cancel_and_return_request_never_resurrect_a_ticket() {
    let f = setup();
    let session_id = f.sessions.insert_if_no_overlap(matinee()).unwrap().id;

    for _ in 0..50 {
        let ticket = f.coordinator.purchase(f.user_id, session_id, 1).unwrap();
        let barrier = Barrier::new(2);

        let (cancel_result, return_result) = thread::scope(|s| {
            let cancel = s.spawn(|| {
                barrier.wait();
                f.coordinator.staff_action(ticket.id, TicketAction::Cancel)
            });
            let request = s.spawn(|| {
                barrier.wait();
                f.coordinator.request_return(ticket.id, f.user_id)
            });
            (cancel.join().unwrap(), request.join().unwrap())
        });

        // Both serializations are legal: cancel first leaves the return
        // request with InvalidTransition, return first lets the cancel
        // close a (PENDING, RETURN) ticket. In either order the ticket
        // ends CANCELLED; it must never come back to a holding state.
        cancel_result.unwrap();
        if let Err(e) = return_result {
            assert!(
                matches!(e, BookingError::InvalidTransition { .. }),
                "unexpected error: {}",
                e
            );
        }
        let settled = f.coordinator.get(ticket.id).unwrap();
        assert_eq!(settled.status, TicketStatus::Cancelled);

        f.coordinator.staff_delete(ticket.id).unwrap();
    }
}

#[tokio::test]
async fn full_lifecycle_against_the_catalog() {
    let f = setup();
    let showing = f.catalog.create(matinee()).await.unwrap();

    let ticket = f.coordinator.purchase(f.user_id, showing.id, 5).unwrap();

    // Holding tickets protect the showing from deletion.
    assert!(matches!(
        f.catalog.delete(showing.id),
        Err(BookingError::Conflict(_))
    ));

    f.coordinator.request_return(ticket.id, f.user_id).unwrap();
    f.coordinator
        .staff_action(ticket.id, TicketAction::ApproveReturn)
        .unwrap();

    // Once the last hold is released the showing can go.
    f.catalog.delete(showing.id).unwrap();
}

#[tokio::test]
async fn schedule_conflicts_surface_through_the_catalog() {
    let f = setup();
    f.catalog.create(matinee()).await.unwrap();

    let mut contained = matinee();
    contained.starts_at = "10:30:00".parse().unwrap();
    contained.ends_at = "11:30:00".parse().unwrap();
    assert!(matches!(
        f.catalog.create(contained).await,
        Err(BookingError::Conflict(_))
    ));

    let mut back_to_back = matinee();
    back_to_back.starts_at = "12:00:00".parse().unwrap();
    back_to_back.ends_at = "14:00:00".parse().unwrap();
    f.catalog.create(back_to_back).await.unwrap();
}
