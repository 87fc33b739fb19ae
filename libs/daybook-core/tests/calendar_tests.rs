use chrono::{Duration, NaiveDate};
use daybook_core::{
    calendar::{date_to_page, page_to_date},
    test_utils::{create_test_store, MockEventStore},
    CalendarNavigator, Event, EventRepository,
};
use daybook_common::INITIAL_PAGE;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::timeout;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

proptest! {
    #[test]
    fn prop_page_round_trip(offset in -3_660_i64..3_660, day in 0_i64..3_650) {
        let today = date(2020, 1, 1) + Duration::days(day);
        let page = INITIAL_PAGE + offset;
        let shown = page_to_date(today, page).unwrap();
        prop_assert_eq!(date_to_page(today, shown), page);
    }

    #[test]
    fn prop_consecutive_pages_are_consecutive_days(offset in -3_660_i64..3_660) {
        let today = date(2024, 2, 28);
        let page = INITIAL_PAGE + offset;
        let a = page_to_date(today, page).unwrap();
        let b = page_to_date(today, page + 1).unwrap();
        prop_assert_eq!(a.succ_opt().unwrap(), b);
    }
}

#[tokio::test]
async fn test_switching_dates_follows_new_day() {
    let (store, _dir) = create_test_store().await.unwrap();
    let store = Arc::new(store);
    store
        .insert(&Event::new("Tomorrow's thing", date(2024, 3, 11)))
        .await
        .unwrap();

    let mut nav = CalendarNavigator::with_today(store.clone(), date(2024, 3, 10));
    assert!(nav.next_events().await.unwrap().unwrap().is_empty());

    nav.page_changed(INITIAL_PAGE + 1).unwrap();
    let events = nav.next_events().await.unwrap().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(nav.state().selected_date, date(2024, 3, 11));
}

#[tokio::test]
async fn test_switching_dates_cancels_previous_query() {
    let store = Arc::new(MockEventStore::new());
    let today = date(2024, 3, 10);
    let mut nav = CalendarNavigator::with_today(store.clone(), today);
    assert!(nav.next_events().await.unwrap().unwrap().is_empty());
    assert_eq!(store.watcher_count(), 1);

    nav.page_changed(INITIAL_PAGE + 1).unwrap();
    assert!(nav.next_events().await.unwrap().unwrap().is_empty());

    // The aborted task releases its change-feed receiver on its next poll
    timeout(StdDuration::from_secs(1), async {
        while store.watcher_count() > 1 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("previous day's query still subscribed");
    assert_eq!(store.watcher_count(), 1);

    store.insert(&Event::new("Yesterday's page", today)).await.unwrap();
    let next = timeout(StdDuration::from_millis(200), nav.next_events()).await;
    assert!(next.is_err(), "navigator emitted for a day it no longer shows");
    assert!(!nav.events().unwrap().has_pending().unwrap());
    assert_eq!(nav.state().selected_date, date(2024, 3, 11));
}

#[tokio::test]
async fn test_delete_from_context_menu() {
    let (store, _dir) = create_test_store().await.unwrap();
    let store = Arc::new(store);
    let day = date(2024, 3, 10);
    let mut event = Event::new("Cancelled", day);
    event.id = store.insert(&event).await.unwrap();

    let mut nav = CalendarNavigator::with_today(store.clone(), day);
    let mut states = nav.subscribe();
    assert_eq!(nav.next_events().await.unwrap().unwrap().len(), 1);

    nav.open_context_menu(event.clone());
    states.borrow_and_update();
    nav.delete_from_context_menu().await.unwrap();

    assert!(states.has_changed().unwrap());
    assert_eq!(states.borrow_and_update().context_menu, None);
    assert!(nav.next_events().await.unwrap().unwrap().is_empty());
    assert!(store.get_event(event.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_toggle_done_moves_event_last() {
    let (store, _dir) = create_test_store().await.unwrap();
    let store = Arc::new(store);
    let day = date(2024, 3, 10);
    let mut first = Event::new("First", day);
    first.id = store.insert(&first).await.unwrap();
    store.insert(&Event::new("Second", day)).await.unwrap();

    let mut nav = CalendarNavigator::with_today(store.clone(), day);
    let initial = nav.next_events().await.unwrap().unwrap();
    assert_eq!(initial[0].title, "First");

    nav.toggle_done(&first).await.unwrap();
    let reordered = nav.next_events().await.unwrap().unwrap();
    assert_eq!(reordered[0].title, "Second");
    assert!(reordered[1].is_done);
}
