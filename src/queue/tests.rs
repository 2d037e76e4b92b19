use std::time::Duration;

use super::*;
use crate::store::Store;

const QUEUE: &str = "train";

#[test]
fn receive_hides_message_until_visibility_expires() {
    let mut store = Store::open_in_memory().unwrap();
    let id = send(store.conn(), QUEUE, "{}").unwrap();

    let message = receive(store.conn_mut(), QUEUE, Duration::from_secs(30))
        .unwrap()
        .unwrap();
    assert_eq!(message.id, id);
    assert_eq!(message.receive_count, 1);
    assert!(receive(store.conn_mut(), QUEUE, Duration::from_secs(30))
        .unwrap()
        .is_none());

    change_visibility(store.conn(), id, Duration::ZERO, Some("boom")).unwrap();
    let again = receive(store.conn_mut(), QUEUE, Duration::from_secs(30))
        .unwrap()
        .unwrap();
    assert_eq!(again.receive_count, 2);
}

#[test]
fn delete_acknowledges_message() {
    let mut store = Store::open_in_memory().unwrap();
    let id = send(store.conn(), QUEUE, "payload").unwrap();
    let message = receive(store.conn_mut(), QUEUE, Duration::from_secs(5))
        .unwrap()
        .unwrap();
    delete(store.conn(), message.id).unwrap();
    assert_eq!(depth(store.conn(), QUEUE).unwrap(), QueueDepth::default());
    assert!(matches!(
        delete(store.conn(), id),
        Err(QueueError::MessageNotFound(_))
    ));
}

#[test]
fn messages_are_delivered_oldest_first_per_queue() {
    let mut store = Store::open_in_memory().unwrap();
    let first = send(store.conn(), QUEUE, "a").unwrap();
    send(store.conn(), "other", "x").unwrap();
    let second = send(store.conn(), QUEUE, "b").unwrap();

    let got = receive(store.conn_mut(), QUEUE, Duration::from_secs(60))
        .unwrap()
        .unwrap();
    assert_eq!(got.id, first);
    let got = receive(store.conn_mut(), QUEUE, Duration::from_secs(60))
        .unwrap()
        .unwrap();
    assert_eq!(got.id, second);
    assert_eq!(got.body, "b");
}

#[test]
fn exhausted_messages_are_dead_lettered() {
    let mut store = Store::open_in_memory().unwrap();
    let id = send(store.conn(), QUEUE, "poison").unwrap();
    for _ in 0..2 {
        receive(store.conn_mut(), QUEUE, Duration::from_secs(60))
            .unwrap()
            .unwrap();
        change_visibility(store.conn(), id, Duration::ZERO, None).unwrap();
    }
    assert_eq!(dead_letter_exhausted(store.conn(), QUEUE, 3).unwrap(), 0);
    assert_eq!(dead_letter_exhausted(store.conn(), QUEUE, 2).unwrap(), 1);
    assert!(receive(store.conn_mut(), QUEUE, Duration::from_secs(60))
        .unwrap()
        .is_none());
    assert_eq!(
        depth(store.conn(), QUEUE).unwrap(),
        QueueDepth { pending: 0, dead: 1 }
    );
}
