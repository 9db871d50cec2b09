use bytefifo::{Channel, ChannelEvent, CompactingStore, Handle, RingStore};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

#[tokio::test]
async fn test_readable_fires_only_on_empty_to_nonempty() {
    let channel = Channel::new(RingStore::new(16).unwrap());
    let mut session = channel.open(Handle::new(1));
    let mut events = session.subscribe("test").unwrap();

    // First write: empty -> non-empty
    session.write(b"a", false).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::Readable);

    // Second write while non-empty: no event
    session.write(b"b", false).await.unwrap();
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    // Drain, then write again: a fresh transition
    let mut buf = [0u8; 8];
    session.read(&mut buf, false).await.unwrap();
    assert_eq!(channel.len(), 0);

    session.write(b"c", false).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::Readable);
}

#[tokio::test]
async fn test_zero_length_write_does_not_notify() {
    let channel = Channel::new(CompactingStore::new(8).unwrap());
    let mut session = channel.open(Handle::new(1));
    let mut events = session.subscribe("test").unwrap();

    assert_eq!(session.write(b"", false).await.unwrap(), 0);
    assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

    // A real write still notifies afterwards
    session.write(b"data", false).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::Readable);
}

#[tokio::test]
async fn test_closed_event_on_teardown() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let session = channel.open(Handle::new(1));
    let mut events = session.subscribe("test").unwrap();

    channel.close();
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::Closed);
}

#[tokio::test]
async fn test_lagging_subscriber_never_stalls_writer() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut session = channel.open(Handle::new(1));
    let mut events = session.subscribe("slow").unwrap();

    // 40 empty -> non-empty transitions without the subscriber reading:
    // far beyond the event ring depth
    let mut buf = [0u8; 1];
    for _ in 0..40 {
        assert_eq!(session.write(b"x", false).await.unwrap(), 1);
        assert_eq!(session.read(&mut buf, false).await.unwrap(), 1);
    }

    // Delivery is best-effort: the subscriber lags and loses the oldest
    // events instead of ever blocking the writer above
    assert!(matches!(events.recv().await, Err(RecvError::Lagged(_))));
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::Readable);
}

#[tokio::test]
async fn test_dropped_subscriber_is_ignored() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut session = channel.open(Handle::new(1));

    let events = session.subscribe("short-lived").unwrap();
    drop(events);

    // Emission with no live subscribers is silently discarded
    assert_eq!(session.write(b"data", false).await.unwrap(), 4);
}

#[tokio::test]
async fn test_subscription_survives_session_close() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut subscriber = channel.open(Handle::new(1));
    let mut events = subscriber.subscribe("outliving").unwrap();
    subscriber.close();

    // Only dropping the receiver ends the subscription
    let mut writer = channel.open(Handle::new(2));
    writer.write(b"x", false).await.unwrap();
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::Readable);
}

#[tokio::test]
async fn test_multiple_subscribers_each_get_the_event() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut writer = channel.open(Handle::new(1));
    let observer = channel.open(Handle::new(2));

    let mut events_a = writer.subscribe("a").unwrap();
    let mut events_b = observer.subscribe("b").unwrap();

    writer.write(b"data", false).await.unwrap();

    assert_eq!(events_a.recv().await.unwrap(), ChannelEvent::Readable);
    assert_eq!(events_b.recv().await.unwrap(), ChannelEvent::Readable);
}
