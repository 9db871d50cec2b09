use std::time::Duration;

use bytefifo::{Channel, ChannelError, CompactingStore, Handle, Interest, RingStore};
use tokio::time::{sleep, timeout};

#[tokio::test]
async fn test_readiness_matches_nonblocking_outcomes() {
    let channel = Channel::new(CompactingStore::new(4).unwrap());
    let mut session = channel.open(Handle::new(1));
    let mut buf = [0u8; 1];

    // Empty: not readable, writable
    let readiness = session.readiness().unwrap();
    assert!(!readiness.readable);
    assert!(readiness.writable);
    assert_eq!(
        session.read(&mut buf, true).await,
        Err(ChannelError::WouldBlock)
    );
    assert_eq!(session.write(b"ab", true).await.unwrap(), 2);

    // Partially filled: both
    let readiness = session.readiness().unwrap();
    assert!(readiness.readable);
    assert!(readiness.writable);

    // Full: readable, not writable
    assert_eq!(session.write(b"cdef", true).await.unwrap(), 2);
    let readiness = session.readiness().unwrap();
    assert!(readiness.readable);
    assert!(!readiness.writable);
    assert_eq!(
        session.write(b"x", true).await,
        Err(ChannelError::WouldBlock)
    );
    assert_eq!(session.read(&mut buf, true).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ready_returns_immediately_when_satisfied() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut session = channel.open(Handle::new(1));

    // Empty channel is writable right away
    let readiness = session.ready(Interest::WRITABLE).await.unwrap();
    assert!(readiness.writable);

    session.write(b"data", false).await.unwrap();
    let readiness = session.ready(Interest::READABLE).await.unwrap();
    assert!(readiness.readable);

    let readiness = session.ready(Interest::BOTH).await.unwrap();
    assert!(readiness.readable && readiness.writable);
}

#[tokio::test]
async fn test_ready_wakes_on_data_arrival() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut poller = channel.open(Handle::new(1));

    let poll_task = tokio::spawn(async move {
        poller.ready(Interest::READABLE).await.unwrap()
    });

    sleep(Duration::from_millis(50)).await;

    let mut writer = channel.open(Handle::new(2));
    writer.write(b"hi", false).await.unwrap();

    let readiness = poll_task.await.unwrap();
    assert!(readiness.readable);
}

#[tokio::test]
async fn test_ready_wakes_when_space_frees() {
    let channel = Channel::new(CompactingStore::new(4).unwrap());
    let mut writer = channel.open(Handle::new(1));
    assert_eq!(writer.write(b"full", false).await.unwrap(), 4);

    let mut poller = channel.open(Handle::new(2));
    let poll_task = tokio::spawn(async move {
        poller.ready(Interest::WRITABLE).await.unwrap()
    });

    sleep(Duration::from_millis(50)).await;

    let mut reader = channel.open(Handle::new(3));
    let mut buf = [0u8; 2];
    reader.read(&mut buf, false).await.unwrap();

    let readiness = poll_task.await.unwrap();
    assert!(readiness.writable);
}

#[tokio::test]
async fn test_ready_timeout_is_callers_policy() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut poller = channel.open(Handle::new(1));

    // The channel has no internal timers; the caller bounds the wait
    let result = timeout(
        Duration::from_millis(50),
        poller.ready(Interest::READABLE),
    )
    .await;
    assert!(result.is_err());

    // The abandoned registration must not break later waits
    let mut writer = channel.open(Handle::new(2));
    writer.write(b"x", false).await.unwrap();
    let readiness = poller.ready(Interest::READABLE).await.unwrap();
    assert!(readiness.readable);
}

#[tokio::test]
async fn test_ready_interrupted() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut poller = channel.open(Handle::new(1));
    let interrupter = poller.interrupter();

    let poll_task = tokio::spawn(async move {
        poller.ready(Interest::READABLE).await
    });

    sleep(Duration::from_millis(50)).await;
    interrupter.raise();

    assert_eq!(poll_task.await.unwrap(), Err(ChannelError::Interrupted));
}

#[tokio::test]
async fn test_ready_with_no_interest_returns_snapshot() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut session = channel.open(Handle::new(1));

    let none = Interest {
        readable: false,
        writable: false,
    };
    let readiness = session.ready(none).await.unwrap();
    assert!(!readiness.readable);
    assert!(readiness.writable);
}

#[tokio::test]
async fn test_ready_fails_closed_on_teardown() {
    let channel = Channel::new(RingStore::new(8).unwrap());
    let mut poller = channel.open(Handle::new(1));

    let poll_task = tokio::spawn(async move {
        poller.ready(Interest::READABLE).await
    });

    sleep(Duration::from_millis(50)).await;
    channel.close();

    assert_eq!(poll_task.await.unwrap(), Err(ChannelError::Closed));
}
