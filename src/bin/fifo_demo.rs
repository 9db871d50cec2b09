//! Bounded channel CLI demo
//!
//! Feeds stdin lines into a small ring channel while a reader drains it
//! in 4-byte chunks and a subscriber reports data-arrival events. The
//! userspace equivalent of poking the fifo device from two terminals
//! with a poll monitor attached.

use std::io::{self, BufRead};

use bytefifo::{Channel, ChannelError, ChannelEvent, Handle, IdGen, RingStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let id_gen = IdGen::new();
    let channel = Channel::new(RingStore::new(64)?);

    let mut writer = channel.open(Handle::new(id_gen.get_next()));
    let mut reader = channel.open(Handle::new(id_gen.get_next()));
    let mut events = writer.subscribe("demo")?;

    // Spawn event monitor task
    let events_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("(events) {event:?}");
            if event == ChannelEvent::Closed {
                break;
            }
        }
    });

    // Spawn reader task
    let reader_task = tokio::spawn(async move {
        let mut buf = [0u8; 4];
        loop {
            match reader.read(&mut buf, false).await {
                Ok(n) => {
                    let data = String::from_utf8_lossy(&buf[..n]);
                    println!("(reader): {data}");
                }
                Err(ChannelError::Closed) => {
                    println!("(reader) channel closed");
                    break;
                }
                Err(e) => {
                    eprintln!("(reader) error: {e}");
                    break;
                }
            }
        }
    });

    // Feed stdin lines from the main task, retrying short writes
    println!("Enter text (empty line to quit):");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    while let Some(Ok(line)) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            break;
        }

        let mut data = trimmed.as_bytes();
        while !data.is_empty() {
            match writer.write(data, false).await {
                Ok(n) => data = &data[n..],
                Err(e) => {
                    eprintln!("(writer) error: {e}");
                    break;
                }
            }
        }
    }

    println!("Writer done");
    channel.close();

    let _ = tokio::join!(reader_task, events_task);

    println!("All tasks completed");
    Ok(())
}
