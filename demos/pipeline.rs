//! Pipeline example for rust-minifut
//!
//! Builds a transformation chain on a future and satisfies it from a
//! producer thread. The chain runs on the producer thread while the main
//! thread blocks in `get`.

use std::thread;
use std::time::Duration;

use rust_minifut::{pair, FutureError};

fn main() {
    tracing_subscriber::fmt::init();

    println!("--- Stage pipeline driven by a worker thread ---");
    let (mut promise, mut future) = pair::<u64>();

    let mut pipeline = future
        .then(|raw| {
            println!("stage 1 (parse) on {:?}", thread::current().id());
            raw * 2
        })
        .unwrap()
        .then(|doubled| {
            println!("stage 2 (enrich) on {:?}", thread::current().id());
            doubled + 2
        })
        .unwrap();

    let producer = thread::spawn(move || {
        println!("producer working on {:?}", thread::current().id());
        thread::sleep(Duration::from_millis(50));
        promise.set_value(20).unwrap();
    });

    println!("main thread blocking in get on {:?}", thread::current().id());
    let answer = pipeline.get().unwrap();
    println!("pipeline answer: {}", answer);
    producer.join().unwrap();

    println!("\n--- Broken promise surfaces as an error ---");
    let (abandoned, mut observer) = pair::<u64>();
    drop(abandoned);
    match observer.get() {
        Err(FutureError::BrokenPromise) => println!("observer saw: broken promise"),
        other => println!("unexpected outcome: {:?}", other),
    }
}
