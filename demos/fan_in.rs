//! Fan-in example for rust-minifut
//!
//! Spawns workers that each satisfy one promise and joins the results with
//! `when_all`; a tuple join mixes value types.

use std::thread;
use std::time::Duration;

use rust_minifut::{pair, when_all};

fn main() {
    tracing_subscriber::fmt::init();

    println!("--- Joining eight workers ---");
    let mut futures = Vec::new();
    let mut workers = Vec::new();
    for worker_id in 0..8u64 {
        let (mut promise, future) = pair::<u64>();
        futures.push(future);
        workers.push(thread::spawn(move || {
            // Pretend to do uneven amounts of work.
            thread::sleep(Duration::from_millis((8 - worker_id) * 5));
            println!("worker {} finished", worker_id);
            promise.set_value(worker_id * worker_id).unwrap();
        }));
    }

    let mut joined = when_all(futures).unwrap();
    let squares = joined.get().unwrap();
    println!("squares in worker order: {:?}", squares);
    for worker in workers {
        worker.join().unwrap();
    }

    println!("\n--- Tuple join with mixed types ---");
    let (mut count_promise, count_future) = pair::<usize>();
    let (mut label_promise, label_future) = pair::<String>();

    let mut both = rust_minifut::when_all!(count_future, label_future).unwrap();
    count_promise.set_value(3).unwrap();
    label_promise.set_value(String::from("items")).unwrap();

    let (count, label) = both.get().unwrap();
    println!("{} {}", count, label);
}
