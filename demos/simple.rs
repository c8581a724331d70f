//! Minimal producer/consumer pair over a shared queue.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use seqring::Queue;

fn main() {
    let queue = Arc::new(Queue::<String, 16>::new());

    let producer = {
        let queue = queue.clone();
        thread::spawn(move || {
            for i in 0..10 {
                let message = format!("message {}", i);
                println!("enqueue: {}", message);

                // Full queue is a normal outcome; retry until a slot frees up.
                let mut pending = message;
                loop {
                    match queue.enqueue(pending) {
                        Ok(()) => break,
                        Err(seqring::EnqueueError(rejected)) => {
                            pending = rejected;
                            std::hint::spin_loop();
                        }
                    }
                }

                thread::sleep(Duration::from_millis(50));
            }
        })
    };

    let consumer = {
        let queue = queue.clone();
        thread::spawn(move || {
            let mut received = 0;
            while received < 10 {
                match queue.dequeue() {
                    Ok(message) => {
                        println!("dequeue: {}", message);
                        received += 1;
                    }
                    Err(_) => std::hint::spin_loop(),
                }
            }
        })
    };

    producer.join().unwrap();
    consumer.join().unwrap();

    println!("done, queue empty: {}", queue.is_empty());
}
