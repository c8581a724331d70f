//! Fan-out/fan-in work dispatcher: one producer feeds a job queue, a pool
//! of workers processes jobs and pushes results onto a second queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use seqring::Queue;

const NUM_WORKERS: usize = 4;
const NUM_JOBS: usize = 20;

fn main() {
    let jobs = Arc::new(Queue::<String, 128>::new());
    let results = Arc::new(Queue::<String, 128>::new());
    let dispatched = Arc::new(AtomicUsize::new(0));

    let producer = {
        let jobs = jobs.clone();
        let dispatched = dispatched.clone();
        thread::spawn(move || {
            for i in 0..NUM_JOBS {
                let job = format!("job-{:02}", i);
                while jobs.enqueue(job.clone()).is_err() {
                    std::hint::spin_loop();
                }
                dispatched.fetch_add(1, Ordering::Release);
                println!("dispatched {}", job);
            }
        })
    };

    let mut workers = vec![];
    for worker_id in 0..NUM_WORKERS {
        let jobs = jobs.clone();
        let results = results.clone();
        let dispatched = dispatched.clone();

        workers.push(thread::spawn(move || {
            let mut processed = 0;
            loop {
                match jobs.dequeue() {
                    Ok(job) => {
                        thread::sleep(Duration::from_millis(20));
                        let result = format!("{} done by worker {}", job, worker_id);
                        while results.enqueue(result.clone()).is_err() {
                            std::hint::spin_loop();
                        }
                        processed += 1;
                    }
                    Err(_) => {
                        // Exit once everything was handed out and the job
                        // queue has drained.
                        if dispatched.load(Ordering::Acquire) == NUM_JOBS && jobs.is_empty() {
                            break;
                        }
                        thread::yield_now();
                    }
                }
            }
            println!("worker {} processed {} jobs", worker_id, processed);
        }));
    }

    let collector = {
        let results = results.clone();
        thread::spawn(move || {
            let mut collected = 0;
            while collected < NUM_JOBS {
                match results.dequeue() {
                    Ok(result) => {
                        println!("collected: {}", result);
                        collected += 1;
                    }
                    Err(_) => std::hint::spin_loop(),
                }
            }
        })
    };

    producer.join().unwrap();
    for worker in workers {
        worker.join().unwrap();
    }
    collector.join().unwrap();

    println!("all {} jobs processed", NUM_JOBS);
}
