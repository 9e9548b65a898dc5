//! Multi-threaded demo: four workers exercise every tier, then the main
//! thread allocates again after their caches have drained into the global
//! pool.
//!
//! Run with `cargo run --example thread_demo`; the tracing output shows the
//! batch fills and the teardown hand-offs.

use std::thread;

use slabcache::{allocate, deallocate, global_stats, local_stats, MemoryStats};

fn print_stats(title: &str, stats: MemoryStats) {
    println!("{}", "-".repeat(50));
    println!("{title}:");
    println!("{stats}");
    println!("{}", "-".repeat(50));
}

fn worker(id: usize) {
    let p1 = allocate(64); // pooled
    let p2 = allocate(1024); // pooled
    let p3 = allocate(4096); // oversize, host-served
    let p4 = allocate(15); // rounds up to a 24-byte block
    let p5 = allocate(0); // rounds up to the minimum class

    println!(
        "worker {id}: {p1:p} (64B), {p2:p} (1024B), {p3:p} (4096B), {p4:p} (15B), {p5:p} (0B)"
    );

    for p in [p1, p2, p3, p4, p5] {
        deallocate(p);
    }

    print_stats(&format!("worker {id} local stats"), local_stats());
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    let handles: Vec<_> = (0..4).map(|id| thread::spawn(move || worker(id))).collect();
    for handle in handles {
        handle.join().unwrap();
    }

    print_stats("global pool after hand-off", global_stats());

    let p = allocate(64);
    println!("main thread allocated {p:p} after the hand-offs");
    deallocate(p);

    print_stats("global pool at exit", global_stats());
}
