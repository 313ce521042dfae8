use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use multibar::Progress;
use rand::Rng;

const WORKERS: u64 = 4;

fn main() {
    let progress = Arc::new(Progress::new());
    progress.start();

    let mut workers = Vec::new();
    for n in 0..WORKERS {
        let bar = progress.add_bar(100);
        let progress = Arc::clone(&progress);

        workers.push(thread::spawn(move || {
            // Each worker advances at its own pace.
            let wait = rand::thread_rng().gen_range(5, 20);
            while bar.incr() {
                thread::sleep(Duration::from_millis(wait));
            }

            // Log lines go above the bars, not into the live region.
            writeln!(progress.bypass(), "download #{} finished", n).unwrap();
        }));
    }

    for worker in workers {
        worker.join().unwrap();
    }

    progress.stop();
}
