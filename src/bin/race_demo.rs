use flight_http_bench::{
    common::{group_thousands, init_tracing},
    race::{run_trials, ITERATIONS, NUM_TRIALS, NUM_WORKERS},
};

fn main() {
    init_tracing(false);

    let expected = NUM_WORKERS as u64 * ITERATIONS;
    println!(
        "Workers: {}, increments per worker: {}",
        NUM_WORKERS,
        group_thousands(ITERATIONS)
    );
    println!("Expected: {}\n", group_thousands(expected));

    for outcome in run_trials(NUM_TRIALS, NUM_WORKERS, ITERATIONS) {
        println!(
            "Run {}: {} (lost: {} = {:.1}%)",
            outcome.trial + 1,
            group_thousands(outcome.final_value),
            group_thousands(outcome.lost()),
            outcome.loss_percent()
        );
    }
}
