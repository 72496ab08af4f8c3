fn main() {
    if let Err(err) = cancel_metrics::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
