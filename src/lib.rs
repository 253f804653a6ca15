pub mod adapters;
pub mod core;
pub mod runtime;

pub fn run() {
    let _ = dotenv::dotenv();
    env_logger::init();
    if let Err(err) = runtime::cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
