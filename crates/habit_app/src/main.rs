use habit_app::app::{run, AppConfig};

fn main() {
    tracing_subscriber::fmt::init();
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(%err, "invalid configuration");
            eprintln!("Invalid configuration: {err:#}");
            std::process::exit(2);
        }
    };
    match run(config) {
        Ok(output) => print!("{output}"),
        Err(err) => {
            tracing::error!(%err, "dashboard failed");
            eprintln!("Failed to build dashboard: {err:#}");
            std::process::exit(1);
        }
    }
}
