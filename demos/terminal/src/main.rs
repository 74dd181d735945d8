//! Terminal matrix chat.
//!
//! One local user, one simulated room. Everything travels over the in-memory
//! loopback, so there is nothing to connect to:
//!
//!   cargo run -p glitch-example-terminal
//!   cargo run -p glitch-example-terminal -- --name neo --history 20
//!
//! Until joined, each line typed is a username; afterwards, each line is a
//! message. Pass `--no-demo` to skip the simulated SYSTEM peer and welcome text.

mod app;
mod render;

use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("glitch_example_terminal=info".parse()?)
                .add_directive("glitch_core=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let options = app::Options {
        name: parse_arg_string(&args, "--name"),
        history: parse_arg(&args, "--history"),
        demo: !args.iter().any(|a| a == "--no-demo"),
    };

    tracing::info!("Entering the matrix");
    app::run(options).await
}

fn parse_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}

fn parse_arg_string(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
