//! Interactive-style walkthrough of a ULTIMA session.
//!
//! Run with `RUST_LOG=ultima=debug cargo run --example chat_session` to see
//! the training steps and target-network syncs as they happen.

use tracing_subscriber::EnvFilter;
use ultima::agent::{DqnAgentBuilder, DqnConfig};
use ultima::session::{Session, SharedSession};
use ultima::trainer::TrainingSample;

fn main() -> ultima::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => DqnConfig::from_json_file(path)?,
        None => DqnConfig::default(),
    };
    let agent = DqnAgentBuilder::new().config(config).build()?;
    let session = SharedSession::new(Session::new(agent));

    let reply = session.chat("Hello ULTIMA, what can you do?")?;
    println!("{}\n", reply.response);

    let toggle = session.toggle_mode()?;
    println!("Switched to {} (advanced: {})\n", toggle.mode, toggle.advanced);

    let reply = session.chat("Explain experience replay in one sentence.")?;
    println!("{}\n", reply.response);

    let samples = vec![
        TrainingSample::new("user", "What is a target network?"),
        TrainingSample::new("assistant", "A lagging copy of the Q-network used for stable targets."),
        TrainingSample::new("user", "Why decay epsilon?"),
        TrainingSample::new("assistant", "To explore early and exploit later."),
    ];
    let stats = session.train(&samples)?;
    println!("Training stats: {}", serde_json::to_string(&stats)?);

    let status = session.status()?;
    println!(
        "Status: advanced={} logs={} tools={}",
        status.advanced_mode, status.logs_count, status.tools_count
    );
    Ok(())
}
