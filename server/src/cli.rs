use clap::Parser;

/// L3 order book reconstruction server — estimates per-order book state
/// from the upstream exchange's L2 aggregate feed and pushes snapshots to
/// WebSocket subscribers.
#[derive(Parser, Debug)]
#[command(name = "l3-server", version)]
pub struct Args {
    /// Initial trading symbol (case-insensitive), e.g. ethusdt.
    #[arg(default_value = "ethusdt")]
    pub symbol: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Port the subscriber WebSocket server binds on.
    #[arg(long, default_value = "8080")]
    pub port: u16,
}
