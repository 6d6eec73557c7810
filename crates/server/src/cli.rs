use std::net::SocketAddr;

/// CLI flags for the relay binary. There is no configuration file and no
/// other environment variables are read (6's "Process control" contract);
/// these flags are the only override surface over the defaults.
#[derive(Debug, clap::Parser)]
#[command(name = "tidalcast-server", about = "RTMP ingest + HTTP-FLV relay server")]
pub struct Args {
    /// Address the RTMP listener binds to.
    #[arg(long, default_value = "0.0.0.0:1935")]
    pub rtmp_addr: SocketAddr,

    /// Address the HTTP-FLV/static listener binds to.
    #[arg(long, default_value = "0.0.0.0:9090")]
    pub http_addr: SocketAddr,

    /// Directory `GET /` (and other non-`/live` paths) is served from.
    #[arg(long, default_value = ".")]
    pub web_root: std::path::PathBuf,

    /// Increases log verbosity; layered on top of `RUST_LOG`. Repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// The `tracing_subscriber::EnvFilter` directive implied by `-v`
    /// repetitions, used only when `RUST_LOG` is unset.
    pub fn default_log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
