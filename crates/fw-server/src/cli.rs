use clap::Parser;

/// Command-line surface. Everything that affects digest behavior lives in
/// [`crate::config::Config`] and is read from the environment instead; this
/// covers only how the process itself is wired up.
#[derive(Debug, Parser)]
#[command(name = "file-whisperer", about = "Recursive file-dissection gRPC service")]
pub struct Args {
    #[arg(long, env = "FILE_WHISPERER_PORT", default_value_t = 50051)]
    pub port: u16,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}
