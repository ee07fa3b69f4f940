use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytcap",
    about = "HTTP endpoint returning English captions for a YouTube URL",
    version
)]
pub struct Cli {
    /// Address to listen on (default 127.0.0.1:3000)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Seconds to wait for the caption provider
    #[arg(short, long)]
    pub timeout: Option<u64>,

    /// Config file (default ~/.config/ytcap/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    pub verbose: bool,
}
