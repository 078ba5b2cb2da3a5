use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Turn proxy share links into sing-box configs", long_about = None)]
pub struct Args {
    #[arg(short, long, global = true, help = "Emit debug log")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Parse one share link and print the node as JSON
    Parse {
        #[arg(help = "Share link, e.g. trojan://password@host:443#name")]
        uri: String,
    },

    /// Import a subscription body and report per-line results
    Import {
        #[arg(help = "Subscription, accept file path or URL")]
        source: String,
    },

    /// Refresh subscriptions once and write the sing-box config
    Build {
        #[arg(short, long, help = "Profile, accept file path or URL")]
        profile: String,

        #[arg(short, long, help = "Config output path, defaults to settings.config_path")]
        output: Option<String>,

        #[arg(long, help = "Skip fetching subscriptions, use manual nodes only")]
        no_refresh: bool,
    },

    /// Keep refreshing on the profile's interval until interrupted
    Watch {
        #[arg(short, long, help = "Profile, accept file path or URL")]
        profile: String,
    },
}
