use clap::{Parser, Subcommand};

const HELP_TEMPLATE: &str = r#"
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
"#;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, help_template = HELP_TEMPLATE)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "Sets the remote host to connect to",
        default_value = "127.0.0.1",
        value_name = "HOST"
    )]
    pub host: String,

    #[arg(
        short,
        long,
        help = "Sets the remote port to connect to",
        default_value_t = 2003,
        value_name = "PORT"
    )]
    pub port: u16,

    #[arg(help = "The refer (store key) identifying the filter", value_name = "REFER")]
    pub refer: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new filter at `refer`, failing if one already exists
    Create {
        #[arg(long, default_value_t = 0.5, help = "Target max occupancy per slice")]
        ratio: f64,
        #[arg(long, default_value_t = 10, help = "Number of hash functions (k)")]
        k: u16,
        #[arg(long, default_value_t = 65536, help = "Bits per slice (m), must be a multiple of 8")]
        m: u32,
    },
    /// Add an element to the filter
    Add {
        #[arg(help = "The element to add")]
        element: String,
    },
    /// Check whether an element may be a member of the filter
    Check {
        #[arg(help = "The element to check")]
        element: String,
    },
    /// Delete all frames and counters, resetting the filter to one frame
    Truncate,
}
