use clap::Parser;
use clap_handler::handler;
use kirinuki::clip::{probe_duration, video_duration};

/// Print the duration of a local file or a remote stream
#[derive(Parser, Clone, Debug)]
#[clap(name = "duration")]
pub struct DurationCommand {
    /// Print seconds instead of HH:MM:SS
    #[clap(long)]
    pub seconds: bool,

    /// File path or URL
    pub input: String,
}

#[handler(DurationCommand)]
pub async fn duration(args: DurationCommand) -> anyhow::Result<()> {
    if args.seconds {
        println!("{:.3}", probe_duration(&args.input).await?);
    } else {
        println!("{}", video_duration(&args.input).await?);
    }
    Ok(())
}
