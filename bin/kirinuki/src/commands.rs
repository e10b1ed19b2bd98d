use clap::Subcommand;
use clap_handler::Handler;

mod download;
mod duration;
mod progress;
mod trim;

#[derive(Subcommand, Clone, Handler)]
pub enum KirinukiCommand {
    Download(download::DownloadCommand),
    Trim(trim::TrimCommand),
    Progress(progress::ProgressCommand),
    Duration(duration::DurationCommand),
}
