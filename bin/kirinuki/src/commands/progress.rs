use clap::Parser;
use clap_handler::handler;
use kirinuki::{
    progress::{FileProgressStore, ProgressStore},
    ProcessId,
};

use crate::config::ConfigOptions;

/// Show the latest progress of a download or clip job
#[derive(Parser, Clone, Debug)]
#[clap(name = "progress")]
pub struct ProgressCommand {
    #[clap(flatten)]
    pub config: ConfigOptions,

    /// Remove the record instead of printing it
    #[clap(long)]
    pub clear: bool,

    /// Print the raw JSON snapshot
    #[clap(long)]
    pub json: bool,

    pub process_id: String,
}

#[handler(ProgressCommand)]
pub async fn progress(args: ProgressCommand) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let store = FileProgressStore::new(config.download.progress_dir);
    let process_id = ProcessId::from(args.process_id);

    if args.clear {
        store.clear(&process_id).await?;
        return Ok(());
    }

    match store.read(&process_id).await? {
        Some(snapshot) if args.json => println!("{}", serde_json::to_string(&snapshot)?),
        Some(snapshot) => println!("{}", snapshot.display_line()),
        None => anyhow::bail!("No progress recorded for {process_id}"),
    }
    Ok(())
}
