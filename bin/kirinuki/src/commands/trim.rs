use std::path::PathBuf;

use clap::Parser;
use clap_handler::handler;
use kirinuki::{
    clip::{ClipOutputs, ClipRenderer, CropLayout, CropRegion, Timestamp},
    merge::FfmpegTranscoder,
    progress::FileProgressStore,
    ProcessId,
};

use crate::config::ConfigOptions;

/// Cut a recording into a screen clip and a webcam clip
#[derive(Parser, Clone, Debug)]
#[clap(name = "trim")]
pub struct TrimCommand {
    #[clap(flatten)]
    pub config: ConfigOptions,

    /// Clip start, HH:MM:SS
    #[clap(short, long)]
    pub start: Timestamp,

    /// Clip end, HH:MM:SS
    #[clap(short, long)]
    pub end: Timestamp,

    /// Screen area as w:h:x:y
    #[clap(long)]
    pub screen: Option<CropRegion>,

    /// Webcam area as w:h:x:y
    #[clap(long)]
    pub webcam: Option<CropRegion>,

    /// Frame width, used for the default layout
    #[clap(long)]
    pub width: Option<u32>,

    /// Frame height, used for the default layout
    #[clap(long)]
    pub height: Option<u32>,

    /// Base output path, `_screen` and `_webcam` are appended to its name
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Recording to cut
    pub input: PathBuf,
}

impl TrimCommand {
    fn layout(&self) -> anyhow::Result<CropLayout> {
        let default = match (self.width, self.height) {
            (Some(width), Some(height)) => Some(CropLayout::default_for(width, height)),
            _ => None,
        };
        let screen = self
            .screen
            .or(default.map(|layout| layout.screen))
            .ok_or_else(|| anyhow::anyhow!("--screen or --width/--height is required"))?;
        let webcam = self
            .webcam
            .or(default.map(|layout| layout.webcam))
            .ok_or_else(|| anyhow::anyhow!("--webcam or --width/--height is required"))?;
        Ok(CropLayout { screen, webcam })
    }
}

#[handler(TrimCommand)]
pub async fn trim(args: TrimCommand) -> anyhow::Result<()> {
    let config = args.config.load()?;
    let layout = args.layout()?;
    let outputs = ClipOutputs::from_base(args.output.clone().unwrap_or_else(|| args.input.clone()));

    let process_id = ProcessId::generate();
    eprintln!("Process id: {process_id}");

    let renderer = ClipRenderer::new(
        FfmpegTranscoder::new()?,
        FileProgressStore::new(config.download.progress_dir),
    );
    let outputs = renderer
        .render(
            &process_id,
            &args.input,
            args.start,
            args.end,
            &layout,
            &outputs,
        )
        .await?;

    println!("{}", outputs.screen.display());
    println!("{}", outputs.webcam.display());
    Ok(())
}
