mod app;
mod carousel;
mod input;
mod model;
mod render;
mod sim;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "skydeck")]
#[command(about = "Animated night-sky backdrop (parallax stars, nebula, meteors) with a slide deck")]
pub(crate) struct Cli {
    /// Frame cap
    #[arg(long, default_value_t = 60)]
    pub(crate) fps: u32,

    /// RNG seed; 0 picks a random one
    #[arg(long, default_value_t = 0)]
    pub(crate) seed: u64,

    /// Start with the meteor spawner disabled
    #[arg(long)]
    pub(crate) no_meteors: bool,

    /// Start with the slide deck open
    #[arg(long)]
    pub(crate) deck: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    app::run(cli)
}
