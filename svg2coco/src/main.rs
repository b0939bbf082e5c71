use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "svg2coco")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convert a directory of SVG drawings into a COCO detection dataset", long_about = None)]
struct Cli {
    /// Directory scanned for `.svg` drawing files
    #[arg(short, long)]
    input_dir: PathBuf,
}

fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;

    // The dataset goes to stdout, so logs must not.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("svg2coco=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let dataset = svg2coco::build_dataset(&cli.input_dir)
        .wrap_err_with(|| format!("converting `{}`", cli.input_dir.display()))?;
    svg2coco::coco::write_dataset(std::io::stdout().lock(), &dataset)
        .wrap_err("writing dataset to stdout")?;
    Ok(())
}
