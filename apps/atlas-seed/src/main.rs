use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = atlas_seed::Args::parse();
	atlas_seed::run(args).await
}
