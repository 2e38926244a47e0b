use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = arbiter_api::Args::parse();

	arbiter_api::run(args).await
}
