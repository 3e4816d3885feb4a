use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = qbank_api::Args::parse();

	qbank_api::run(args).await
}
