use clap::Parser;
use spfmacro::{
    cli::{Args, SettingsLoader},
    error::SpfMacroError,
    runtime::run,
};

#[tokio::main]
async fn main() -> Result<(), SpfMacroError> {
    env_logger::init();

    let args = Args::parse();

    let settings = SettingsLoader::load(&args)?;

    run(settings).await
}
