mod app;
pub use app::App;

use probex_experiment::ExperimentConfig;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let app = App::new(ExperimentConfig::default())?;
    app.run()?;

    Ok(())
}
