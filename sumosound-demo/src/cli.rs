use anyhow::{Context, Result, bail};
use std::path::PathBuf;

const USAGE: &str = "usage: sumosound-demo [--steps N] [--capacity N] [--backend-sources N] [--assets DIR] [--track ID]";

/// Command-line options of the demo driver.
#[derive(Debug, Clone)]
pub struct DemoArgs {
    pub steps: usize,
    /// Emitter ceiling handed to the scene (unset admits until the backend refuses)
    pub capacity: Option<usize>,
    /// Source budget of the headless backend
    pub backend_sources: Option<usize>,
    /// Directory with the stock sounds; silence is synthesized when unset
    pub assets: Option<PathBuf>,
    /// Vehicle whose position the listener follows
    pub track: Option<String>,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            steps: 60,
            capacity: None,
            backend_sources: Some(32),
            assets: None,
            track: None,
        }
    }
}

impl DemoArgs {
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .with_context(|| format!("{} needs a value\n{}", flag, USAGE))
            };
            match flag.as_str() {
                "--steps" => parsed.steps = value()?.parse().context("--steps")?,
                "--capacity" => parsed.capacity = Some(value()?.parse().context("--capacity")?),
                "--backend-sources" => {
                    parsed.backend_sources = Some(value()?.parse().context("--backend-sources")?)
                }
                "--assets" => parsed.assets = Some(PathBuf::from(value()?)),
                "--track" => parsed.track = Some(value()?),
                "-h" | "--help" => bail!("{}", USAGE),
                other => bail!("unknown argument '{}'\n{}", other, USAGE),
            }
        }
        Ok(parsed)
    }
}
