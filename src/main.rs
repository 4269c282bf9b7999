use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Record the screen for a while and hand the result to the upload flow
#[derive(Debug, Parser)]
#[command(name = "snapcast", version)]
struct Args {
    /// JSON config file; defaults are used when omitted
    config: Option<PathBuf>,

    /// Recording length in seconds
    #[arg(long, default_value_t = 3)]
    seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    snapcast_lib::init_tracing();

    let record = snapcast_lib::run(args.config.as_deref(), Duration::from_secs(args.seconds))
        .await
        .context("recording failed")?;

    println!("{}", record.to_json().context("failed to encode transfer record")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["snapcast"]).unwrap();
        assert_eq!(args.config, None);
        assert_eq!(args.seconds, 3);
    }

    #[test]
    fn test_config_and_seconds() {
        let args = Args::try_parse_from(["snapcast", "snapcast.json", "--seconds", "10"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("snapcast.json")));
        assert_eq!(args.seconds, 10);
    }

    #[test]
    fn test_help_is_not_a_config_path() {
        let err = Args::try_parse_from(["snapcast", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_bad_seconds_rejected() {
        let err = Args::try_parse_from(["snapcast", "--seconds", "soon"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
