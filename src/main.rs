use spinlist::model::PlaylistSource;
use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    null_audio: bool,
    paths: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    if let Err(err) = spinlist::config::log_path().and_then(|path| spinlist::logging::init(&path)) {
        eprintln!("logging disabled: {err:#}");
    }
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");

    spinlist::app::run_with_startup(spinlist::app::AppStartupOptions {
        source: PlaylistSource::from_args(args.paths),
        null_audio: args.null_audio,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    for arg in args {
        match arg.as_str() {
            "--null-audio" => out.null_audio = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            flag if flag.starts_with("--") => anyhow::bail!("unknown argument {flag}"),
            path => {
                if path.trim().is_empty() {
                    anyhow::bail!("path cannot be empty");
                }
                out.paths.push(PathBuf::from(path));
            }
        }
    }
    Ok(out)
}

fn print_help() {
    println!("spinlist [PATH...]");
    println!("  PATH              CSV file, folder of MP3s, or several track paths");
    println!("  --null-audio      Run without opening an audio device");
    println!();
    println!("Without PATH the last loaded playlist is restored.");
}
