use std::path::PathBuf;

use clap::Parser;
use xcresult_report::cli::commands::{GenerateArgs, cmd_generate, cmd_render, default_log_path};
use xcresult_report::cli::config::{Cli, Commands, load_config};
use xcresult_report::trace::logger::{FileLogSink, log_event};
use xcresult_report::trace::trace::PipelineEvent;

fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let log_path = cli.log.as_deref().map(PathBuf::from).unwrap_or_else(default_log_path);
    let log = FileLogSink::new(&log_path);
    if cli.verbose > 0 && log.is_enabled() {
        eprintln!("Logging to {}", log_path.display());
    }

    let result = match cli.command {
        Commands::Generate {
            bundle,
            output,
            pdf,
            title,
            details,
            screenshots,
            timeout,
            no_overwrite,
        } => {
            let args = GenerateArgs {
                bundle,
                output,
                pdf,
                title,
                details,
                screenshots,
                timeout,
                no_overwrite,
            };
            cmd_generate(&args, &config, &log, cli.verbose)
        }
        Commands::Render {
            snapshot,
            output,
            pdf,
        } => cmd_render(&snapshot, output.as_deref(), pdf.as_deref(), &config, &log),
    };

    if let Err(e) = result {
        log_event(&log, &PipelineEvent::failed("cli", &e));
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
