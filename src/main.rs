use chromesync::cli::commands::migrate::MigrateArgs;
use chromesync::cli::{init_logging, Cli, Commands};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Logins {
            ref triage,
            browser,
            ref key,
            show_passwords,
        } => chromesync::cli::commands::logins::execute(
            &cli,
            triage,
            browser,
            key.as_deref(),
            show_passwords,
        ),
        Commands::Verify {
            ref profile,
            browser,
            ref key,
            fail_fast,
        } => chromesync::cli::commands::verify::execute(
            &cli,
            profile,
            browser,
            key.as_deref(),
            fail_fast,
        ),
        Commands::Migrate {
            ref triage,
            ref from,
            ref to,
            from_browser,
            to_browser,
            ref source_key,
            ref dest_key,
            fail_fast,
            dry_run,
            force,
        } => {
            let args = MigrateArgs {
                triage,
                from: from.as_deref(),
                to: to.as_deref(),
                from_browser,
                to_browser,
                source_key: source_key.as_deref(),
                dest_key: dest_key.as_deref(),
                fail_fast,
                dry_run,
                force,
            };
            chromesync::cli::commands::migrate::execute(&cli, &args)
        }
        #[cfg(feature = "audit-log")]
        Commands::Audit { last, ref since } => {
            chromesync::cli::commands::audit_cmd::execute(last, since.as_deref())
        }
    };

    if let Err(e) = result {
        chromesync::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
