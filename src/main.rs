use clap::Parser;
use observatory::cli::{
    handle_completions, handle_config_init, handle_mode_set, handle_mode_show, Cli, Commands,
    ConfigCommands, ModeCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Watch(args) => observatory::cli::watch::run_watch(args).await,
        Commands::Mode(cmd) => {
            let output = match cmd {
                ModeCommands::Show(args) => handle_mode_show(&args),
                ModeCommands::Set(args) => handle_mode_set(&args),
            };
            output.map(|text| println!("{}", text))
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
