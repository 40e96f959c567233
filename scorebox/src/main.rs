use clap::{Parser, Subcommand};
use cricket_common::{ball::Ball, match_state::MatchId};
use log::*;
#[cfg(debug_assertions)]
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::{
    append::rolling_file::{
        RollingFileAppender,
        policy::compound::{
            CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
        },
    },
    config::{Appender, Config as LogConfig, Logger, Root},
    encode::pattern::PatternEncoder,
};
use scorebox::{
    config::Config,
    match_manager::NewMatch,
    mirror::MirrorSender,
    score_keeper::ScoreKeeper,
    store::FileStore,
};
use serde::Serialize;
use std::{fs, path::PathBuf};
use tokio::time::Duration;

const APP_NAME: &str = "scorebox";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(long, short, action(clap::ArgAction::Count))]
    /// Increase the log verbosity
    verbose: u8,

    #[clap(long)]
    /// Directory within which log files will be placed, default is platform dependent
    log_location: Option<PathBuf>,

    #[clap(long, default_value = "5000000")]
    /// Max size in bytes that a log file is allowed to reach before being rolled over
    log_max_file_size: u64,

    #[clap(long, default_value = "3")]
    /// Number of archived logs to keep
    num_old_logs: u32,

    #[clap(long)]
    /// Directory holding match data, overrides the config file
    data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new match and print its state
    Create {
        #[clap(long)]
        team_a: String,

        #[clap(long)]
        team_b: String,

        #[clap(long, value_delimiter = ',')]
        /// Comma separated squad for team A
        team_a_players: Vec<String>,

        #[clap(long, value_delimiter = ',')]
        /// Comma separated squad for team B
        team_b_players: Vec<String>,

        #[clap(long)]
        /// Overs per innings, defaults to the value in the config file
        overs: Option<u32>,

        #[clap(long)]
        toss_winner: String,

        #[clap(long, default_value = "bat")]
        /// `bat` or `bowl`
        toss_decision: String,
    },

    /// Record one delivery
    Ball {
        match_id: String,

        /// Ball as JSON, or `@path` to read it from a file
        ball: String,
    },

    /// Close the current innings with the score as it stands
    EndInnings { match_id: String },

    /// Finish the match immediately
    EndMatch { match_id: String },

    /// Print the live state of a match
    Show { match_id: String },

    /// Print the summary of a finished match
    Summary { match_id: String },

    /// List the ids of all stored matches
    List,
}

fn init_logging(args: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = match args.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_base_path = match &args.log_location {
        Some(path) => path.clone(),
        None => {
            let mut path = directories::BaseDirs::new()
                .ok_or("Could not find a directory to store logs")?
                .data_local_dir()
                .to_path_buf();
            path.push("scorebox-logs");
            path
        }
    };
    let log_path = log_base_path.join(format!("{APP_NAME}-log.txt"));
    let archived_log_path = log_base_path.join(format!("{APP_NAME}-log-{{}}.txt.gz"));

    #[cfg(debug_assertions)]
    eprintln!("Log path: {}", log_path.display());

    // Only log to the console in debug mode, and keep stdout for command output
    #[cfg(debug_assertions)]
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{d} {h({l:5})} {M}] {m}{n}")))
        .build();

    let roller = FixedWindowRoller::builder().build(
        archived_log_path
            .to_str()
            .ok_or("Log path is not valid UTF-8")?,
        args.num_old_logs,
    )?;
    let file_policy = CompoundPolicy::new(
        Box::new(SizeTrigger::new(args.log_max_file_size)),
        Box::new(roller),
    );
    let file_appender = RollingFileAppender::builder()
        .append(true)
        .encoder(Box::new(PatternEncoder::new("[{d} {l:5} {M}] {m}{n}")))
        .build(log_path, Box::new(file_policy))?;

    let root = Root::builder().appender("file_appender");
    #[cfg(debug_assertions)]
    let root = root.appender("console");
    let root = root.build(LevelFilter::Error);

    let log_config = LogConfig::builder()
        .appender(Appender::builder().build("file_appender", Box::new(file_appender)));

    #[cfg(debug_assertions)]
    let log_config = log_config.appender(Appender::builder().build("console", Box::new(console)));

    let log_config = log_config
        .logger(Logger::builder().build(APP_NAME, log_level))
        .build(root)?;

    log4rs::init_config(log_config)?;
    log_panics::init();
    Ok(())
}

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    info!(
        "Reading config file from {:?}",
        confy::get_configuration_file_path(APP_NAME, None)?
    );

    Ok(match confy::load(APP_NAME, None) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file, overwriting with default. Error: {e}");
            let config = Config::default();
            confy::store(APP_NAME, None, &config)?;
            config
        }
    })
}

fn read_ball(arg: &str) -> Result<Ball, Box<dyn std::error::Error>> {
    let json = match arg.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)?,
        None => arg.to_string(),
    };
    Ok(serde_json::from_str(&json)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    init_logging(&args)?;
    info!("Starting scorebox");

    let config = load_config()?;

    let data_dir = match args.data_dir.clone().or(config.store.data_dir.clone()) {
        Some(dir) => dir,
        None => {
            let mut path = directories::BaseDirs::new()
                .ok_or("Could not find a directory to store match data")?
                .data_local_dir()
                .to_path_buf();
            path.push("scorebox-data");
            path
        }
    };
    let mut keeper = ScoreKeeper::new(FileStore::open(data_dir)?);

    let mirror = if config.mirror.enabled {
        info!("Mirroring live state to {}", config.mirror.url);
        let sender = MirrorSender::new(&config.mirror)?;
        keeper = keeper.with_mirror(sender.handle());
        Some(sender)
    } else {
        None
    };

    let outcome = run(&mut keeper, args.command, &config);

    if let Some(sender) = mirror {
        let grace = Duration::from_millis(config.mirror.timeout_ms.saturating_add(1000));
        sender.shutdown(grace).await;
    }

    if let Err(ref e) = outcome {
        error!("Command failed: {e}");
    }
    outcome
}

fn run(
    keeper: &mut ScoreKeeper<FileStore>,
    command: Command,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Create {
            team_a,
            team_b,
            team_a_players,
            team_b_players,
            overs,
            toss_winner,
            toss_decision,
        } => {
            let request = NewMatch {
                team_a,
                team_b,
                team_a_players,
                team_b_players,
                overs_limit: overs.unwrap_or(config.defaults.overs_limit),
                toss_winner,
                toss_decision,
            };
            print_json(&keeper.create_match(request)?)
        }
        Command::Ball { match_id, ball } => {
            let ball = read_ball(&ball)?;
            print_json(&keeper.submit_ball(&MatchId::new(match_id), ball)?)
        }
        Command::EndInnings { match_id } => {
            print_json(&keeper.end_innings_now(&MatchId::new(match_id))?)
        }
        Command::EndMatch { match_id } => {
            print_json(&keeper.end_match_now(&MatchId::new(match_id))?)
        }
        Command::Show { match_id } => print_json(&keeper.get_match(&MatchId::new(match_id))?),
        Command::Summary { match_id } => {
            print_json(&keeper.get_summary(&MatchId::new(match_id))?)
        }
        Command::List => {
            for id in keeper.list_matches()? {
                println!("{id}");
            }
            Ok(())
        }
    }
}
