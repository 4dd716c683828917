use argh::FromArgs;
use libqcom_bootctl::config_helper::Config;
use libqcom_bootctl::run;

#[derive(FromArgs)]
/// qcom_bootctl, inspect the A/B boot state of the booted slot
/// stored in the qualcomm private gpt attribute bits
struct CmdProg {
    #[argh(switch)]
    /// set the successful bit of the booted slot after printing its state
    mark_successful: bool,
    #[argh(option, short = 'c')]
    /// toml config file (tool path, label dirs, backend)
    config: Option<String>,
}

fn main() {
    env_logger::init();
    let args: CmdProg = argh::from_env();
    let config = match args.config {
        Some(path) => Config::from_toml(&path),
        None => Ok(Config::default()),
    };
    let ret = config.and_then(|config| run(&config, args.mark_successful));
    if let Err(e) = ret {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
