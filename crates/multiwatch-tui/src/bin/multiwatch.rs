use std::io::IsTerminal;
use std::process::ExitCode;

use multiwatch_tui::{oneshot, parse_args, runtime, USAGE};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("multiwatch: {err}");
            return ExitCode::FAILURE;
        }
    };
    if options.help {
        println!("{USAGE}");
        return ExitCode::SUCCESS;
    }

    let interactive =
        !options.once && std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    if interactive {
        match runtime::run(&options) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("multiwatch: {err}");
                ExitCode::FAILURE
            }
        }
    } else {
        let (reports, code) = oneshot::run_once_each(&options.commands);
        if options.json {
            match oneshot::render_json(&reports) {
                Ok(json) => println!("{json}"),
                Err(err) => {
                    eprintln!("multiwatch: {err}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            print!("{}", oneshot::render_text(&reports));
        }
        if code == 0 {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}
