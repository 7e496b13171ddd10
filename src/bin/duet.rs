use duet::app::command_handlers;
use duet::app::command_support::FAILURE_MARK;

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let output = command_handlers::run_cli(args)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{FAILURE_MARK} {err}");
        std::process::exit(1);
    }
}
