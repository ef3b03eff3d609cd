//! Interactive numbered menu.

use console::{style, Term};

use tormgr::schedule::Interval;
use tormgr::service::ServiceAction;
use tormgr::{Action, Result, TorError, TorManager};

use super::handlers;
use super::icons::error;

/// Loop until the user picks Exit or stdin closes.
pub async fn run(manager: &mut TorManager) -> anyhow::Result<()> {
    let term = Term::stdout();

    loop {
        let _ = term.clear_screen();
        println!("{}", style("Tor manager").bold().cyan());
        handlers::print_summary(&manager.summary());
        println!();
        for action in Action::ALL {
            println!("{}", action);
        }
        println!();

        let Some(input) = prompt(&term, "Choose an option: ")? else {
            return Ok(());
        };
        let action = match input.parse::<Action>() {
            Ok(action) => action,
            Err(e) => {
                eprintln!("{} {}", error(), e);
                pause(&term)?;
                continue;
            }
        };
        if action == Action::Exit {
            return Ok(());
        }

        if let Err(e) = dispatch(manager, &term, action).await {
            eprintln!("{} {}", error(), e);
        }
        pause(&term)?;
    }
}

async fn dispatch(manager: &mut TorManager, term: &Term, action: Action) -> Result<()> {
    match action {
        Action::Exit => Ok(()),
        Action::Install => handlers::install(manager),
        Action::Update => handlers::update(manager),
        Action::Uninstall => handlers::uninstall(manager),
        Action::ExitIp => handlers::exit_ip(manager, None).await,
        Action::Schedule => {
            let interval = pick_interval(term)?;
            handlers::schedule(manager, interval.minutes())
        }
        Action::ChangeIp => handlers::rotate(manager),
        Action::ChangePort => {
            let port = prompt_required(term, "New SOCKS port: ")?;
            handlers::set_port(manager, &port)
        }
        Action::ChangeCountries => {
            handlers::countries();
            let codes = prompt_required(term, "Country codes (e.g. de,fr): ")?;
            handlers::set_countries(manager, &codes)
        }
        Action::Start => handlers::service(manager, ServiceAction::Start),
        Action::Stop => handlers::service(manager, ServiceAction::Stop),
        Action::Restart => handlers::service(manager, ServiceAction::Restart),
        Action::Reload => handlers::service(manager, ServiceAction::Reload),
        Action::Status => handlers::service(manager, ServiceAction::Status),
    }
}

fn pick_interval(term: &Term) -> Result<Interval> {
    for (i, interval) in Interval::ALL.iter().enumerate() {
        println!("{:>2}) every {}", i + 1, interval);
    }
    let input = prompt_required(term, "Interval: ")?;
    input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| Interval::ALL.get(i).copied())
        .ok_or_else(|| TorError::InvalidInput(format!("unknown interval choice: {:?}", input)))
}

/// Read one line; `None` once stdin is closed.
fn prompt(term: &Term, message: &str) -> std::io::Result<Option<String>> {
    term.write_str(message)?;
    match term.read_line() {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e),
    }
}

fn prompt_required(term: &Term, message: &str) -> Result<String> {
    let input = prompt(term, message)
        .map_err(|e| TorError::InvalidInput(format!("could not read input: {}", e)))?
        .unwrap_or_default();
    if input.is_empty() {
        return Err(TorError::InvalidInput("no input given".to_string()));
    }
    Ok(input)
}

fn pause(term: &Term) -> std::io::Result<()> {
    prompt(term, "Press Enter to continue").map(|_| ())
}
