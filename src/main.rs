//! Wager Ledger CLI
//!
//! Loads a JSON state snapshot, applies one command, writes the snapshot
//! back, and prints listings as CSV.
//!
//! # Usage
//!
//! ```bash
//! wager-ledger state.json init
//! wager-ledger state.json create-user alice alice@example.com 123456 player 500
//! wager-ledger state.json create-match HQ DERBY ALICE=100 BOB=100
//! wager-ledger state.json settle DERBY A
//! wager-ledger state.json transactions BOB
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use std::env;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process;
use std::str::FromStr;

use wager_ledger::{
    Credits, LedgerEngine, LedgerError, Match, MatchPlayer, MemoryStore, NewUser, Result, Role,
    SettlementStatus, Team, User,
};

const USAGE: &str = "Usage: wager-ledger <state.json> <command> [args]

Commands:
  init
  create-user <username> <email> <pin> <role: admin|player> <balance> [can-create-match]
  users [all]
  set-blocked <username> <true|false>
  delete-user <username>
  reset-pin <username> <new-pin>
  adjust <admin> <target> <amount> <reason...>
  create-match <creator> <name|-> <TEAM_A> <TEAM_B>   rosters as NAME=STAKE[,NAME=STAKE...]
  matches
  settle <match-name> <A|B>
  mark-paid <match-name> <username>
  transactions [username]
  notifications <username>
  mark-read <username>";

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(LedgerError::Usage(USAGE.to_string()));
    }

    let state_path = &args[1];
    let command = args[2].as_str();
    let rest = &args[3..];

    if command == "init" {
        let store = MemoryStore::new();
        save(state_path, &store)?;
        println!("Initialized empty state at {}", state_path);
        return Ok(());
    }

    let file = File::open(state_path)?;
    let store = MemoryStore::from_reader(BufReader::new(file))?;
    let mut engine = LedgerEngine::new(store);

    let mutated = dispatch(&mut engine, command, rest)?;
    if mutated {
        save(state_path, engine.store())?;
    }
    Ok(())
}

/// Runs one command. Returns `true` if the state must be written back.
fn dispatch(engine: &mut LedgerEngine<MemoryStore>, command: &str, args: &[String]) -> Result<bool> {
    match command {
        "create-user" => {
            let [username, email, pin, role, balance] = take5(args)?;
            let role = match role.to_lowercase().as_str() {
                "admin" => Role::Admin,
                "player" => Role::Player,
                other => {
                    return Err(LedgerError::Usage(format!("Unknown role: {}", other)));
                }
            };
            let user = engine.create_user(NewUser {
                username: username.clone(),
                email: email.clone(),
                pin: pin.clone(),
                role,
                starting_balance: parse_amount(balance)?,
                can_create_match: args.get(5).map(|s| s == "can-create-match").unwrap_or(false),
            })?;
            println!("Created user {} ({})", user.username, user.id);
            Ok(true)
        }
        "users" => {
            let include_deleted = args.first().map(|s| s == "all").unwrap_or(false);
            write_users(io::stdout(), &engine.list_users(include_deleted)?)?;
            Ok(false)
        }
        "set-blocked" => {
            let [username, flag] = take2(args)?;
            let user = resolve_user(engine, username)?;
            let blocked = flag
                .parse::<bool>()
                .map_err(|_| LedgerError::Usage("Expected true or false".to_string()))?;
            engine.set_user_fields(
                user.id,
                wager_ledger::UserUpdate {
                    is_blocked: Some(blocked),
                    ..Default::default()
                },
            )?;
            println!("{} blocked={}", user.username, blocked);
            Ok(true)
        }
        "delete-user" => {
            let [username] = take1(args)?;
            let user = resolve_user(engine, username)?;
            engine.soft_delete_user(user.id)?;
            println!("Soft-deleted {}", user.username);
            Ok(true)
        }
        "reset-pin" => {
            let [username, new_pin] = take2(args)?;
            let user = resolve_user(engine, username)?;
            engine.reset_pin(user.id, new_pin)?;
            println!("PIN reset for {}", user.username);
            Ok(true)
        }
        "adjust" => {
            if args.len() < 4 {
                return Err(LedgerError::Usage(
                    "adjust <admin> <target> <amount> <reason...>".to_string(),
                ));
            }
            let admin = resolve_user(engine, &args[0])?;
            let target = resolve_user(engine, &args[1])?;
            let amount = parse_amount(&args[2])?;
            let reason = args[3..].join(" ");
            engine.admin_adjust_balance(admin.id, target.id, amount, &reason)?;
            println!("Adjusted {} by {}", target.username, amount);
            Ok(true)
        }
        "create-match" => {
            let [creator, name, team_a, team_b] = take4(args)?;
            let creator = resolve_user(engine, creator)?;
            let team_a = parse_roster(engine, team_a)?;
            let team_b = parse_roster(engine, team_b)?;
            let name = if name == "-" { "" } else { name.as_str() };
            let m = engine.create_match(name, team_a, team_b, creator.id)?;
            println!("Created match {} ({})", m.name, m.id);
            Ok(true)
        }
        "matches" => {
            write_matches(io::stdout(), &engine.list_matches()?)?;
            Ok(false)
        }
        "settle" => {
            let [match_name, team] = take2(args)?;
            let m = resolve_match(engine, match_name)?;
            let winner = parse_team(team)?;
            let report = engine.settle_match(m.id, winner)?;
            match report.status {
                SettlementStatus::Applied => {
                    println!("Settled {} winner={}", m.name, winner);
                    for p in &report.participants {
                        match &p.error {
                            None => println!("  {} {} ok", p.username, p.delta),
                            Some(e) => println!("  {} {} FAILED: {}", p.username, p.delta, e),
                        }
                    }
                }
                SettlementStatus::AlreadySettled => {
                    println!("Match {} already settled, nothing to do", m.name)
                }
                SettlementStatus::NotFound => println!("Match not found, nothing to do"),
            }
            Ok(true)
        }
        "mark-paid" => {
            let [match_name, username] = take2(args)?;
            let m = resolve_match(engine, match_name)?;
            let user = resolve_user(engine, username)?;
            if engine.mark_loser_paid(m.id, user.id)? {
                println!("Cleared {}'s debt for {}", user.username, m.name);
            } else {
                println!("Nothing to clear for {} on {}", user.username, m.name);
            }
            Ok(true)
        }
        "transactions" => {
            let txs = match args.first() {
                Some(username) => {
                    let user = resolve_user(engine, username)?;
                    engine.list_transactions(user.id)?
                }
                None => engine.list_all_transactions()?,
            };
            write_transactions(io::stdout(), &txs)?;
            Ok(false)
        }
        "notifications" => {
            let [username] = take1(args)?;
            let user = resolve_user(engine, username)?;
            let notes = engine.list_notifications(user.id)?;
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["id", "message", "read", "created_at"])?;
            for n in notes {
                writer.write_record([
                    n.id.to_string(),
                    n.message,
                    n.is_read.to_string(),
                    n.created_at.to_rfc3339(),
                ])?;
            }
            writer.flush()?;
            Ok(false)
        }
        "mark-read" => {
            let [username] = take1(args)?;
            let user = resolve_user(engine, username)?;
            engine.mark_all_notifications_read(user.id)?;
            println!("Marked all notifications read for {}", user.username);
            Ok(true)
        }
        other => Err(LedgerError::Usage(format!(
            "Unknown command: {}\n\n{}",
            other, USAGE
        ))),
    }
}

fn save(path: &str, store: &MemoryStore) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    store.to_writer(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn parse_amount(s: &str) -> Result<Credits> {
    Credits::from_str(s).map_err(|_| LedgerError::Usage(format!("Bad amount: {}", s)))
}

fn parse_team(s: &str) -> Result<Team> {
    match s.to_uppercase().as_str() {
        "A" => Ok(Team::A),
        "B" => Ok(Team::B),
        other => Err(LedgerError::Usage(format!("Expected A or B, got {}", other))),
    }
}

/// Looks up a user by (case-insensitive) username, soft-deleted included.
fn resolve_user(engine: &LedgerEngine<MemoryStore>, username: &str) -> Result<User> {
    let wanted = username.trim().to_uppercase();
    engine
        .list_users(true)?
        .into_iter()
        .find(|u| u.username == wanted)
        .ok_or_else(|| LedgerError::Usage(format!("No user named {}", wanted)))
}

/// Looks up a match by exact name, preferring the newest.
fn resolve_match(engine: &LedgerEngine<MemoryStore>, name: &str) -> Result<Match> {
    engine
        .list_matches()?
        .into_iter()
        .find(|m| m.name == name)
        .ok_or_else(|| LedgerError::Usage(format!("No match named {}", name)))
}

/// Parses `NAME=STAKE[,NAME=STAKE...]` into a roster.
fn parse_roster(engine: &LedgerEngine<MemoryStore>, spec: &str) -> Result<Vec<MatchPlayer>> {
    let mut roster = Vec::new();
    for entry in spec.split(',') {
        let (name, stake) = entry
            .split_once('=')
            .ok_or_else(|| LedgerError::Usage(format!("Bad roster entry: {}", entry)))?;
        let user = resolve_user(engine, name)?;
        roster.push(MatchPlayer::new(
            user.id,
            user.username,
            parse_amount(stake)?,
        ));
    }
    Ok(roster)
}

fn write_users<W: Write>(writer: W, users: &[User]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "username",
        "email",
        "role",
        "balance",
        "blocked",
        "deleted",
        "can_create_match",
        "matches_paid",
    ])?;
    for u in users {
        csv_writer.write_record([
            u.username.clone(),
            u.email.clone(),
            format!("{:?}", u.role).to_uppercase(),
            u.balance.to_string(),
            u.is_blocked.to_string(),
            u.is_deleted.to_string(),
            u.can_create_match.to_string(),
            u.total_matches_paid.to_string(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn write_matches<W: Write>(writer: W, matches: &[Match]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["name", "status", "winning_team", "team_a", "team_b"])?;
    for m in matches {
        csv_writer.write_record([
            m.name.clone(),
            format!("{:?}", m.status).to_uppercase(),
            m.winning_team.map(|t| t.to_string()).unwrap_or_default(),
            format_roster(&m.team_a),
            format_roster(&m.team_b),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn format_roster(roster: &[MatchPlayer]) -> String {
    roster
        .iter()
        .map(|p| {
            if p.paid {
                format!("{}={} paid", p.username, p.stake)
            } else {
                format!("{}={}", p.username, p.stake)
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn write_transactions<W: Write>(writer: W, txs: &[wager_ledger::Transaction]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["user_id", "amount", "type", "description", "created_at"])?;
    for t in txs {
        let kind = serde_json::to_string(&t.kind)
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();
        csv_writer.write_record([
            t.user_id.to_string(),
            t.amount.to_string(),
            kind,
            t.description.clone(),
            t.created_at.to_rfc3339(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn take1(args: &[String]) -> Result<[&String; 1]> {
    match args {
        [a, ..] => Ok([a]),
        _ => Err(LedgerError::Usage(USAGE.to_string())),
    }
}

fn take2(args: &[String]) -> Result<[&String; 2]> {
    match args {
        [a, b, ..] => Ok([a, b]),
        _ => Err(LedgerError::Usage(USAGE.to_string())),
    }
}

fn take4(args: &[String]) -> Result<[&String; 4]> {
    match args {
        [a, b, c, d, ..] => Ok([a, b, c, d]),
        _ => Err(LedgerError::Usage(USAGE.to_string())),
    }
}

fn take5(args: &[String]) -> Result<[&String; 5]> {
    match args {
        [a, b, c, d, e, ..] => Ok([a, b, c, d, e]),
        _ => Err(LedgerError::Usage(USAGE.to_string())),
    }
}
