use anyhow::{Context, Result, anyhow};
use chore_rota::persistence::{load_history_from_csv, save_history_to_csv};
use chore_rota::{
    FixedClock, HistoryStore, JsonFileHistory, SchedulerConfig, ScheduleStore, WeekIndex,
    WeekLookup, WeekRecords,
};
use std::env;
use std::fmt::Display;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "chores.json";
const DEFAULT_HISTORY: &str = "history.json";

type Store = ScheduleStore<Box<dyn HistoryStore>>;

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, headers.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        let pad = widths[ci].saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

fn render_week(records: &WeekRecords) -> String {
    let rows: Vec<Vec<String>> = records
        .values()
        .map(|record| {
            let assignees = record
                .assignees
                .iter()
                .map(|a| format!("[{}] {}", if a.done { "x" } else { " " }, a.name))
                .collect::<Vec<_>>()
                .join(", ");
            vec![record.chore_name.clone(), record.due.clone(), assignees]
        })
        .collect();
    render_table(&["chore", "due", "assignees"], &rows)
}

fn show(store: &Store, week: WeekIndex) {
    match store.get_week(week) {
        Ok(WeekLookup::Available(records)) => {
            println!("Week {} (from {})", week, week.monday().format("%d/%m/%Y"));
            if records.is_empty() {
                println!("No chores due.");
            } else {
                print!("{}", render_week(&records));
            }
        }
        Ok(WeekLookup::NotGenerated) => println!("Week {} was never generated.", week),
        Err(e) => println!("Error: {}", e),
    }
}

fn print_chores(store: &Store) {
    let rows: Vec<Vec<String>> = store
        .config()
        .chores
        .iter()
        .map(|chore| {
            let next_due = match store.next_due(chore.name()) {
                Ok(Some(week)) => week.to_string(),
                _ => "-".to_string(),
            };
            vec![
                chore.urlized_name(),
                chore.rule().to_string(),
                chore.assignee_count().to_string(),
                chore.namelist().names().collect::<Vec<_>>().join(", "),
                next_due,
            ]
        })
        .collect();
    let headers = ["chore", "rule", "count", "namelist", "next due"];
    print!("{}", render_table(&headers, &rows));
    if !store.config().unavailable.is_empty() {
        let away: Vec<&str> = store.config().unavailable.iter().map(String::as_str).collect();
        println!("Away: {}", away.join(", "));
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show [<week> <year>]               Show a week (generating it if needed)\n  next | prev | today                Move between weeks\n  generate                           Assign missing chores of the shown week\n  chores                             List configured chores\n  weights <chore>                    Show current fairness weights\n  done    <chore> <name>             Mark an assignment done\n  undone  <chore> <name>             Mark an assignment not done\n  toggle  <chore> <name>             Flip an assignment's done flag\n  reassign <chore> <from> <to>       Hand an assignment to someone else\n  away <name> | back <name>          Skip someone in new weeks, or stop skipping\n  reset                              Delete assignments from the shown week on\n  export <csv_path>                  Write history to CSV\n  import <csv_path>                  Load history from CSV\n  quit|exit                          Exit\n\nChore names match loosely: 'take-out-bins' finds 'Take out bins'."
    );
}

fn open_history(path: &str) -> Result<Box<dyn HistoryStore>> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    match extension {
        #[cfg(feature = "sqlite")]
        "db" | "sqlite" => Ok(Box::new(
            chore_rota::SqliteHistory::new(path)
                .with_context(|| format!("opening sqlite history {path}"))?,
        )),
        _ => Ok(Box::new(
            JsonFileHistory::open(path).with_context(|| format!("opening history {path}"))?,
        )),
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={value:?}: {e}")),
        Err(_) => Ok(None),
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config_path = env::var("CHORE_ROTA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let history_path =
        env::var("CHORE_ROTA_HISTORY").unwrap_or_else(|_| DEFAULT_HISTORY.to_string());
    let config = SchedulerConfig::load(&config_path)
        .with_context(|| format!("loading chores from {config_path}"))?;

    let mut store = ScheduleStore::new(open_history(&history_path)?, config);
    if let Some(seed) = env_parse::<u64>("CHORE_ROTA_SEED")? {
        store = store.with_seed(seed);
    }
    if let Some(week) = env_parse::<WeekIndex>("CHORE_ROTA_WEEK")? {
        store = store.with_clock(FixedClock(week));
    }

    let mut current = store.current_week();
    println!("Chore Rota (CLI) - type 'help' for commands\n");
    show(&store, current);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => match (parts.next(), parts.next()) {
                (None, _) => show(&store, current),
                (Some(week_s), Some(year_s)) => {
                    let week = match (week_s.parse(), year_s.parse()) {
                        (Ok(w), Ok(y)) => WeekIndex::new(w, y),
                        _ => {
                            println!("Invalid week or year");
                            continue;
                        }
                    };
                    match week {
                        Ok(week) => {
                            current = week;
                            show(&store, current);
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: show [<week> <year>]"),
            },
            "next" => match store.next_week(current) {
                Some(week) => {
                    current = week;
                    show(&store, current);
                }
                None => println!("Week {} is the last one that can be generated.", current),
            },
            "prev" => match store.previous_week(current) {
                Ok(Some(week)) => {
                    current = week;
                    show(&store, current);
                }
                Ok(None) => println!("No earlier week has assignments."),
                Err(e) => println!("Error: {}", e),
            },
            "today" => {
                current = store.current_week();
                show(&store, current);
            }
            "generate" => match store.generate_week(current) {
                Ok(summary) => {
                    println!("Generated ({})", summary.to_cli_summary());
                    for (chore, reason) in &summary.failed {
                        println!("  {}: {}", chore, reason);
                    }
                    print!("{}", render_week(&summary.records));
                }
                Err(e) => println!("Generate error: {}", e),
            },
            "chores" => print_chores(&store),
            "weights" => match parts.next() {
                Some(chore) => match store.fairness_weights(chore) {
                    Ok(weights) => {
                        let rows: Vec<Vec<String>> = weights
                            .iter()
                            .map(|(name, weight)| vec![name.clone(), format!("{weight:.2}")])
                            .collect();
                        print!("{}", render_table(&["name", "weight"], &rows));
                    }
                    Err(e) => println!("Error: {}", e),
                },
                None => println!("Usage: weights <chore>"),
            },
            "done" | "undone" | "toggle" => match (parts.next(), parts.next()) {
                (Some(chore), Some(name)) => {
                    let res = match cmd {
                        "done" => store.mark_done(current, chore, name),
                        "undone" => store.mark_not_done(current, chore, name),
                        _ => store.toggle_done(current, chore, name),
                    };
                    match res {
                        Ok(record) => {
                            let done = record.assignee(name).is_some_and(|a| a.done);
                            println!(
                                "{} is {} for {}.",
                                record.chore_name,
                                if done { "done" } else { "not done" },
                                name
                            );
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: {} <chore> <name>", cmd),
            },
            "reassign" => match (parts.next(), parts.next(), parts.next()) {
                (Some(chore), Some(from), Some(to)) => {
                    match store.reassign(current, chore, from, to) {
                        Ok(record) => {
                            println!("{} reassigned from {} to {}.", record.chore_name, from, to)
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: reassign <chore> <from> <to>"),
            },
            "away" | "back" => match parts.next() {
                Some(name) => {
                    let available = cmd == "back";
                    if !store.set_available(name, available) {
                        let state = if available { "back" } else { "away" };
                        println!("{} is already {}.", name, state);
                        continue;
                    }
                    match store.config().save(&config_path) {
                        Ok(()) if available => println!("{} is back.", name),
                        Ok(()) => println!("{} is away; new weeks will skip them.", name),
                        Err(e) => println!("Error saving {}: {}", config_path, e),
                    }
                }
                None => println!("Usage: {} <name>", cmd),
            },
            "reset" => match store.clear_from(current) {
                Ok(removed) => println!("Removed {} record(s) from week {} on.", removed, current),
                Err(e) => println!("Error: {}", e),
            },
            "export" => match parts.next() {
                Some(path) => match save_history_to_csv(store.history(), path) {
                    Ok(rows) => println!("Exported {} row(s) to {}.", rows, path),
                    Err(e) => println!("Export error: {}", e),
                },
                None => println!("Usage: export <csv_path>"),
            },
            "import" => match parts.next() {
                Some(path) => match load_history_from_csv(store.history(), path) {
                    Ok(records) => println!("Imported {} record(s) from {}.", records, path),
                    Err(e) => println!("Import error: {}", e),
                },
                None => println!("Usage: import <csv_path>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
    Ok(())
}
