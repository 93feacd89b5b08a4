use anyhow::Context;
use clap::Parser;
use is_terminal::IsTerminal;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use gatelog::render::{self, ColorScheme};
use gatelog::{Console, FetchLimit, FileSource, Level, LevelFilterSet};

#[derive(Parser)]
#[command(name = "gatelog")]
#[command(about = "Normalize, filter, and tail a managed gateway's log stream")]
#[command(version)]
struct Args {
    /// Log file standing in for the gateway's log endpoint
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Requested tail size per fetch
    #[arg(long, value_enum, default_value_t = FetchLimit::Lines500)]
    limit: FetchLimit,

    /// Keep polling the source instead of rendering once
    #[arg(short = 'f', long)]
    follow: bool,

    /// Poll interval while following
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    interval: Duration,

    /// Comma-separated levels to show (default: all six)
    #[arg(long, value_delimiter = ',', value_name = "LEVEL")]
    level: Vec<String>,

    /// Case-insensitive keyword filter
    #[arg(short = 'g', long = "grep", value_name = "QUERY")]
    query: Option<String>,

    /// Hide everything already in the log at startup
    #[arg(long)]
    since_start: bool,

    /// Write the filtered set to a file and exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Emit normalized records as JSON lines instead of formatted text
    #[arg(long)]
    json: bool,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Show processing details on stderr
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("gatelog: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut console = Console::new(args.limit);

    if !args.level.is_empty() {
        let mut set = LevelFilterSet::none();
        for name in &args.level {
            let level = Level::from_name(name)
                .ok_or_else(|| anyhow::anyhow!("unknown level '{}'", name))?;
            set.set(level, true);
        }
        console.set_levels(set);
    }
    if let Some(query) = &args.query {
        console.set_query(query.clone());
    }
    console.set_follow(args.follow);

    let mut source = FileSource::new(&args.file);

    // The first fetch is fatal when the source is unreadable; later ticks
    // only skip the update and keep the previous tail.
    console
        .refresh(&mut source)
        .with_context(|| format!("cannot read '{}'", args.file.display()))?;

    if args.since_start {
        console.clear();
    }

    if let Some(path) = &args.export {
        let count = console.export(path)?;
        if args.debug {
            eprintln!("gatelog: exported {} lines to {}", count, path.display());
        }
        return Ok(());
    }

    let use_colors = !args.no_color && !args.json && io::stdout().is_terminal();
    let scheme = ColorScheme::new(use_colors);
    let width = render::display_width();
    let query = console.query().to_string();

    render_view(&console, &scheme, &query, width, args.json, use_colors && args.follow)?;

    if args.follow {
        loop {
            thread::sleep(args.interval);
            if !console.gate().polling() && !console.take_immediate_refresh() {
                continue;
            }
            match console.refresh(&mut source) {
                Ok(true) => {}
                Ok(false) => {
                    if args.debug {
                        eprintln!("gatelog: stale fetch discarded");
                    }
                    continue;
                }
                Err(e) => {
                    if args.debug {
                        eprintln!("gatelog: fetch failed, keeping previous tail: {}", e);
                    }
                    continue;
                }
            }
            render_view(&console, &scheme, &query, width, args.json, use_colors)?;
        }
    }

    Ok(())
}

fn render_view(
    console: &Console,
    scheme: &ColorScheme,
    query: &str,
    width: usize,
    json: bool,
    clear_screen: bool,
) -> anyhow::Result<()> {
    let view = console.view();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if clear_screen {
        write!(out, "\x1b[2J\x1b[H")?;
    }

    if json {
        for line in &view.rendered {
            match line.record {
                Some(record) => writeln!(out, "{}", serde_json::to_string(record)?)?,
                None => writeln!(out, "{}", serde_json::json!({ "raw": line.raw }))?,
            }
        }
    } else {
        if view.omitted > 0 {
            writeln!(
                out,
                "{}… {} earlier matching rows not shown{}",
                scheme.extra, view.omitted, scheme.reset
            )?;
        }
        for line in &view.rendered {
            writeln!(out, "{}", render::render_line(line, scheme, query, width))?;
        }
        writeln!(
            out,
            "{}{} errors, {} warnings in view{}",
            scheme.extra, view.stats.errors, view.stats.warns, scheme.reset
        )?;
    }

    out.flush()?;
    Ok(())
}
