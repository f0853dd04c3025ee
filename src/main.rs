// SPDX-License-Identifier: MPL-2.0

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tablon::config::APP_NAME;
use tablon::model::FeedContent;
use tablon::{
    FeedError, FeedItem, FeedSettings, FeedViewModel, HttpBackend, ItemId, LoadOutcome,
    MutationOutcome, PendingMutation, runtime,
};

/// Print a viewer's feed as the engine assembles it.
#[derive(Parser, Debug)]
#[command(name = "tablon", version, about)]
struct Args {
    /// Profile id of the viewer
    #[arg(long)]
    viewer: i64,
    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,
    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Print items as JSON lines
    #[arg(long)]
    json: bool,
    /// Toggle the viewer's like on an item (e.g. `pub:42`) before printing
    #[arg(long, value_name = "ITEM")]
    like: Vec<ItemId>,
    /// Toggle the viewer's saved flag on an item (e.g. `ad:7`) before printing
    #[arg(long, value_name = "ITEM")]
    save: Vec<ItemId>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tablon=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = match &args.settings {
        Some(path) => match FeedSettings::load_from(path) {
            Ok(settings) => settings.with_env_overrides(),
            Err(e) => {
                eprintln!("{APP_NAME}: failed to read {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => FeedSettings::load(),
    };

    let backend = match HttpBackend::new(&settings) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("{APP_NAME}: {e}");
            return ExitCode::FAILURE;
        }
    };

    runtime::block_on(run(args, backend))
}

async fn run(args: Args, backend: Arc<HttpBackend>) -> ExitCode {
    let view_model = FeedViewModel::new(backend);

    if let LoadOutcome::Failed(e) = view_model.load_initial(args.viewer).await {
        eprintln!("{APP_NAME}: could not load feed: {e}");
        return ExitCode::FAILURE;
    }
    for _ in 1..args.pages {
        match view_model.load_more(args.viewer).await {
            LoadOutcome::Failed(e) => {
                eprintln!("{APP_NAME}: could not load more: {e}");
                break;
            }
            LoadOutcome::Skipped => break,
            _ => {}
        }
    }

    for &item in &args.like {
        report_toggle(item, view_model.toggle_like(item, args.viewer)).await;
    }
    for &item in &args.save {
        report_toggle(item, view_model.toggle_save(item, args.viewer)).await;
    }

    for item in view_model.items() {
        if args.json {
            match serde_json::to_string(&item) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("{APP_NAME}: {e}"),
            }
        } else {
            println!("{}", describe(&item));
        }
    }
    if view_model.has_more() {
        eprintln!("(more available)");
    }
    ExitCode::SUCCESS
}

async fn report_toggle(item: ItemId, pending: Result<PendingMutation, FeedError>) {
    let result = match pending {
        Ok(pending) => pending.await,
        Err(e) => Err(e),
    };
    match result {
        Ok(MutationOutcome::Liked { liked, like_count }) => {
            eprintln!("{item}: liked={liked} ({like_count} likes)")
        }
        Ok(MutationOutcome::Saved { saved }) => eprintln!("{item}: saved={saved}"),
        Err(e) => eprintln!("{APP_NAME}: {item}: {e}"),
    }
}

fn describe(item: &FeedItem) -> String {
    let envelope = &item.envelope;
    let headline = envelope.title.as_deref().unwrap_or(&envelope.body);
    let counters = match &item.content {
        FeedContent::Publication(p) => format!(
            "likes {}{} | comments {}",
            p.like_count,
            if p.viewer_has_liked { " (you)" } else { "" },
            p.comment_count,
        ),
        FeedContent::Advertisement(_) => "sponsored".to_string(),
    };
    format!(
        "{:<10} {} | {} | {}\n           {}",
        item.id().to_string(),
        envelope.published_at.format("%Y-%m-%d %H:%M"),
        envelope.display_name,
        counters,
        headline,
    )
}
