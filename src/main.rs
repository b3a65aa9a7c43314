// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podsync::dates::format_short_date;
use podsync::{
    ItunesSearch, JsonStore, NoopReporter, Podcast, ProgressEvent, ProgressReporter,
    ReqwestClient, SearchProvider, SharedProgressReporter, SyncCoordinator, SyncOptions,
    UpdateSummary,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static NEW: Emoji<'_, '_> = Emoji("🆕 ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static VIDEO: Emoji<'_, '_> = Emoji("🎬 ", "[v] ");

/// Keep a library of podcast subscriptions in sync with their feeds
#[derive(Parser, Debug)]
#[command(name = "podsync")]
#[command(about = "Keep a library of podcast subscriptions in sync with their feeds")]
#[command(version)]
struct Args {
    /// Library file holding subscriptions and episodes
    #[arg(short = 'L', long, global = true, default_value = "podsync.json")]
    library: PathBuf,

    /// Maximum number of feeds fetched at the same time
    #[arg(short = 'c', long, global = true, default_value = "8")]
    concurrent: usize,

    /// Timeout for a single feed request, in seconds
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch every subscribed feed and save new episodes
    Refresh,

    /// Subscribe to a podcast feed
    Subscribe {
        /// RSS feed URL
        url: String,
    },

    /// Remove a subscription and its episodes
    Unsubscribe {
        /// RSS feed URL
        url: String,
    },

    /// List subscribed podcasts
    List,

    /// Show a podcast and its episodes, from the library or the network
    Show {
        /// RSS feed URL
        url: String,

        /// Maximum number of episodes to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Search the iTunes directory for podcasts
    Search {
        /// Search term
        term: String,
    },
}

/// Progress reporter using an indicatif spinner for terminal output
struct IndicatifReporter {
    bar: ProgressBar,
}

impl IndicatifReporter {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.green} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RefreshStarted { total } => {
                self.bar.set_length(total as u64);
                self.bar.set_message(format!(
                    "{SEARCH}Refreshing {} podcasts",
                    total.to_string().cyan()
                ));
            }

            ProgressEvent::FetchingFeed { url } => {
                self.bar
                    .set_message(format!("{SEARCH}Fetching feed: {}", url.cyan()));
            }

            ProgressEvent::FeedReconciled {
                podcast_title,
                total_episodes,
                new_episodes,
            } => {
                self.bar.set_message(format!(
                    "{HEADPHONES}{} • {} episodes total, {} new",
                    podcast_title.bold().green(),
                    total_episodes.to_string().cyan(),
                    new_episodes.to_string().yellow()
                ));
            }

            ProgressEvent::FeedFailed { url, error } => {
                self.bar.println(format!(
                    "{FAILURE}{} - {}",
                    url.red(),
                    error.dimmed()
                ));
            }

            ProgressEvent::RefreshProgress { done, .. } => {
                self.bar.set_position(done as u64);
            }

            ProgressEvent::RefreshCompleted {
                updated_podcasts,
                new_episodes,
                failed_count,
            } => {
                self.bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} new episodes in {} podcasts, {} failed",
                    "Refresh complete:".bold().green(),
                    new_episodes.to_string().green().bold(),
                    updated_podcasts.to_string().cyan(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let kept: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

fn print_summaries(summaries: &[UpdateSummary]) {
    if summaries.is_empty() {
        println!("No new episodes.");
        return;
    }

    for summary in summaries {
        println!(
            "{NEW}{} - {} new",
            summary.name.bold(),
            summary.new_count.to_string().yellow()
        );
        for episode in &summary.new_episodes {
            println!(
                "    {} {}",
                format_short_date(&episode.release_date).dimmed(),
                truncate_title(&episode.title, 60)
            );
        }
    }
}

fn print_podcast(podcast: &Podcast, limit: usize) {
    println!("{HEADPHONES}{}", podcast.title.bold().green());
    println!("  {}", podcast.feed_url.cyan());
    if !podcast.description.is_empty() {
        println!("  {}", truncate_title(&podcast.description, 100).dimmed());
    }
    println!(
        "  {} episodes, last updated {}{}\n",
        podcast.episodes.len().to_string().cyan(),
        format_short_date(&podcast.last_updated),
        if podcast.is_subscribed() {
            " (subscribed)".green().to_string()
        } else {
            String::new()
        }
    );

    for episode in podcast.episodes.iter().take(limit) {
        let marker = if episode.is_video() { VIDEO } else { Emoji("  ", "  ") };
        println!(
            "  {}{} {} {}",
            marker,
            format_short_date(&episode.release_date).dimmed(),
            truncate_title(&episode.title, 60),
            episode.duration.dimmed()
        );
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podsync".bold().magenta(),
            "- Podcast Feed Sync".dimmed()
        );
    }

    let store = JsonStore::open(&args.library)
        .await
        .with_context(|| format!("Failed to open library {}", args.library.display()))?;

    let options = SyncOptions {
        max_concurrent: args.concurrent,
        fetch_timeout: Duration::from_secs(args.timeout),
    };

    let show_progress = !args.quiet && matches!(args.command, Command::Refresh);
    let reporter: SharedProgressReporter = if show_progress {
        Arc::new(IndicatifReporter::new())
    } else {
        NoopReporter::shared()
    };

    let sync = SyncCoordinator::new(ReqwestClient::new(), Arc::new(store), options, reporter);

    match args.command {
        Command::Refresh => {
            let mut summaries = Vec::new();
            sync.refresh_all_with(|result| summaries = result).await;
            print_summaries(&summaries);
        }

        Command::Subscribe { url } => {
            let Some(podcast) = sync
                .get_podcast(&url)
                .await
                .context("Failed to look up podcast")?
            else {
                bail!("Could not fetch podcast feed {url}");
            };

            if podcast.is_subscribed() {
                println!("Already subscribed to {}", podcast.title.bold());
            } else {
                let podcast = sync
                    .subscribe(podcast)
                    .await
                    .context("Failed to save podcast")?;
                println!(
                    "{NEW}Subscribed to {} ({} episodes)",
                    podcast.title.bold().green(),
                    podcast.episodes.len().to_string().cyan()
                );
            }
        }

        Command::Unsubscribe { url } => {
            if sync
                .unsubscribe(&url)
                .await
                .context("Failed to remove podcast")?
            {
                println!("Unsubscribed from {}", url.cyan());
            } else {
                println!("Not subscribed to {}", url.yellow());
            }
        }

        Command::List => {
            let podcasts = sync.podcasts().await.context("Failed to load podcasts")?;
            if podcasts.is_empty() {
                println!("No subscriptions yet.");
            }
            for podcast in &podcasts {
                println!(
                    "{} {}\n    {}",
                    format_short_date(&podcast.last_updated).dimmed(),
                    podcast.title.bold(),
                    podcast.feed_url.cyan()
                );
            }
        }

        Command::Show { url, limit } => {
            match sync
                .get_podcast(&url)
                .await
                .context("Failed to look up podcast")?
            {
                Some(podcast) => print_podcast(&podcast, limit),
                None => bail!("Could not fetch podcast feed {url}"),
            }
        }

        Command::Search { term } => {
            let search = ItunesSearch::new(ReqwestClient::new());
            let results = search.search(&term).await.context("Search failed")?;

            if results.is_empty() {
                println!("No podcasts found for {}", term.yellow());
            }
            for result in &results {
                println!(
                    "{} {}\n    {}",
                    result.last_updated_display().dimmed(),
                    result.name.bold(),
                    result.feed_url.cyan()
                );
            }
        }
    }

    if !args.quiet {
        println!(
            "\n{FOLDER}Library: {}\n",
            args.library.display().to_string().cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_title_keeps_short_titles() {
        assert_eq!(truncate_title("Short", 10), "Short");
    }

    #[test]
    fn truncate_title_respects_char_boundaries() {
        assert_eq!(truncate_title("Ünïcödé episode title", 10), "Ünïcödé...");
    }

    #[test]
    fn args_accept_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "podsync",
            "refresh",
            "--library",
            "/tmp/lib.json",
            "-c",
            "2",
        ])
        .unwrap();

        assert!(matches!(args.command, Command::Refresh));
        assert_eq!(args.library, PathBuf::from("/tmp/lib.json"));
        assert_eq!(args.concurrent, 2);
        assert_eq!(args.timeout, 30);
    }
}
