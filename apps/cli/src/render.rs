use std::time::Duration;

use cinefind_core::{TrendingEntry, ViewState, format_movies, format_trending};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{broadcast, watch};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn section_title(query: &str) -> String {
    if query.is_empty() {
        "Popular Movies".to_string()
    } else {
        format!("Results for \"{}\"", query)
    }
}

pub fn print_state(title: &str, state: &ViewState) {
    match state {
        ViewState::Idle | ViewState::Loading => {}
        ViewState::Error(message) => {
            eprintln!("{} {}", style("Error:").red().bold(), message);
        }
        ViewState::Loaded(movies) => {
            println!("\n{}\n", style(title).cyan().bold());
            print!("{}", format_movies(movies));
        }
    }
}

pub fn print_trending(entries: &[TrendingEntry]) {
    if entries.is_empty() {
        return;
    }
    println!("{}", style("─".repeat(60)).dim());
    print!("{}", format_trending(entries));
    println!("{}", style("─".repeat(60)).dim());
}

/// Redraw whenever the view or the trending list changes, until shutdown.
/// `query` reports what the results belong to at the time they arrive.
pub async fn follow<F>(
    mut view: watch::Receiver<ViewState>,
    mut trending: watch::Receiver<Vec<TrendingEntry>>,
    query: F,
    mut shutdown: broadcast::Receiver<()>,
) where
    F: Fn() -> String + Send,
{
    let mut spinner: Option<ProgressBar> = None;

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = view.borrow_and_update().clone();
                if state.is_loading() {
                    if spinner.is_none() {
                        spinner = Some(create_spinner("Loading movies..."));
                    }
                    continue;
                }
                if let Some(pb) = spinner.take() {
                    pb.finish_and_clear();
                }
                print_state(&section_title(&query()), &state);
            }
            changed = trending.changed() => {
                if changed.is_err() {
                    break;
                }
                let entries = trending.borrow_and_update().clone();
                print_trending(&entries);
            }
        }
    }

    if let Some(pb) = spinner.take() {
        pb.finish_and_clear();
    }
}
