use crate::types::{Movie, TrendingEntry};

/// Format a rating as one decimal, or "N/A" when the catalog has none
pub fn format_rating(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(rating) if rating > 0.0 => format!("{:.1}", rating),
        _ => "N/A".to_string(),
    }
}

/// Format one movie as `Title (Year) ★ 7.2 · EN`
pub fn format_movie_line(movie: &Movie) -> String {
    let mut line = movie.title.clone();
    if let Some(year) = movie.release_year() {
        line.push_str(&format!(" ({})", year));
    }
    line.push_str(&format!(" ★ {}", format_rating(movie.vote_average)));
    if let Some(lang) = movie.original_language.as_deref().filter(|l| !l.is_empty()) {
        line.push_str(&format!(" · {}", lang.to_uppercase()));
    }
    line
}

pub fn format_movies(movies: &[Movie]) -> String {
    if movies.is_empty() {
        return "No movies found.\n".to_string();
    }

    let mut output = String::new();
    for (index, movie) in movies.iter().enumerate() {
        output.push_str(&format!("{:>3}. {}\n", index + 1, format_movie_line(movie)));
        if let Some(poster) = movie.poster_url() {
            output.push_str(&format!("     {}\n", poster));
        }
    }
    output
}

pub fn format_trending(entries: &[TrendingEntry]) -> String {
    let mut output = String::new();
    output.push_str("## Trending Movies\n\n");
    for entry in entries {
        output.push_str(&format!("{:>2}. {}\n", entry.rank, entry.search_term));
        if !entry.poster_url.is_empty() {
            output.push_str(&format!("    {}\n", entry.poster_url));
        }
    }
    output
}
