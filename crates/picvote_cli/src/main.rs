//! Command-line probe for the PicVote core.
//!
//! # Responsibility
//! - Verify `picvote_core` linkage (`ping`, version).
//! - Drive the gallery task against a local database for manual checks.
//!
//! Usage: `picvote_cli [list [QUERY] [--sort votes|newest|oldest] | vote ID |
//! login | logout | profile | submit NAME IMAGE_PATH [DESCRIPTION]]`

mod render;

use picvote_core::{
    init_logging, spawn_gallery, AppConfig, GalleryClosed, GalleryController, GalleryHandle,
    ImagePayload, MockIdentityProvider, SortOption, SqliteStateStore, SubmissionDraft,
    VoteOutcome,
};
use render::TextRenderer;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    match run(std::env::args().skip(1).collect()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Vec<String>) -> Result<(), String> {
    println!("picvote_core ping={}", picvote_core::ping());
    println!("picvote_core version={}", picvote_core::core_version());

    let config = AppConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, &dir.to_string_lossy()).map_err(|err| err.to_string())?;
    }

    let store = SqliteStateStore::open(&config.db_path).map_err(|err| err.to_string())?;
    let (gallery, task) = spawn_gallery(
        GalleryController::load(store),
        config.build_analyzer(),
        Arc::new(MockIdentityProvider::new(config.login_delay)),
    );

    let outcome = dispatch(&gallery, &args).await;
    drop(gallery);
    let _ = task.await;
    outcome
}

async fn dispatch(gallery: &GalleryHandle, args: &[String]) -> Result<(), String> {
    let renderer = TextRenderer;
    let closed = |err: GalleryClosed| err.to_string();
    let command = args.first().map(String::as_str).unwrap_or("list");

    match command {
        "list" => {
            let (query, sort) = parse_list_args(&args[1..])?;
            gallery.set_search_query(query).await.map_err(closed)?;
            gallery.set_sort(sort).await.map_err(closed)?;
            let snapshot = gallery.snapshot().await.map_err(closed)?;
            print!("{}", renderer.render_gallery(&snapshot));
        }
        "vote" => {
            let id = args.get(1).ok_or("usage: vote ID")?;
            match gallery.vote(id.as_str()).await.map_err(closed)? {
                VoteOutcome::Recorded { votes } => println!("voted for {id}; total {votes}"),
                VoteOutcome::AlreadyVoted => println!("already voted for {id}"),
                VoteOutcome::LoginRequired => println!("login required; run `login` first"),
                VoteOutcome::UnknownCandidate => println!("no candidate with id {id}"),
            }
        }
        "login" => match gallery.login().await.map_err(closed)? {
            Ok(user) => println!("signed in as @{}", user.handle),
            Err(err) => println!("{err}"),
        },
        "logout" => {
            gallery.logout().await.map_err(closed)?;
            println!("signed out");
        }
        "profile" => {
            if !gallery.open_profile().await.map_err(closed)? {
                println!("login required; run `login` first");
                return Ok(());
            }
            let snapshot = gallery.snapshot().await.map_err(closed)?;
            if let Some(profile) = snapshot.profile.as_ref() {
                print!("{}", renderer.render_profile(profile));
            }
        }
        "submit" => {
            let name = args.get(1).ok_or("usage: submit NAME IMAGE_PATH [DESCRIPTION]")?;
            let path = args.get(2).ok_or("usage: submit NAME IMAGE_PATH [DESCRIPTION]")?;
            let description = args.get(3).cloned().unwrap_or_default();
            let bytes = std::fs::read(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
            let image = ImagePayload::from_bytes(&bytes, mime_for_path(Path::new(path)));

            println!("analyzing...");
            let draft = SubmissionDraft::new(name.as_str(), description, image);
            match gallery.submit(draft).await.map_err(closed)? {
                Ok(candidate) => println!(
                    "created {} ({}% vibe)",
                    candidate.id,
                    candidate.vibe_score.unwrap_or_default()
                ),
                Err(err) => println!("rejected: {err}"),
            }
        }
        other => return Err(format!("unknown command `{other}`")),
    }

    Ok(())
}

fn parse_list_args(args: &[String]) -> Result<(String, SortOption), String> {
    let mut query = String::new();
    let mut sort = SortOption::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--sort" {
            let value = iter.next().ok_or("`--sort` needs a value")?;
            sort = value
                .parse::<SortOption>()
                .map_err(|err| err.to_string())?;
        } else {
            query = arg.clone();
        }
    }
    Ok((query, sort))
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::{mime_for_path, parse_list_args};
    use picvote_core::SortOption;
    use std::path::Path;

    #[test]
    fn list_args_accept_query_and_sort() {
        let args = vec!["nature".to_string(), "--sort".to_string(), "oldest".to_string()];
        let (query, sort) = parse_list_args(&args).unwrap();
        assert_eq!(query, "nature");
        assert_eq!(sort, SortOption::Oldest);

        let bad = vec!["--sort".to_string(), "loud".to_string()];
        assert!(parse_list_args(&bad).is_err());
    }

    #[test]
    fn mime_is_derived_from_extension() {
        assert_eq!(mime_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("a")), "image/jpeg");
    }
}
