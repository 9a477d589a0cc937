//! Charpick - command line front end for the selection engine.

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use charpick_domain::{AnimeId, AnimeSelection, CharacterId};
use charpick_engine::infrastructure::settings::EngineConfig;
use charpick_engine::use_cases::selection::SessionPhase;
use charpick_engine::App;

const USAGE: &str = "usage: charpick <command>

commands:
  status                      show identity and selection summary
  roster <anime_id> [title]   fetch (or reuse) an anime's main roster
  toggle <anime_id> [title]   select or deselect an anime's whole roster
  remove <character_id>       deselect one character
  pool                        list every selected character
  list [filter]               list selected animes, optionally filtered by title
  clear                       drop every selection and cached anime";

#[derive(Debug)]
enum Command {
    Status,
    Roster { anime_id: AnimeId, title: Option<String> },
    Toggle { anime_id: AnimeId, title: Option<String> },
    Remove { character_id: CharacterId },
    Pool,
    List { filter: Option<String> },
    Clear,
}

impl Command {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut args = args.iter().map(String::as_str);
        let Some(name) = args.next() else {
            bail!("missing command\n\n{USAGE}");
        };
        let rest = args.collect::<Vec<_>>();

        let command = match name {
            "status" => Self::Status,
            "roster" | "toggle" => {
                let raw = rest.first().context("missing anime id")?;
                let anime_id: AnimeId = raw.parse()?;
                let title = Some(rest[1..].join(" ")).filter(|t| !t.is_empty());
                if name == "roster" {
                    Self::Roster { anime_id, title }
                } else {
                    Self::Toggle { anime_id, title }
                }
            }
            "remove" => {
                let raw = rest.first().context("missing character id")?;
                Self::Remove {
                    character_id: raw.parse()?,
                }
            }
            "pool" => Self::Pool,
            "list" => Self::List {
                filter: (!rest.is_empty()).then(|| rest.join(" ")),
            },
            "clear" => Self::Clear,
            other => bail!("unknown command `{other}`\n\n{USAGE}"),
        };
        Ok(command)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the binary may run from `crates/engine`).
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charpick_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let config = EngineConfig::from_env();
    tracing::info!(storage = ?config.storage_path, "Starting charpick");
    let app = App::from_config(&config).await;
    app.selection.refresh().await;

    let result = run(&app, command).await;
    // Remote saves run in the background; let them land before exiting.
    app.selection.flush_pending_writes().await;
    result
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let engine = &app.selection;
    match command {
        Command::Status => {
            let state = engine.snapshot();
            let who = match engine.phase() {
                SessionPhase::Identified(user) => format!("signed in as {user}"),
                SessionPhase::Anonymous => "guest".to_string(),
                SessionPhase::AuthUnresolved => "identity unresolved".to_string(),
            };
            println!("{who}");
            println!("selected characters: {}", state.selection().len());
            println!("cached animes: {}", state.cache().len());
        }
        Command::Roster { anime_id, title } => {
            let roster = engine
                .resolve_anime_roster(anime_id, title.as_deref(), None)
                .await;
            if roster.is_empty() {
                println!("no main characters known for anime {anime_id}");
            }
            for character in roster {
                let mark = if engine.is_character_selected(character.id) {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{mark} {:>8}  {}  ({})",
                    character.id.get(), character.name, character.anime_title
                );
            }
        }
        Command::Toggle { anime_id, title } => {
            engine
                .toggle_all_characters_of_anime(anime_id, title.as_deref(), None)
                .await;
            let summary = match engine.anime_selection(anime_id) {
                AnimeSelection::Unknown => "roster unavailable".to_string(),
                AnimeSelection::None => "deselected".to_string(),
                AnimeSelection::Partial { selected, total } => {
                    format!("{selected}/{total} selected")
                }
                AnimeSelection::Full => "all selected".to_string(),
            };
            println!("anime {anime_id}: {summary}");
        }
        Command::Remove { character_id } => {
            if !engine.is_character_selected(character_id) {
                println!("character {character_id} was not selected");
            }
            engine.remove_character(character_id).await;
        }
        Command::Pool => {
            let pool = engine.game_pool();
            for character in &pool {
                println!(
                    "{:>8}  {}  ({})",
                    character.id.get(), character.name, character.anime_title
                );
            }
            println!("{} characters in pool", pool.len());
        }
        Command::List { filter } => {
            for anime in engine.selected_animes(filter.as_deref()) {
                let summary = match engine.anime_selection(anime.id) {
                    AnimeSelection::Partial { selected, total } => format!("{selected}/{total}"),
                    _ => "all".to_string(),
                };
                println!("{:>8}  {}  [{summary}]", anime.id.get(), anime.title);
            }
        }
        Command::Clear => {
            engine.clear_all_selections().await;
            println!("cleared");
        }
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_toggle_with_multi_word_title() {
        let command = Command::parse(&args(&["toggle", "42", "Cowboy", "Bebop"])).expect("parse");
        match command {
            Command::Toggle { anime_id, title } => {
                assert_eq!(anime_id, AnimeId::new(42));
                assert_eq!(title.as_deref(), Some("Cowboy Bebop"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn roster_title_is_optional() {
        let command = Command::parse(&args(&["roster", "7"])).expect("parse");
        assert!(matches!(command, Command::Roster { title: None, .. }));
    }

    #[test]
    fn rejects_bad_ids_and_unknown_commands() {
        assert!(Command::parse(&args(&["remove", "abc"])).is_err());
        assert!(Command::parse(&args(&["toggle"])).is_err());
        assert!(Command::parse(&args(&["dance"])).is_err());
        assert!(Command::parse(&[]).is_err());
    }
}
