//! Terminal front-end for the ingredient list.
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! login                   authenticate
//! add <title> <amount>    store a new ingredient
//! remove <id>             delete an ingredient
//! search [text]           filter by exact title (empty shows everything)
//! list                    show the list
//! dismiss                 close the error message
//! quit                    exit
//! ```

use anyhow::Context;
use ingredients::{
    App, DatabaseConfig, IngredientId, IngredientsPage, NewIngredient, PageError, Screen,
};
use pantry_http::{ClientConfig, ReqwestClient};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

enum Command {
    Login,
    Add { title: String, amount: String },
    Remove(IngredientId),
    Search(String),
    List,
    Dismiss,
    Quit,
}

fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match verb {
        "login" => Ok(Command::Login),
        "add" => match rest.rsplit_once(' ') {
            Some((title, amount)) if !title.trim().is_empty() => Ok(Command::Add {
                title: title.trim().to_string(),
                amount: amount.to_string(),
            }),
            _ => Err("usage: add <title> <amount>".to_string()),
        },
        "remove" if !rest.is_empty() => Ok(Command::Remove(IngredientId::new(rest))),
        "remove" => Err("usage: remove <id>".to_string()),
        "search" => Ok(Command::Search(rest.to_string())),
        "list" => Ok(Command::List),
        "dismiss" => Ok(Command::Dismiss),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command: {other}")),
    }
}

/// Show a failed page operation and keep the session going
fn report(result: Result<(), PageError>) {
    if let Err(error) = result {
        tracing::warn!(error = %error, "Page operation failed");
        println!("!! {error}");
    }
}

fn render(page: &IngredientsPage) {
    let view = page.view();

    if let Some(error) = &view.error {
        println!("!! {error} (type `dismiss` to close)");
    }
    if view.loading {
        println!("   saving...");
    }
    if view.searching {
        println!("   searching...");
    }
    if !view.filter.is_empty() {
        println!("   filter: {:?}", view.filter);
    }

    if view.ingredients.is_empty() {
        println!("   (no ingredients)");
    }
    for ingredient in &view.ingredients {
        println!("   [{}] {} x{}", ingredient.id, ingredient.title, ingredient.amount);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = DatabaseConfig::from_env().context("Failed to load configuration")?;
    let client = ReqwestClient::with_config(
        &ClientConfig::default().with_timeout(config.request_timeout),
    )
    .context("Failed to build HTTP client")?;
    let client = Arc::new(client);
    let settle_timeout = config.request_timeout + config.search_debounce;

    tracing::info!(database = config.base_url(), "Starting ingredients");

    let mut app = App::new();
    let mut page: Option<IngredientsPage> = None;

    println!("Please log in to continue (type `login`).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command = match parse(&line) {
            Ok(command) => command,
            Err(usage) => {
                println!("{usage}");
                continue;
            },
        };

        if matches!(command, Command::Quit) {
            break;
        }

        let page = match (app.screen(), command) {
            (Screen::Auth, Command::Login) => {
                app.login();
                let fresh = page.insert(IngredientsPage::new(client.clone(), config.clone()));
                report(fresh.load());
                &*fresh
            },
            (Screen::Auth, _) => {
                println!("You are not authenticated. Type `login` first.");
                continue;
            },
            (Screen::Ingredients, command) => {
                let Some(page) = page.as_ref() else {
                    continue;
                };
                report(match command {
                    Command::Add { title, amount } => page
                        .add_ingredient(NewIngredient::new(title, amount))
                        .map(|_ticket| ()),
                    Command::Remove(id) => page.remove_ingredient(&id).map(|_ticket| ()),
                    Command::Search(text) => page.set_filter(text),
                    Command::Dismiss => page.clear_error(),
                    Command::Login => {
                        println!("Already logged in.");
                        Ok(())
                    },
                    Command::List | Command::Quit => Ok(()),
                });
                page
            },
        };

        if !page.settle(settle_timeout).await {
            println!("   (still waiting for the server)");
        }
        render(page);
    }

    Ok(())
}
