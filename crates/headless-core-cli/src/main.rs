use clap::{Parser, Subcommand, ValueEnum};
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::{Value, json};
use std::error::Error;
use url::Url;

#[derive(Parser)]
#[command(name = "headless-core")]
#[command(about = "A CLI for the headless core service")]
struct Cli {
    /// Base URL for the headless core service
    #[arg(long, default_value = "http://localhost:3000")]
    service_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a content item and run its save events
    Upsert {
        id: i64,
        /// Backend permalink of the item
        permalink: String,
        #[arg(long, default_value = "post")]
        post_type: String,
        #[arg(long, default_value = "draft")]
        status: String,
        #[arg(short, long, default_value = "")]
        slug: String,
        #[arg(short, long, default_value = "")]
        title: String,
        /// Content body (HTML)
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Show the external link of a content item
    Link { id: i32 },
    /// Show the preview link of a content item
    Preview { id: i32 },
    /// Dispatch a content event
    Event { kind: EventKind, id: i32 },
    /// Read or change the stored headless settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Clone, Copy, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
enum EventKind {
    Saved,
    Edited,
}

#[derive(Subcommand)]
enum SettingsAction {
    Get,
    Set {
        #[arg(long)]
        error_404_page: Option<i32>,
        #[arg(long)]
        page_on_front: Option<i32>,
        #[arg(long)]
        page_for_posts: Option<i32>,
    },
}

#[derive(Serialize)]
struct UpsertPayload {
    id: i64,
    post_type: String,
    slug: String,
    title: String,
    status: String,
    content_body: String,
    permalink: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let client = Client::new();
    let api = Url::parse(&cli.service_url)?.join("api/v1/")?;

    match cli.command {
        Commands::Upsert {
            id,
            permalink,
            post_type,
            status,
            slug,
            title,
            body,
        } => {
            let payload = UpsertPayload {
                id,
                post_type,
                slug,
                title,
                status,
                content_body: body,
                permalink,
            };
            let response = client
                .post(api.join("content")?)
                .json(&payload)
                .send()
                .await?;
            print_response(response).await?;
        }
        Commands::Link { id } => {
            let response = client
                .get(api.join(&format!("content/{id}"))?)
                .send()
                .await?;
            print_field(response, "link").await?;
        }
        Commands::Preview { id } => {
            let response = client
                .get(api.join(&format!("content/{id}/preview"))?)
                .send()
                .await?;
            print_field(response, "link").await?;
        }
        Commands::Event { kind, id } => {
            let response = client
                .post(api.join("events")?)
                .json(&json!({ "event": kind, "id": id }))
                .send()
                .await?;
            print_response(response).await?;
        }
        Commands::Settings { action } => {
            let endpoint = api.join("settings")?;
            let response = match action {
                SettingsAction::Get => client.get(endpoint).send().await?,
                SettingsAction::Set {
                    error_404_page,
                    page_on_front,
                    page_for_posts,
                } => {
                    // Replaces the whole settings document, as the service does.
                    let payload = json!({
                        "error_404_page": error_404_page,
                        "page_on_front": page_on_front,
                        "page_for_posts": page_for_posts,
                    });
                    client.put(endpoint).json(&payload).send().await?
                }
            };
            print_response(response).await?;
        }
    }

    Ok(())
}

async fn print_response(response: Response) -> Result<(), Box<dyn Error>> {
    if let Some(body) = success_body(response).await? {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Ok(())
}

async fn print_field(response: Response, field: &str) -> Result<(), Box<dyn Error>> {
    if let Some(body) = success_body(response).await? {
        match body.get(field).and_then(Value::as_str) {
            Some(value) => println!("{value}"),
            None => eprintln!("Response has no {field}: {body}"),
        }
    }
    Ok(())
}

async fn success_body(response: Response) -> Result<Option<Value>, Box<dyn Error>> {
    if response.status().is_success() {
        Ok(Some(response.json().await?))
    } else {
        eprintln!("Request failed: {}", response.status());
        eprintln!("Response: {}", response.text().await?);
        Ok(None)
    }
}
