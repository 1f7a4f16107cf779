//! Command execution against a connected [`RemoteClient`].

use anyhow::Context;
use controller::{
    DocumentMetadata, DocumentPath, PortalType, RemoteClient, RpcTransport, Value,
};
use serde::Serialize;

use crate::args::{Cli, Command};

const DEMO_FOLDER: &str = "workspaces";
const DEMO_DOCUMENT: &str = "workspaces/test-document";
const DEMO_PORTAL_TYPE: &str = "File";

/// Renders one result either as human-readable text or as a JSON line.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    step: &'a str,
    result: &'a Value,
}

impl Output {
    pub fn render(&self, step: &str, result: &Value) -> anyhow::Result<String> {
        if self.json {
            Ok(serde_json::to_string(&Report { step, result })?)
        } else {
            Ok(format!("\n{step}: {result}"))
        }
    }

    fn print(&self, step: &str, result: &Value) -> anyhow::Result<()> {
        println!("{}", self.render(step, result)?);
        Ok(())
    }
}

/// Runs the selected command (the demo when none was given).
pub async fn run(cli: &Cli) -> anyhow::Result<()> {
    let command = cli.command.clone().unwrap_or(Command::Demo);
    let output = Output { json: cli.json };

    if command == Command::Servers {
        return list_servers(cli, output);
    }

    let (server, config) = cli.client_config()?;
    tracing::info!(server = %server, endpoint = %config.endpoint, "Connecting to remote controller");
    let client = xmlrpc::connect(config).context("creating XML-RPC client")?;

    execute(&client, command, output).await
}

pub async fn execute<T: RpcTransport>(
    client: &RemoteClient<T>,
    command: Command,
    output: Output,
) -> anyhow::Result<()> {
    match command {
        Command::Demo => demo(client, output).await,
        Command::List { path } => {
            let entries = client.list_content(&document_path(&path)?).await?;
            output.print("Content", &Value::Array(entries))
        }
        Command::State { path } => {
            let state = client.get_document_state(&document_path(&path)?).await?;
            output.print("Document state", &state)
        }
        Command::History { path } => {
            let history = client.get_document_history(&document_path(&path)?).await?;
            output.print("Document history", &Value::Struct(history))
        }
        // Answered from configuration in `run`; no connection needed.
        Command::Servers => Ok(()),
    }
}

/// List the workspaces, create a test document in them, then read its state.
pub async fn demo<T: RpcTransport>(client: &RemoteClient<T>, output: Output) -> anyhow::Result<()> {
    let folder = document_path(DEMO_FOLDER)?;

    let content = client.list_content(&folder).await?;
    output.print("Workspaces content", &Value::Array(content))?;

    let portal_type = PortalType::new(DEMO_PORTAL_TYPE).context("demo portal type")?;
    let id = client
        .create_document(&portal_type, &folder, demo_metadata(), 0)
        .await?;
    output.print("Document created", &Value::String(id))?;

    let state = client
        .get_document_state(&document_path(DEMO_DOCUMENT)?)
        .await?;
    output.print("Document state", &state)
}

fn demo_metadata() -> DocumentMetadata {
    DocumentMetadata::new()
        .with_text("Title", "Test Document")
        .with_text("Description", "Test Document Description")
        .with_bytes("file", b"Bla bla ...".to_vec())
        .with_text("file_name", "test.txt")
}

fn list_servers(cli: &Cli, output: Output) -> anyhow::Result<()> {
    let mut registry = cli.registry()?;
    let active = registry.active_or_first().cloned();
    let servers = registry
        .list_servers()
        .into_iter()
        .map(|(name, endpoint)| {
            let mut entry = DocumentMetadata::new().with_text("url", endpoint.url().as_str());
            entry.insert("active", Value::Boolean(active.as_ref() == Some(name)));
            (name.to_string(), Value::from(entry))
        })
        .collect();
    output.print("Servers", &Value::Struct(servers))
}

fn document_path(path: &str) -> anyhow::Result<DocumentPath> {
    DocumentPath::new(path).context("document path must not be empty")
}
