//! Command-line arguments and the configuration derived from them.
//!
//! Server addresses come from `--url` / `REMOTE_CONTROL_URL` (registered as
//! the `default` server) and any number of `--server NAME=URL` entries.
//! Credentials may be embedded in an address or given separately. A separate
//! username or password replaces only its embedded counterpart.

use anyhow::Context;
use clap::{Parser, Subcommand};
use controller::{ClientConfig, Credentials, Endpoint, ServerName, ServerRegistry};

/// Registry name under which `--url` is stored.
pub const DEFAULT_SERVER: &str = "default";

/// Drive a portal remote controller over XML-RPC.
#[derive(Parser, Debug)]
#[command(name = "remote-control", version, about, long_about = None)]
pub struct Cli {
    /// Remote controller address, e.g. http://myserver.net:8080/cps
    #[arg(long, env = "REMOTE_CONTROL_URL")]
    pub url: Option<String>,

    /// Named server (repeatable)
    #[arg(long = "server", value_name = "NAME=URL", value_parser = parse_server_spec)]
    pub servers: Vec<ServerSpec>,

    /// Named server to call (defaults to the first by name)
    #[arg(long = "use", value_name = "NAME", value_parser = parse_server_name)]
    pub active: Option<ServerName>,

    /// Basic-auth username; overrides the one embedded in the address
    #[arg(long, env = "REMOTE_CONTROL_USERNAME")]
    pub username: Option<String>,

    /// Basic-auth password; overrides the one embedded in the address
    #[arg(long, env = "REMOTE_CONTROL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print results as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List workspaces, create a test document, then read its state (default)
    Demo,
    /// List the documents in a folder
    List { path: String },
    /// Show the workflow state of a document
    State { path: String },
    /// Show the workflow history of a document
    History { path: String },
    /// List configured servers
    Servers,
}

/// One `--server NAME=URL` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSpec {
    pub name: ServerName,
    pub address: String,
}

fn parse_server_name(s: &str) -> Result<ServerName, String> {
    ServerName::new(s.trim()).ok_or_else(|| "server name must not be empty".to_owned())
}

fn parse_server_spec(s: &str) -> Result<ServerSpec, String> {
    let (name, address) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got '{s}'"))?;
    Ok(ServerSpec {
        name: parse_server_name(name)?,
        address: address.trim().to_owned(),
    })
}

impl Cli {
    /// Builds the server registry, normalising every address to the
    /// remote controller tool path.
    pub fn registry(&self) -> anyhow::Result<ServerRegistry> {
        let mut registry = ServerRegistry::new();
        if let Some(url) = &self.url {
            let name = ServerName::new(DEFAULT_SERVER).context("default server name")?;
            registry.add_server(name, Endpoint::parse(url)?.with_tool_path());
        }
        for spec in &self.servers {
            let endpoint = Endpoint::parse(&spec.address)
                .with_context(|| format!("server '{}'", spec.name))?;
            registry.add_server(spec.name.clone(), endpoint.with_tool_path());
        }
        if let Some(name) = &self.active {
            registry.set_active(name)?;
        }
        Ok(registry)
    }

    /// Resolves the active server into a client configuration.
    pub fn client_config(&self) -> anyhow::Result<(ServerName, ClientConfig)> {
        let mut registry = self.registry()?;
        let (name, endpoint) = registry
            .active_endpoint()
            .context("no server configured; pass --url or --server NAME=URL")?;

        let mut endpoint = endpoint.clone();
        let credentials = self.credentials(endpoint.credentials())?;
        if let Some(credentials) = credentials {
            endpoint = endpoint.with_credentials(credentials);
        }
        Ok((name.clone(), ClientConfig::new(endpoint)))
    }

    /// Merges `--username`/`--password` over the credentials embedded in the
    /// address.
    fn credentials(&self, embedded: Option<&Credentials>) -> anyhow::Result<Option<Credentials>> {
        let credentials = match (&self.username, &self.password, embedded) {
            (None, None, embedded) => embedded.cloned(),
            (Some(username), Some(password), _) => Some(Credentials::new(username, password)),
            (Some(username), None, embedded) => Some(Credentials::new(
                username,
                embedded.map(Credentials::password).unwrap_or_default(),
            )),
            (None, Some(password), Some(embedded)) => {
                Some(Credentials::new(embedded.username(), password))
            }
            (None, Some(_), None) => anyhow::bail!(
                "--password needs a username, from --username or embedded in the server address"
            ),
        };
        Ok(credentials)
    }
}
