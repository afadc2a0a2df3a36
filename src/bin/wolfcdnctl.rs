//! WolfCdnCtl - Command line client for WolfCDN
//!
//! Usage:
//!   wolfcdnctl ping                          - Check the server is up
//!   wolfcdnctl get <remote> [-o <file>]      - Download a file
//!   wolfcdnctl put <local> <remote-dir>      - Upload a file
//!   wolfcdnctl rm <remote>                   - Delete a file

use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder, Response};

use wolfcdn::api::Envelope;

/// WolfCDN Control Tool
#[derive(Parser)]
#[command(name = "wolfcdnctl")]
#[command(about = "Upload, download and delete files on a WolfCDN server", long_about = None)]
struct Cli {
    /// Server endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    endpoint: String,

    /// Upload username
    #[arg(short, long, env = "CDN_USER")]
    user: Option<String>,

    /// Upload password
    #[arg(short, long, env = "CDN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is up
    Ping,
    /// Download a file
    Get {
        /// Remote path, e.g. /images/logo.png
        remote: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a file
    Put {
        /// Local file to upload
        local: PathBuf,
        /// Remote directory, e.g. /images
        remote_dir: String,
        /// Remote file name (defaults to the local file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Replace an existing file
        #[arg(long)]
        overwrite: bool,
    },
    /// Delete a file
    Rm {
        /// Remote path, e.g. /images/logo.png
        remote: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let ctl = Ctl {
        client: Client::new(),
        endpoint: cli.endpoint.trim_end_matches('/').to_string(),
        user: cli.user,
        password: cli.password,
    };

    let result = match cli.command {
        Commands::Ping => ctl.ping().await,
        Commands::Get { remote, output } => ctl.get(&remote, output).await,
        Commands::Put {
            local,
            remote_dir,
            name,
            overwrite,
        } => ctl.put(local, &remote_dir, name, overwrite).await,
        Commands::Rm { remote } => ctl.rm(&remote).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

struct Ctl {
    client: Client,
    endpoint: String,
    user: Option<String>,
    password: Option<String>,
}

impl Ctl {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let Some(user) = &self.user else {
            bail!("--user (or CDN_USER) is required for this command");
        };
        Ok(request.basic_auth(user, self.password.as_deref()))
    }

    async fn ping(&self) -> Result<()> {
        let envelope = expect_envelope(self.client.get(self.url("/")).send().await?).await?;
        println!("{}", envelope.message);
        Ok(())
    }

    async fn get(&self, remote: &str, output: Option<PathBuf>) -> Result<()> {
        let response = self.client.get(self.url(remote)).send().await?;
        if !response.status().is_success() {
            expect_envelope(response).await?;
            return Ok(());
        }

        let data = response.bytes().await?;
        match output {
            Some(path) => {
                std::fs::write(&path, &data)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("Saved {} bytes to {}", data.len(), path.display());
            }
            None => std::io::stdout().write_all(&data)?,
        }
        Ok(())
    }

    async fn put(
        &self,
        local: PathBuf,
        remote_dir: &str,
        name: Option<String>,
        overwrite: bool,
    ) -> Result<()> {
        let filename = match name {
            Some(n) => n,
            None => local
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .context("local path has no file name, pass --name")?,
        };
        let data = std::fs::read(&local).with_context(|| format!("reading {}", local.display()))?;

        let mut query = vec![("filename", filename)];
        if overwrite {
            query.push(("overwrite", "1".to_string()));
        }

        let request = self
            .client
            .post(self.url(remote_dir))
            .query(&query)
            .body(data);
        let envelope = expect_envelope(self.authed(request)?.send().await?).await?;
        println!("{}", envelope.message);
        Ok(())
    }

    async fn rm(&self, remote: &str) -> Result<()> {
        let request = self.client.delete(self.url(remote));
        let envelope = expect_envelope(self.authed(request)?.send().await?).await?;
        println!("{}", envelope.message);
        Ok(())
    }
}

/// Decode the status envelope, failing on non-success codes
async fn expect_envelope(response: Response) -> Result<Envelope> {
    let status = response.status();
    let body = response.text().await?;
    let envelope: Envelope = serde_json::from_str(&body)
        .with_context(|| format!("unexpected {} response: {}", status, body))?;

    if !envelope.success {
        bail!("{} {}", envelope.code, envelope.message);
    }
    Ok(envelope)
}
