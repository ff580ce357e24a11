use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use rapnet_pricelist::{AcceptType, ClientConfig, Payload, PriceItemsQuery, PriceListClient};
use tracing_subscriber::EnvFilter;

/// pricelistctl - query the RapNet diamond price list
///
/// Credentials come from flags or the RAPNET_* environment variables.
/// Price commands fetch a machine-to-machine token first unless --token is given.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// OAuth client id
    #[arg(long, env = "RAPNET_CLIENT_ID", global = true)]
    client_id: Option<String>,

    /// OAuth client secret
    #[arg(long, env = "RAPNET_CLIENT_SECRET", hide_env_values = true, global = true)]
    client_secret: Option<String>,

    /// Price list API root (defaults to the production service)
    #[arg(long, env = "RAPNET_PRICELIST_URL", value_name = "URL", global = true)]
    pricelist_url: Option<String>,

    /// Token service root (defaults to the production service)
    #[arg(long, env = "RAPNET_MACHINE_AUTH_URL", value_name = "URL", global = true)]
    machine_auth_url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the URL that starts the authorization-code flow
    AuthorizeUrl {
        #[arg(long, env = "RAPNET_REDIRECT_URI")]
        redirect_uri: String,
    },

    /// Exchange an authorization code for a token
    Exchange {
        #[arg(long)]
        code: String,
        #[arg(long, env = "RAPNET_REDIRECT_URI")]
        redirect_uri: String,
    },

    /// Request a machine-to-machine token
    Token,

    /// Fetch the price list for a shape
    List {
        #[command(flatten)]
        auth: TokenArgs,
        #[arg(long)]
        shape: Option<String>,
        /// json, xml, dbf or csv
        #[arg(long, default_value = "json")]
        format: AcceptType,
    },

    /// Fetch the normalized CSV price list
    Normalized {
        #[command(flatten)]
        auth: TokenArgs,
        #[arg(long)]
        shape: Option<String>,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        csvnormalized: bool,
    },

    /// Look up prices for a shape, size, color and clarity
    Items {
        #[command(flatten)]
        auth: TokenArgs,
        #[arg(long)]
        shape: Option<String>,
        #[arg(long)]
        size: String,
        #[arg(long)]
        color: String,
        #[arg(long)]
        clarity: String,
        /// json or xml
        #[arg(long, default_value = "json")]
        format: AcceptType,
    },

    /// Fetch recent price changes
    Changes {
        #[command(flatten)]
        auth: TokenArgs,
        #[arg(long)]
        shape: Option<String>,
    },
}

#[derive(clap::Args, Debug)]
struct TokenArgs {
    /// Bearer token to use instead of requesting one
    #[arg(long, env = "RAPNET_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Cli {
    fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env().with_accept_invalid_certs(self.insecure);
        if let Some(client_id) = &self.client_id {
            config.client_id = Some(client_id.clone());
        }
        if let Some(secret) = &self.client_secret {
            config.client_secret = Some(secret.clone().into());
        }
        if let Some(url) = &self.pricelist_url {
            config.pricelist_url = url.clone();
        }
        if let Some(url) = &self.machine_auth_url {
            config.machine_auth_url = url.clone();
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = PriceListClient::new(cli.config()).context("Failed to create client")?;

    let payload = match cli.command {
        Commands::AuthorizeUrl { redirect_uri } => {
            println!("{}", client.authorize(&redirect_uri)?.location());
            return Ok(());
        }
        Commands::Exchange { code, redirect_uri } => {
            let token = client.get_auth_token(&code, &redirect_uri).await?;
            Payload::Json(serde_json::to_value(token)?)
        }
        Commands::Token => {
            let token = client.get_auth_token_machine_to_machine().await?;
            Payload::Json(serde_json::to_value(token)?)
        }
        Commands::List { auth, shape, format } => {
            let token = bearer(&client, auth).await?;
            client
                .get_prices_list(&token, shape.as_deref(), format)
                .await?
        }
        Commands::Normalized {
            auth,
            shape,
            csvnormalized,
        } => {
            let token = bearer(&client, auth).await?;
            client
                .get_normalized_prices_list(&token, shape.as_deref(), csvnormalized)
                .await?
        }
        Commands::Items {
            auth,
            shape,
            size,
            color,
            clarity,
            format,
        } => {
            let token = bearer(&client, auth).await?;
            let mut query = PriceItemsQuery::new()
                .size(size)
                .color(color)
                .clarity(clarity)
                .accept(format);
            if let Some(shape) = shape {
                query = query.shape(shape);
            }
            client.get_price_items(&token, &query).await?
        }
        Commands::Changes { auth, shape } => {
            let token = bearer(&client, auth).await?;
            client.get_prices_changes(&token, shape.as_deref()).await?
        }
    };

    print_payload(payload)
}

/// The explicit token, the configured cached one, or a fresh machine token.
async fn bearer(client: &PriceListClient, auth: TokenArgs) -> Result<String> {
    if let Some(token) = auth.token {
        return Ok(token);
    }
    if let Some(token) = client.cached_token() {
        return Ok(token.to_string());
    }

    let response = client
        .get_auth_token_machine_to_machine()
        .await
        .context("Failed to obtain a machine-to-machine token")?;
    response
        .bearer()
        .map(str::to_string)
        .context("Token response did not contain a token")
}

fn print_payload(payload: Payload) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match payload {
        Payload::Json(value) => writeln!(stdout, "{}", serde_json::to_string_pretty(&value)?)?,
        Payload::Text(text) => write!(stdout, "{}", text)?,
        Payload::Binary(bytes) => stdout.write_all(&bytes)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_authorize_url() {
        let cli = Cli::try_parse_from([
            "pricelistctl",
            "authorize-url",
            "--redirect-uri",
            "https://app/cb",
        ])
        .unwrap();
        match cli.command {
            Commands::AuthorizeUrl { redirect_uri } => assert_eq!(redirect_uri, "https://app/cb"),
            _ => panic!("Expected AuthorizeUrl command"),
        }
    }

    #[test]
    fn parses_list_with_format() {
        let cli = Cli::try_parse_from([
            "pricelistctl",
            "list",
            "--shape",
            "Pear",
            "--format",
            "xml",
            "--token",
            "t",
        ])
        .unwrap();
        match cli.command {
            Commands::List { auth, shape, format } => {
                assert_eq!(auth.token.as_deref(), Some("t"));
                assert_eq!(shape.as_deref(), Some("Pear"));
                assert_eq!(format, AcceptType::Xml);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn normalized_defaults_to_true() {
        let cli = Cli::try_parse_from(["pricelistctl", "normalized"]).unwrap();
        match cli.command {
            Commands::Normalized { csvnormalized, .. } => assert!(csvnormalized),
            _ => panic!("Expected Normalized command"),
        }

        let args = ["pricelistctl", "normalized", "--csvnormalized", "false"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Normalized { csvnormalized, .. } => assert!(!csvnormalized),
            _ => panic!("Expected Normalized command"),
        }
    }

    #[test]
    fn items_requires_filters() {
        let result = Cli::try_parse_from(["pricelistctl", "items", "--size", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_feed_the_config() {
        let cli = Cli::try_parse_from([
            "pricelistctl",
            "token",
            "--client-id",
            "id",
            "--client-secret",
            "secret",
            "--pricelist-url",
            "http://localhost:9000/pricelist/api",
            "--insecure",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.client_id.as_deref(), Some("id"));
        assert_eq!(config.pricelist_url, "http://localhost:9000/pricelist/api");
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn no_subcommand_fails() {
        assert!(Cli::try_parse_from(["pricelistctl"]).is_err());
    }
}
